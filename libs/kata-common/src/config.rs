// Application configuration
// Loaded once at startup and handed to each adapter; never read again at runtime.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Redis,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(StorageBackend::Redis),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}' (expected redis or memory)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub generation_model: String,
    pub guidance_model: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    pub max_parallel_tests: usize,
    pub submission_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub storage: StorageBackend,
    pub redis_url: String,
    pub judge: JudgeConfig,
    pub gemini: GeminiConfig,
    pub evaluation: EvaluationConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_parallel_tests: usize = load(&lookup, "KATA_MAX_PARALLEL_TESTS", "4")?;
        if max_parallel_tests == 0 {
            return Err(ConfigError::Invalid {
                key: "KATA_MAX_PARALLEL_TESTS",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            bind_addr: load(&lookup, "KATA_BIND_ADDR", "0.0.0.0:8000")?,
            storage: load(&lookup, "KATA_STORAGE", "redis")?,
            redis_url: load(&lookup, "REDIS_URL", "redis://127.0.0.1:6379")?,
            judge: JudgeConfig {
                base_url: load::<String, _>(&lookup, "JUDGE0_API_URL", "http://127.0.0.1:2358")?
                    .trim_end_matches('/')
                    .to_string(),
                request_timeout_ms: load(&lookup, "KATA_JUDGE_TIMEOUT_MS", "10000")?,
            },
            gemini: GeminiConfig {
                base_url: load::<String, _>(
                    &lookup,
                    "GEMINI_API_URL",
                    "https://generativelanguage.googleapis.com",
                )?
                .trim_end_matches('/')
                .to_string(),
                api_key: lookup("GEMINI_API_KEY").unwrap_or_default(),
                generation_model: load(&lookup, "KATA_GENERATION_MODEL", "gemini-1.5-flash")?,
                guidance_model: load(&lookup, "KATA_GUIDANCE_MODEL", "gemini-1.5-pro")?,
                request_timeout_ms: load(&lookup, "KATA_GEMINI_TIMEOUT_MS", "60000")?,
            },
            evaluation: EvaluationConfig {
                max_parallel_tests,
                submission_timeout_ms: load(&lookup, "KATA_SUBMISSION_TIMEOUT_MS", "30000")?,
            },
        })
    }
}

fn load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })
}
