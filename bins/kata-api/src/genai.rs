// Generative AI client
// Two call shapes: structured challenge generation and free-text guidance.

use async_trait::async_trait;
use kata_common::config::GeminiConfig;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("generative AI API key is not configured")]
    MissingApiKey,

    #[error("generative AI request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generative AI returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generative AI response missing text")]
    EmptyResponse,
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Prompt expected to yield one JSON document (possibly fenced)
    async fn generate_challenge(&self, prompt: &str) -> Result<String, GenAiError>;

    /// Prompt answered in free text
    async fn generate_guidance(&self, prompt: &str) -> Result<String, GenAiError>;
}

/// Remove markdown code fences (```json / ```) that models like to wrap JSON in.
pub fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        if rest.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
            rest = &rest[4..];
        }
    }
    out.push_str(rest);

    out.trim().to_string()
}

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    generation_model: String,
    guidance_model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            generation_model: config.generation_model.clone(),
            guidance_model: config.guidance_model.clone(),
            timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenAiError> {
        if self.api_key.is_empty() {
            return Err(GenAiError::MissingApiKey);
        }

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenAiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = resp.json().await?;
        let text = json
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .filter(|t| !t.trim().is_empty())
            .ok_or(GenAiError::EmptyResponse)?;

        debug!(model, chars = text.len(), "Generative call completed");
        Ok(text.to_string())
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_challenge(&self, prompt: &str) -> Result<String, GenAiError> {
        self.generate(&self.generation_model, prompt).await
    }

    async fn generate_guidance(&self, prompt: &str) -> Result<String, GenAiError> {
        self.generate(&self.guidance_model, prompt).await
    }
}
