mod daily;
mod error;
mod evaluator;
mod executor;
mod genai;
mod guidance;
mod handlers;
mod judge;
mod metrics;
mod routes;
#[cfg(test)]
mod testing;

use anyhow::Context;
use axum::Router;
use kata_common::config::{Config, StorageBackend};
use kata_common::redis::RedisQuestionRepository;
use kata_common::repository::{InMemoryQuestionRepository, QuestionRepository};
use redis::aio::ConnectionManager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::daily::DailyChallengeCache;
use crate::executor::SubmissionExecutor;
use crate::genai::{GeminiClient, GenerativeModel};
use crate::guidance::GuidanceService;
use crate::judge::{Judge, Judge0Client};

pub struct AppState {
    pub repo: Arc<dyn QuestionRepository>,
    pub executor: SubmissionExecutor,
    pub daily: DailyChallengeCache,
    pub guidance: GuidanceService,
}

impl AppState {
    pub fn new(
        config: &Config,
        repo: Arc<dyn QuestionRepository>,
        judge: Arc<dyn Judge>,
        model: Arc<dyn GenerativeModel>,
    ) -> Self {
        Self {
            executor: SubmissionExecutor::new(judge, &config.evaluation, &config.judge),
            daily: DailyChallengeCache::new(repo.clone(), model.clone()),
            guidance: GuidanceService::new(model),
            repo,
        }
    }
}

async fn connect_storage(config: &Config) -> anyhow::Result<Arc<dyn QuestionRepository>> {
    match config.storage {
        StorageBackend::Redis => {
            let client = redis::Client::open(config.redis_url.as_str())
                .context("Failed to create Redis client")?;
            let conn = ConnectionManager::new(client)
                .await
                .context("Failed to connect to Redis")?;
            info!("Connected to Redis: {}", config.redis_url);
            Ok(Arc::new(RedisQuestionRepository::new(conn)))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; questions are lost on restart");
            Ok(Arc::new(InMemoryQuestionRepository::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining connections");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Kata API booting...");

    let config = Config::from_env().context("Invalid configuration")?;

    let repo = connect_storage(&config).await?;
    let judge = Arc::new(Judge0Client::new(&config.judge).context("Failed to build Judge0 client")?);
    info!("Judge0 endpoint: {}", config.judge.base_url);

    if config.gemini.api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set; daily challenges fail and guidance falls back");
    }
    let model = Arc::new(GeminiClient::new(&config.gemini));

    let state = Arc::new(AppState::new(&config, repo, judge, model));

    // Build router
    let app = Router::new().merge(routes::routes()).with_state(state);

    // Start server
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Kata API stopped");
    Ok(())
}
