// HTTP route handlers for the Kata API

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use kata_common::types::{
    Evaluation, Question, QuestionLanguage, QuestionSummary, MAX_LEVEL, MIN_LEVEL,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::daily;
use crate::error::{ApiError, ApiJson};
use crate::metrics;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct QuestionListResponse {
    pub success: bool,
    pub questions: Vec<QuestionSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub success: bool,
    pub question: Question,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallengeResponse {
    pub success: bool,
    pub question: Question,
    pub is_from_cache: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub question_id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceRequest {
    #[serde(default)]
    pub question_id: String,
    #[serde(default)]
    pub user_code: String,
    #[serde(default)]
    pub language: String,
    /// Echoed into the prompt as-is, any shape accepted
    #[serde(default)]
    pub failed_test_cases: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct GuidanceResponse {
    pub success: bool,
    pub guidance: String,
    pub topic: String,
    pub concepts: Vec<String>,
}

async fn load_question(state: &AppState, question_id: &str) -> Result<Question, ApiError> {
    let id = Uuid::parse_str(question_id.trim())
        .map_err(|_| ApiError::Validation("Invalid question ID format".to_string()))?;

    state
        .repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))
}

/// GET /api/questions/:language/:level - List questions without test cases
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Path((language, level)): Path<(String, String)>,
) -> Result<Json<QuestionListResponse>, ApiError> {
    let language = QuestionLanguage::from_key(&language)
        .ok_or_else(|| ApiError::Validation(format!("Unsupported language: {}", language)))?;
    let level: u8 = level
        .parse()
        .ok()
        .filter(|l| (MIN_LEVEL..=MAX_LEVEL).contains(l))
        .ok_or_else(|| {
            ApiError::Validation(format!("Level must be between {} and {}", MIN_LEVEL, MAX_LEVEL))
        })?;

    let questions = state.repo.find_by_language_and_level(language, level).await?;
    info!(language = %language, level, count = questions.len(), "Questions listed");

    Ok(Json(QuestionListResponse {
        success: true,
        count: questions.len(),
        questions,
    }))
}

/// GET /api/questions/single/:id - Fetch one question with test cases
pub async fn get_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = load_question(&state, &id).await?;
    Ok(Json(QuestionResponse {
        success: true,
        question,
    }))
}

/// GET /api/questions/daily-challenge - Today's challenge, generated on first request
pub async fn daily_challenge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DailyChallengeResponse>, ApiError> {
    let challenge = state.daily.get_or_create(&daily::today()).await?;
    Ok(Json(DailyChallengeResponse {
        success: true,
        question: challenge.question,
        is_from_cache: challenge.from_cache,
    }))
}

/// POST /api/questions/submit-solution - Judge a solution against every test case
pub async fn submit_solution(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    if payload.question_id.trim().is_empty()
        || payload.code.trim().is_empty()
        || payload.language.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "questionId, code and language are required".to_string(),
        ));
    }

    let question = load_question(&state, &payload.question_id).await?;
    let evaluation = state
        .executor
        .evaluate(&question, &payload.code, &payload.language)
        .await?;

    Ok(Json(SubmitResponse {
        success: true,
        evaluation,
    }))
}

/// POST /api/questions/ai-guidance - Remediation after a failed submission
pub async fn ai_guidance(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<GuidanceRequest>,
) -> Result<Json<GuidanceResponse>, ApiError> {
    if payload.question_id.trim().is_empty() {
        return Err(ApiError::Validation("questionId is required".to_string()));
    }

    let question = load_question(&state, &payload.question_id).await?;
    let guidance = state
        .guidance
        .guide(
            &question,
            &payload.user_code,
            &payload.language,
            &payload.failed_test_cases,
        )
        .await;

    Ok(Json(GuidanceResponse {
        success: true,
        guidance: guidance.guidance,
        topic: guidance.topic,
        concepts: guidance.concepts,
    }))
}

/// GET /health - Liveness probe
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus exposition
pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}
