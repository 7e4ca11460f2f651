use crate::daily::DailyError;
use crate::executor::EvaluateError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use kata_common::repository::RepositoryError;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Generation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error("{0}")]
    Internal(String),
}

impl From<EvaluateError> for ApiError {
    fn from(e: EvaluateError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<DailyError> for ApiError {
    fn from(e: DailyError) -> Self {
        match e {
            DailyError::Generation(reason) => ApiError::Generation(format!("AI response invalid: {}", reason)),
            DailyError::Storage(e) => ApiError::Storage(e),
            DailyError::Inconsistent(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Generation(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (
            status,
            Json(serde_json::json!({
                "success": false,
                "message": self.to_string()
            })),
        )
            .into_response()
    }
}

/// `Json` extractor whose rejections use the `ApiError` envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(DailyError::Generation("bad json".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(EvaluateError::UnsupportedLanguage("rust".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(RepositoryError::Poisoned).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(DailyError::Inconsistent("2026-10-17".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[derive(Debug, serde::Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        name: String,
    }

    async fn extract(body: &'static str) -> Result<ApiJson<Payload>, ApiError> {
        let req = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        ApiJson::<Payload>::from_request(req, &()).await
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_envelope() {
        assert!(extract(r#"{"name":"ok"}"#).await.is_ok());

        for body in [r#"{"name":"#, r#"{"other":1}"#] {
            let err = match extract(body).await {
                Err(e) => e,
                Ok(_) => panic!("body {body} should be rejected"),
            };
            assert!(matches!(err, ApiError::Validation(_)));

            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(json["success"], false);
            assert!(json["message"].as_str().is_some_and(|m| !m.is_empty()));
        }
    }
}
