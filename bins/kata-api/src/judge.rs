/// Judge Client - Adapter to the External Code-Execution Service
///
/// **Core Responsibility:**
/// Run one piece of source code against one stdin and return raw outputs.
///
/// **Critical Architectural Boundary:**
/// - Knows HOW to reach the judge (HTTP, Judge0 wire format)
/// - Does NOT decide pass/fail (evaluator's job)
/// - Does NOT fan out over test cases (executor's job)
/// - Every failure comes back as a `JudgeError` value, never a panic,
///   so one broken call cannot take sibling calls down with it
///
/// **Wire format (Judge0, synchronous mode):**
/// `POST {base}/submissions?base64_encoded=false&wait=true`
/// request  `{source_code, language_id, stdin, expected_output}`
/// response `{stdout, stderr, status: {description}}` (all nullable)

use async_trait::async_trait;
use kata_common::config::JudgeConfig;
use kata_common::types::Language;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// One judge call: a program, a runtime and a single stdin
#[derive(Debug, Clone)]
pub struct JudgeRequest<'a> {
    pub source_code: &'a str,
    pub language: Language,
    pub stdin: &'a str,
    pub expected_output: &'a str,
    pub timeout: Duration,
}

/// Raw judge outputs; the judge's own verdict is only carried as text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgeResponse {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub status_description: Option<String>,
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("judge request timed out")]
    Timeout,

    #[error("judge transport error: {0}")]
    Transport(String),

    #[error("judge returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("judge response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for JudgeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            JudgeError::Timeout
        } else if e.is_decode() {
            JudgeError::Decode(e.to_string())
        } else {
            JudgeError::Transport(e.to_string())
        }
    }
}

#[async_trait]
pub trait Judge: Send + Sync {
    async fn execute(&self, request: &JudgeRequest<'_>) -> Result<JudgeResponse, JudgeError>;
}

#[derive(Debug, Serialize)]
struct SubmissionBody<'a> {
    source_code: &'a str,
    language_id: u32,
    stdin: &'a str,
    expected_output: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmissionReply {
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    status: Option<StatusReply>,
}

#[derive(Debug, Deserialize)]
struct StatusReply {
    #[serde(default)]
    description: Option<String>,
}

/// HTTP client for a Judge0-compatible service
pub struct Judge0Client {
    client: reqwest::Client,
    base_url: String,
}

impl Judge0Client {
    pub fn new(config: &JudgeConfig) -> Result<Self, JudgeError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| JudgeError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn submissions_url(&self) -> String {
        format!("{}/submissions?base64_encoded=false&wait=true", self.base_url)
    }
}

#[async_trait]
impl Judge for Judge0Client {
    async fn execute(&self, request: &JudgeRequest<'_>) -> Result<JudgeResponse, JudgeError> {
        let body = SubmissionBody {
            source_code: request.source_code,
            language_id: request.language.judge_id(),
            stdin: request.stdin,
            expected_output: request.expected_output,
        };

        let response = self
            .client
            .post(self.submissions_url())
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: SubmissionReply = response.json().await?;
        let status_description = reply.status.and_then(|s| s.description);
        debug!(
            language = %request.language,
            status = status_description.as_deref().unwrap_or("unknown"),
            "Judge call completed"
        );

        Ok(JudgeResponse {
            stdout: reply.stdout,
            stderr: reply.stderr,
            status_description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> Judge0Client {
        Judge0Client::new(&JudgeConfig {
            base_url: server.uri(),
            request_timeout_ms: 1000,
        })
        .expect("client")
    }

    fn request(timeout: Duration) -> JudgeRequest<'static> {
        JudgeRequest {
            source_code: "print(input()[::-1])",
            language: Language::Python,
            stdin: "abc",
            expected_output: "cba",
            timeout,
        }
    }

    #[tokio::test]
    async fn test_execute_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submissions"))
            .and(query_param("wait", "true"))
            .and(query_param("base64_encoded", "false"))
            .and(body_partial_json(serde_json::json!({
                "language_id": 71,
                "stdin": "abc",
                "expected_output": "cba"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "stdout": "cba\n",
                "stderr": null,
                "status": { "id": 3, "description": "Accepted" }
            })))
            .mount(&server)
            .await;

        let response = client_for(&server)
            .execute(&request(Duration::from_secs(1)))
            .await
            .unwrap();

        assert_eq!(response.stdout.as_deref(), Some("cba\n"));
        assert_eq!(response.stderr, None);
        assert_eq!(response.status_description.as_deref(), Some("Accepted"));
    }

    #[tokio::test]
    async fn test_execute_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submissions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .execute(&request(Duration::from_secs(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, JudgeError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_execute_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submissions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "stdout": "cba" }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .execute(&request(Duration::from_millis(50)))
            .await
            .unwrap_err();

        assert!(matches!(err, JudgeError::Timeout));
    }

    #[tokio::test]
    async fn test_execute_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submissions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let response = client_for(&server)
            .execute(&request(Duration::from_secs(1)))
            .await
            .unwrap();

        assert_eq!(response, JudgeResponse::default());
    }
}
