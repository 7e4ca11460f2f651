// Post-failure remediation guidance.
// Best effort: any upstream problem degrades to FALLBACK_GUIDANCE, never to an error.

use crate::genai::GenerativeModel;
use crate::metrics;
use kata_common::types::Question;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const FALLBACK_GUIDANCE: &str = "AI guidance is unavailable right now. \
Compare your output with the expected output for each failed case, \
re-read the constraints in the problem statement, and test edge cases \
such as empty input and boundary values.";

#[derive(Debug, Clone)]
pub struct Guidance {
    pub guidance: String,
    pub topic: String,
    pub concepts: Vec<String>,
}

pub struct GuidanceService {
    model: Arc<dyn GenerativeModel>,
}

fn build_prompt(
    question: &Question,
    code: &str,
    language: &str,
    failed: &[serde_json::Value],
) -> String {
    let failed_json = serde_json::to_string_pretty(failed).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Student failed solving this problem:\n\n\
         Title: {}\n\
         Description: {}\n\n\
         Code ({}):\n{}\n\n\
         Failed test cases: {}\n\n\
         Explain mistakes, core concepts, step-by-step fix, and give learning roadmap.",
        question.title, question.description, language, code, failed_json
    )
}

impl GuidanceService {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    #[instrument(skip_all, fields(question_id = %question.id, language = %language, failed = failed.len()))]
    pub async fn guide(
        &self,
        question: &Question,
        code: &str,
        language: &str,
        failed: &[serde_json::Value],
    ) -> Guidance {
        let prompt = build_prompt(question, code, language, failed);

        let guidance = match self.model.generate_guidance(&prompt).await {
            Ok(text) => {
                info!(chars = text.len(), "Guidance generated");
                text
            }
            Err(e) => {
                metrics::GUIDANCE_FALLBACKS.inc();
                warn!(error = %e, "Guidance unavailable, using fallback");
                FALLBACK_GUIDANCE.to_string()
            }
        };

        Guidance {
            guidance,
            topic: question.topic.clone(),
            concepts: question.concepts.clone(),
        }
    }
}
