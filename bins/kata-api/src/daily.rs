//! Daily challenge cache.
//!
//! One AI-generated question per calendar date, created on the first request
//! of the day and served from storage afterwards. Concurrent first requests
//! may all generate, but only one insert wins: the repository rejects the
//! others with a conflict and they return the winner's record instead.

use crate::genai::{strip_code_fences, GenerativeModel};
use crate::metrics;
use chrono::Utc;
use kata_common::repository::{QuestionRepository, RepositoryError};
use kata_common::types::{Difficulty, Language, Question, QuestionLanguage, TestCase};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Level assigned to every generated daily challenge
pub const DAILY_CHALLENGE_LEVEL: u8 = 3;

const CHALLENGE_PROMPT: &str = r#"Generate a coding problem in valid JSON (no markdown, no explanation).
Use exactly this shape. "difficulty" must be one of easy, medium, hard, very-hard, expert.
Every test case input is fed to the program on stdin; expectedOutput is the exact stdout.
{
  "title": "Problem Title",
  "description": "Problem description",
  "difficulty": "medium",
  "topic": "Arrays/Strings/etc",
  "sampleInput": "Example input",
  "sampleOutput": "Example output",
  "concepts": ["concept1","concept2"],
  "starterCode": {
    "python": "def solution():\n    pass",
    "java": "public class Solution { }",
    "cpp": "class Solution { };"
  },
  "testCases": [
    {"input": "test1", "expectedOutput": "output1"}
  ]
}"#;

#[derive(Debug, Error)]
pub enum DailyError {
    #[error("challenge generation failed: {0}")]
    Generation(String),

    #[error("daily challenge for {0} missing after a conflicting insert")]
    Inconsistent(String),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

#[derive(Debug, Clone)]
pub struct DailyChallenge {
    pub question: Question,
    pub from_cache: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedChallenge {
    title: String,
    description: String,
    difficulty: Difficulty,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    sample_input: Option<String>,
    #[serde(default)]
    sample_output: Option<String>,
    #[serde(default)]
    concepts: Vec<String>,
    #[serde(default)]
    starter_code: BTreeMap<String, String>,
    test_cases: Vec<TestCase>,
}

/// Current calendar date (UTC) in `YYYY-MM-DD` form
pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Parse model output into a daily question for `date`
fn parse_challenge(raw: &str, date: &str) -> Result<Question, String> {
    let cleaned = strip_code_fences(raw);
    let generated: GeneratedChallenge =
        serde_json::from_str(&cleaned).map_err(|e| format!("AI response invalid JSON: {}", e))?;

    if generated.title.trim().is_empty() {
        return Err("AI response has an empty title".to_string());
    }
    if generated.test_cases.is_empty() {
        return Err("AI response has no test cases".to_string());
    }

    let starter_code = generated
        .starter_code
        .into_iter()
        .filter_map(|(key, code)| Language::from_key(&key).map(|lang| (lang, code)))
        .collect();

    Ok(Question {
        id: Uuid::new_v4(),
        language: QuestionLanguage::All,
        level: DAILY_CHALLENGE_LEVEL,
        difficulty: generated.difficulty,
        title: generated.title,
        description: generated.description,
        sample_input: generated.sample_input,
        sample_output: generated.sample_output,
        test_cases: generated.test_cases,
        topic: generated.topic,
        concepts: generated.concepts,
        starter_code,
        is_daily_challenge: true,
        challenge_date: Some(date.to_string()),
        created_at: Utc::now(),
    })
}

pub struct DailyChallengeCache {
    repo: Arc<dyn QuestionRepository>,
    model: Arc<dyn GenerativeModel>,
}

impl DailyChallengeCache {
    pub fn new(repo: Arc<dyn QuestionRepository>, model: Arc<dyn GenerativeModel>) -> Self {
        Self { repo, model }
    }

    #[instrument(skip(self))]
    pub async fn get_or_create(&self, date: &str) -> Result<DailyChallenge, DailyError> {
        if let Some(question) = self.repo.find_daily_by_date(date).await? {
            metrics::DAILY_CHALLENGE_REQUESTS
                .with_label_values(&["cache"])
                .inc();
            return Ok(DailyChallenge {
                question,
                from_cache: true,
            });
        }

        info!("No daily challenge cached, generating");
        let raw = self
            .model
            .generate_challenge(CHALLENGE_PROMPT)
            .await
            .map_err(|e| {
                metrics::GENERATION_FAILURES.inc();
                warn!(error = %e, "Daily challenge generation failed");
                DailyError::Generation(e.to_string())
            })?;

        let question = parse_challenge(&raw, date).map_err(|reason| {
            metrics::GENERATION_FAILURES.inc();
            warn!(reason = %reason, raw_len = raw.len(), "Generated challenge rejected");
            DailyError::Generation(reason)
        })?;

        match self.repo.insert_daily(&question).await {
            Ok(()) => {
                metrics::DAILY_CHALLENGE_REQUESTS
                    .with_label_values(&["generated"])
                    .inc();
                info!(question_id = %question.id, title = %question.title, "Daily challenge stored");
                Ok(DailyChallenge {
                    question,
                    from_cache: false,
                })
            }
            Err(RepositoryError::Conflict { .. }) => {
                metrics::DAILY_CHALLENGE_REQUESTS
                    .with_label_values(&["race"])
                    .inc();
                info!(discarded = %question.id, "Lost daily challenge race, re-reading winner");
                let question = self
                    .repo
                    .find_daily_by_date(date)
                    .await?
                    .ok_or_else(|| DailyError::Inconsistent(date.to_string()))?;
                Ok(DailyChallenge {
                    question,
                    from_cache: true,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
