//! In-process doubles for the judge and the generative model.

use crate::genai::{GenAiError, GenerativeModel};
use crate::judge::{Judge, JudgeError, JudgeRequest, JudgeResponse};
use async_trait::async_trait;
use kata_common::config::{EvaluationConfig, JudgeConfig};
use kata_common::types::{Difficulty, Question, QuestionDraft, QuestionLanguage, TestCase};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// "Runs" a submission by interpreting its source as a tiny command:
/// `reverse` reverses a JSON array read from stdin, anything else echoes stdin.
#[derive(Default)]
pub struct ScriptedJudge {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delays: HashMap<String, Duration>,
    failures: Vec<String>,
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay the reply for a given stdin
    pub fn with_delay(mut self, stdin: &str, delay: Duration) -> Self {
        self.delays.insert(stdin.to_string(), delay);
        self
    }

    /// Fail the call for a given stdin with a transport error
    pub fn with_failure(mut self, stdin: &str) -> Self {
        self.failures.push(stdin.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn run(source: &str, stdin: &str) -> String {
        if source.contains("reverse") {
            match serde_json::from_str::<Vec<serde_json::Value>>(stdin) {
                Ok(mut items) => {
                    items.reverse();
                    format!("{}\n", serde_json::to_string(&items).unwrap_or_default())
                }
                Err(_) => String::new(),
            }
        } else {
            stdin.to_string()
        }
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn execute(&self, request: &JudgeRequest<'_>) -> Result<JudgeResponse, JudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(request.stdin) {
            tokio::time::sleep(*delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failures.iter().any(|s| s == request.stdin) {
            return Err(JudgeError::Transport("connection reset".to_string()));
        }

        Ok(JudgeResponse {
            stdout: Some(Self::run(request.source_code, request.stdin)),
            stderr: None,
            status_description: Some("Accepted".to_string()),
        })
    }
}

/// Generative model returning canned text and recording prompts
pub struct FakeModel {
    challenge: Result<String, String>,
    guidance: Result<String, String>,
    delay: Duration,
    challenge_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn new() -> Self {
        Self {
            challenge: Ok(challenge_json()),
            guidance: Ok("Walk the array from both ends.".to_string()),
            delay: Duration::ZERO,
            challenge_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_challenge(mut self, text: &str) -> Self {
        self.challenge = Ok(text.to_string());
        self
    }

    pub fn with_challenge_error(mut self) -> Self {
        self.challenge = Err("unreachable".to_string());
        self
    }

    pub fn with_guidance_error(mut self) -> Self {
        self.guidance = Err("unreachable".to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn challenge_calls(&self) -> usize {
        self.challenge_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn record(&self, prompt: &str) {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
    }
}

fn canned(reply: &Result<String, String>) -> Result<String, GenAiError> {
    match reply {
        Ok(text) => Ok(text.clone()),
        Err(_) => Err(GenAiError::EmptyResponse),
    }
}

#[async_trait]
impl GenerativeModel for FakeModel {
    async fn generate_challenge(&self, prompt: &str) -> Result<String, GenAiError> {
        self.challenge_calls.fetch_add(1, Ordering::SeqCst);
        self.record(prompt);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        canned(&self.challenge)
    }

    async fn generate_guidance(&self, prompt: &str) -> Result<String, GenAiError> {
        self.record(prompt);
        canned(&self.guidance)
    }
}

pub fn challenge_json() -> String {
    serde_json::json!({
        "title": "Rotate Array",
        "description": "Rotate the array right by one.",
        "difficulty": "medium",
        "topic": "Arrays",
        "sampleInput": "[1,2,3]",
        "sampleOutput": "[3,1,2]",
        "concepts": ["Arrays", "Modular arithmetic"],
        "starterCode": {
            "python": "def solution():\n    pass",
            "java": "public class Solution { }",
            "cpp": "class Solution { };"
        },
        "testCases": [
            { "input": "[1,2,3]", "expectedOutput": "[3,1,2]" },
            { "input": "[4]", "expectedOutput": "[4]" }
        ]
    })
    .to_string()
}

pub fn reverse_question() -> Question {
    QuestionDraft {
        language: QuestionLanguage::Python,
        level: 1,
        difficulty: Difficulty::Easy,
        title: "Reverse an Array".to_string(),
        description: "Write a function to reverse an array in-place.".to_string(),
        sample_input: Some("[1,2,3]".to_string()),
        sample_output: Some("[3,2,1]".to_string()),
        test_cases: vec![
            TestCase {
                input: "[1,2,3]".to_string(),
                expected_output: "[3,2,1]".to_string(),
            },
            TestCase {
                input: "[10,20]".to_string(),
                expected_output: "[20,10]".to_string(),
            },
        ],
        topic: "Arrays".to_string(),
        concepts: vec!["Two pointers".to_string()],
        starter_code: BTreeMap::new(),
    }
    .into_question()
}

pub fn question_with_cases(cases: &[(&str, &str)]) -> Question {
    let mut question = reverse_question();
    question.test_cases = cases
        .iter()
        .map(|(input, expected)| TestCase {
            input: input.to_string(),
            expected_output: expected.to_string(),
        })
        .collect();
    question
}

pub fn evaluation_config(max_parallel_tests: usize, submission_timeout_ms: u64) -> EvaluationConfig {
    EvaluationConfig {
        max_parallel_tests,
        submission_timeout_ms,
    }
}

pub fn judge_config(request_timeout_ms: u64) -> JudgeConfig {
    JudgeConfig {
        base_url: "http://judge.invalid".to_string(),
        request_timeout_ms,
    }
}
