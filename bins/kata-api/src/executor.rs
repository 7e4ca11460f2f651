/// Submission Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Fan one submission out to the judge (one call per test case) and fold the
/// replies back into an ordered verdict.
///
/// **Architecture:**
/// 1. Validate the language against the closed `Language` set (no judge calls on failure)
/// 2. Dispatch test cases through a bounded concurrent stream
/// 3. Write each reply into the slot of its test case index, whatever the completion order
/// 4. Score with the evaluator (evaluator.rs)
///
/// **Failure isolation:**
/// - A failed or timed-out judge call becomes a failed `TestResult`, siblings keep running
/// - The whole submission is bounded by a deadline; slots still empty when it
///   expires are recorded as timed out, so `evaluate` always returns

use crate::evaluator::{
    aggregate_results, evaluate_test, failed_test, EXECUTION_FAILED, EXECUTION_TIMED_OUT,
};
use crate::judge::{Judge, JudgeError, JudgeRequest};
use crate::metrics;
use futures_util::stream::{self, StreamExt};
use kata_common::config::{EvaluationConfig, JudgeConfig};
use kata_common::types::{Evaluation, Language, Question, TestCase, TestResult};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Question {0} has no test cases")]
    NoTestCases(Uuid),
}

pub struct SubmissionExecutor {
    judge: Arc<dyn Judge>,
    max_parallel_tests: usize,
    judge_timeout: Duration,
    submission_timeout: Duration,
}

impl SubmissionExecutor {
    pub fn new(judge: Arc<dyn Judge>, evaluation: &EvaluationConfig, judge_config: &JudgeConfig) -> Self {
        Self {
            judge,
            max_parallel_tests: evaluation.max_parallel_tests.max(1),
            judge_timeout: Duration::from_millis(judge_config.request_timeout_ms),
            submission_timeout: Duration::from_millis(evaluation.submission_timeout_ms),
        }
    }

    /// Evaluate `code` against every test case of `question`
    #[instrument(skip(self, question, code), fields(question_id = %question.id))]
    pub async fn evaluate(
        &self,
        question: &Question,
        code: &str,
        language: &str,
    ) -> Result<Evaluation, EvaluateError> {
        let Some(language) = Language::from_key(language) else {
            metrics::SUBMISSIONS_TOTAL
                .with_label_values(&["unsupported", "rejected"])
                .inc();
            return Err(EvaluateError::UnsupportedLanguage(language.to_string()));
        };
        if question.test_cases.is_empty() {
            return Err(EvaluateError::NoTestCases(question.id));
        }

        info!(
            language = %language,
            test_cases = question.test_cases.len(),
            source_size = code.len(),
            "Evaluating submission"
        );

        let start = std::time::Instant::now();
        let results = self.run_test_cases(&question.test_cases, code, language).await;
        let evaluation = aggregate_results(results);
        let elapsed = start.elapsed();

        let outcome = if evaluation.all_passed { "passed" } else { "failed" };
        metrics::SUBMISSIONS_TOTAL
            .with_label_values(&[language.as_str(), outcome])
            .inc();
        metrics::EVALUATION_SECONDS
            .with_label_values(&[language.as_str()])
            .observe(elapsed.as_secs_f64());

        info!(
            language = %language,
            all_passed = evaluation.all_passed,
            passed = evaluation.results.iter().filter(|r| r.passed).count(),
            total = evaluation.results.len(),
            execution_ms = elapsed.as_millis() as u64,
            "Evaluation completed"
        );

        Ok(evaluation)
    }

    async fn run_test_cases(
        &self,
        test_cases: &[TestCase],
        code: &str,
        language: Language,
    ) -> Vec<TestResult> {
        let total = test_cases.len();
        let limit = self.max_parallel_tests.min(total).max(1);
        let deadline = Instant::now() + self.submission_timeout;
        let mut slots: Vec<Option<TestResult>> = vec![None; total];

        // Owned indices keep the stream future `Send` for axum handlers.
        let mut pending = stream::iter(0..total)
            .map(|index| async move {
                (index, self.run_test_case(index, &test_cases[index], code, language).await)
            })
            .buffer_unordered(limit);

        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((index, result))) => slots[index] = Some(result),
                Ok(None) => break,
                Err(_) => {
                    let finished = slots.iter().filter(|s| s.is_some()).count();
                    warn!(
                        finished,
                        total,
                        timeout_ms = self.submission_timeout.as_millis() as u64,
                        "Submission deadline reached; marking pending test cases as timed out"
                    );
                    break;
                }
            }
        }
        // Dropping the stream cancels any judge call still in flight.
        drop(pending);

        slots
            .into_iter()
            .zip(test_cases)
            .map(|(slot, test_case)| {
                slot.unwrap_or_else(|| failed_test(test_case, EXECUTION_TIMED_OUT))
            })
            .collect()
    }

    async fn run_test_case(
        &self,
        index: usize,
        test_case: &TestCase,
        code: &str,
        language: Language,
    ) -> TestResult {
        let request = JudgeRequest {
            source_code: code,
            language,
            stdin: &test_case.input,
            expected_output: &test_case.expected_output,
            timeout: self.judge_timeout,
        };

        let reply = match tokio::time::timeout(self.judge_timeout, self.judge.execute(&request)).await {
            Ok(reply) => reply,
            Err(_) => Err(JudgeError::Timeout),
        };

        match reply {
            Ok(response) => {
                metrics::JUDGE_CALLS_TOTAL.with_label_values(&["ok"]).inc();
                let result = evaluate_test(test_case, response);
                debug!(
                    test_num = index + 1,
                    passed = result.passed,
                    status = result.status_description.as_deref().unwrap_or("unknown"),
                    "Test result"
                );
                result
            }
            Err(e) => {
                let outcome = if matches!(e, JudgeError::Timeout) { "timeout" } else { "error" };
                metrics::JUDGE_CALLS_TOTAL.with_label_values(&[outcome]).inc();
                warn!(test_num = index + 1, error = %e, "Judge call failed");
                failed_test(test_case, EXECUTION_FAILED)
            }
        }
    }
}
