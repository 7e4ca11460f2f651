/// Test Evaluator - Language-Agnostic Scoring Logic
///
/// **Core Responsibility:**
/// Compare raw judge outputs against expected outputs and decide pass/fail.
///
/// **Critical Properties:**
/// - Knows nothing about HTTP or the judge wire format
/// - Knows nothing about language runtimes
/// - Pure functions: (judge outputs, expected outputs) → results
///
/// **Comparison Rules (Applied to All Languages):**
/// - Trim leading/trailing whitespace on both sides: YES
/// - Internal whitespace: preserved, must match exactly
/// - Case sensitivity: YES
/// - Numeric tolerance: NO
/// - stderr and judge status: reported, not judged
/// - Missing stdout: never passes

use crate::judge::JudgeResponse;
use kata_common::types::{Evaluation, TestCase, TestResult};

/// Error marker for a judge call that failed outright
pub const EXECUTION_FAILED: &str = "Execution failed";

/// Error marker for a test case still pending when the submission deadline hit
pub const EXECUTION_TIMED_OUT: &str = "Execution timed out";

fn normalize_output(output: &str) -> &str {
    output.trim()
}

/// Trim-only equality between judge stdout and the expected output
pub fn outputs_match(actual: Option<&str>, expected: &str) -> bool {
    actual.is_some_and(|out| normalize_output(out) == normalize_output(expected))
}

/// Turn one judge reply into a test result
pub fn evaluate_test(test_case: &TestCase, response: JudgeResponse) -> TestResult {
    let passed = outputs_match(response.stdout.as_deref(), &test_case.expected_output);

    TestResult {
        input: test_case.input.clone(),
        expected: test_case.expected_output.clone(),
        actual: response.stdout,
        passed,
        error: response.stderr.filter(|e| !e.is_empty()),
        status_description: response.status_description,
    }
}

/// A test case that never produced output
pub fn failed_test(test_case: &TestCase, marker: &str) -> TestResult {
    TestResult {
        input: test_case.input.clone(),
        expected: test_case.expected_output.clone(),
        actual: None,
        passed: false,
        error: Some(marker.to_string()),
        status_description: None,
    }
}

/// Fold ordered results into the submission verdict
pub fn aggregate_results(results: Vec<TestResult>) -> Evaluation {
    let all_passed = results.iter().all(|r| r.passed);
    Evaluation {
        all_passed,
        results,
    }
}
