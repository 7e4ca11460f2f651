// Prometheus metrics for the evaluation and daily-challenge pipeline

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    pub static ref SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "kata_submissions_total",
        "Evaluated submissions by language and outcome",
        &["language", "outcome"]
    )
    .expect("kata_submissions_total can be registered");

    pub static ref JUDGE_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "kata_judge_calls_total",
        "Judge calls by outcome (ok, error, timeout)",
        &["outcome"]
    )
    .expect("kata_judge_calls_total can be registered");

    pub static ref EVALUATION_SECONDS: HistogramVec = register_histogram_vec!(
        "kata_evaluation_seconds",
        "Wall-clock time to evaluate one submission",
        &["language"],
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("kata_evaluation_seconds can be registered");

    pub static ref DAILY_CHALLENGE_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "kata_daily_challenge_requests_total",
        "Daily challenge lookups by source (cache, generated, race)",
        &["source"]
    )
    .expect("kata_daily_challenge_requests_total can be registered");

    pub static ref GENERATION_FAILURES: IntCounter = register_int_counter!(
        "kata_generation_failures_total",
        "Daily challenge generations that failed upstream or did not parse"
    )
    .expect("kata_generation_failures_total can be registered");

    pub static ref GUIDANCE_FALLBACKS: IntCounter = register_int_counter!(
        "kata_guidance_fallbacks_total",
        "Guidance requests answered with the fallback text"
    )
    .expect("kata_guidance_fallbacks_total can be registered");
}

/// Render every registered metric in the Prometheus text format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_touched_metrics() {
        JUDGE_CALLS_TOTAL.with_label_values(&["ok"]).inc();
        GUIDANCE_FALLBACKS.inc();

        let text = render();
        assert!(text.contains("kata_judge_calls_total"));
        assert!(text.contains("kata_guidance_fallbacks_total"));
    }
}
