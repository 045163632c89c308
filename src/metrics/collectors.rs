//! Metric recording for debate stages.
//!
//! `MetricsCollector` wraps the raw Prometheus metrics with consistent
//! labels. Every method is a no-op until `init_metrics()` has run.

use super::prometheus::{
    CASES_STARTED_TOTAL, LLM_COST_DOLLARS, LLM_TOKENS_TOTAL, STAGE_DURATION, STAGE_RUNS_TOTAL,
};

/// Metrics collector for recording jury operational metrics.
///
/// # Example
///
/// ```ignore
/// use jury::metrics::{MetricsCollector, init_metrics};
///
/// init_metrics().expect("Failed to init metrics");
/// let collector = MetricsCollector::new();
/// collector.record_stage("Proposer", "nvidia/nemotron", true, 12.5, 1800, 0.0036);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    /// Create a new MetricsCollector instance.
    pub fn new() -> Self {
        Self
    }

    /// Record one stage run.
    ///
    /// Tokens and cost are only counted for successful runs.
    pub fn record_stage(
        &self,
        stage: &str,
        model: &str,
        success: bool,
        duration_secs: f64,
        tokens: u64,
        cost: f64,
    ) {
        let status = if success { "success" } else { "failure" };

        if let Some(runs) = STAGE_RUNS_TOTAL.get() {
            runs.with_label_values(&[stage, status]).inc();
        }

        if let Some(duration) = STAGE_DURATION.get() {
            duration.with_label_values(&[stage]).observe(duration_secs);
        }

        if success {
            if let Some(llm_tokens) = LLM_TOKENS_TOTAL.get() {
                llm_tokens.with_label_values(&[model]).inc_by(tokens as f64);
            }
            if let Some(llm_cost) = LLM_COST_DOLLARS.get() {
                llm_cost.with_label_values(&[model]).inc_by(cost.max(0.0));
            }
        }

        tracing::trace!(
            stage = stage,
            model = model,
            status = status,
            duration_secs = duration_secs,
            tokens = tokens,
            cost = cost,
            "Recorded stage metric"
        );
    }

    /// Record a `start_case` call; `reused` when an existing verdict was returned.
    pub fn record_case_started(&self, reused: bool) {
        let outcome = if reused { "reused" } else { "created" };
        if let Some(started) = CASES_STARTED_TOTAL.get() {
            started.with_label_values(&[outcome]).inc();
        }
    }
}
