//! Prometheus metrics registration and export.
//!
//! This module defines all Prometheus metrics used by the jury and provides
//! functions for initializing, registering, and exporting metrics.

use prometheus::{CounterVec, Encoder, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::{Mutex, OnceLock};

/// Serializes initialization so every metric comes from the same call.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Global Prometheus registry for all jury metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Total stage runs, labeled by stage and status.
pub static STAGE_RUNS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Stage wall-clock duration in seconds, labeled by stage.
pub static STAGE_DURATION: OnceLock<HistogramVec> = OnceLock::new();

/// Total tokens used, labeled by model.
pub static LLM_TOKENS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Model costs in dollars, labeled by model.
pub static LLM_COST_DOLLARS: OnceLock<CounterVec> = OnceLock::new();

/// Cases started, labeled by outcome (created or reused).
pub static CASES_STARTED_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Initialize all metrics and register them with the registry.
///
/// Safe to call more than once and from several threads: the first call
/// registers everything, later calls return immediately.
///
/// # Errors
///
/// Returns a `prometheus::Error` if metric registration fails.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    // Stage metrics
    let stage_runs_total = CounterVec::new(
        Opts::new("jury_stage_runs_total", "Total debate stage runs"),
        &["stage", "status"],
    )?;

    let stage_duration = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "jury_stage_duration_seconds",
            "Debate stage duration in seconds",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["stage"],
    )?;

    // LLM metrics
    let llm_tokens_total = CounterVec::new(
        Opts::new("jury_llm_tokens_total", "Total tokens used"),
        &["model"],
    )?;

    let llm_cost_dollars = CounterVec::new(
        Opts::new("jury_llm_cost_dollars", "Estimated model cost in dollars"),
        &["model"],
    )?;

    // Case metrics
    let cases_started_total = CounterVec::new(
        Opts::new("jury_cases_started_total", "Cases started"),
        &["outcome"],
    )?;

    registry.register(Box::new(stage_runs_total.clone()))?;
    registry.register(Box::new(stage_duration.clone()))?;
    registry.register(Box::new(llm_tokens_total.clone()))?;
    registry.register(Box::new(llm_cost_dollars.clone()))?;
    registry.register(Box::new(cases_started_total.clone()))?;

    // Under INIT_LOCK with REGISTRY unset, none of these are set yet.
    // REGISTRY goes last: it marks initialization as complete.
    let _ = STAGE_RUNS_TOTAL.set(stage_runs_total);
    let _ = STAGE_DURATION.set(stage_duration);
    let _ = LLM_TOKENS_TOTAL.set(llm_tokens_total);
    let _ = LLM_COST_DOLLARS.set(llm_cost_dollars);
    let _ = CASES_STARTED_TOTAL.set(cases_started_total);
    let _ = REGISTRY.set(registry);

    tracing::debug!("Prometheus metrics initialized");

    Ok(())
}

/// Export all registered metrics in Prometheus text format.
///
/// Returns a comment line instead when metrics are not initialized or
/// encoding fails.
pub fn export_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return "# Metrics not initialized. Call init_metrics() first.\n".to_string();
    };

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}\n", e);
    }

    String::from_utf8(buffer)
        .unwrap_or_else(|e| format!("# Error converting metrics to UTF-8: {}\n", e))
}
