//! Metrics module for Prometheus-based monitoring.
//!
//! Records debate stage runs, latency, token usage and cost.
//!
//! # Example
//!
//! ```ignore
//! use jury::metrics::{init_metrics, export_metrics, MetricsCollector};
//!
//! init_metrics().expect("Failed to initialize metrics");
//! let collector = MetricsCollector::new();
//! collector.record_stage("Judge", "meta-llama/llama-3.1-405b-instruct:free", true, 8.1, 2400, 0.0048);
//! let metrics_text = export_metrics();
//! ```

pub mod collectors;
pub mod prometheus;

pub use collectors::MetricsCollector;
pub use prometheus::{export_metrics, init_metrics};

pub use prometheus::{
    CASES_STARTED_TOTAL, LLM_COST_DOLLARS, LLM_TOKENS_TOTAL, REGISTRY, STAGE_DURATION,
    STAGE_RUNS_TOTAL,
};
