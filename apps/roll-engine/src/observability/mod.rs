//! Observability module for metrics.
//!
//! Structured logging goes through `tracing` directly; this module adds the
//! Prometheus exporter and the roll engine's metric names.

mod metrics;

pub use metrics::{
    MetricsConfig, MetricsError, init_metrics, record_pipeline_run, record_validation_finding,
    update_roll_entries,
};
