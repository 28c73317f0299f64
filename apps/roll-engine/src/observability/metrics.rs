//! Prometheus metrics for the roll engine.
//!
//! Recording goes through the `metrics` facade and is a no-op until
//! [`init_metrics`] installs the exporter.
//!
//! # Example
//!
//! ```ignore
//! use roll_engine::observability::{init_metrics, MetricsConfig};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config)?;
//!
//! record_pipeline_run("success", 0.42);
//! ```

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for pipeline durations (in seconds).
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 9090),
            // 1ms to 1 minute
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0, 60.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Create a metrics configuration with a custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.duration_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Pipeline Metrics
// ============================================================================

/// Record one instrument pipeline run.
///
/// # Arguments
///
/// * `status` - Outcome (e.g., "success", "insufficient_overlap", "not_found")
/// * `duration_seconds` - Wall time of the run
pub fn record_pipeline_run(status: &str, duration_seconds: f64) {
    counter!(
        "roll_engine_pipeline_runs_total",
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("roll_engine_pipeline_duration_seconds").record(duration_seconds);
}

/// Update the number of roll entries in an instrument's calendar.
pub fn update_roll_entries(instrument: &str, entries: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!(
        "roll_engine_roll_entries",
        "instrument" => instrument.to_string()
    )
    .set(entries as f64);
}

/// Record one validation finding.
///
/// # Arguments
///
/// * `severity` - "warning" or "error"
/// * `code` - Finding code (e.g., "DATA_GAP")
pub fn record_validation_finding(severity: &str, code: &str) {
    counter!(
        "roll_engine_validation_findings_total",
        "severity" => severity.to_string(),
        "code" => code.to_string()
    )
    .increment(1);
}
