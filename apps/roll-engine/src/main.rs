//! Roll Engine Binary
//!
//! Runs one update cycle over every configured instrument: load contract
//! history, build calendars and price series, write the artifacts.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin roll-engine
//! ```
//!
//! # Environment Variables
//!
//! - `ROLL_ENGINE_CONFIG`: Config file path (default: config.yaml)
//! - `RUST_LOG`: Log filter (default: roll_engine=info)

use std::sync::Arc;

use anyhow::{Context, bail};
use roll_engine::application::use_cases::{
    InstrumentPipeline, UpdateInstrumentsUseCase, UpdateSummary,
};
use roll_engine::batch::BatchRunner;
use roll_engine::config::{Config, load_config, load_dotenv};
use roll_engine::infrastructure::persistence::JsonFileStore;
use roll_engine::observability::init_metrics;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    init_tracing();

    tracing::info!("Starting roll engine");

    let config = load_config(None).context("loading configuration")?;
    log_config(&config);

    if config.metrics.enabled {
        let metrics = config.metrics.exporter_config()?;
        init_metrics(&metrics).context("starting metrics exporter")?;
    }

    let specs = config.instrument_specs()?;
    if specs.is_empty() {
        tracing::warn!("No instruments configured, nothing to do");
        return Ok(());
    }

    let store = Arc::new(JsonFileStore::new(
        &config.storage.contracts_dir,
        &config.storage.output_dir,
    ));
    let use_case = UpdateInstrumentsUseCase::new(
        Arc::clone(&store),
        store,
        InstrumentPipeline::new(&config.pipeline.settings(&config.validation)),
        BatchRunner::new(config.batch.clone()),
    );

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let summary = use_case.execute(&specs, &cancel).await?;
    log_summary(&summary);

    if summary.has_failures() {
        bail!("{} instrument(s) failed", summary.failed.len());
    }

    tracing::info!("Roll engine finished");
    Ok(())
}

/// Initialize the tracing subscriber with environment filter.
///
/// Uses a static directive string that is a compile-time constant guaranteed to parse.
#[allow(clippy::expect_used)]
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "roll_engine=info"
                    .parse()
                    .expect("static directive 'roll_engine=info' is valid"),
            ),
        )
        .init();
}

fn log_config(config: &Config) {
    tracing::info!(
        contracts_dir = %config.storage.contracts_dir,
        output_dir = %config.storage.output_dir,
        adjustment_method = %config.pipeline.adjustment_method,
        search_window_days = config.pipeline.roll_search_window_days,
        instruments = config.instruments.len(),
        max_threads = config.batch.max_threads,
        metrics_enabled = config.metrics.enabled,
        "Configuration loaded"
    );
}

fn log_summary(summary: &UpdateSummary) {
    for failure in &summary.failed {
        tracing::error!(
            instrument = %failure.instrument,
            stage = ?failure.stage,
            error = %failure.message,
            "Instrument not updated"
        );
    }
    if !summary.cancelled.is_empty() {
        tracing::warn!(
            cancelled = summary.cancelled.len(),
            "Update cancelled before all instruments were written"
        );
    }
    tracing::info!(
        written = summary.written.len(),
        failed = summary.failed.len(),
        cancelled = summary.cancelled.len(),
        "Update summary"
    );
}

/// Cancel the update cycle on Ctrl+C.
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C, finishing current step and stopping");
            cancel.cancel();
        }
        Err(e) => tracing::warn!(error = %e, "Could not install Ctrl+C handler"),
    }
}
