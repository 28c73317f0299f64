//! Update Instruments Use Case
//!
//! One update cycle: load every configured instrument through the repository
//! port, run the pipelines as a batch off the async runtime, then hand each
//! successful instrument to the sink.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::application::ports::{ContractPriceRepository, PriceArtifactSink};
use crate::batch::{BatchError, BatchRunner};
use crate::domain::roll_calendar::{RollCalendarEntry, RollParameters};
use crate::domain::shared::InstrumentCode;

use super::build_instrument::{InstrumentInput, InstrumentPipeline};

/// What to build for one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentSpec {
    /// Instrument code.
    pub instrument: InstrumentCode,
    /// Roll parameters.
    pub params: RollParameters,
    /// Manual calendar corrections.
    pub overrides: Vec<RollCalendarEntry>,
}

/// Stage at which an instrument failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Reading contract history.
    Load,
    /// Running the pipeline.
    Pipeline,
    /// Writing artifacts.
    Write,
}

/// One failed instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentFailure {
    /// Instrument code.
    pub instrument: InstrumentCode,
    /// Where it failed.
    pub stage: FailureStage,
    /// Error message.
    pub message: String,
}

/// Result of one update cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Instruments whose artifacts were written.
    pub written: Vec<InstrumentCode>,
    /// Instruments that failed.
    pub failed: Vec<InstrumentFailure>,
    /// Instruments skipped because the cycle was cancelled.
    pub cancelled: Vec<InstrumentCode>,
}

impl UpdateSummary {
    /// Whether any instrument failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    fn fail(&mut self, instrument: InstrumentCode, stage: FailureStage, message: String) {
        error!(instrument = %instrument, stage = ?stage, error = %message, "Instrument failed");
        self.failed.push(InstrumentFailure {
            instrument,
            stage,
            message,
        });
    }
}

/// Update cycle error.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// The batch could not run or was aborted.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// The blocking batch task panicked or was cancelled by the runtime.
    #[error("Batch task failed: {0}")]
    Join(String),
}

/// Use case for rebuilding every configured instrument.
pub struct UpdateInstrumentsUseCase<R, S>
where
    R: ContractPriceRepository,
    S: PriceArtifactSink,
{
    repository: Arc<R>,
    sink: Arc<S>,
    pipeline: InstrumentPipeline,
    runner: BatchRunner,
}

impl<R, S> UpdateInstrumentsUseCase<R, S>
where
    R: ContractPriceRepository,
    S: PriceArtifactSink,
{
    /// Create a new `UpdateInstrumentsUseCase`.
    pub const fn new(
        repository: Arc<R>,
        sink: Arc<S>,
        pipeline: InstrumentPipeline,
        runner: BatchRunner,
    ) -> Self {
        Self {
            repository,
            sink,
            pipeline,
            runner,
        }
    }

    /// Execute one update cycle.
    ///
    /// Cancellation is checked before each load and each write. Instruments
    /// already written stay written; the rest are reported as cancelled.
    ///
    /// # Errors
    ///
    /// Returns error only when the batch as a whole fails; per-instrument
    /// failures are collected in the summary.
    pub async fn execute(
        &self,
        specs: &[InstrumentSpec],
        cancel: &CancellationToken,
    ) -> Result<UpdateSummary, UpdateError> {
        let mut summary = UpdateSummary::default();
        let mut inputs = Vec::with_capacity(specs.len());

        for (index, spec) in specs.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(remaining = specs.len() - index, "Update cancelled while loading");
                summary
                    .cancelled
                    .extend(specs[index..].iter().map(|s| s.instrument.clone()));
                return Ok(summary);
            }

            match self.repository.load_instrument(&spec.instrument).await {
                Ok(contracts) if contracts.is_empty() => summary.fail(
                    spec.instrument.clone(),
                    FailureStage::Load,
                    "no contracts stored".to_string(),
                ),
                Ok(contracts) => inputs.push(
                    InstrumentInput::new(spec.params.clone(), contracts)
                        .with_overrides(spec.overrides.clone()),
                ),
                Err(e) => summary.fail(spec.instrument.clone(), FailureStage::Load, e.to_string()),
            }
        }

        if inputs.is_empty() {
            return Ok(summary);
        }

        let pipeline = self.pipeline.clone();
        let runner = self.runner.clone();
        let batch = tokio::task::spawn_blocking(move || runner.run(&pipeline, &inputs))
            .await
            .map_err(|e| UpdateError::Join(e.to_string()))??;

        for outcome in batch.outcomes {
            let output = match outcome.result {
                Ok(output) => output,
                Err(e) => {
                    summary.fail(outcome.instrument, FailureStage::Pipeline, e.to_string());
                    continue;
                }
            };

            if cancel.is_cancelled() {
                summary.cancelled.push(outcome.instrument);
                continue;
            }

            match self.sink.write_instrument(&output.artifacts()).await {
                Ok(()) => summary.written.push(outcome.instrument),
                Err(e) => summary.fail(outcome.instrument, FailureStage::Write, e.to_string()),
            }
        }

        info!(
            written = summary.written.len(),
            failed = summary.failed.len(),
            cancelled = summary.cancelled.len(),
            "Update cycle complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::InstrumentArtifacts;
    use crate::application::ports::SinkError;
    use crate::batch::BatchConfig;
    use crate::domain::contract_prices::{ContractPriceSeries, PriceBar};
    use crate::domain::roll_calendar::CarryOffset;
    use crate::domain::shared::{ContractCycle, ContractIdentifier};
    use crate::infrastructure::persistence::{InMemoryArtifactSink, InMemoryContractRepository};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    // Sink that cancels the cycle after its first write
    struct CancellingSink {
        inner: InMemoryArtifactSink,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl PriceArtifactSink for CancellingSink {
        async fn write_instrument(&self, artifacts: &InstrumentArtifacts) -> Result<(), SinkError> {
            self.inner.write_instrument(artifacts).await?;
            self.cancel.cancel();
            Ok(())
        }
    }

    fn code(s: &str) -> InstrumentCode {
        InstrumentCode::new(s).unwrap()
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn seed(repo: &InMemoryContractRepository, instrument: &str) {
        for (month, from, to) in [(3, date(2, 1), date(3, 15)), (6, date(3, 1), date(6, 14))] {
            let contract = ContractIdentifier::new(code(instrument), 2024, month)
                .unwrap()
                .with_day(15)
                .unwrap();
            let bars = from
                .iter_days()
                .take_while(|d| *d <= to)
                .map(|d| PriceBar::from_close(d, dec!(50)))
                .collect();
            repo.add(ContractPriceSeries::new(contract, bars).unwrap());
        }
    }

    fn spec(instrument: &str) -> InstrumentSpec {
        InstrumentSpec {
            instrument: code(instrument),
            params: RollParameters::new(
                5,
                CarryOffset::Next,
                ContractCycle::quarterly(),
                ContractCycle::quarterly(),
            )
            .unwrap(),
            overrides: Vec::new(),
        }
    }

    fn use_case<S: PriceArtifactSink>(
        repo: InMemoryContractRepository,
        sink: Arc<S>,
    ) -> UpdateInstrumentsUseCase<InMemoryContractRepository, S> {
        UpdateInstrumentsUseCase::new(
            Arc::new(repo),
            sink,
            InstrumentPipeline::default(),
            BatchRunner::new(BatchConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_writes_every_successful_instrument() {
        let repo = InMemoryContractRepository::new();
        seed(&repo, "GOLD");
        seed(&repo, "SP500");
        let sink = Arc::new(InMemoryArtifactSink::new());

        let summary = use_case(repo, Arc::clone(&sink))
            .execute(&[spec("GOLD"), spec("SP500")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.written, vec![code("GOLD"), code("SP500")]);
        assert!(!summary.has_failures());
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.get(&code("GOLD")).unwrap().roll_calendar.len(), 1);
    }

    #[tokio::test]
    async fn test_instrument_without_contracts_fails_alone() {
        let repo = InMemoryContractRepository::new();
        seed(&repo, "GOLD");
        let sink = Arc::new(InMemoryArtifactSink::new());

        let summary = use_case(repo, Arc::clone(&sink))
            .execute(&[spec("GOLD"), spec("BUND")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.written, vec![code("GOLD")]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].instrument, code("BUND"));
        assert_eq!(summary.failed[0].stage, FailureStage::Load);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_writes_nothing() {
        let repo = InMemoryContractRepository::new();
        seed(&repo, "GOLD");
        let sink = Arc::new(InMemoryArtifactSink::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = use_case(repo, Arc::clone(&sink))
            .execute(&[spec("GOLD")], &cancel)
            .await
            .unwrap();

        assert!(sink.is_empty());
        assert_eq!(summary.cancelled, vec![code("GOLD")]);
    }

    #[tokio::test]
    async fn test_cancel_between_writes_keeps_written_instrument() {
        let repo = InMemoryContractRepository::new();
        seed(&repo, "GOLD");
        seed(&repo, "SP500");
        let cancel = CancellationToken::new();
        let sink = Arc::new(CancellingSink {
            inner: InMemoryArtifactSink::new(),
            cancel: cancel.clone(),
        });

        let summary = use_case(repo, Arc::clone(&sink))
            .execute(&[spec("GOLD"), spec("SP500")], &cancel)
            .await
            .unwrap();

        assert_eq!(summary.written, vec![code("GOLD")]);
        assert_eq!(summary.cancelled, vec![code("SP500")]);
        assert_eq!(sink.inner.instruments(), vec![code("GOLD")]);
    }
}
