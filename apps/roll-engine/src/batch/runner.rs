//! Batch instrument runner using Rayon.

use std::sync::Mutex;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::application::use_cases::{InstrumentInput, InstrumentPipeline};

use super::config::BatchConfig;
use super::error::BatchError;
use super::progress::ProgressTracker;
use super::result::{BatchResult, InstrumentOutcome};

/// Runs independent instrument pipelines on a Rayon pool.
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    config: BatchConfig,
}

impl BatchRunner {
    /// Create a new batch runner.
    #[must_use]
    pub const fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Runner configuration.
    #[must_use]
    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Get effective thread count.
    #[must_use]
    pub fn effective_thread_count(&self) -> usize {
        if self.config.max_threads > 0 {
            self.config.max_threads
        } else {
            rayon::current_num_threads()
        }
    }

    /// Run one pipeline per input.
    ///
    /// Outcomes keep input order. A failed instrument is recorded and the
    /// rest still run unless `continue_on_error` is off, in which case the
    /// batch stops at the first failure.
    ///
    /// # Errors
    ///
    /// Returns error if no inputs are given, the pool cannot be built, or an
    /// instrument fails while `continue_on_error` is off.
    #[allow(clippy::cast_possible_truncation)]
    pub fn run(
        &self,
        pipeline: &InstrumentPipeline,
        inputs: &[InstrumentInput],
    ) -> Result<BatchResult, BatchError> {
        if inputs.is_empty() {
            return Err(BatchError::NoJobs);
        }

        let tracker = ProgressTracker::new(inputs.len());
        let first_failure: Mutex<Option<BatchError>> = Mutex::new(None);
        let start_time = Instant::now();

        info!(
            instruments = inputs.len(),
            threads = self.effective_thread_count(),
            "Starting batch run"
        );

        let slots: Vec<Option<InstrumentOutcome>> = if inputs.len() >= self.config.min_parallel_jobs
        {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.max_threads)
                .thread_name(|i| format!("roll-engine-{i}"))
                .build()
                .map_err(|e| BatchError::ThreadPoolError {
                    message: e.to_string(),
                })?;
            pool.install(|| {
                inputs
                    .par_iter()
                    .map(|input| self.execute(pipeline, input, &tracker, &first_failure))
                    .collect()
            })
        } else {
            inputs
                .iter()
                .map(|input| self.execute(pipeline, input, &tracker, &first_failure))
                .collect()
        };

        if let Some(err) = first_failure
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
        {
            warn!(error = %err, "Batch aborted");
            return Err(err);
        }

        let outcomes: Vec<InstrumentOutcome> = slots.into_iter().flatten().collect();
        let elapsed = start_time.elapsed();
        let progress = tracker.snapshot();

        info!(
            succeeded = progress.built,
            failed = progress.failed(),
            failures = ?progress.failures,
            pending_roll = progress.pending_roll,
            rolls = progress.rolls,
            total = progress.total,
            elapsed_secs = elapsed.as_secs_f64(),
            "Batch run complete"
        );

        Ok(BatchResult {
            outcomes,
            total_time_ms: elapsed.as_millis() as u64,
            jobs_succeeded: progress.built as u64,
            jobs_failed: progress.failed() as u64,
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn execute(
        &self,
        pipeline: &InstrumentPipeline,
        input: &InstrumentInput,
        tracker: &ProgressTracker,
        first_failure: &Mutex<Option<BatchError>>,
    ) -> Option<InstrumentOutcome> {
        if !self.config.continue_on_error
            && first_failure
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .is_some()
        {
            return None;
        }

        let start = Instant::now();
        let result = pipeline.run(input);
        let outcome = InstrumentOutcome {
            instrument: input.instrument().clone(),
            result,
            execution_time_ms: start.elapsed().as_millis() as u64,
        };

        let progress = tracker.record(&outcome);
        if self.config.track_progress {
            debug!(
                instrument = %outcome.instrument,
                pct = progress.percentage(),
                remaining = progress.remaining(),
                failed = progress.failed(),
                "Batch progress"
            );
        }

        if let (Err(e), false) = (&outcome.result, self.config.continue_on_error) {
            let mut slot = first_failure
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(BatchError::Aborted {
                    instrument: outcome.instrument.to_string(),
                    message: e.to_string(),
                });
            }
        }

        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract_prices::{ContractPriceSeries, ContractPriceSet, PriceBar};
    use crate::domain::roll_calendar::{CarryOffset, RollParameters};
    use crate::domain::shared::{ContractCycle, ContractIdentifier, InstrumentCode};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn input(code: &str, overlapping: bool) -> InstrumentInput {
        let instrument = InstrumentCode::new(code).unwrap();
        let mar = ContractIdentifier::new(instrument.clone(), 2024, 3)
            .unwrap()
            .with_day(15)
            .unwrap();
        let jun = ContractIdentifier::new(instrument.clone(), 2024, 6)
            .unwrap()
            .with_day(15)
            .unwrap();
        let jun_start = if overlapping { date(3, 1) } else { date(5, 1) };
        let bars = |from: NaiveDate, to: NaiveDate| {
            from.iter_days()
                .take_while(|d| *d <= to)
                .map(|d| PriceBar::from_close(d, dec!(100)))
                .collect::<Vec<_>>()
        };
        let contracts = ContractPriceSet::from_series(
            instrument,
            vec![
                ContractPriceSeries::new(mar, bars(date(2, 1), date(3, 15))).unwrap(),
                ContractPriceSeries::new(jun, bars(jun_start, date(6, 14))).unwrap(),
            ],
        )
        .unwrap();
        let params = RollParameters::new(
            5,
            CarryOffset::Next,
            ContractCycle::quarterly(),
            ContractCycle::quarterly(),
        )
        .unwrap();
        InstrumentInput::new(params, contracts)
    }

    #[test]
    fn test_empty_batch_rejected() {
        let runner = BatchRunner::default();
        let result = runner.run(&InstrumentPipeline::default(), &[]);
        assert_eq!(result.unwrap_err(), BatchError::NoJobs);
    }

    #[test]
    fn test_parallel_run_keeps_input_order() {
        let runner = BatchRunner::new(BatchConfig {
            max_threads: 2,
            min_parallel_jobs: 1,
            ..BatchConfig::default()
        });
        let inputs = vec![input("SP500", true), input("GOLD", false), input("BUND", true)];

        let result = runner.run(&InstrumentPipeline::default(), &inputs).unwrap();

        let order: Vec<_> = result.outcomes.iter().map(|o| o.instrument.as_str()).collect();
        assert_eq!(order, vec!["SP500", "GOLD", "BUND"]);
        assert_eq!(result.jobs_succeeded, 2);
        assert_eq!(result.jobs_failed, 1);
    }

    #[test]
    fn test_abort_on_first_failure() {
        let runner = BatchRunner::new(BatchConfig {
            continue_on_error: false,
            ..BatchConfig::default()
        });
        let inputs = vec![input("GOLD", false), input("SP500", true)];

        let err = runner.run(&InstrumentPipeline::default(), &inputs).unwrap_err();

        assert!(matches!(err, BatchError::Aborted { ref instrument, .. } if instrument == "GOLD"));
    }

    #[test]
    fn test_effective_thread_count() {
        let runner = BatchRunner::new(BatchConfig {
            max_threads: 3,
            ..BatchConfig::default()
        });
        assert_eq!(runner.effective_thread_count(), 3);
    }
}
