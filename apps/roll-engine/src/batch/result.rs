//! Result types for batch instrument runs.

use crate::application::use_cases::{PipelineError, PipelineOutput};
use crate::domain::shared::InstrumentCode;

/// Outcome of one instrument in a batch.
#[derive(Debug, Clone)]
pub struct InstrumentOutcome {
    /// Instrument code.
    pub instrument: InstrumentCode,
    /// Pipeline output or the error that stopped it.
    pub result: Result<PipelineOutput, PipelineError>,
    /// Wall time in milliseconds.
    pub execution_time_ms: u64,
}

impl InstrumentOutcome {
    /// Whether the pipeline produced output.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Result from a batch run, in input order.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Individual instrument outcomes.
    pub outcomes: Vec<InstrumentOutcome>,

    /// Total execution time in milliseconds.
    pub total_time_ms: u64,

    /// Number of instruments that produced output.
    pub jobs_succeeded: u64,

    /// Number of instruments that failed.
    pub jobs_failed: u64,
}

impl BatchResult {
    /// Get the success rate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            self.jobs_succeeded as f64 / self.outcomes.len() as f64
        }
    }

    /// Successful instruments with their output.
    pub fn successful(&self) -> impl Iterator<Item = (&InstrumentCode, &PipelineOutput)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|output| (&o.instrument, output)))
    }

    /// Failed instruments with their error.
    pub fn failed(&self) -> impl Iterator<Item = (&InstrumentCode, &PipelineError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.instrument, e)))
    }

    /// Consume the result, yielding successful outputs.
    pub fn into_successful(self) -> impl Iterator<Item = PipelineOutput> {
        self.outcomes.into_iter().filter_map(|o| o.result.ok())
    }
}
