//! Batch execution of instrument pipelines.
//!
//! Instruments are independent, so each pipeline runs as its own job on a
//! Rayon pool. Small batches run sequentially.

mod config;
mod error;
mod progress;
mod result;
mod runner;

pub use config::BatchConfig;
pub use error::BatchError;
pub use progress::{Progress, ProgressTracker};
pub use result::{BatchResult, InstrumentOutcome};
pub use runner::BatchRunner;
