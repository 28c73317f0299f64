//! Error types for batch instrument runs.

use thiserror::Error;

/// Errors from batch instrument runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Thread pool initialization failed.
    #[error("Failed to initialize thread pool: {message}")]
    ThreadPoolError {
        /// Error message.
        message: String,
    },

    /// No instruments to run.
    #[error("No instrument jobs provided")]
    NoJobs,

    /// An instrument failed while `continue_on_error` was off.
    #[error("Batch aborted after '{instrument}' failed: {message}")]
    Aborted {
        /// Instrument that failed first.
        instrument: String,
        /// Error message.
        message: String,
    },
}
