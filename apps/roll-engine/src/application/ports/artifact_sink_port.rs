//! Price Artifact Sink Port (Driven Port)
//!
//! Storage hand-off for one instrument's roll calendar, multiple prices,
//! adjusted prices and validation report.

use async_trait::async_trait;

use crate::application::dto::InstrumentArtifacts;

/// Artifact sink error.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Storage could not be written.
    #[error("Failed to write artifacts for {instrument}: {source}")]
    Io {
        /// Instrument being written.
        instrument: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Artifacts could not be encoded.
    #[error("Failed to encode artifacts for {instrument}: {message}")]
    Encode {
        /// Instrument being written.
        instrument: String,
        /// Encoder message.
        message: String,
    },
}

/// Port for persisting pipeline output.
///
/// Implementations must make the whole instrument visible at once: readers
/// either see the previous artifacts or the new ones, never a mix.
#[async_trait]
pub trait PriceArtifactSink: Send + Sync {
    /// Write every artifact of one instrument.
    async fn write_instrument(&self, artifacts: &InstrumentArtifacts) -> Result<(), SinkError>;
}
