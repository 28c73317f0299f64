//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod build_instrument;
mod update_instruments;

pub use build_instrument::{
    InstrumentInput, InstrumentPipeline, PipelineError, PipelineOutput, PipelineSettings,
};
pub use update_instruments::{
    FailureStage, InstrumentFailure, InstrumentSpec, UpdateError, UpdateInstrumentsUseCase,
    UpdateSummary,
};
