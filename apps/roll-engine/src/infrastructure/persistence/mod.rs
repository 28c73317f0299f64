//! Persistence Adapters
//!
//! Implementations of the contract repository and artifact sink ports.

pub mod in_memory;
pub mod json_file;

pub use in_memory::{InMemoryArtifactSink, InMemoryContractRepository};
pub use json_file::JsonFileStore;
