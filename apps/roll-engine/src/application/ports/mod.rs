//! Application Ports (Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - [`ContractPriceRepository`]: where contract history comes from
//! - [`PriceArtifactSink`]: where pipeline output goes

mod artifact_sink_port;
mod contract_repository_port;

pub use artifact_sink_port::{PriceArtifactSink, SinkError};
pub use contract_repository_port::{ContractPriceRepository, RepositoryError};
