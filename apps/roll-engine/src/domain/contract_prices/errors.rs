//! Contract lookup errors.

use thiserror::Error;

use crate::domain::shared::ContractIdentifier;

/// Requested contract has no known price series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No price series for contract {contract}")]
pub struct NotFoundError {
    /// The unknown contract.
    pub contract: ContractIdentifier,
}

impl NotFoundError {
    /// Create a not-found error for a contract.
    #[must_use]
    pub fn new(contract: ContractIdentifier) -> Self {
        Self { contract }
    }
}
