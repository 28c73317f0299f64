//! Contract Price Repository Port (Driven Port)
//!
//! Read interface to per-contract price history. The core never writes
//! through it.

use async_trait::async_trait;

use crate::domain::contract_prices::{ContractPriceSeries, ContractPriceSet, NotFoundError};
use crate::domain::shared::{ContractIdentifier, InstrumentCode};

/// Contract repository error.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Contract has no stored series.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// Storage could not be read.
    #[error("Repository I/O error at {path}: {source}")]
    Io {
        /// Path or key being read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Stored data could not be decoded or is inconsistent.
    #[error("Corrupt contract data at {path}: {message}")]
    Corrupt {
        /// Path or key being read.
        path: String,
        /// What was wrong.
        message: String,
    },
}

/// Port for reading contract price history.
#[async_trait]
pub trait ContractPriceRepository: Send + Sync {
    /// Contracts stored for an instrument, chronologically ordered.
    async fn list_contracts(
        &self,
        instrument: &InstrumentCode,
    ) -> Result<Vec<ContractIdentifier>, RepositoryError>;

    /// Price series of one contract.
    async fn get_contract_series(
        &self,
        contract: &ContractIdentifier,
    ) -> Result<ContractPriceSeries, RepositoryError>;

    /// Every stored series of an instrument.
    async fn load_instrument(
        &self,
        instrument: &InstrumentCode,
    ) -> Result<ContractPriceSet, RepositoryError> {
        let mut set = ContractPriceSet::new(instrument.clone());
        for contract in self.list_contracts(instrument).await? {
            let series = self.get_contract_series(&contract).await?;
            set.insert(series).map_err(|e| RepositoryError::Corrupt {
                path: contract.to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(set)
    }
}
