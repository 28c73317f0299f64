//! In-memory contract repository and artifact sink.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::application::dto::InstrumentArtifacts;
use crate::application::ports::{
    ContractPriceRepository, PriceArtifactSink, RepositoryError, SinkError,
};
use crate::domain::contract_prices::{ContractPriceSeries, NotFoundError};
use crate::domain::shared::{ContractIdentifier, InstrumentCode};

/// In-memory implementation of `ContractPriceRepository`.
///
/// Suitable for testing and embedding. Not for production use.
#[derive(Debug, Default)]
pub struct InMemoryContractRepository {
    series: RwLock<BTreeMap<ContractIdentifier, ContractPriceSeries>>,
}

impl InMemoryContractRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding the given series.
    #[must_use]
    pub fn with_series(series: impl IntoIterator<Item = ContractPriceSeries>) -> Self {
        let repo = Self::new();
        for s in series {
            repo.add(s);
        }
        repo
    }

    /// Add or replace one contract's series (for test setup).
    pub fn add(&self, series: ContractPriceSeries) {
        let mut stored = self.series.write().unwrap_or_else(PoisonError::into_inner);
        stored.insert(series.contract().clone(), series);
    }

    /// Number of stored contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContractPriceRepository for InMemoryContractRepository {
    async fn list_contracts(
        &self,
        instrument: &InstrumentCode,
    ) -> Result<Vec<ContractIdentifier>, RepositoryError> {
        let stored = self.series.read().unwrap_or_else(PoisonError::into_inner);
        Ok(stored
            .keys()
            .filter(|c| c.instrument() == instrument)
            .cloned()
            .collect())
    }

    async fn get_contract_series(
        &self,
        contract: &ContractIdentifier,
    ) -> Result<ContractPriceSeries, RepositoryError> {
        let stored = self.series.read().unwrap_or_else(PoisonError::into_inner);
        stored
            .get(contract)
            .cloned()
            .ok_or_else(|| NotFoundError::new(contract.clone()).into())
    }
}

/// In-memory implementation of `PriceArtifactSink`.
///
/// Keeps the latest artifacts per instrument.
#[derive(Debug, Default)]
pub struct InMemoryArtifactSink {
    written: RwLock<BTreeMap<InstrumentCode, InstrumentArtifacts>>,
}

impl InMemoryArtifactSink {
    /// Create a new empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest artifacts written for an instrument.
    #[must_use]
    pub fn get(&self, instrument: &InstrumentCode) -> Option<InstrumentArtifacts> {
        self.written
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(instrument)
            .cloned()
    }

    /// Instruments written so far.
    #[must_use]
    pub fn instruments(&self) -> Vec<InstrumentCode> {
        self.written
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Number of instruments written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.written
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PriceArtifactSink for InMemoryArtifactSink {
    async fn write_instrument(&self, artifacts: &InstrumentArtifacts) -> Result<(), SinkError> {
        let mut written = self.written.write().unwrap_or_else(PoisonError::into_inner);
        written.insert(artifacts.instrument.clone(), artifacts.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract_prices::PriceBar;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn series(instrument: &str, month: u32) -> ContractPriceSeries {
        let contract =
            ContractIdentifier::new(InstrumentCode::new(instrument).unwrap(), 2024, month).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        ContractPriceSeries::new(contract, vec![PriceBar::from_close(date, dec!(100))]).unwrap()
    }

    #[tokio::test]
    async fn test_list_contracts_filters_instrument() {
        let repo = InMemoryContractRepository::with_series([
            series("GOLD", 6),
            series("SP500", 3),
            series("GOLD", 2),
        ]);

        let gold = repo
            .list_contracts(&InstrumentCode::new("GOLD").unwrap())
            .await
            .unwrap();

        assert_eq!(repo.len(), 3);
        assert_eq!(gold.len(), 2);
        assert!(gold[0] < gold[1]);
    }

    #[tokio::test]
    async fn test_missing_contract_is_not_found() {
        let repo = InMemoryContractRepository::new();
        let contract = series("GOLD", 6).contract().clone();

        let err = repo.get_contract_series(&contract).await.unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound(e) if e.contract == contract));
    }

    #[tokio::test]
    async fn test_load_instrument_collects_series() {
        let repo = InMemoryContractRepository::with_series([series("GOLD", 6), series("GOLD", 8)]);

        let set = repo
            .load_instrument(&InstrumentCode::new("GOLD").unwrap())
            .await
            .unwrap();

        assert_eq!(set.len(), 2);
    }
}
