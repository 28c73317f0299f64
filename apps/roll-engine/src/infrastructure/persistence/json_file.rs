//! JSON-on-disk contract store and artifact sink.
//!
//! Layout:
//!
//! ```text
//! {contracts_dir}/{INSTRUMENT}/{INSTRUMENT}_{YYYYMMDD}.json   array of price bars
//! {output_dir}/{INSTRUMENT}/roll_calendar.json
//! {output_dir}/{INSTRUMENT}/multiple_prices.json
//! {output_dir}/{INSTRUMENT}/adjusted_prices.json
//! {output_dir}/{INSTRUMENT}/validation.json
//! ```
//!
//! An instrument's output is staged in a sibling directory and swapped in
//! with renames, so readers never see tables from two different runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::application::dto::InstrumentArtifacts;
use crate::application::ports::{
    ContractPriceRepository, PriceArtifactSink, RepositoryError, SinkError,
};
use crate::domain::contract_prices::{ContractPriceSeries, NotFoundError, PriceBar};
use crate::domain::shared::{ContractIdentifier, InstrumentCode};

/// File names of the artifact tables.
pub const ROLL_CALENDAR_FILE: &str = "roll_calendar.json";
/// Multiple prices table.
pub const MULTIPLE_PRICES_FILE: &str = "multiple_prices.json";
/// Adjusted prices table.
pub const ADJUSTED_PRICES_FILE: &str = "adjusted_prices.json";
/// Roll diagnostics.
pub const ROLL_QUALITY_FILE: &str = "roll_quality.json";
/// Validation report.
pub const VALIDATION_FILE: &str = "validation.json";

/// Contract repository and artifact sink over plain JSON files.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    contracts_dir: PathBuf,
    output_dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store reading from `contracts_dir` and writing to `output_dir`.
    #[must_use]
    pub fn new(contracts_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            contracts_dir: contracts_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Directory holding an instrument's contract files.
    #[must_use]
    pub fn instrument_dir(&self, instrument: &InstrumentCode) -> PathBuf {
        self.contracts_dir.join(instrument.as_str())
    }

    /// Path of one contract's file.
    #[must_use]
    pub fn contract_path(&self, contract: &ContractIdentifier) -> PathBuf {
        self.instrument_dir(contract.instrument())
            .join(format!("{contract}.json"))
    }

    /// Directory holding an instrument's artifacts.
    #[must_use]
    pub fn output_path(&self, instrument: &InstrumentCode) -> PathBuf {
        self.output_dir.join(instrument.as_str())
    }

    /// Write one contract's bars (for seeding and tests).
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub async fn put_contract(&self, series: &ContractPriceSeries) -> Result<(), RepositoryError> {
        let path = self.contract_path(series.contract());
        let dir = self.instrument_dir(series.contract().instrument());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| io_error(&dir, source))?;

        let bars: Vec<&PriceBar> = series.iter().collect();
        let bytes = serde_json::to_vec_pretty(&bars).map_err(|e| RepositoryError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| io_error(&path, source))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> RepositoryError {
    RepositoryError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl ContractPriceRepository for JsonFileStore {
    async fn list_contracts(
        &self,
        instrument: &InstrumentCode,
    ) -> Result<Vec<ContractIdentifier>, RepositoryError> {
        let dir = self.instrument_dir(instrument);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|source| io_error(&dir, source))?;

        let mut contracts = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| io_error(&dir, source))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match stem.parse::<ContractIdentifier>() {
                Ok(contract) if contract.instrument() == instrument => contracts.push(contract),
                Ok(contract) => {
                    warn!(path = %path.display(), contract = %contract, "Skipping contract of another instrument");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unrecognised contract file");
                }
            }
        }

        contracts.sort();
        debug!(instrument = %instrument, contracts = contracts.len(), "Listed contracts");
        Ok(contracts)
    }

    async fn get_contract_series(
        &self,
        contract: &ContractIdentifier,
    ) -> Result<ContractPriceSeries, RepositoryError> {
        let path = self.contract_path(contract);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(NotFoundError::new(contract.clone()).into());
            }
            Err(source) => return Err(io_error(&path, source)),
        };

        let corrupt = |message: String| RepositoryError::Corrupt {
            path: path.display().to_string(),
            message,
        };
        let bars: Vec<PriceBar> = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        ContractPriceSeries::new(contract.clone(), bars).map_err(|e| corrupt(e.to_string()))
    }
}

#[async_trait]
impl PriceArtifactSink for JsonFileStore {
    async fn write_instrument(&self, artifacts: &InstrumentArtifacts) -> Result<(), SinkError> {
        let instrument = artifacts.instrument.as_str();
        let io = |source| SinkError::Io {
            instrument: instrument.to_string(),
            source,
        };

        let target = self.output_path(&artifacts.instrument);
        let staging = self.output_dir.join(format!(".{instrument}.staging"));
        let retired = self.output_dir.join(format!(".{instrument}.old"));

        remove_dir_if_exists(&staging).await.map_err(io)?;
        tokio::fs::create_dir_all(&staging).await.map_err(io)?;

        let tables: [(&str, Vec<u8>); 5] = [
            (ROLL_CALENDAR_FILE, encode(instrument, &artifacts.roll_calendar)?),
            (MULTIPLE_PRICES_FILE, encode(instrument, &artifacts.multiple_prices)?),
            (ADJUSTED_PRICES_FILE, encode(instrument, &artifacts.adjusted_prices)?),
            (ROLL_QUALITY_FILE, encode(instrument, &artifacts.roll_quality)?),
            (VALIDATION_FILE, encode(instrument, &artifacts.validation)?),
        ];
        for (name, bytes) in tables {
            tokio::fs::write(staging.join(name), bytes).await.map_err(io)?;
        }

        remove_dir_if_exists(&retired).await.map_err(io)?;
        let had_previous = match tokio::fs::rename(&target, &retired).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(io(e)),
        };
        tokio::fs::rename(&staging, &target).await.map_err(io)?;
        if had_previous {
            remove_dir_if_exists(&retired).await.map_err(io)?;
        }

        debug!(
            instrument,
            path = %target.display(),
            rows = artifacts.adjusted_prices.len(),
            "Wrote instrument artifacts"
        );
        Ok(())
    }
}

fn encode<T: Serialize + ?Sized>(instrument: &str, value: &T) -> Result<Vec<u8>, SinkError> {
    serde_json::to_vec_pretty(value).map_err(|e| SinkError::Encode {
        instrument: instrument.to_string(),
        message: e.to_string(),
    })
}

async fn remove_dir_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let store = JsonFileStore::new("/data/contracts", "/data/out");
        let contract: ContractIdentifier = "GOLD_20240600".parse().unwrap();

        assert_eq!(
            store.contract_path(&contract),
            PathBuf::from("/data/contracts/GOLD/GOLD_20240600.json")
        );
        assert_eq!(
            store.output_path(contract.instrument()),
            PathBuf::from("/data/out/GOLD")
        );
    }
}
