//! Per-contract price series and the per-instrument contract set.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::ops::RangeBounds;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::errors::NotFoundError;
use super::price_bar::PriceBar;
use crate::domain::shared::{ContractIdentifier, DomainError, InstrumentCode};

/// Ascending, duplicate-free daily bars for one contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractPriceSeries {
    contract: ContractIdentifier,
    bars: BTreeMap<NaiveDate, PriceBar>,
}

impl ContractPriceSeries {
    /// Build a series from bars in any order.
    ///
    /// # Errors
    ///
    /// Returns error if two bars share a date.
    pub fn new(contract: ContractIdentifier, bars: Vec<PriceBar>) -> Result<Self, DomainError> {
        let mut by_date = BTreeMap::new();
        for bar in bars {
            match by_date.entry(bar.date) {
                Entry::Vacant(slot) => {
                    slot.insert(bar);
                }
                Entry::Occupied(slot) => {
                    return Err(DomainError::InvariantViolation {
                        aggregate: "ContractPriceSeries".to_string(),
                        invariant: "bar dates are unique".to_string(),
                        state: format!("{contract} has two bars on {}", slot.key()),
                    });
                }
            }
        }

        Ok(Self {
            contract,
            bars: by_date,
        })
    }

    /// Contract this series belongs to.
    #[must_use]
    pub const fn contract(&self) -> &ContractIdentifier {
        &self.contract
    }

    /// Bar on a date.
    #[must_use]
    pub fn bar_on(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.bars.get(&date)
    }

    /// Close on a date.
    #[must_use]
    pub fn close_on(&self, date: NaiveDate) -> Option<Decimal> {
        self.bars.get(&date).map(|bar| bar.close)
    }

    /// Volume on a date, when the bar exists and reports one.
    #[must_use]
    pub fn volume_on(&self, date: NaiveDate) -> Option<u64> {
        self.bars.get(&date).and_then(|bar| bar.volume)
    }

    /// Whether the contract traded on a date.
    #[must_use]
    pub fn has_bar(&self, date: NaiveDate) -> bool {
        self.bars.contains_key(&date)
    }

    /// First trading date.
    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.keys().next().copied()
    }

    /// Last trading date.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.keys().next_back().copied()
    }

    /// All bars in date order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PriceBar> {
        self.bars.values()
    }

    /// Bars whose date falls in `range`, in date order.
    pub fn range<R>(&self, range: R) -> impl DoubleEndedIterator<Item = &PriceBar>
    where
        R: RangeBounds<NaiveDate>,
    {
        self.bars.range(range).map(|(_, bar)| bar)
    }

    /// Number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Whether the series has no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Every contract series known for one instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractPriceSet {
    instrument: InstrumentCode,
    series: BTreeMap<ContractIdentifier, ContractPriceSeries>,
}

impl ContractPriceSet {
    /// Empty set for an instrument.
    #[must_use]
    pub const fn new(instrument: InstrumentCode) -> Self {
        Self {
            instrument,
            series: BTreeMap::new(),
        }
    }

    /// Build a set from several series.
    ///
    /// # Errors
    ///
    /// Returns error if a series belongs to another instrument.
    pub fn from_series(
        instrument: InstrumentCode,
        series: impl IntoIterator<Item = ContractPriceSeries>,
    ) -> Result<Self, DomainError> {
        let mut set = Self::new(instrument);
        for s in series {
            set.insert(s)?;
        }
        Ok(set)
    }

    /// Add or replace the series for its contract.
    ///
    /// # Errors
    ///
    /// Returns error if the series belongs to another instrument.
    pub fn insert(&mut self, series: ContractPriceSeries) -> Result<(), DomainError> {
        if series.contract().instrument() != &self.instrument {
            return Err(DomainError::invalid(
                "contract",
                format!(
                    "{} does not belong to instrument {}",
                    series.contract(),
                    self.instrument
                ),
            ));
        }
        self.series.insert(series.contract().clone(), series);
        Ok(())
    }

    /// Instrument code.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentCode {
        &self.instrument
    }

    /// Series for a contract.
    #[must_use]
    pub fn get(&self, contract: &ContractIdentifier) -> Option<&ContractPriceSeries> {
        self.series.get(contract)
    }

    /// Series for a contract, or a [`NotFoundError`].
    pub fn require(
        &self,
        contract: &ContractIdentifier,
    ) -> Result<&ContractPriceSeries, NotFoundError> {
        self.series
            .get(contract)
            .ok_or_else(|| NotFoundError::new(contract.clone()))
    }

    /// The stored identifier for a contract, keeping its expiry day when the
    /// lookup key has none.
    #[must_use]
    pub fn resolve(&self, contract: &ContractIdentifier) -> Option<&ContractIdentifier> {
        self.series.get_key_value(contract).map(|(key, _)| key)
    }

    /// Latest bar date across every contract: the edge of known data.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.series
            .values()
            .filter_map(ContractPriceSeries::last_date)
            .max()
    }

    /// Contracts in chronological order.
    pub fn contracts(&self) -> impl Iterator<Item = &ContractIdentifier> {
        self.series.keys()
    }

    /// Series in contract order.
    pub fn iter(&self) -> impl Iterator<Item = &ContractPriceSeries> {
        self.series.values()
    }

    /// Number of contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether no contracts are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
