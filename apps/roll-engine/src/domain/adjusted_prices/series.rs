//! Back-adjusted continuous price series.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{ContractIdentifier, InstrumentCode};

/// How older segments are shifted onto the latest contract's price level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentMethod {
    /// Additive: add the cumulative roll gap (Panama canal method).
    #[default]
    Panama,
    /// Multiplicative: scale by the cumulative roll price ratio.
    Ratio,
}

impl std::fmt::Display for AdjustmentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Panama => write!(f, "panama"),
            Self::Ratio => write!(f, "ratio"),
        }
    }
}

/// One adjusted observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedPriceRow {
    /// Trading date.
    pub date: NaiveDate,
    /// Contract the raw price came from.
    pub contract: ContractIdentifier,
    /// Unadjusted close of `contract`.
    pub raw_price: Decimal,
    /// Back-adjusted price.
    pub adjusted_price: Decimal,
    /// `adjusted_price - raw_price`.
    pub cumulative_offset: Decimal,
}

/// Continuous back-adjusted series for one instrument.
///
/// Rows of the latest segment carry a zero offset, so the series ends exactly
/// at the held contract's raw price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustedPriceSeries {
    instrument: InstrumentCode,
    method: AdjustmentMethod,
    rows: Vec<AdjustedPriceRow>,
}

impl AdjustedPriceSeries {
    pub(crate) const fn assemble(
        instrument: InstrumentCode,
        method: AdjustmentMethod,
        rows: Vec<AdjustedPriceRow>,
    ) -> Self {
        Self {
            instrument,
            method,
            rows,
        }
    }

    /// Instrument code.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentCode {
        &self.instrument
    }

    /// Adjustment method used.
    #[must_use]
    pub const fn method(&self) -> AdjustmentMethod {
        self.method
    }

    /// Rows in date order.
    #[must_use]
    pub fn rows(&self) -> &[AdjustedPriceRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of the most recent contract.
    #[must_use]
    pub fn latest_segment(&self) -> &[AdjustedPriceRow] {
        let Some(last) = self.rows.last() else {
            return &[];
        };
        let start = self
            .rows
            .iter()
            .rposition(|row| row.contract != last.contract)
            .map_or(0, |index| index + 1);
        &self.rows[start..]
    }

    /// Simple returns of the adjusted price between consecutive rows.
    ///
    /// Each return is dated on the later row. Pairs whose earlier price is zero
    /// are skipped.
    #[must_use]
    pub fn returns(&self) -> Vec<(NaiveDate, Decimal)> {
        self.rows
            .windows(2)
            .filter_map(|pair| {
                let [previous, row] = pair else { return None };
                if previous.adjusted_price.is_zero() {
                    return None;
                }
                Some((
                    row.date,
                    (row.adjusted_price - previous.adjusted_price) / previous.adjusted_price,
                ))
            })
            .collect()
    }
}
