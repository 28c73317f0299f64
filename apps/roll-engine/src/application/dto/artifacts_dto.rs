//! Pipeline output tables handed to storage.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::adjusted_prices::{AdjustedPriceRow, AdjustedPriceSeries, AdjustmentMethod};
use crate::domain::multiple_prices::{MultiplePriceRow, MultiplePriceSeries};
use crate::domain::roll_calendar::{RollCalendar, RollCalendarEntry, RollQuality};
use crate::domain::shared::{ContractIdentifier, InstrumentCode};
use crate::domain::validation::ValidationReport;

/// Roll calendar table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollCalendarRecord {
    /// Roll date.
    pub roll_date: NaiveDate,
    /// Contract rolled out of.
    pub current_contract: ContractIdentifier,
    /// Contract rolled into.
    pub next_contract: ContractIdentifier,
    /// Carry contract.
    pub carry_contract: ContractIdentifier,
}

impl From<&RollCalendarEntry> for RollCalendarRecord {
    fn from(entry: &RollCalendarEntry) -> Self {
        Self {
            roll_date: entry.roll_date(),
            current_contract: entry.current_contract().clone(),
            next_contract: entry.next_contract().clone(),
            carry_contract: entry.carry_contract().clone(),
        }
    }
}

/// Multiple prices table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplePriceRecord {
    /// Trading date.
    pub date: NaiveDate,
    /// Held contract close.
    pub price: Decimal,
    /// Forward contract close.
    pub forward: Option<Decimal>,
    /// Carry contract close.
    pub carry: Option<Decimal>,
    /// Held contract.
    pub current_id: ContractIdentifier,
    /// Forward contract.
    pub forward_id: Option<ContractIdentifier>,
    /// Carry contract.
    pub carry_id: Option<ContractIdentifier>,
}

impl From<&MultiplePriceRow> for MultiplePriceRecord {
    fn from(row: &MultiplePriceRow) -> Self {
        Self {
            date: row.date,
            price: row.price,
            forward: row.forward,
            carry: row.carry,
            current_id: row.price_contract.clone(),
            forward_id: row.forward_contract.clone(),
            carry_id: row.carry_contract.clone(),
        }
    }
}

/// Adjusted prices table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedPriceRecord {
    /// Trading date.
    pub date: NaiveDate,
    /// Back-adjusted price.
    pub adjusted_price: Decimal,
    /// Offset applied on that date.
    pub cumulative_offset: Decimal,
}

impl From<&AdjustedPriceRow> for AdjustedPriceRecord {
    fn from(row: &AdjustedPriceRow) -> Self {
        Self {
            date: row.date,
            adjusted_price: row.adjusted_price,
            cumulative_offset: row.cumulative_offset,
        }
    }
}

/// Roll diagnostics table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollQualityRecord {
    /// Roll date.
    pub roll_date: NaiveDate,
    /// Contract rolled out of.
    pub current_contract: ContractIdentifier,
    /// Contract rolled into.
    pub next_contract: ContractIdentifier,
    /// Gap between the two closes.
    pub price_gap: Option<Decimal>,
    /// Gap in percent of the current close.
    pub gap_pct: Option<Decimal>,
    /// Next over current volume.
    pub volume_ratio: Option<Decimal>,
}

impl From<&RollQuality> for RollQualityRecord {
    fn from(quality: &RollQuality) -> Self {
        Self {
            roll_date: quality.roll_date,
            current_contract: quality.current_contract.clone(),
            next_contract: quality.next_contract.clone(),
            price_gap: quality.price_gap,
            gap_pct: quality.gap_pct,
            volume_ratio: quality.volume_ratio,
        }
    }
}

/// Everything written for one instrument in one hand-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentArtifacts {
    /// Instrument code.
    pub instrument: InstrumentCode,
    /// Back-adjustment method used.
    pub adjustment_method: AdjustmentMethod,
    /// Roll calendar table.
    pub roll_calendar: Vec<RollCalendarRecord>,
    /// Multiple prices table.
    pub multiple_prices: Vec<MultiplePriceRecord>,
    /// Adjusted prices table.
    pub adjusted_prices: Vec<AdjustedPriceRecord>,
    /// Price gap and volume shift at each roll.
    pub roll_quality: Vec<RollQualityRecord>,
    /// Validation findings.
    pub validation: ValidationReport,
}

impl InstrumentArtifacts {
    /// Flatten domain output into tables.
    #[must_use]
    pub fn from_domain(
        calendar: &RollCalendar,
        multiple: &MultiplePriceSeries,
        adjusted: &AdjustedPriceSeries,
        roll_quality: &[RollQuality],
        validation: ValidationReport,
    ) -> Self {
        Self {
            instrument: calendar.instrument().clone(),
            adjustment_method: adjusted.method(),
            roll_calendar: calendar.entries().iter().map(Into::into).collect(),
            multiple_prices: multiple.rows().iter().map(Into::into).collect(),
            adjusted_prices: adjusted.rows().iter().map(Into::into).collect(),
            roll_quality: roll_quality.iter().map(Into::into).collect(),
            validation,
        }
    }
}
