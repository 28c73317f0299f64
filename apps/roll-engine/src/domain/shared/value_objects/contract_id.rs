//! Contract identifier value object.
//!
//! Canonical text form: `{INSTRUMENT}_{YYYYMMDD}`, where `DD` is `00` when the
//! contract is only known by its delivery month (e.g. `SP500_20240300`).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use super::instrument_code::InstrumentCode;
use super::month_code::{ContractCycle, MonthCode};
use crate::domain::shared::DomainError;

/// Uniquely names one futures contract.
///
/// Identity is the instrument and delivery month: the optional expiry day is
/// carried for display and expiry resolution but ignored by equality,
/// hashing and ordering, so `SP500_20240300` and `SP500_20240315` name the
/// same contract. Ordering is chronological within an instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContractIdentifier {
    instrument: InstrumentCode,
    month_start: NaiveDate,
    expiry: Option<NaiveDate>,
}

impl ContractIdentifier {
    /// Create an identifier for a delivery month.
    ///
    /// # Errors
    ///
    /// Returns error if the month is outside 1-12 or the year is unrepresentable.
    pub fn new(instrument: InstrumentCode, year: i32, month: u32) -> Result<Self, DomainError> {
        let month_start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            DomainError::invalid("contract", format!("Invalid contract month {year}-{month}"))
        })?;

        Ok(Self {
            instrument,
            month_start,
            expiry: None,
        })
    }

    /// Attach an explicit expiry day within the delivery month.
    ///
    /// # Errors
    ///
    /// Returns error if the day does not exist in the delivery month.
    pub fn with_day(mut self, day: u32) -> Result<Self, DomainError> {
        let expiry = self.month_start.with_day(day).ok_or_else(|| {
            DomainError::invalid(
                "contract",
                format!("Day {day} does not exist in {}", self.month_start.format("%Y-%m")),
            )
        })?;
        self.expiry = Some(expiry);
        Ok(self)
    }

    /// Instrument this contract belongs to.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentCode {
        &self.instrument
    }

    /// Delivery year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.month_start.year()
    }

    /// Delivery month (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.month_start.month()
    }

    /// Exchange month code of the delivery month.
    #[must_use]
    pub fn month_code(&self) -> MonthCode {
        // month_start is a validated date, so the month is always 1-12.
        MonthCode::from_month(self.month()).unwrap_or(MonthCode::F)
    }

    /// First calendar day of the delivery month.
    #[must_use]
    pub const fn month_start(&self) -> NaiveDate {
        self.month_start
    }

    /// Expiry date when the identifier carries an explicit day.
    #[must_use]
    pub const fn explicit_expiry(&self) -> Option<NaiveDate> {
        self.expiry
    }

    /// The contract `steps` positions away in `cycle`, wrapping across years.
    ///
    /// The result carries no explicit day; resolve it against stored
    /// contracts to recover one. Returns `None` when this contract's month is
    /// not part of the cycle.
    #[must_use]
    pub fn shift_in_cycle(&self, cycle: &ContractCycle, steps: i32) -> Option<Self> {
        let position = i32::try_from(cycle.position(self.month_code())?).ok()?;
        let cycle_len = i32::try_from(cycle.len()).ok()?;

        let absolute = position + steps;
        let year_shift = absolute.div_euclid(cycle_len);
        let target_index = usize::try_from(absolute.rem_euclid(cycle_len)).ok()?;
        let target_month = cycle.months().get(target_index)?.month();

        Self::new(self.instrument.clone(), self.year() + year_shift, target_month).ok()
    }
}

impl PartialEq for ContractIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.instrument == other.instrument && self.month_start == other.month_start
    }
}

impl Eq for ContractIdentifier {}

impl Hash for ContractIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instrument.hash(state);
        self.month_start.hash(state);
    }
}

impl PartialOrd for ContractIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ContractIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instrument
            .cmp(&other.instrument)
            .then(self.month_start.cmp(&other.month_start))
    }
}

impl fmt::Display for ContractIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = self.expiry.map_or(0, |d| d.day());
        write!(
            f,
            "{}_{:04}{:02}{:02}",
            self.instrument,
            self.year(),
            self.month(),
            day
        )
    }
}

impl FromStr for ContractIdentifier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            DomainError::invalid(
                "contract",
                format!("'{s}' is not of the form INSTRUMENT_YYYYMMDD"),
            )
        };

        let (instrument, stamp) = s.rsplit_once('_').ok_or_else(invalid)?;
        if stamp.len() != 8 || !stamp.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = stamp[0..4].parse().map_err(|_| invalid())?;
        let month: u32 = stamp[4..6].parse().map_err(|_| invalid())?;
        let day: u32 = stamp[6..8].parse().map_err(|_| invalid())?;

        let contract = Self::new(InstrumentCode::new(instrument)?, year, month)?;
        if day == 0 {
            Ok(contract)
        } else {
            contract.with_day(day)
        }
    }
}

impl TryFrom<String> for ContractIdentifier {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContractIdentifier> for String {
    fn from(contract: ContractIdentifier) -> Self {
        contract.to_string()
    }
}
