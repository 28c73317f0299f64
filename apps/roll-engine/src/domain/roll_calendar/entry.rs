//! Roll calendar entries and intervals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::RollCalendarError;
use crate::domain::shared::ContractIdentifier;

/// One roll: on `roll_date` the position moves from `current` to `next`.
///
/// `carry` may equal `next` when the carry offset is `+1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub struct RollCalendarEntry {
    roll_date: NaiveDate,
    current: ContractIdentifier,
    next: ContractIdentifier,
    carry: ContractIdentifier,
}

impl RollCalendarEntry {
    /// Create an entry.
    ///
    /// # Errors
    ///
    /// Returns error if `current` and `next` are the same contract.
    pub fn new(
        roll_date: NaiveDate,
        current: ContractIdentifier,
        next: ContractIdentifier,
        carry: ContractIdentifier,
    ) -> Result<Self, RollCalendarError> {
        if current == next {
            return Err(RollCalendarError::SameContract { contract: current });
        }
        Ok(Self {
            roll_date,
            current,
            next,
            carry,
        })
    }

    /// Entry whose contracts are already known to differ.
    pub(super) const fn resolved(
        roll_date: NaiveDate,
        current: ContractIdentifier,
        next: ContractIdentifier,
        carry: ContractIdentifier,
    ) -> Self {
        Self {
            roll_date,
            current,
            next,
            carry,
        }
    }

    /// Date of the roll (last day the current contract is held).
    #[must_use]
    pub const fn roll_date(&self) -> NaiveDate {
        self.roll_date
    }

    /// Contract rolled out of.
    #[must_use]
    pub const fn current_contract(&self) -> &ContractIdentifier {
        &self.current
    }

    /// Contract rolled into.
    #[must_use]
    pub const fn next_contract(&self) -> &ContractIdentifier {
        &self.next
    }

    /// Carry contract while `current` is held.
    #[must_use]
    pub const fn carry_contract(&self) -> &ContractIdentifier {
        &self.carry
    }
}

#[derive(Serialize, Deserialize)]
struct RawEntry {
    roll_date: NaiveDate,
    current_contract: ContractIdentifier,
    next_contract: ContractIdentifier,
    carry_contract: ContractIdentifier,
}

impl TryFrom<RawEntry> for RollCalendarEntry {
    type Error = RollCalendarError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        Self::new(
            raw.roll_date,
            raw.current_contract,
            raw.next_contract,
            raw.carry_contract,
        )
    }
}

impl From<RollCalendarEntry> for RawEntry {
    fn from(entry: RollCalendarEntry) -> Self {
        Self {
            roll_date: entry.roll_date,
            current_contract: entry.current,
            next_contract: entry.next,
            carry_contract: entry.carry,
        }
    }
}

/// The open-ended final interval: held contract with no determined roll yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenInterval {
    /// Currently held contract.
    pub current: ContractIdentifier,
    /// Next hold contract, when one is already listed.
    pub forward: Option<ContractIdentifier>,
    /// Carry contract, when it can be resolved.
    pub carry: Option<ContractIdentifier>,
}

/// Date span during which one set of contracts is active.
///
/// Covers `(after, until]`; `None` bounds are open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInterval {
    /// Exclusive lower bound (the previous roll date).
    pub after: Option<NaiveDate>,
    /// Inclusive upper bound (this interval's roll date).
    pub until: Option<NaiveDate>,
    /// Held contract.
    pub current: ContractIdentifier,
    /// Forward contract.
    pub forward: Option<ContractIdentifier>,
    /// Carry contract.
    pub carry: Option<ContractIdentifier>,
}

impl CalendarInterval {
    /// Whether `date` falls inside the interval.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.after.is_none_or(|after| date > after) && self.until.is_none_or(|until| date <= until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::InstrumentCode;

    fn contract(year: i32, month: u32) -> ContractIdentifier {
        ContractIdentifier::new(InstrumentCode::new("SP500").unwrap(), year, month).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn entry_rejects_same_contract() {
        let result = RollCalendarEntry::new(
            date(2024, 3, 10),
            contract(2024, 3),
            contract(2024, 3),
            contract(2024, 6),
        );
        assert!(matches!(result, Err(RollCalendarError::SameContract { .. })));
    }

    #[test]
    fn entry_allows_carry_equal_to_next() {
        let entry = RollCalendarEntry::new(
            date(2024, 3, 10),
            contract(2024, 3),
            contract(2024, 6),
            contract(2024, 6),
        )
        .unwrap();
        assert_eq!(entry.carry_contract(), entry.next_contract());
    }

    #[test]
    fn entry_serde_uses_table_columns() {
        let entry = RollCalendarEntry::new(
            date(2024, 3, 10),
            contract(2024, 3),
            contract(2024, 6),
            contract(2023, 12),
        )
        .unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["current_contract"], "SP500_20240300");
        assert_eq!(json["roll_date"], "2024-03-10");

        let bad = r#"{"roll_date":"2024-03-10","current_contract":"SP500_20240300",
            "next_contract":"SP500_20240300","carry_contract":"SP500_20231200"}"#;
        assert!(serde_json::from_str::<RollCalendarEntry>(bad).is_err());
    }

    #[test]
    fn interval_bounds_are_exclusive_inclusive() {
        let interval = CalendarInterval {
            after: Some(date(2024, 3, 10)),
            until: Some(date(2024, 6, 10)),
            current: contract(2024, 6),
            forward: Some(contract(2024, 9)),
            carry: None,
        };
        assert!(!interval.contains(date(2024, 3, 10)));
        assert!(interval.contains(date(2024, 3, 11)));
        assert!(interval.contains(date(2024, 6, 10)));
        assert!(!interval.contains(date(2024, 6, 11)));
    }
}
