//! Roll calendar errors.

use chrono::NaiveDate;
use thiserror::Error;

use super::calendar::RollCalendar;
use crate::domain::contract_prices::NotFoundError;
use crate::domain::shared::{ContractIdentifier, InstrumentCode};

/// Roll parameters failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollParametersError {
    /// Roll offset must count days before expiry.
    #[error("Roll offset must be non-negative, got {0} days")]
    NegativeRollOffset(i64),

    /// Roll offset exceeds the accepted maximum.
    #[error("Roll offset of {days} days exceeds the maximum of {max}")]
    RollOffsetTooLarge {
        /// Requested offset.
        days: i64,
        /// Maximum accepted offset.
        max: i64,
    },

    /// Carry offset is neither +1 nor -1.
    #[error("Carry offset must be +1 or -1, got {0}")]
    InvalidCarryOffset(i64),

    /// Hold cycle holds a month that is never priced.
    #[error("Hold cycle {hold} is not a subset of priced cycle {priced}")]
    HoldNotSubsetOfPriced {
        /// Hold cycle.
        hold: String,
        /// Priced cycle.
        priced: String,
    },

    /// A contract cycle string could not be parsed.
    #[error("Invalid contract cycle: {0}")]
    InvalidCycle(String),
}

/// No date inside the search window on which both contracts traded.
///
/// Generation halts at this boundary; `truncated` holds every entry resolved
/// before it, with `current` as the open interval.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Insufficient overlap between {current} and {next}: no common trading date within \
     {window_days} days of {target}"
)]
pub struct InsufficientOverlapError {
    /// Instrument being generated.
    pub instrument: InstrumentCode,
    /// Contract being rolled out of.
    pub current: ContractIdentifier,
    /// Contract that could not be rolled into.
    pub next: ContractIdentifier,
    /// Target roll date the search was centred on.
    pub target: NaiveDate,
    /// Search radius in calendar days.
    pub window_days: u32,
    /// Calendar up to the last valid entry.
    pub truncated: Box<RollCalendar>,
}

/// Calendar invariant violated while constructing or overriding a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollCalendarError {
    /// Roll dates must strictly increase.
    #[error("Roll date {date} is not after previous roll date {previous}")]
    NonIncreasingRollDate {
        /// Previous roll date.
        previous: NaiveDate,
        /// Offending roll date.
        date: NaiveDate,
    },

    /// A contract can only be rolled out of once.
    #[error("Contract {contract} is the current contract of more than one entry")]
    DuplicateCurrentContract {
        /// Repeated contract.
        contract: ContractIdentifier,
    },

    /// Each entry must roll out of the contract the previous one rolled into.
    #[error("Broken roll chain: expected current contract {expected}, found {found}")]
    BrokenChain {
        /// Contract the chain requires.
        expected: ContractIdentifier,
        /// Contract supplied.
        found: ContractIdentifier,
    },

    /// Current and next contract are identical.
    #[error("Entry rolls {contract} into itself")]
    SameContract {
        /// The contract.
        contract: ContractIdentifier,
    },

    /// A contract has no bar on the roll date.
    #[error("Contract {contract} did not trade on roll date {date}")]
    RollDateNotTraded {
        /// Contract without a bar.
        contract: ContractIdentifier,
        /// Roll date.
        date: NaiveDate,
    },

    /// Entry names a contract of another instrument.
    #[error("Contract {contract} does not belong to instrument {instrument}")]
    InstrumentMismatch {
        /// Calendar instrument.
        instrument: InstrumentCode,
        /// Foreign contract.
        contract: ContractIdentifier,
    },

    /// Contract month is not part of the hold cycle.
    #[error("Contract {contract} is outside the hold cycle")]
    OutsideHoldCycle {
        /// The contract.
        contract: ContractIdentifier,
    },

    /// Not enough history to derive a roll pattern.
    #[error("At least {required} roll entries are needed, calendar has {available}")]
    InsufficientHistory {
        /// Entries required.
        required: usize,
        /// Entries present.
        available: usize,
    },

    /// A referenced contract has no price series.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}
