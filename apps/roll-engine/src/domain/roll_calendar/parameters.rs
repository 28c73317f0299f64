//! Per-instrument roll parameters.
//!
//! Loaded once per instrument and read-only thereafter. The generator uses them
//! to compute each contract's target roll date and to pick the carry leg.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::errors::RollParametersError;
use crate::domain::contract_prices::ContractPriceSet;
use crate::domain::shared::{ContractCycle, ContractIdentifier};

/// Largest accepted roll offset, in calendar days.
pub const MAX_ROLL_OFFSET_DAYS: i64 = 365;

/// Which neighbour of the current contract supplies the carry leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CarryOffset {
    /// Carry is the next contract (`+1`), i.e. the one rolled into.
    Next,
    /// Carry is the contract preceding current in the priced cycle (`-1`).
    Previous,
}

impl CarryOffset {
    /// Signed cycle step (`+1` or `-1`).
    #[must_use]
    pub const fn steps(self) -> i32 {
        match self {
            Self::Next => 1,
            Self::Previous => -1,
        }
    }
}

impl TryFrom<i64> for CarryOffset {
    type Error = RollParametersError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Next),
            -1 => Ok(Self::Previous),
            other => Err(RollParametersError::InvalidCarryOffset(other)),
        }
    }
}

impl From<CarryOffset> for i64 {
    fn from(offset: CarryOffset) -> Self {
        i64::from(offset.steps())
    }
}

/// Broad asset classes with default roll conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Equity index futures.
    Equity,
    /// Government bond futures.
    Bond,
    /// Currency futures.
    Fx,
    /// Precious and base metals.
    Metals,
    /// Crude, products and natural gas.
    Energy,
    /// Grains, softs and livestock.
    Ags,
    /// Volatility index futures.
    Vol,
}

/// Immutable roll configuration for one instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollParameters {
    roll_offset_days: u32,
    carry_offset: CarryOffset,
    priced_cycle: ContractCycle,
    hold_cycle: ContractCycle,
    expiry_offset_days: i32,
}

impl RollParameters {
    /// Create validated roll parameters.
    ///
    /// `roll_offset_days` counts days *before* expiry.
    ///
    /// # Errors
    ///
    /// Returns error if the roll offset is negative or larger than a year, or
    /// if the hold cycle is not a subset of the priced cycle.
    pub fn new(
        roll_offset_days: i64,
        carry_offset: CarryOffset,
        priced_cycle: ContractCycle,
        hold_cycle: ContractCycle,
    ) -> Result<Self, RollParametersError> {
        if roll_offset_days < 0 {
            return Err(RollParametersError::NegativeRollOffset(roll_offset_days));
        }
        if roll_offset_days > MAX_ROLL_OFFSET_DAYS {
            return Err(RollParametersError::RollOffsetTooLarge {
                days: roll_offset_days,
                max: MAX_ROLL_OFFSET_DAYS,
            });
        }
        if !hold_cycle.is_subset_of(&priced_cycle) {
            return Err(RollParametersError::HoldNotSubsetOfPriced {
                hold: hold_cycle.to_string(),
                priced: priced_cycle.to_string(),
            });
        }

        Ok(Self {
            roll_offset_days: u32::try_from(roll_offset_days)
                .map_err(|_| RollParametersError::NegativeRollOffset(roll_offset_days))?,
            carry_offset,
            priced_cycle,
            hold_cycle,
            expiry_offset_days: 0,
        })
    }

    /// Default parameters for an asset class.
    #[must_use]
    pub fn preset(asset_class: AssetClass) -> Self {
        use crate::domain::shared::MonthCode::{G, H, J, K, M, N, Q, U, V, Z};

        let quarterly = ContractCycle::quarterly();
        let monthly = ContractCycle::monthly();
        let (roll_offset_days, priced_cycle, hold_cycle) = match asset_class {
            AssetClass::Equity | AssetClass::Bond | AssetClass::Fx => {
                (5, quarterly.clone(), quarterly)
            }
            AssetClass::Metals => {
                let cycle = ContractCycle::new([G, J, M, Q, V, Z]).unwrap_or(quarterly);
                (5, cycle.clone(), cycle)
            }
            AssetClass::Energy => (3, monthly.clone(), monthly),
            AssetClass::Ags => {
                let hold = ContractCycle::new([H, K, N, U, Z]).unwrap_or(quarterly);
                (5, monthly, hold)
            }
            AssetClass::Vol => (30, monthly.clone(), monthly),
        };

        Self {
            roll_offset_days,
            carry_offset: CarryOffset::Previous,
            priced_cycle,
            hold_cycle,
            expiry_offset_days: 0,
        }
    }

    /// Set the expiry offset used for contracts without an explicit day.
    #[must_use]
    pub const fn with_expiry_offset_days(mut self, days: i32) -> Self {
        self.expiry_offset_days = days;
        self
    }

    /// Days before expiry to target the roll.
    #[must_use]
    pub const fn roll_offset_days(&self) -> u32 {
        self.roll_offset_days
    }

    /// Carry leg selection.
    #[must_use]
    pub const fn carry_offset(&self) -> CarryOffset {
        self.carry_offset
    }

    /// Months with a tradable, priced contract.
    #[must_use]
    pub const fn priced_cycle(&self) -> &ContractCycle {
        &self.priced_cycle
    }

    /// Months actually held and rolled into.
    #[must_use]
    pub const fn hold_cycle(&self) -> &ContractCycle {
        &self.hold_cycle
    }

    /// Days after the first of the delivery month that a contract expires.
    #[must_use]
    pub const fn expiry_offset_days(&self) -> i32 {
        self.expiry_offset_days
    }

    /// Expiry date of a contract.
    ///
    /// An explicit day on the identifier wins; otherwise the first of the
    /// delivery month shifted by `expiry_offset_days`.
    #[must_use]
    pub fn expiry_date(&self, contract: &ContractIdentifier) -> NaiveDate {
        contract
            .explicit_expiry()
            .unwrap_or_else(|| shift_days(contract.month_start(), i64::from(self.expiry_offset_days)))
    }

    /// Expiry minus the roll offset.
    #[must_use]
    pub fn target_roll_date(&self, contract: &ContractIdentifier) -> NaiveDate {
        shift_days(
            self.expiry_date(contract),
            -i64::from(self.roll_offset_days),
        )
    }

    /// Carry contract for `current`: one step forward or back in the priced
    /// cycle, independent of which contract is held next.
    ///
    /// The result carries no expiry day; resolve it against the stored
    /// contracts before reading expiries.
    #[must_use]
    pub fn carry_for(&self, current: &ContractIdentifier) -> Option<ContractIdentifier> {
        current.shift_in_cycle(&self.priced_cycle, self.carry_offset.steps())
    }

    /// [`Self::carry_for`], swapped for the stored identifier when the carry
    /// contract has price history.
    #[must_use]
    pub fn resolve_carry(
        &self,
        current: &ContractIdentifier,
        contracts: &ContractPriceSet,
    ) -> Option<ContractIdentifier> {
        let carry = self.carry_for(current)?;
        Some(contracts.resolve(&carry).cloned().unwrap_or(carry))
    }
}

/// Shift a date by a signed number of days, saturating at the calendar edge.
pub(crate) fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    shifted.unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::InstrumentCode;
    use test_case::test_case;

    fn contract(year: i32, month: u32) -> ContractIdentifier {
        ContractIdentifier::new(InstrumentCode::new("SP500").unwrap(), year, month).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn quarterly(offset: i64, carry: CarryOffset) -> RollParameters {
        RollParameters::new(
            offset,
            carry,
            ContractCycle::quarterly(),
            ContractCycle::quarterly(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_negative_roll_offset() {
        let err = RollParameters::new(
            -5,
            CarryOffset::Next,
            ContractCycle::quarterly(),
            ContractCycle::quarterly(),
        )
        .unwrap_err();
        assert_eq!(err, RollParametersError::NegativeRollOffset(-5));
    }

    #[test]
    fn rejects_roll_offset_over_a_year() {
        let result = RollParameters::new(
            400,
            CarryOffset::Next,
            ContractCycle::quarterly(),
            ContractCycle::quarterly(),
        );
        assert!(matches!(
            result,
            Err(RollParametersError::RollOffsetTooLarge { days: 400, .. })
        ));
    }

    #[test]
    fn rejects_hold_outside_priced() {
        let result = RollParameters::new(
            5,
            CarryOffset::Next,
            ContractCycle::quarterly(),
            ContractCycle::monthly(),
        );
        assert!(matches!(
            result,
            Err(RollParametersError::HoldNotSubsetOfPriced { .. })
        ));
    }

    #[test_case(1, Some(CarryOffset::Next))]
    #[test_case(-1, Some(CarryOffset::Previous))]
    #[test_case(0, None)]
    #[test_case(2, None)]
    fn carry_offset_from_integer(value: i64, expected: Option<CarryOffset>) {
        assert_eq!(CarryOffset::try_from(value).ok(), expected);
    }

    #[test]
    fn expiry_prefers_explicit_day() {
        let params = quarterly(5, CarryOffset::Next).with_expiry_offset_days(20);
        let explicit = contract(2024, 3).with_day(15).unwrap();
        assert_eq!(params.expiry_date(&explicit), date(2024, 3, 15));
        assert_eq!(params.expiry_date(&contract(2024, 3)), date(2024, 3, 21));
    }

    #[test]
    fn target_roll_date_subtracts_offset() {
        let params = quarterly(5, CarryOffset::Next);
        let explicit = contract(2024, 3).with_day(15).unwrap();
        assert_eq!(params.target_roll_date(&explicit), date(2024, 3, 10));
        assert_eq!(params.target_roll_date(&contract(2024, 3)), date(2024, 2, 25));
    }

    #[test]
    fn carry_next_is_next_priced_contract() {
        let params = quarterly(5, CarryOffset::Next);
        assert_eq!(params.carry_for(&contract(2024, 3)), Some(contract(2024, 6)));
        assert_eq!(params.carry_for(&contract(2024, 12)), Some(contract(2025, 3)));
    }

    #[test]
    fn carry_next_walks_priced_cycle_not_hold_cycle() {
        let params = RollParameters::new(
            5,
            CarryOffset::Next,
            ContractCycle::monthly(),
            ContractCycle::quarterly(),
        )
        .unwrap();
        assert_eq!(params.carry_for(&contract(2024, 3)), Some(contract(2024, 4)));
    }

    #[test]
    fn carry_previous_wraps_year() {
        let params = quarterly(5, CarryOffset::Previous);
        assert_eq!(params.carry_for(&contract(2024, 3)), Some(contract(2023, 12)));
    }

    #[test]
    fn carry_previous_walks_priced_cycle() {
        let params = RollParameters::preset(AssetClass::Ags);
        assert_eq!(params.carry_for(&contract(2024, 5)), Some(contract(2024, 4)));
    }

    #[test]
    fn carry_outside_priced_cycle_is_none() {
        let params = quarterly(5, CarryOffset::Next);
        assert_eq!(params.carry_for(&contract(2024, 4)), None);
    }

    #[test_case(AssetClass::Equity, 5, "HMUZ", "HMUZ")]
    #[test_case(AssetClass::Metals, 5, "GJMQVZ", "GJMQVZ")]
    #[test_case(AssetClass::Energy, 3, "FGHJKMNQUVXZ", "FGHJKMNQUVXZ")]
    #[test_case(AssetClass::Ags, 5, "FGHJKMNQUVXZ", "HKNUZ")]
    #[test_case(AssetClass::Vol, 30, "FGHJKMNQUVXZ", "FGHJKMNQUVXZ")]
    fn presets(class: AssetClass, offset: u32, priced: &str, hold: &str) {
        let params = RollParameters::preset(class);
        assert_eq!(params.roll_offset_days(), offset);
        assert_eq!(params.priced_cycle().to_string(), priced);
        assert_eq!(params.hold_cycle().to_string(), hold);
        assert_eq!(params.carry_offset(), CarryOffset::Previous);
        assert!(params.hold_cycle().is_subset_of(params.priced_cycle()));
    }
}
