//! Multiple price construction.
//!
//! Each calendar interval contributes the held contract's bars inside
//! `(previous roll, roll]`. Forward and carry closes are joined by date; a
//! missing leg stays missing and a date without a held-contract bar never
//! appears.

use std::ops::Bound;

use tracing::debug;

use super::series::{MultiplePriceRow, MultiplePriceSeries};
use crate::domain::contract_prices::{ContractPriceSet, NotFoundError};
use crate::domain::roll_calendar::RollCalendar;

/// Builds a [`MultiplePriceSeries`] from contract history and a calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MultiplePriceBuilder;

impl MultiplePriceBuilder {
    /// Create a builder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Build the multiple price series.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if an interval's current or forward contract
    /// has no series. A carry contract without a series only leaves the carry
    /// leg missing.
    pub fn build(
        &self,
        contracts: &ContractPriceSet,
        calendar: &RollCalendar,
    ) -> Result<MultiplePriceSeries, NotFoundError> {
        let mut rows = Vec::new();

        for interval in calendar.intervals() {
            let current = contracts.require(&interval.current)?;
            let forward = interval
                .forward
                .as_ref()
                .map(|contract| contracts.require(contract))
                .transpose()?;
            let carry = interval
                .carry
                .as_ref()
                .and_then(|contract| contracts.get(contract));

            let lower = interval.after.map_or(Bound::Unbounded, Bound::Excluded);
            let upper = interval.until.map_or(Bound::Unbounded, Bound::Included);

            let before = rows.len();
            rows.extend(current.range((lower, upper)).map(|bar| MultiplePriceRow {
                date: bar.date,
                price: bar.close,
                forward: forward.and_then(|series| series.close_on(bar.date)),
                carry: carry.and_then(|series| series.close_on(bar.date)),
                price_contract: interval.current.clone(),
                forward_contract: interval.forward.clone(),
                carry_contract: interval.carry.clone(),
            }));

            debug!(
                instrument = %calendar.instrument(),
                contract = %interval.current,
                rows = rows.len() - before,
                "Built multiple price segment"
            );
        }

        Ok(MultiplePriceSeries::assemble(
            calendar.instrument().clone(),
            rows,
        ))
    }
}
