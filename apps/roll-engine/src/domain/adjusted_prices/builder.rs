//! Back-adjustment of a multiple price series.
//!
//! Segments are walked from newest to oldest. At each roll the gap between
//! the rolled-into and rolled-out contracts is sampled on the last row of the
//! older segment and accumulated, so the newest segment is never moved.

use rust_decimal::Decimal;
use tracing::debug;

use super::errors::AdjustmentError;
use super::series::{AdjustedPriceRow, AdjustedPriceSeries, AdjustmentMethod};
use crate::domain::multiple_prices::{MultiplePriceRow, MultiplePriceSeries};
use crate::domain::shared::ContractIdentifier;

/// Builds an [`AdjustedPriceSeries`] from a [`MultiplePriceSeries`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdjustedPriceBuilder {
    method: AdjustmentMethod,
}

/// Running adjustment carried from newer to older segments.
#[derive(Debug, Clone, Copy)]
enum Adjustment {
    Offset(Decimal),
    Factor(Decimal),
}

impl Adjustment {
    const fn identity(method: AdjustmentMethod) -> Self {
        match method {
            AdjustmentMethod::Panama => Self::Offset(Decimal::ZERO),
            AdjustmentMethod::Ratio => Self::Factor(Decimal::ONE),
        }
    }

    fn apply(self, raw: Decimal) -> Decimal {
        match self {
            Self::Offset(offset) => raw + offset,
            Self::Factor(factor) => raw * factor,
        }
    }

    /// Fold in the roll sampled on `boundary`.
    fn roll(
        self,
        boundary: &MultiplePriceRow,
        rolled_into: &ContractIdentifier,
    ) -> Result<Self, AdjustmentError> {
        let forward = match (boundary.forward, &boundary.forward_contract) {
            (Some(forward), Some(contract)) if contract == rolled_into => forward,
            _ => {
                return Err(AdjustmentError::MissingRollPrice {
                    date: boundary.date,
                    rolled_out: boundary.price_contract.clone(),
                    rolled_into: rolled_into.clone(),
                });
            }
        };

        match self {
            Self::Offset(offset) => Ok(Self::Offset(offset + forward - boundary.price)),
            Self::Factor(factor) => {
                if boundary.price.is_zero() {
                    return Err(AdjustmentError::ZeroPrice {
                        date: boundary.date,
                        contract: boundary.price_contract.clone(),
                    });
                }
                Ok(Self::Factor(factor * forward / boundary.price))
            }
        }
    }
}

impl AdjustedPriceBuilder {
    /// Create a builder for an adjustment method.
    #[must_use]
    pub const fn new(method: AdjustmentMethod) -> Self {
        Self { method }
    }

    /// Adjustment method.
    #[must_use]
    pub const fn method(&self) -> AdjustmentMethod {
        self.method
    }

    /// Back-adjust `multiple`.
    ///
    /// # Errors
    ///
    /// Returns [`AdjustmentError`] if a roll boundary lacks the forward price
    /// of the rolled-into contract, or if ratio adjustment meets a zero price.
    pub fn build(
        &self,
        multiple: &MultiplePriceSeries,
    ) -> Result<AdjustedPriceSeries, AdjustmentError> {
        let mut adjustment = Adjustment::identity(self.method);
        let mut newest_first: Vec<AdjustedPriceRow> = Vec::with_capacity(multiple.len());
        let mut rolled_into: Option<&ContractIdentifier> = None;
        let mut rolls = 0_usize;

        for segment in multiple.segments().rev() {
            let (Some(first), Some(boundary)) = (segment.first(), segment.last()) else {
                continue;
            };

            if let Some(newer) = rolled_into {
                adjustment = adjustment.roll(boundary, newer)?;
                rolls += 1;
            }

            newest_first.extend(segment.iter().rev().map(|row| {
                let adjusted_price = adjustment.apply(row.price);
                AdjustedPriceRow {
                    date: row.date,
                    contract: row.price_contract.clone(),
                    raw_price: row.price,
                    adjusted_price,
                    cumulative_offset: adjusted_price - row.price,
                }
            }));

            rolled_into = Some(&first.price_contract);
        }

        newest_first.reverse();

        debug!(
            instrument = %multiple.instrument(),
            method = %self.method,
            rolls,
            rows = newest_first.len(),
            "Back-adjusted price series"
        );

        Ok(AdjustedPriceSeries::assemble(
            multiple.instrument().clone(),
            self.method,
            newest_first,
        ))
    }
}
