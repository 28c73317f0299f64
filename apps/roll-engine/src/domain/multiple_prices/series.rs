//! Multiple price series: current, forward and carry legs per date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{ContractIdentifier, DomainError, InstrumentCode};

/// Prices of the three legs on one date, with their contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplePriceRow {
    /// Trading date.
    pub date: NaiveDate,
    /// Close of the held contract.
    pub price: Decimal,
    /// Close of the forward contract, when it traded.
    pub forward: Option<Decimal>,
    /// Close of the carry contract, when it traded.
    pub carry: Option<Decimal>,
    /// Held contract.
    pub price_contract: ContractIdentifier,
    /// Forward contract designated by the calendar.
    pub forward_contract: Option<ContractIdentifier>,
    /// Carry contract designated by the calendar.
    pub carry_contract: Option<ContractIdentifier>,
}

/// Date-ordered multiple price rows for one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiplePriceSeries {
    instrument: InstrumentCode,
    rows: Vec<MultiplePriceRow>,
}

impl MultiplePriceSeries {
    /// Build a series from rows.
    ///
    /// # Errors
    ///
    /// Returns error if dates are not strictly increasing.
    pub fn from_rows(
        instrument: InstrumentCode,
        rows: Vec<MultiplePriceRow>,
    ) -> Result<Self, DomainError> {
        if let Some(pair) = rows.windows(2).find(|pair| pair[1].date <= pair[0].date) {
            return Err(DomainError::InvariantViolation {
                aggregate: "MultiplePriceSeries".to_string(),
                invariant: "dates strictly increase".to_string(),
                state: format!("{} follows {}", pair[1].date, pair[0].date),
            });
        }
        Ok(Self { instrument, rows })
    }

    pub(crate) const fn assemble(instrument: InstrumentCode, rows: Vec<MultiplePriceRow>) -> Self {
        Self { instrument, rows }
    }

    /// Instrument code.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentCode {
        &self.instrument
    }

    /// Rows in date order.
    #[must_use]
    pub fn rows(&self) -> &[MultiplePriceRow] {
        &self.rows
    }

    /// Row on a date.
    #[must_use]
    pub fn row_on(&self, date: NaiveDate) -> Option<&MultiplePriceRow> {
        self.rows
            .binary_search_by_key(&date, |row| row.date)
            .ok()
            .and_then(|index| self.rows.get(index))
    }

    /// Maximal runs of rows sharing the same held contract, oldest first.
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &[MultiplePriceRow]> {
        self.rows
            .chunk_by(|a, b| a.price_contract == b.price_contract)
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

    /// Percentage of rows with a forward price.
    #[must_use]
    pub fn forward_coverage_pct(&self) -> Option<Decimal> {
        self.coverage_pct(|row| row.forward.is_some())
    }

    /// Percentage of rows with a carry price.
    #[must_use]
    pub fn carry_coverage_pct(&self) -> Option<Decimal> {
        self.coverage_pct(|row| row.carry.is_some())
    }

    fn coverage_pct(&self, present: impl Fn(&MultiplePriceRow) -> bool) -> Option<Decimal> {
        if self.rows.is_empty() {
            return None;
        }
        let covered = self.rows.iter().filter(|row| present(row)).count();
        Some(Decimal::from(covered) * Decimal::ONE_HUNDRED / Decimal::from(self.rows.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn contract(month: u32) -> ContractIdentifier {
        ContractIdentifier::new(InstrumentCode::new("SP500").unwrap(), 2024, month).unwrap()
    }

    fn row(day: u32, month: u32, forward: Option<Decimal>) -> MultiplePriceRow {
        MultiplePriceRow {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            price: dec!(100),
            forward,
            carry: None,
            price_contract: contract(month),
            forward_contract: None,
            carry_contract: None,
        }
    }

    #[test]
    fn from_rows_rejects_unordered_dates() {
        let result = MultiplePriceSeries::from_rows(
            InstrumentCode::new("SP500").unwrap(),
            vec![row(2, 3, None), row(1, 3, None)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn segments_split_on_contract_change() {
        let series = MultiplePriceSeries::from_rows(
            InstrumentCode::new("SP500").unwrap(),
            vec![row(1, 3, None), row(2, 3, None), row(3, 6, None)],
        )
        .unwrap();
        let lengths: Vec<_> = series.segments().map(<[_]>::len).collect();
        assert_eq!(lengths, vec![2, 1]);
    }

    #[test]
    fn coverage_counts_present_legs() {
        let series = MultiplePriceSeries::from_rows(
            InstrumentCode::new("SP500").unwrap(),
            vec![
                row(1, 3, Some(dec!(101))),
                row(2, 3, None),
                row(3, 3, Some(dec!(101))),
                row(4, 3, Some(dec!(101))),
            ],
        )
        .unwrap();
        assert_eq!(series.forward_coverage_pct(), Some(dec!(75)));
        assert_eq!(series.carry_coverage_pct(), Some(dec!(0)));
        assert!(series.row_on(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()).is_some());
        assert!(series.row_on(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()).is_none());
    }
}
