//! Roll quality analysis.
//!
//! Measures the price gap and liquidity shift at each roll. Prices are taken
//! on the roll date, or the nearest bar within [`NEAREST_BAR_MAX_DAYS`] when a
//! hand-edited roll date has no bar.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::calendar::RollCalendar;
use crate::domain::contract_prices::{ContractPriceSeries, ContractPriceSet, PriceBar};
use crate::domain::shared::ContractIdentifier;

/// Largest distance, in calendar days, to a substitute bar.
pub const NEAREST_BAR_MAX_DAYS: i64 = 3;

/// Price and volume transition at one roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollQuality {
    /// Roll date.
    pub roll_date: NaiveDate,
    /// Contract rolled out of.
    pub current_contract: ContractIdentifier,
    /// Contract rolled into.
    pub next_contract: ContractIdentifier,
    /// Close of the current contract.
    pub current_price: Option<Decimal>,
    /// Close of the next contract.
    pub next_price: Option<Decimal>,
    /// `next_price - current_price`.
    pub price_gap: Option<Decimal>,
    /// Gap as a percentage of the current price.
    pub gap_pct: Option<Decimal>,
    /// Next contract volume over current contract volume.
    pub volume_ratio: Option<Decimal>,
}

/// Analyze every roll in `calendar`.
///
/// Rolls whose contracts are missing from `contracts`, or have no bar close
/// to the roll date, are reported with empty measurements.
#[must_use]
pub fn analyze_rolls(calendar: &RollCalendar, contracts: &ContractPriceSet) -> Vec<RollQuality> {
    calendar
        .entries()
        .iter()
        .map(|entry| {
            let roll_date = entry.roll_date();
            let current_bar = contracts
                .get(entry.current_contract())
                .and_then(|series| nearest_bar(series, roll_date));
            let next_bar = contracts
                .get(entry.next_contract())
                .and_then(|series| nearest_bar(series, roll_date));

            let mut quality = RollQuality {
                roll_date,
                current_contract: entry.current_contract().clone(),
                next_contract: entry.next_contract().clone(),
                current_price: None,
                next_price: None,
                price_gap: None,
                gap_pct: None,
                volume_ratio: None,
            };

            if let (Some(current), Some(next)) = (current_bar, next_bar) {
                let gap = next.close - current.close;
                quality.current_price = Some(current.close);
                quality.next_price = Some(next.close);
                quality.price_gap = Some(gap);
                quality.gap_pct = (!current.close.is_zero())
                    .then(|| gap / current.close * Decimal::ONE_HUNDRED);
                quality.volume_ratio = match (current.volume, next.volume) {
                    (Some(current_volume), Some(next_volume)) if current_volume > 0 => {
                        Some(Decimal::from(next_volume) / Decimal::from(current_volume))
                    }
                    _ => None,
                };
            }

            quality
        })
        .collect()
}

fn nearest_bar(series: &ContractPriceSeries, date: NaiveDate) -> Option<&PriceBar> {
    if let Some(bar) = series.bar_on(date) {
        return Some(bar);
    }

    let window = chrono::Duration::days(NEAREST_BAR_MAX_DAYS);
    let before = series
        .range(..date)
        .next_back()
        .filter(|bar| date - bar.date <= window);
    let after = series
        .range(date..)
        .next()
        .filter(|bar| bar.date - date <= window);

    match (before, after) {
        (Some(b), Some(a)) if a.date - date < date - b.date => Some(a),
        (Some(b), _) => Some(b),
        (None, a) => a,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::roll_calendar::entry::RollCalendarEntry;
    use crate::domain::shared::InstrumentCode;
    use rust_decimal_macros::dec;

    fn instrument() -> InstrumentCode {
        InstrumentCode::new("SP500").unwrap()
    }

    fn contract(year: i32, month: u32) -> ContractIdentifier {
        ContractIdentifier::new(instrument(), year, month).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar() -> RollCalendar {
        RollCalendar::from_entries(
            instrument(),
            vec![
                RollCalendarEntry::new(
                    date(2024, 3, 10),
                    contract(2024, 3),
                    contract(2024, 6),
                    contract(2024, 6),
                )
                .unwrap(),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn measures_gap_and_volume_ratio() {
        let contracts = ContractPriceSet::from_series(
            instrument(),
            vec![
                ContractPriceSeries::new(
                    contract(2024, 3),
                    vec![PriceBar::from_close(date(2024, 3, 10), dec!(100)).with_volume(400)],
                )
                .unwrap(),
                ContractPriceSeries::new(
                    contract(2024, 6),
                    vec![PriceBar::from_close(date(2024, 3, 10), dec!(101.5)).with_volume(1000)],
                )
                .unwrap(),
            ],
        )
        .unwrap();

        let report = analyze_rolls(&calendar(), &contracts);
        assert_eq!(report.len(), 1);
        let roll = &report[0];
        assert_eq!(roll.price_gap, Some(dec!(1.5)));
        assert_eq!(roll.gap_pct, Some(dec!(1.5)));
        assert_eq!(roll.volume_ratio, Some(dec!(2.5)));
    }

    #[test]
    fn uses_nearest_bar_within_window() {
        let contracts = ContractPriceSet::from_series(
            instrument(),
            vec![
                ContractPriceSeries::new(
                    contract(2024, 3),
                    vec![
                        PriceBar::from_close(date(2024, 3, 6), dec!(90)),
                        PriceBar::from_close(date(2024, 3, 8), dec!(99)),
                    ],
                )
                .unwrap(),
                ContractPriceSeries::new(
                    contract(2024, 6),
                    vec![PriceBar::from_close(date(2024, 3, 20), dec!(101))],
                )
                .unwrap(),
            ],
        )
        .unwrap();

        let report = analyze_rolls(&calendar(), &contracts);
        assert_eq!(report[0].current_price, None);
        assert_eq!(report[0].price_gap, None);

        let series = contracts.get(&contract(2024, 3)).unwrap();
        assert_eq!(
            nearest_bar(series, date(2024, 3, 10)).map(|b| b.close),
            Some(dec!(99))
        );
    }

    #[test]
    fn missing_contract_reports_empty_measurements() {
        let contracts = ContractPriceSet::new(instrument());
        let report = analyze_rolls(&calendar(), &contracts);
        assert_eq!(report[0].next_price, None);
        assert_eq!(report[0].volume_ratio, None);
    }
}
