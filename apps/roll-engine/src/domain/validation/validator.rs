//! Calendar and price series validation.
//!
//! Observes generator and builder output without mutating it. Findings are
//! collected into a [`ValidationReport`]; nothing here fails a run.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::report::{DataGapError, FindingCode, ValidationFinding, ValidationReport};
use crate::domain::adjusted_prices::AdjustedPriceSeries;
use crate::domain::contract_prices::ContractPriceSet;
use crate::domain::multiple_prices::MultiplePriceSeries;
use crate::domain::roll_calendar::RollCalendar;

/// Thresholds for every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Minimum calendar days between consecutive rolls.
    #[serde(default = "default_min_roll_spacing_days")]
    pub min_roll_spacing_days: i64,

    /// Minimum rolled-into volume on the roll date.
    #[serde(default = "default_min_roll_volume")]
    pub min_roll_volume: u64,

    /// Longest tolerated run of weekdays without a price.
    #[serde(default = "default_max_missing_business_days")]
    pub max_missing_business_days: u32,

    /// Minimum share of rows, in percent, carrying a forward or carry price.
    #[serde(default = "default_min_leg_coverage_pct")]
    pub min_leg_coverage_pct: Decimal,

    /// Largest tolerated absolute adjusted-price move, in percent.
    #[serde(default = "default_max_daily_move_pct")]
    pub max_daily_move_pct: Decimal,
}

const fn default_min_roll_spacing_days() -> i64 {
    20
}

const fn default_min_roll_volume() -> u64 {
    100
}

const fn default_max_missing_business_days() -> u32 {
    5
}

fn default_min_leg_coverage_pct() -> Decimal {
    dec!(90)
}

fn default_max_daily_move_pct() -> Decimal {
    dec!(20)
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_roll_spacing_days: default_min_roll_spacing_days(),
            min_roll_volume: default_min_roll_volume(),
            max_missing_business_days: default_max_missing_business_days(),
            min_leg_coverage_pct: default_min_leg_coverage_pct(),
            max_daily_move_pct: default_max_daily_move_pct(),
        }
    }
}

/// Cross-checks calendars and price series against data availability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a validator with thresholds.
    #[must_use]
    pub const fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use.
    #[must_use]
    pub const fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Check a calendar and the multiple prices built from it.
    #[must_use]
    pub fn validate(
        &self,
        calendar: &RollCalendar,
        multiple: &MultiplePriceSeries,
        contracts: &ContractPriceSet,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();
        self.check_roll_spacing(calendar, &mut report);
        self.check_roll_volume(calendar, contracts, &mut report);
        Self::check_roll_prices(calendar, multiple, &mut report);
        self.check_data_gaps(multiple, &mut report);
        self.check_leg_coverage(multiple, &mut report);
        report
    }

    /// Sanity-check a back-adjusted series.
    #[must_use]
    pub fn validate_adjusted(&self, adjusted: &AdjustedPriceSeries) -> ValidationReport {
        let mut report = ValidationReport::new();

        let negative: Vec<_> = adjusted
            .rows()
            .iter()
            .filter(|row| row.adjusted_price.is_sign_negative() && !row.adjusted_price.is_zero())
            .collect();
        if let Some(first) = negative.first() {
            report.push(
                ValidationFinding::warning(
                    FindingCode::NegativeAdjustedPrice,
                    format!(
                        "{} rows have a negative adjusted price, first on {}",
                        negative.len(),
                        first.date
                    ),
                )
                .with("count", negative.len())
                .with("first_date", first.date),
            );
        }

        let limit = self.config.max_daily_move_pct / Decimal::ONE_HUNDRED;
        for (date, change) in adjusted.returns() {
            if change.abs() > limit {
                let pct = (change * Decimal::ONE_HUNDRED).round_dp(2);
                report.push(
                    ValidationFinding::warning(
                        FindingCode::LargeDailyMove,
                        format!("Adjusted price moved {pct}% on {date}"),
                    )
                    .with("date", date)
                    .with("move_pct", pct),
                );
            }
        }

        report
    }

    fn check_roll_spacing(&self, calendar: &RollCalendar, report: &mut ValidationReport) {
        let entries = calendar.entries();
        for (previous, entry) in entries.iter().zip(entries.iter().skip(1)) {
            let days = (entry.roll_date() - previous.roll_date()).num_days();
            if days < self.config.min_roll_spacing_days {
                report.push(
                    ValidationFinding::warning(
                        FindingCode::RollSpacingTooShort,
                        format!(
                            "Rolls on {} and {} are only {days} days apart",
                            previous.roll_date(),
                            entry.roll_date()
                        ),
                    )
                    .with("roll_date", entry.roll_date())
                    .with("previous_roll_date", previous.roll_date())
                    .with("days", days),
                );
            }
        }
    }

    fn check_roll_volume(
        &self,
        calendar: &RollCalendar,
        contracts: &ContractPriceSet,
        report: &mut ValidationReport,
    ) {
        for entry in calendar.entries() {
            let volume = contracts
                .get(entry.next_contract())
                .and_then(|series| series.volume_on(entry.roll_date()));
            if let Some(volume) = volume.filter(|v| *v < self.config.min_roll_volume) {
                report.push(
                    ValidationFinding::warning(
                        FindingCode::LowRollVolume,
                        format!(
                            "{} traded only {volume} contracts on roll date {}",
                            entry.next_contract(),
                            entry.roll_date()
                        ),
                    )
                    .with("contract", entry.next_contract())
                    .with("roll_date", entry.roll_date())
                    .with("volume", volume),
                );
            }
        }
    }

    fn check_roll_prices(
        calendar: &RollCalendar,
        multiple: &MultiplePriceSeries,
        report: &mut ValidationReport,
    ) {
        for entry in calendar.entries() {
            if multiple.row_on(entry.roll_date()).is_none() {
                report.push(
                    ValidationFinding::error(
                        FindingCode::RollDateMissingPrice,
                        format!(
                            "No price for {} on roll date {}",
                            entry.current_contract(),
                            entry.roll_date()
                        ),
                    )
                    .with("contract", entry.current_contract())
                    .with("roll_date", entry.roll_date()),
                );
            }
        }
    }

    fn check_data_gaps(&self, multiple: &MultiplePriceSeries, report: &mut ValidationReport) {
        let rows = multiple.rows();
        for (previous, row) in rows.iter().zip(rows.iter().skip(1)) {
            let missing = weekdays_between(previous.date, row.date);
            if missing > self.config.max_missing_business_days {
                report.push_gap(DataGapError {
                    instrument: multiple.instrument().clone(),
                    last_price: previous.date,
                    resumed: row.date,
                    missing_business_days: missing,
                });
            }
        }
    }

    fn check_leg_coverage(&self, multiple: &MultiplePriceSeries, report: &mut ValidationReport) {
        let legs = [
            ("forward", FindingCode::LowForwardCoverage, multiple.forward_coverage_pct()),
            ("carry", FindingCode::LowCarryCoverage, multiple.carry_coverage_pct()),
        ];
        for (leg, code, coverage) in legs {
            let Some(coverage) = coverage else { continue };
            if coverage < self.config.min_leg_coverage_pct {
                let pct = coverage.round_dp(1);
                report.push(
                    ValidationFinding::warning(
                        code,
                        format!("{leg} price present on only {pct}% of rows"),
                    )
                    .with("coverage_pct", pct),
                );
            }
        }
    }
}

/// Weekdays strictly between two dates.
fn weekdays_between(from: NaiveDate, to: NaiveDate) -> u32 {
    from.iter_days()
        .skip(1)
        .take_while(|date| *date < to)
        .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
        .fold(0, |count, _| count + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::adjusted_prices::{AdjustedPriceBuilder, AdjustmentMethod};
    use crate::domain::contract_prices::{ContractPriceSeries, PriceBar};
    use crate::domain::multiple_prices::MultiplePriceRow;
    use crate::domain::roll_calendar::RollCalendarEntry;
    use crate::domain::shared::{ContractIdentifier, InstrumentCode};
    use test_case::test_case;

    fn instrument() -> InstrumentCode {
        InstrumentCode::new("SP500").unwrap()
    }

    fn contract(month: u32) -> ContractIdentifier {
        ContractIdentifier::new(instrument(), 2024, month).unwrap()
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn entry(roll: NaiveDate, current: u32, next: u32) -> RollCalendarEntry {
        RollCalendarEntry::new(roll, contract(current), contract(next), contract(next)).unwrap()
    }

    fn row(date: NaiveDate, held: u32, price: Decimal, forward: Option<Decimal>) -> MultiplePriceRow {
        MultiplePriceRow {
            date,
            price,
            forward,
            carry: forward,
            price_contract: contract(held),
            forward_contract: Some(contract(held + 3)),
            carry_contract: Some(contract(held + 3)),
        }
    }

    fn multiple(rows: Vec<MultiplePriceRow>) -> MultiplePriceSeries {
        MultiplePriceSeries::from_rows(instrument(), rows).unwrap()
    }

    #[test_case(date(3, 1), date(3, 4), 0; "friday to monday")]
    #[test_case(date(3, 1), date(3, 11), 5; "one week missing")]
    #[test_case(date(3, 1), date(3, 12), 6; "six weekdays")]
    #[test_case(date(3, 4), date(3, 5), 0; "adjacent")]
    fn counts_weekdays(from: NaiveDate, to: NaiveDate, expected: u32) {
        assert_eq!(weekdays_between(from, to), expected);
    }

    #[test]
    fn flags_rolls_too_close_together() {
        let calendar = RollCalendar::from_entries(
            instrument(),
            vec![entry(date(3, 10), 3, 6), entry(date(3, 20), 6, 9)],
            None,
        )
        .unwrap();
        let report = Validator::default().validate(
            &calendar,
            &multiple(vec![
                row(date(3, 10), 3, dec!(100), Some(dec!(101))),
                row(date(3, 20), 6, dec!(101), Some(dec!(102))),
            ]),
            &ContractPriceSet::new(instrument()),
        );

        let spacing: Vec<_> = report.with_code(FindingCode::RollSpacingTooShort).collect();
        assert_eq!(spacing.len(), 1);
        assert_eq!(spacing[0].context["days"], "10");
    }

    #[test]
    fn flags_low_volume_on_rolled_into_contract() {
        let calendar =
            RollCalendar::from_entries(instrument(), vec![entry(date(3, 10), 3, 6)], None).unwrap();
        let contracts = ContractPriceSet::from_series(
            instrument(),
            vec![
                ContractPriceSeries::new(
                    contract(6),
                    vec![PriceBar::from_close(date(3, 10), dec!(101)).with_volume(40)],
                )
                .unwrap(),
            ],
        )
        .unwrap();

        let report = Validator::default().validate(
            &calendar,
            &multiple(vec![row(date(3, 10), 3, dec!(100), Some(dec!(101)))]),
            &contracts,
        );

        assert_eq!(report.with_code(FindingCode::LowRollVolume).count(), 1);
        assert!(!report.has_errors());
    }

    #[test]
    fn unknown_volume_is_not_flagged() {
        let calendar =
            RollCalendar::from_entries(instrument(), vec![entry(date(3, 10), 3, 6)], None).unwrap();
        let contracts = ContractPriceSet::from_series(
            instrument(),
            vec![
                ContractPriceSeries::new(
                    contract(6),
                    vec![PriceBar::from_close(date(3, 10), dec!(101))],
                )
                .unwrap(),
            ],
        )
        .unwrap();

        let report = Validator::default().validate(
            &calendar,
            &multiple(vec![row(date(3, 10), 3, dec!(100), Some(dec!(101)))]),
            &contracts,
        );
        assert_eq!(report.with_code(FindingCode::LowRollVolume).count(), 0);
    }

    #[test]
    fn data_gap_is_an_error_with_typed_detail() {
        let calendar = RollCalendar::empty(instrument());
        let report = Validator::default().validate(
            &calendar,
            &multiple(vec![
                row(date(3, 1), 3, dec!(100), Some(dec!(101))),
                row(date(3, 12), 3, dec!(100), Some(dec!(101))),
            ]),
            &ContractPriceSet::new(instrument()),
        );

        assert!(report.has_errors());
        let gap = &report.data_gaps()[0];
        assert_eq!(gap.missing_business_days, 6);
        assert_eq!(gap.last_price, date(3, 1));
        assert_eq!(gap.resumed, date(3, 12));
    }

    #[test]
    fn roll_date_without_price_is_error() {
        let calendar =
            RollCalendar::from_entries(instrument(), vec![entry(date(3, 10), 3, 6)], None).unwrap();
        let report = Validator::default().validate(
            &calendar,
            &multiple(vec![row(date(3, 8), 3, dec!(100), Some(dec!(101)))]),
            &ContractPriceSet::new(instrument()),
        );
        assert_eq!(report.with_code(FindingCode::RollDateMissingPrice).count(), 1);
    }

    #[test]
    fn low_leg_coverage_warns() {
        let report = Validator::default().validate(
            &RollCalendar::empty(instrument()),
            &multiple(vec![
                row(date(3, 4), 3, dec!(100), Some(dec!(101))),
                row(date(3, 5), 3, dec!(100), None),
            ]),
            &ContractPriceSet::new(instrument()),
        );
        assert_eq!(report.with_code(FindingCode::LowForwardCoverage).count(), 1);
        assert_eq!(report.with_code(FindingCode::LowCarryCoverage).count(), 1);
    }

    #[test]
    fn adjusted_checks_flag_negative_and_large_moves() {
        let series = multiple(vec![
            row(date(3, 4), 3, dec!(1), Some(dec!(5))),
            row(date(3, 5), 6, dec!(3), None),
            row(date(3, 6), 6, dec!(5), None),
        ]);
        let adjusted = AdjustedPriceBuilder::new(AdjustmentMethod::Panama)
            .build(&series)
            .unwrap();

        let report = Validator::default().validate_adjusted(&adjusted);
        assert_eq!(report.with_code(FindingCode::NegativeAdjustedPrice).count(), 0);
        assert_eq!(report.with_code(FindingCode::LargeDailyMove).count(), 2);

        let drop = multiple(vec![
            row(date(3, 4), 3, dec!(1), Some(dec!(-1))),
            row(date(3, 5), 6, dec!(1), None),
        ]);
        let adjusted = AdjustedPriceBuilder::default().build(&drop).unwrap();
        let report = Validator::default().validate_adjusted(&adjusted);
        assert_eq!(report.with_code(FindingCode::NegativeAdjustedPrice).count(), 1);
    }
}
