//! Roll calendar generation.
//!
//! Walks the hold-cycle contracts in chronological order and, for each
//! consecutive pair, finds the trading date closest to the target roll date on
//! which both contracts have a bar.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::calendar::RollCalendar;
use super::entry::{OpenInterval, RollCalendarEntry};
use super::errors::InsufficientOverlapError;
use super::parameters::{RollParameters, shift_days};
use crate::domain::contract_prices::{ContractPriceSeries, ContractPriceSet};

/// Default search radius around the target roll date, in calendar days.
pub const DEFAULT_SEARCH_WINDOW_DAYS: u32 = 30;

/// Derives a [`RollCalendar`] from contract price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollCalendarGenerator {
    search_window_days: u32,
}

impl Default for RollCalendarGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_WINDOW_DAYS)
    }
}

impl RollCalendarGenerator {
    /// Create a generator searching `search_window_days` either side of the
    /// target roll date.
    #[must_use]
    pub const fn new(search_window_days: u32) -> Self {
        Self { search_window_days }
    }

    /// Search radius in calendar days.
    #[must_use]
    pub const fn search_window_days(&self) -> u32 {
        self.search_window_days
    }

    /// Generate the roll calendar for one instrument.
    ///
    /// Only contracts whose month is in the hold cycle are rolled into. The
    /// last of them has no successor and becomes the open interval.
    ///
    /// A roll whose search window reaches past the latest bar in `contracts`
    /// is not decided yet: a closer common date may still trade. The calendar
    /// then ends with the current contract held open and the next one as its
    /// forward.
    ///
    /// # Errors
    ///
    /// Returns [`InsufficientOverlapError`] at the first pair of contracts
    /// with no common trading date inside a window that lies fully within
    /// known history. The error carries the calendar resolved up to that
    /// point.
    pub fn generate(
        &self,
        contracts: &ContractPriceSet,
        params: &RollParameters,
    ) -> Result<RollCalendar, InsufficientOverlapError> {
        let instrument = contracts.instrument().clone();
        let horizon = contracts.last_date();
        let held: Vec<&ContractPriceSeries> = contracts
            .iter()
            .filter(|series| {
                params
                    .hold_cycle()
                    .contains(series.contract().month_code())
            })
            .collect();

        let mut entries: Vec<RollCalendarEntry> = Vec::with_capacity(held.len());
        let mut previous_roll: Option<NaiveDate> = None;

        for pair in held.windows(2) {
            let [current, next] = pair else { continue };
            let current_id = current.contract();
            let next_id = next.contract();
            let target = params.target_roll_date(current_id);
            let pending = || OpenInterval {
                current: current_id.clone(),
                forward: Some(next_id.clone()),
                carry: params.resolve_carry(current_id, contracts),
            };
            let known_through = |date: NaiveDate| horizon.is_some_and(|last| last >= date);

            let Some((roll_date, distance)) =
                self.find_roll_date(current, next, target, previous_roll)
            else {
                let window_end = shift_days(target, i64::from(self.search_window_days));
                if !known_through(window_end) {
                    info!(
                        instrument = %instrument,
                        current = %current_id,
                        next = %next_id,
                        target = %target,
                        "Roll not yet determined, holding current contract open"
                    );
                    return Ok(RollCalendar::assemble(instrument, entries, Some(pending())));
                }
                warn!(
                    instrument = %instrument,
                    current = %current_id,
                    next = %next_id,
                    target = %target,
                    window_days = self.search_window_days,
                    "No common trading date near target roll date, calendar truncated"
                );
                let truncated =
                    RollCalendar::assemble(instrument.clone(), entries, Some(pending()));
                return Err(InsufficientOverlapError {
                    instrument,
                    current: current_id.clone(),
                    next: next_id.clone(),
                    target,
                    window_days: self.search_window_days,
                    truncated: Box::new(truncated),
                });
            };

            // Every date closer to the target than the match must be in history.
            if distance > 0 && !known_through(shift_days(target, distance - 1)) {
                info!(
                    instrument = %instrument,
                    current = %current_id,
                    next = %next_id,
                    candidate = %roll_date,
                    target = %target,
                    "Closer roll date may still trade, holding current contract open"
                );
                return Ok(RollCalendar::assemble(instrument, entries, Some(pending())));
            }

            // Hold is a subset of priced, so the carry shift always lands.
            let carry = params
                .resolve_carry(current_id, contracts)
                .unwrap_or_else(|| next_id.clone());

            debug!(
                instrument = %instrument,
                contract = %current_id,
                next = %next_id,
                carry = %carry,
                roll_date = %roll_date,
                "Resolved roll"
            );

            entries.push(RollCalendarEntry::resolved(
                roll_date,
                current_id.clone(),
                next_id.clone(),
                carry,
            ));
            previous_roll = Some(roll_date);
        }

        let open = held.last().map(|last| {
            let current = last.contract().clone();
            let carry = params.resolve_carry(&current, contracts);
            OpenInterval {
                current,
                forward: None,
                carry,
            }
        });

        Ok(RollCalendar::assemble(instrument, entries, open))
    }

    /// Closest date to `target` on which both contracts traded, with its
    /// distance from `target` in days.
    ///
    /// Distance zero first; at each further distance the earlier date is
    /// tried before the later one. Dates on or before `not_before` are
    /// skipped so roll dates stay strictly increasing.
    fn find_roll_date(
        &self,
        current: &ContractPriceSeries,
        next: &ContractPriceSeries,
        target: NaiveDate,
        not_before: Option<NaiveDate>,
    ) -> Option<(NaiveDate, i64)> {
        let usable = |date: NaiveDate| {
            not_before.is_none_or(|previous| date > previous)
                && current.has_bar(date)
                && next.has_bar(date)
        };

        if usable(target) {
            return Some((target, 0));
        }

        (1..=i64::from(self.search_window_days)).find_map(|distance| {
            [shift_days(target, -distance), shift_days(target, distance)]
                .into_iter()
                .find(|date| usable(*date))
                .map(|date| (date, distance))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract_prices::PriceBar;
    use crate::domain::roll_calendar::parameters::CarryOffset;
    use crate::domain::shared::{ContractCycle, ContractIdentifier, InstrumentCode};
    use rust_decimal::Decimal;

    fn instrument() -> InstrumentCode {
        InstrumentCode::new("SP500").unwrap()
    }

    fn contract(year: i32, month: u32) -> ContractIdentifier {
        ContractIdentifier::new(instrument(), year, month).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(contract: ContractIdentifier, from: NaiveDate, to: NaiveDate) -> ContractPriceSeries {
        let bars = from
            .iter_days()
            .take_while(|d| *d <= to)
            .map(|d| PriceBar::from_close(d, Decimal::from(100)))
            .collect();
        ContractPriceSeries::new(contract, bars).unwrap()
    }

    fn on_dates(contract: ContractIdentifier, dates: &[NaiveDate]) -> ContractPriceSeries {
        ContractPriceSeries::new(
            contract,
            dates
                .iter()
                .map(|d| PriceBar::from_close(*d, Decimal::from(100)))
                .collect(),
        )
        .unwrap()
    }

    fn params(carry: CarryOffset) -> RollParameters {
        RollParameters::new(
            5,
            carry,
            ContractCycle::quarterly(),
            ContractCycle::quarterly(),
        )
        .unwrap()
        .with_expiry_offset_days(14)
    }

    fn set(series: Vec<ContractPriceSeries>) -> ContractPriceSet {
        ContractPriceSet::from_series(instrument(), series).unwrap()
    }

    #[test]
    fn rolls_on_target_when_both_trade() {
        let contracts = set(vec![
            daily(contract(2024, 3), date(2024, 1, 1), date(2024, 3, 15)),
            daily(contract(2024, 6), date(2024, 1, 1), date(2024, 6, 15)),
            daily(contract(2024, 9), date(2024, 4, 1), date(2024, 9, 15)),
        ]);

        let calendar = RollCalendarGenerator::default()
            .generate(&contracts, &params(CarryOffset::Next))
            .unwrap();

        let dates: Vec<_> = calendar.roll_dates().collect();
        assert_eq!(dates, vec![date(2024, 3, 10), date(2024, 6, 10)]);
        assert_eq!(calendar.entries()[0].carry_contract(), &contract(2024, 6));
        let open = calendar.open_interval().unwrap();
        assert_eq!(open.current, contract(2024, 9));
        assert_eq!(open.forward, None);
        assert_eq!(open.carry, Some(contract(2024, 12)));
    }

    #[test]
    fn equidistant_tie_prefers_earlier_date() {
        let contracts = set(vec![
            on_dates(contract(2024, 3), &[date(2024, 3, 8), date(2024, 3, 12)]),
            on_dates(contract(2024, 6), &[date(2024, 3, 8), date(2024, 3, 12)]),
        ]);

        let calendar = RollCalendarGenerator::default()
            .generate(&contracts, &params(CarryOffset::Next))
            .unwrap();

        assert_eq!(calendar.last_roll_date(), Some(date(2024, 3, 8)));
    }

    #[test]
    fn closer_later_date_beats_farther_earlier_date() {
        let contracts = set(vec![
            on_dates(contract(2024, 3), &[date(2024, 3, 5), date(2024, 3, 11)]),
            on_dates(contract(2024, 6), &[date(2024, 3, 5), date(2024, 3, 11)]),
        ]);

        let calendar = RollCalendarGenerator::default()
            .generate(&contracts, &params(CarryOffset::Next))
            .unwrap();

        assert_eq!(calendar.last_roll_date(), Some(date(2024, 3, 11)));
    }

    #[test]
    fn insufficient_overlap_truncates() {
        let contracts = set(vec![
            daily(contract(2024, 3), date(2024, 1, 1), date(2024, 3, 15)),
            daily(contract(2024, 6), date(2024, 1, 1), date(2024, 6, 15)),
            daily(contract(2024, 9), date(2024, 8, 1), date(2024, 9, 15)),
        ]);

        let err = RollCalendarGenerator::new(10)
            .generate(&contracts, &params(CarryOffset::Next))
            .unwrap_err();

        assert_eq!(err.current, contract(2024, 6));
        assert_eq!(err.next, contract(2024, 9));
        assert_eq!(err.target, date(2024, 6, 10));
        assert_eq!(err.window_days, 10);
        assert_eq!(err.truncated.len(), 1);
        let open = err.truncated.open_interval().unwrap();
        assert_eq!(open.current, contract(2024, 6));
        assert_eq!(open.forward, Some(contract(2024, 9)));
    }

    #[test]
    fn priced_only_months_are_not_rolled_into() {
        let params = RollParameters::new(
            5,
            CarryOffset::Previous,
            ContractCycle::monthly(),
            ContractCycle::quarterly(),
        )
        .unwrap()
        .with_expiry_offset_days(14);
        let contracts = set(vec![
            daily(contract(2024, 3), date(2024, 1, 1), date(2024, 3, 15)),
            daily(contract(2024, 4), date(2024, 1, 1), date(2024, 4, 15)),
            daily(contract(2024, 6), date(2024, 1, 1), date(2024, 6, 15)),
        ]);

        let calendar = RollCalendarGenerator::default()
            .generate(&contracts, &params)
            .unwrap();

        assert_eq!(calendar.len(), 1);
        let entry = &calendar.entries()[0];
        assert_eq!(entry.next_contract(), &contract(2024, 6));
        assert_eq!(entry.carry_contract(), &contract(2024, 2));
        assert_eq!(
            calendar.open_interval().unwrap().carry,
            Some(contract(2024, 5))
        );
    }

    #[test]
    fn roll_dates_stay_strictly_increasing() {
        // The second pair only overlaps on dates far before its target, one of
        // which is the first roll date itself. The September bar puts the
        // whole window inside known history.
        let contracts = set(vec![
            on_dates(contract(2024, 3), &[date(2024, 3, 10)]),
            on_dates(contract(2024, 6), &[date(2024, 3, 10), date(2024, 3, 20)]),
            on_dates(
                contract(2024, 9),
                &[date(2024, 3, 10), date(2024, 3, 20), date(2024, 9, 1)],
            ),
        ]);
        let params = RollParameters::new(
            5,
            CarryOffset::Next,
            ContractCycle::quarterly(),
            ContractCycle::quarterly(),
        )
        .unwrap()
        .with_expiry_offset_days(14);

        let result = RollCalendarGenerator::new(120).generate(&contracts, &params);
        let calendar = result.unwrap();
        let dates: Vec<_> = calendar.roll_dates().collect();
        assert_eq!(dates, vec![date(2024, 3, 10), date(2024, 3, 20)]);
    }

    #[test]
    fn single_contract_is_open_interval_only() {
        let contracts = set(vec![daily(
            contract(2024, 3),
            date(2024, 1, 1),
            date(2024, 1, 10),
        )]);
        let calendar = RollCalendarGenerator::default()
            .generate(&contracts, &params(CarryOffset::Previous))
            .unwrap();
        assert!(calendar.is_empty());
        let open = calendar.open_interval().unwrap();
        assert_eq!(open.current, contract(2024, 3));
        assert_eq!(open.carry, Some(contract(2023, 12)));
    }

    #[test]
    fn no_hold_contracts_yields_empty_calendar() {
        let contracts = set(vec![daily(
            contract(2024, 2),
            date(2024, 1, 1),
            date(2024, 1, 10),
        )]);
        let calendar = RollCalendarGenerator::default()
            .generate(&contracts, &params(CarryOffset::Next))
            .unwrap();
        assert!(calendar.is_empty());
        assert!(calendar.open_interval().is_none());
    }

    #[test]
    fn future_roll_holds_current_contract_open() {
        let h = contract(2024, 3).with_day(15).unwrap();
        let m = contract(2024, 6).with_day(15).unwrap();
        let contracts = set(vec![
            daily(h.clone(), date(2024, 1, 2), date(2024, 2, 1)),
            daily(m.clone(), date(2024, 1, 2), date(2024, 2, 1)),
        ]);

        let calendar = RollCalendarGenerator::default()
            .generate(&contracts, &params(CarryOffset::Next))
            .unwrap();

        assert!(calendar.is_empty());
        let open = calendar.open_interval().unwrap();
        assert_eq!(open.current.to_string(), "SP500_20240315");
        let name = |id: &Option<ContractIdentifier>| id.as_ref().map(ToString::to_string);
        assert_eq!(name(&open.forward).as_deref(), Some("SP500_20240615"));
        assert_eq!(name(&open.carry).as_deref(), Some("SP500_20240615"));
    }

    #[test]
    fn early_candidate_waits_until_closer_dates_are_known() {
        // Target is 2024-03-10; the latest bar is two days short of it.
        let contracts = set(vec![
            daily(contract(2023, 12), date(2023, 10, 1), date(2023, 12, 15)),
            daily(contract(2024, 3), date(2023, 10, 1), date(2024, 3, 8)),
            daily(contract(2024, 6), date(2024, 1, 1), date(2024, 3, 8)),
        ]);

        let calendar = RollCalendarGenerator::default()
            .generate(&contracts, &params(CarryOffset::Next))
            .unwrap();

        let dates: Vec<_> = calendar.roll_dates().collect();
        assert_eq!(dates, vec![date(2023, 12, 10)]);
        let open = calendar.open_interval().unwrap();
        assert_eq!(open.current, contract(2024, 3));
        assert_eq!(open.forward, Some(contract(2024, 6)));
    }

    #[test]
    fn carry_resolves_to_stored_day_bearing_contract() {
        let z = contract(2023, 12).with_day(15).unwrap();
        let h = contract(2024, 3).with_day(15).unwrap();
        let m = contract(2024, 6).with_day(15).unwrap();
        let contracts = set(vec![
            daily(z, date(2023, 10, 1), date(2023, 12, 15)),
            daily(h, date(2023, 10, 1), date(2024, 3, 15)),
            daily(m, date(2023, 12, 1), date(2024, 6, 15)),
        ]);

        let calendar = RollCalendarGenerator::default()
            .generate(&contracts, &params(CarryOffset::Previous))
            .unwrap();

        let carries: Vec<_> = calendar
            .entries()
            .iter()
            .map(|e| e.carry_contract().to_string())
            .collect();
        assert_eq!(carries, vec!["SP500_20230900", "SP500_20231215"]);
        let open_carry = calendar.open_interval().unwrap().carry.clone();
        assert_eq!(open_carry.map(|c| c.to_string()).as_deref(), Some("SP500_20240315"));
    }

    #[test]
    fn next_carry_follows_priced_cycle_when_hold_is_sparser() {
        let params = RollParameters::new(
            5,
            CarryOffset::Next,
            ContractCycle::monthly(),
            ContractCycle::quarterly(),
        )
        .unwrap()
        .with_expiry_offset_days(14);
        let contracts = set(vec![
            daily(contract(2024, 3), date(2024, 1, 1), date(2024, 3, 15)),
            daily(contract(2024, 4), date(2024, 1, 1), date(2024, 4, 15)),
            daily(contract(2024, 6), date(2024, 1, 1), date(2024, 6, 15)),
        ]);

        let calendar = RollCalendarGenerator::default()
            .generate(&contracts, &params)
            .unwrap();

        let entry = &calendar.entries()[0];
        assert_eq!(entry.next_contract(), &contract(2024, 6));
        assert_eq!(entry.carry_contract(), &contract(2024, 4));
        assert_eq!(
            calendar.open_interval().unwrap().carry,
            Some(contract(2024, 7))
        );
    }
}
