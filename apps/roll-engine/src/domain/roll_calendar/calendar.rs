//! Roll calendar aggregate.
//!
//! An ordered chain of roll entries plus the open-ended final interval.
//!
//! # Invariants
//!
//! - Roll dates strictly increase
//! - No contract is rolled out of twice
//! - `entries[i].next == entries[i + 1].current`
//! - The open interval holds the contract the last entry rolled into
//!
//! Every constructor and mutation re-checks the full set; a failed override
//! leaves the calendar untouched.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use super::entry::{CalendarInterval, OpenInterval, RollCalendarEntry};
use super::errors::RollCalendarError;
use super::parameters::{RollParameters, shift_days};
use crate::domain::contract_prices::ContractPriceSet;
use crate::domain::shared::{ContractIdentifier, InstrumentCode};

/// Result of a successful override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideOutcome {
    /// Entry was chained after the last entry.
    Appended,
    /// Entry replaced the one rolling out of the same contract.
    Replaced,
}

/// When to roll, contract by contract, for one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollCalendar {
    instrument: InstrumentCode,
    entries: Vec<RollCalendarEntry>,
    open: Option<OpenInterval>,
}

impl RollCalendar {
    /// Calendar with no entries and no held contract.
    #[must_use]
    pub const fn empty(instrument: InstrumentCode) -> Self {
        Self {
            instrument,
            entries: Vec::new(),
            open: None,
        }
    }

    /// Build a calendar from entries, checking every invariant.
    ///
    /// When `open` is `None` and entries exist, the open interval holds the
    /// last entry's next contract with no forward or carry.
    ///
    /// No price data is consulted, so a roll date may fall on a day one of
    /// its contracts did not trade. The Panama jump is then sampled on the
    /// last row before the roll where both contracts have a price. Call
    /// [`Self::verify_traded`] to reject such calendars.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn from_entries(
        instrument: InstrumentCode,
        entries: Vec<RollCalendarEntry>,
        open: Option<OpenInterval>,
    ) -> Result<Self, RollCalendarError> {
        let open = open.or_else(|| {
            entries.last().map(|last| OpenInterval {
                current: last.next_contract().clone(),
                forward: None,
                carry: None,
            })
        });
        check_invariants(&instrument, &entries, open.as_ref())?;
        Ok(Self {
            instrument,
            entries,
            open,
        })
    }

    /// Assemble parts the generator already validated.
    pub(crate) const fn assemble(
        instrument: InstrumentCode,
        entries: Vec<RollCalendarEntry>,
        open: Option<OpenInterval>,
    ) -> Self {
        Self {
            instrument,
            entries,
            open,
        }
    }

    /// Instrument code.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentCode {
        &self.instrument
    }

    /// Entries in roll date order.
    #[must_use]
    pub fn entries(&self) -> &[RollCalendarEntry] {
        &self.entries
    }

    /// Open-ended final interval.
    #[must_use]
    pub const fn open_interval(&self) -> Option<&OpenInterval> {
        self.open.as_ref()
    }

    /// Number of roll entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the calendar has no roll entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Roll dates in order.
    pub fn roll_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.entries.iter().map(RollCalendarEntry::roll_date)
    }

    /// Most recent roll date.
    #[must_use]
    pub fn last_roll_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(RollCalendarEntry::roll_date)
    }

    /// Holding intervals, oldest first, ending with the open interval.
    #[must_use]
    pub fn intervals(&self) -> Vec<CalendarInterval> {
        let mut intervals = Vec::with_capacity(self.entries.len() + 1);
        let mut after = None;

        for entry in &self.entries {
            intervals.push(CalendarInterval {
                after,
                until: Some(entry.roll_date()),
                current: entry.current_contract().clone(),
                forward: Some(entry.next_contract().clone()),
                carry: Some(entry.carry_contract().clone()),
            });
            after = Some(entry.roll_date());
        }

        if let Some(open) = &self.open {
            intervals.push(CalendarInterval {
                after,
                until: None,
                current: open.current.clone(),
                forward: open.forward.clone(),
                carry: open.carry.clone(),
            });
        }

        intervals
    }

    /// Contracts active on `date`.
    #[must_use]
    pub fn contracts_on(&self, date: NaiveDate) -> Option<CalendarInterval> {
        self.intervals()
            .into_iter()
            .find(|interval| interval.contains(date))
    }

    /// Contract held on `date`.
    #[must_use]
    pub fn held_contract(&self, date: NaiveDate) -> Option<ContractIdentifier> {
        self.contracts_on(date).map(|interval| interval.current)
    }

    /// Check that both contracts of every entry traded on its roll date.
    ///
    /// # Errors
    ///
    /// Returns [`RollCalendarError::RollDateNotTraded`] for the first entry
    /// with a missing bar, or a not-found error for a contract without price
    /// history.
    pub fn verify_traded(&self, contracts: &ContractPriceSet) -> Result<(), RollCalendarError> {
        self.entries
            .iter()
            .try_for_each(|entry| check_traded(entry, contracts))
    }

    /// Append or replace an entry by hand.
    ///
    /// An entry whose current contract already rolls in the calendar replaces
    /// that entry; otherwise it is chained after the last entry. Both
    /// contracts must have traded on the roll date. When the chain end moves,
    /// the open interval is re-resolved from `contracts` and `params`.
    ///
    /// # Errors
    ///
    /// Returns the violated invariant; the calendar is unchanged on error.
    pub fn apply_override(
        &mut self,
        entry: RollCalendarEntry,
        contracts: &ContractPriceSet,
        params: &RollParameters,
    ) -> Result<OverrideOutcome, RollCalendarError> {
        check_traded(&entry, contracts)?;

        let mut candidate = self.entries.clone();
        let replaced = candidate
            .iter()
            .position(|existing| existing.current_contract() == entry.current_contract());
        let outcome = if let Some(index) = replaced {
            candidate[index] = entry;
            OverrideOutcome::Replaced
        } else {
            if let (None, Some(open)) = (candidate.last(), &self.open) {
                if &open.current != entry.current_contract() {
                    return Err(RollCalendarError::BrokenChain {
                        expected: open.current.clone(),
                        found: entry.current_contract().clone(),
                    });
                }
            }
            candidate.push(entry);
            OverrideOutcome::Appended
        };

        let open = self.reconcile_open(&candidate, contracts, params);
        check_invariants(&self.instrument, &candidate, open.as_ref())?;

        self.entries = candidate;
        self.open = open;
        Ok(outcome)
    }

    /// Project `periods` further rolls from the historic roll pattern.
    ///
    /// Each projected roll is spaced by the median spacing of existing roll
    /// dates and moves one step along the hold cycle. Projections are checked
    /// against calendar ordering but not against price data.
    ///
    /// # Errors
    ///
    /// Returns error with fewer than two entries, or when the chain end is
    /// outside the hold cycle.
    pub fn extend_by_pattern(
        &self,
        periods: usize,
        params: &RollParameters,
    ) -> Result<Self, RollCalendarError> {
        if self.entries.len() < 2 {
            return Err(RollCalendarError::InsufficientHistory {
                required: 2,
                available: self.entries.len(),
            });
        }

        let spacing = median_spacing_days(&self.entries);
        let mut entries = self.entries.clone();
        let (mut current, mut roll_date) = match entries.last() {
            Some(last) => (last.next_contract().clone(), last.roll_date()),
            None => return Ok(self.clone()),
        };

        for _ in 0..periods {
            let next = current
                .shift_in_cycle(params.hold_cycle(), 1)
                .ok_or_else(|| RollCalendarError::OutsideHoldCycle {
                    contract: current.clone(),
                })?;
            roll_date = shift_days(roll_date, spacing);
            let carry = params.carry_for(&current).unwrap_or_else(|| next.clone());
            entries.push(RollCalendarEntry::new(
                roll_date,
                current,
                next.clone(),
                carry,
            )?);
            current = next;
        }

        let carry = params.carry_for(&current);
        let open = OpenInterval {
            current,
            forward: None,
            carry,
        };
        Self::from_entries(self.instrument.clone(), entries, Some(open))
    }

    fn reconcile_open(
        &self,
        candidate: &[RollCalendarEntry],
        contracts: &ContractPriceSet,
        params: &RollParameters,
    ) -> Option<OpenInterval> {
        let Some(last) = candidate.last() else {
            return self.open.clone();
        };
        let current = last.next_contract();
        if let Some(open) = self.open.as_ref().filter(|open| &open.current == current) {
            return Some(open.clone());
        }

        let forward = current
            .shift_in_cycle(params.hold_cycle(), 1)
            .and_then(|forward| contracts.resolve(&forward).cloned());
        let carry = params.resolve_carry(current, contracts);
        Some(OpenInterval {
            current: current.clone(),
            forward,
            carry,
        })
    }
}

fn check_traded(
    entry: &RollCalendarEntry,
    contracts: &ContractPriceSet,
) -> Result<(), RollCalendarError> {
    for contract in [entry.current_contract(), entry.next_contract()] {
        if !contracts.require(contract)?.has_bar(entry.roll_date()) {
            return Err(RollCalendarError::RollDateNotTraded {
                contract: contract.clone(),
                date: entry.roll_date(),
            });
        }
    }
    Ok(())
}

fn check_invariants(
    instrument: &InstrumentCode,
    entries: &[RollCalendarEntry],
    open: Option<&OpenInterval>,
) -> Result<(), RollCalendarError> {
    let mut rolled_out = BTreeSet::new();

    for entry in entries {
        for contract in [
            entry.current_contract(),
            entry.next_contract(),
            entry.carry_contract(),
        ] {
            if contract.instrument() != instrument {
                return Err(RollCalendarError::InstrumentMismatch {
                    instrument: instrument.clone(),
                    contract: contract.clone(),
                });
            }
        }
        if !rolled_out.insert(entry.current_contract()) {
            return Err(RollCalendarError::DuplicateCurrentContract {
                contract: entry.current_contract().clone(),
            });
        }
    }

    for (previous, entry) in entries.iter().zip(entries.iter().skip(1)) {
        if entry.roll_date() <= previous.roll_date() {
            return Err(RollCalendarError::NonIncreasingRollDate {
                previous: previous.roll_date(),
                date: entry.roll_date(),
            });
        }
        if entry.current_contract() != previous.next_contract() {
            return Err(RollCalendarError::BrokenChain {
                expected: previous.next_contract().clone(),
                found: entry.current_contract().clone(),
            });
        }
    }

    if let (Some(last), Some(open)) = (entries.last(), open) {
        if &open.current != last.next_contract() {
            return Err(RollCalendarError::BrokenChain {
                expected: last.next_contract().clone(),
                found: open.current.clone(),
            });
        }
    }

    Ok(())
}

fn median_spacing_days(entries: &[RollCalendarEntry]) -> i64 {
    let mut spacings: Vec<i64> = entries
        .iter()
        .zip(entries.iter().skip(1))
        .map(|(a, b)| (b.roll_date() - a.roll_date()).num_days())
        .collect();
    spacings.sort_unstable();

    let mid = spacings.len() / 2;
    match (spacings.get(mid.wrapping_sub(1)), spacings.get(mid)) {
        (Some(low), Some(high)) if spacings.len() % 2 == 0 => (low + high) / 2,
        (_, Some(middle)) => *middle,
        _ => 0,
    }
}
