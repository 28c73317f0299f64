//! Outcome tally for batch instrument runs.
//!
//! Workers record each finished instrument. Failures are counted per
//! [`PipelineError::kind`](crate::application::use_cases::PipelineError::kind)
//! so a batch summary shows why instruments dropped out; built instruments
//! still waiting on an undetermined roll are counted separately.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use super::result::InstrumentOutcome;

/// Shared tally of finished instruments.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    built: AtomicUsize,
    pending_roll: AtomicUsize,
    rolls: AtomicUsize,
    failures: Mutex<BTreeMap<&'static str, usize>>,
}

impl ProgressTracker {
    /// Tracker for a batch of `total` instruments.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            built: AtomicUsize::new(0),
            pending_roll: AtomicUsize::new(0),
            rolls: AtomicUsize::new(0),
            failures: Mutex::new(BTreeMap::new()),
        }
    }

    /// Count one finished instrument and return the updated snapshot.
    pub fn record(&self, outcome: &InstrumentOutcome) -> Progress {
        match &outcome.result {
            Ok(output) => {
                self.built.fetch_add(1, Ordering::Relaxed);
                self.rolls.fetch_add(output.calendar.len(), Ordering::Relaxed);
                let awaiting = output
                    .calendar
                    .open_interval()
                    .is_some_and(|open| open.forward.is_some());
                if awaiting {
                    self.pending_roll.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                *self
                    .failures
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .entry(e.kind())
                    .or_insert(0) += 1;
            }
        }
        self.snapshot()
    }

    /// Current tally.
    #[must_use]
    pub fn snapshot(&self) -> Progress {
        Progress {
            total: self.total,
            built: self.built.load(Ordering::Relaxed),
            pending_roll: self.pending_roll.load(Ordering::Relaxed),
            rolls: self.rolls.load(Ordering::Relaxed),
            failures: self
                .failures
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone(),
        }
    }
}

/// Snapshot of a batch tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Instruments in the batch.
    pub total: usize,
    /// Instruments whose pipeline produced output.
    pub built: usize,
    /// Built instruments whose open interval already names the next contract.
    pub pending_roll: usize,
    /// Resolved rolls across built instruments.
    pub rolls: usize,
    /// Failed instruments by error kind.
    pub failures: BTreeMap<&'static str, usize>,
}

impl Progress {
    /// Failed instruments.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.values().sum()
    }

    /// Instruments finished either way.
    #[must_use]
    pub fn finished(&self) -> usize {
        self.built + self.failed()
    }

    /// Instruments not yet finished.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.finished())
    }

    /// Completion percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.finished() as f64 / self.total as f64) * 100.0
        }
    }
}
