//! Roll Calendar Bounded Context
//!
//! Decides when a position moves from one futures contract to the next.
//!
//! # Components
//!
//! - [`RollParameters`]: per-instrument roll offset, carry offset and cycles
//! - [`RollCalendarGenerator`]: derives a calendar from contract history
//! - [`RollCalendar`]: validated chain of roll entries with manual overrides
//! - [`analyze_rolls`]: price gap and volume shift at each roll

pub mod analysis;
pub mod calendar;
pub mod entry;
pub mod errors;
pub mod generator;
pub mod parameters;

pub use analysis::{RollQuality, analyze_rolls};
pub use calendar::{OverrideOutcome, RollCalendar};
pub use entry::{CalendarInterval, OpenInterval, RollCalendarEntry};
pub use errors::{InsufficientOverlapError, RollCalendarError, RollParametersError};
pub use generator::{DEFAULT_SEARCH_WINDOW_DAYS, RollCalendarGenerator};
pub use parameters::{AssetClass, CarryOffset, MAX_ROLL_OFFSET_DAYS, RollParameters};
