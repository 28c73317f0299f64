//! Domain Layer
//!
//! The innermost layer containing the roll and stitching logic with zero
//! infrastructure dependencies. Everything here is synchronous and pure.
//!
//! # Bounded Contexts
//!
//! - [`contract_prices`]: Raw per-contract daily bars
//! - [`roll_calendar`]: Roll parameters, calendar generation and overrides
//! - [`multiple_prices`]: Current/forward/carry legs along the calendar
//! - [`adjusted_prices`]: Panama (or ratio) back-adjusted continuous series
//! - [`validation`]: Data availability and liquidity checks

pub mod adjusted_prices;
pub mod contract_prices;
pub mod multiple_prices;
pub mod roll_calendar;
pub mod shared;
pub mod validation;
