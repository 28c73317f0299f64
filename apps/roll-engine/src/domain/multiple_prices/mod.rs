//! Multiple Prices Bounded Context
//!
//! The three-legged (current/forward/carry) price series with contract
//! provenance, stitched along a roll calendar.

pub mod builder;
pub mod series;

pub use builder::MultiplePriceBuilder;
pub use series::{MultiplePriceRow, MultiplePriceSeries};
