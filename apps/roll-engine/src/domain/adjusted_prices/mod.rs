//! Adjusted Prices Bounded Context
//!
//! A single continuous series free of the jumps at contract rolls, anchored at
//! the currently held contract and propagated backward.

pub mod builder;
pub mod errors;
pub mod series;

pub use builder::AdjustedPriceBuilder;
pub use errors::AdjustmentError;
pub use series::{AdjustedPriceRow, AdjustedPriceSeries, AdjustmentMethod};
