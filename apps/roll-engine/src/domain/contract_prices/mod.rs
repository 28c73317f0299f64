//! Contract Prices Bounded Context
//!
//! Raw per-contract daily bars as supplied by the repository. The core reads
//! these series but never mutates them.

pub mod errors;
pub mod price_bar;
pub mod series;

pub use errors::NotFoundError;
pub use price_bar::PriceBar;
pub use series::{ContractPriceSeries, ContractPriceSet};
