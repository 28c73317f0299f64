//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod contract_id;
mod instrument_code;
mod month_code;

pub use contract_id::ContractIdentifier;
pub use instrument_code::InstrumentCode;
pub use month_code::{ContractCycle, MonthCode};
