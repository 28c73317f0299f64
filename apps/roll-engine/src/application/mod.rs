//! Application Layer
//!
//! The application layer orchestrates domain logic through use cases.
//! It defines:
//!
//! - **Ports**: Interfaces to contract storage and artifact storage
//! - **Use Cases**: The per-instrument pipeline and the update cycle
//! - **DTOs**: Flat tables handed to storage

pub mod dto;
pub mod ports;
pub mod use_cases;

pub use dto::*;
pub use ports::*;
pub use use_cases::*;
