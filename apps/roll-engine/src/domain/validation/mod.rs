//! Validation Bounded Context
//!
//! Cross-checks roll calendars and price series against data availability and
//! liquidity. Findings are reported, never thrown.

pub mod report;
pub mod validator;

pub use report::{DataGapError, FindingCode, Severity, ValidationFinding, ValidationReport};
pub use validator::{ValidationConfig, Validator};
