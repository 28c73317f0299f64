//! Instrument code value object.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// A futures instrument code (e.g. "SP500", "CRUDE_W", "EDOLLAR").
///
/// The code is normalized to uppercase. Underscores are allowed because the
/// instrument universe uses them ("GAS_US"), so contract identifiers split
/// on the *last* underscore.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstrumentCode(String);

impl InstrumentCode {
    /// Create a validated instrument code.
    ///
    /// # Errors
    ///
    /// Returns error if the code is empty, too long, or contains characters
    /// other than ASCII alphanumerics and underscores.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_uppercase();

        if value.is_empty() {
            return Err(DomainError::invalid(
                "instrument",
                "Instrument code cannot be empty",
            ));
        }

        if value.len() > 32 {
            return Err(DomainError::invalid(
                "instrument",
                "Instrument code exceeds maximum length",
            ));
        }

        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(DomainError::invalid(
                "instrument",
                format!("Instrument code '{value}' contains invalid characters"),
            ));
        }

        Ok(Self(value))
    }

    /// Get the code string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for InstrumentCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InstrumentCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for InstrumentCode {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InstrumentCode> for String {
    fn from(code: InstrumentCode) -> Self {
        code.0
    }
}
