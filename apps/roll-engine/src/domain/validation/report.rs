//! Validation findings and reports.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::shared::InstrumentCode;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Suspicious but usable.
    Warning,
    /// Data is known to be wrong or incomplete.
    Error,
}

impl Severity {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    /// Two rolls closer together than the configured minimum.
    RollSpacingTooShort,
    /// Rolled-into contract traded thinly on the roll date.
    LowRollVolume,
    /// Too many consecutive weekdays without a price.
    DataGap,
    /// A roll date has no multiple price row.
    RollDateMissingPrice,
    /// Forward leg is missing on too many rows.
    LowForwardCoverage,
    /// Carry leg is missing on too many rows.
    LowCarryCoverage,
    /// Adjusted price below zero.
    NegativeAdjustedPrice,
    /// Adjusted price moved more than the configured limit in one step.
    LargeDailyMove,
}

impl FindingCode {
    /// Code as written in reports and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RollSpacingTooShort => "ROLL_SPACING_TOO_SHORT",
            Self::LowRollVolume => "LOW_ROLL_VOLUME",
            Self::DataGap => "DATA_GAP",
            Self::RollDateMissingPrice => "ROLL_DATE_MISSING_PRICE",
            Self::LowForwardCoverage => "LOW_FORWARD_COVERAGE",
            Self::LowCarryCoverage => "LOW_CARRY_COVERAGE",
            Self::NegativeAdjustedPrice => "NEGATIVE_ADJUSTED_PRICE",
            Self::LargeDailyMove => "LARGE_DAILY_MOVE",
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation about calendar or price quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    /// Severity.
    pub severity: Severity,
    /// Check that fired.
    pub code: FindingCode,
    /// Human-readable description.
    pub message: String,
    /// Structured details (dates, contracts, measured values).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl ValidationFinding {
    /// Warning-level finding.
    pub fn warning(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Error-level finding.
    pub fn error(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Attach a context value.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }
}

/// Run of weekdays with no price row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error(
    "{instrument}: {missing_business_days} business days without a price between {last_price} \
     and {resumed}"
)]
pub struct DataGapError {
    /// Instrument.
    pub instrument: InstrumentCode,
    /// Last date with a price before the gap.
    pub last_price: NaiveDate,
    /// First date with a price after the gap.
    pub resumed: NaiveDate,
    /// Weekdays strictly between the two.
    pub missing_business_days: u32,
}

/// Every finding from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    findings: Vec<ValidationFinding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    data_gaps: Vec<DataGapError>,
}

impl ValidationReport {
    /// Empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding.
    pub fn push(&mut self, finding: ValidationFinding) {
        self.findings.push(finding);
    }

    /// Record a data gap, both as a typed error and as a finding.
    pub fn push_gap(&mut self, gap: DataGapError) {
        self.findings.push(
            ValidationFinding::error(FindingCode::DataGap, gap.to_string())
                .with("last_price", gap.last_price)
                .with("resumed", gap.resumed)
                .with("missing_business_days", gap.missing_business_days),
        );
        self.data_gaps.push(gap);
    }

    /// Append another report.
    pub fn merge(&mut self, other: Self) {
        self.findings.extend(other.findings);
        self.data_gaps.extend(other.data_gaps);
    }

    /// All findings in check order.
    #[must_use]
    pub fn findings(&self) -> &[ValidationFinding] {
        &self.findings
    }

    /// Typed data gaps.
    #[must_use]
    pub fn data_gaps(&self) -> &[DataGapError] {
        &self.data_gaps
    }

    /// Error-level findings.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
    }

    /// Warning-level findings.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }

    /// Whether any error-level finding was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Whether nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Findings with a given code.
    pub fn with_code(&self, code: FindingCode) -> impl Iterator<Item = &ValidationFinding> {
        self.findings.iter().filter(move |f| f.code == code)
    }
}
