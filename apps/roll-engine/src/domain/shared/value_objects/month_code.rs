//! Futures month codes and contract cycles.
//!
//! | Code | Month | Code | Month |
//! |------|-------|------|-------|
//! | F | January | N | July |
//! | G | February | Q | August |
//! | H | March | U | September |
//! | J | April | V | October |
//! | K | May | X | November |
//! | M | June | Z | December |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

/// Exchange month code for a futures delivery month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MonthCode {
    /// January.
    F,
    /// February.
    G,
    /// March.
    H,
    /// April.
    J,
    /// May.
    K,
    /// June.
    M,
    /// July.
    N,
    /// August.
    Q,
    /// September.
    U,
    /// October.
    V,
    /// November.
    X,
    /// December.
    Z,
}

impl MonthCode {
    /// All month codes in calendar order.
    pub const ALL: [Self; 12] = [
        Self::F,
        Self::G,
        Self::H,
        Self::J,
        Self::K,
        Self::M,
        Self::N,
        Self::Q,
        Self::U,
        Self::V,
        Self::X,
        Self::Z,
    ];

    /// Month code for a calendar month (1-12).
    #[must_use]
    pub fn from_month(month: u32) -> Option<Self> {
        let index = usize::try_from(month).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }

    /// Month code for its letter.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|code| code.letter() == letter.to_ascii_uppercase())
    }

    /// Calendar month (1-12).
    #[must_use]
    pub const fn month(self) -> u32 {
        self as u32 + 1
    }

    /// Exchange letter.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::F => 'F',
            Self::G => 'G',
            Self::H => 'H',
            Self::J => 'J',
            Self::K => 'K',
            Self::M => 'M',
            Self::N => 'N',
            Self::Q => 'Q',
            Self::U => 'U',
            Self::V => 'V',
            Self::X => 'X',
            Self::Z => 'Z',
        }
    }
}

impl fmt::Display for MonthCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Ordered, duplicate-free set of delivery months (e.g. "HMUZ").
///
/// Months are always held in calendar order regardless of input order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContractCycle(Vec<MonthCode>);

impl ContractCycle {
    /// Build a cycle from month codes.
    ///
    /// # Errors
    ///
    /// Returns error if no months are given.
    pub fn new(months: impl IntoIterator<Item = MonthCode>) -> Result<Self, DomainError> {
        let mut months: Vec<MonthCode> = months.into_iter().collect();
        months.sort_unstable();
        months.dedup();

        if months.is_empty() {
            return Err(DomainError::invalid("cycle", "Contract cycle cannot be empty"));
        }

        Ok(Self(months))
    }

    /// Quarterly cycle (HMUZ).
    #[must_use]
    pub fn quarterly() -> Self {
        Self(vec![MonthCode::H, MonthCode::M, MonthCode::U, MonthCode::Z])
    }

    /// Every calendar month.
    #[must_use]
    pub fn monthly() -> Self {
        Self(MonthCode::ALL.to_vec())
    }

    /// Months in calendar order.
    #[must_use]
    pub fn months(&self) -> &[MonthCode] {
        &self.0
    }

    /// Whether the cycle contains a month.
    #[must_use]
    pub fn contains(&self, month: MonthCode) -> bool {
        self.0.contains(&month)
    }

    /// Position of a month in the cycle.
    #[must_use]
    pub fn position(&self, month: MonthCode) -> Option<usize> {
        self.0.iter().position(|m| *m == month)
    }

    /// Number of months in the cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed cycle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every month of `self` appears in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.0.iter().all(|m| other.contains(*m))
    }
}

impl fmt::Display for ContractCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for month in &self.0 {
            write!(f, "{month}")?;
        }
        Ok(())
    }
}

impl FromStr for ContractCycle {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let months = s
            .trim()
            .chars()
            .map(|c| {
                MonthCode::from_letter(c).ok_or_else(|| {
                    DomainError::invalid("cycle", format!("Invalid month code '{c}' in '{s}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(months)
    }
}

impl TryFrom<String> for ContractCycle {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContractCycle> for String {
    fn from(cycle: ContractCycle) -> Self {
        cycle.to_string()
    }
}
