//! Back-adjustment errors.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::shared::ContractIdentifier;

/// A roll boundary could not be priced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdjustmentError {
    /// The last row before a roll has no forward price for the rolled-into
    /// contract.
    #[error("No forward price for {rolled_into} on {date} when rolling out of {rolled_out}")]
    MissingRollPrice {
        /// Date of the boundary row.
        date: NaiveDate,
        /// Contract rolled out of.
        rolled_out: ContractIdentifier,
        /// Contract rolled into.
        rolled_into: ContractIdentifier,
    },

    /// Ratio adjustment across a zero price.
    #[error("Cannot ratio-adjust across zero price of {contract} on {date}")]
    ZeroPrice {
        /// Date of the boundary row.
        date: NaiveDate,
        /// Contract with the zero price.
        contract: ContractIdentifier,
    },
}
