//! Application errors surfaced to callers of the trade orchestrator.

use thiserror::Error;

use crate::domain::shared::{DomainError, TradeId};
use crate::domain::trade_lifecycle::RepositoryError;

/// Errors returned by trade operations.
#[derive(Debug, Error)]
pub enum TradeError {
    /// The request was malformed or referred to a trade this process cannot update.
    #[error("invalid input for '{field}': {message}")]
    InvalidInput {
        /// Offending field.
        field: String,
        /// Details.
        message: String,
    },

    /// No trade with this id exists.
    #[error("trade {trade_id} not found")]
    NotFound {
        /// Requested id.
        trade_id: TradeId,
    },

    /// The trade store failed.
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),

    /// The write task was cancelled before reporting back, typically during
    /// runtime shutdown. The outcome of the store write is unknown.
    #[error("{operation} of trade {trade_id} was interrupted")]
    Interrupted {
        /// Store operation in flight.
        operation: &'static str,
        /// Trade being written.
        trade_id: TradeId,
    },
}

impl TradeError {
    /// Whether the caller is at fault.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

impl From<DomainError> for TradeError {
    fn from(err: DomainError) -> Self {
        let DomainError::InvalidValue { field, message } = err;
        Self::InvalidInput { field, message }
    }
}
