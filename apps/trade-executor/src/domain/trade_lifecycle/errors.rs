//! Trade persistence errors.

use thiserror::Error;

/// Errors raised by a [`TradeRepository`](super::TradeRepository).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The store could not be reached.
    #[error("Trade store connection error: {0}")]
    Connection(String),

    /// A statement failed to execute.
    #[error("Trade store query error: {0}")]
    Query(String),

    /// Insert of a trade id that is already stored.
    #[error("Trade already exists: {trade_id}")]
    Duplicate {
        /// Trade ID.
        trade_id: String,
    },

    /// Replace of a trade id that is not stored.
    #[error("Trade not found in store: {trade_id}")]
    NotFound {
        /// Trade ID.
        trade_id: String,
    },

    /// A stored row could not be mapped back to a trade.
    #[error("Corrupt trade row {trade_id}: {message}")]
    Corrupt {
        /// Trade ID of the offending row.
        trade_id: String,
        /// What was wrong with it.
        message: String,
    },
}
