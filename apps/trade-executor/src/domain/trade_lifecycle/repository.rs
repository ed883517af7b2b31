//! Trade Repository Trait
//!
//! Defines the persistence abstraction for trades.
//! Implemented by adapters in the infrastructure layer.

use async_trait::async_trait;

use super::aggregate::Trade;
use super::errors::RepositoryError;

/// Repository trait for Trade persistence.
///
/// This is a domain interface (port) that is implemented by
/// infrastructure adapters (Postgres, in-memory). Implementations are
/// shared with spawned write tasks, hence `'static`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradeRepository: Send + Sync + 'static {
    /// Insert a new trade.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the id is already stored, or a connection/query
    /// error if persistence fails.
    async fn insert(&self, trade: &Trade) -> Result<(), RepositoryError>;

    /// Replace an existing trade, keyed by its id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is not stored, or a connection/query
    /// error if persistence fails.
    async fn replace(&self, trade: &Trade) -> Result<(), RepositoryError>;

    /// Load every stored trade.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails or a row cannot be mapped.
    async fn load_all(&self) -> Result<Vec<Trade>, RepositoryError>;
}
