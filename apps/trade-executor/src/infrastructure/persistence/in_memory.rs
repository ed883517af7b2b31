//! In-memory trade repository for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::shared::TradeId;
use crate::domain::trade_lifecycle::{RepositoryError, Trade, TradeRepository};

/// In-memory implementation of `TradeRepository`.
///
/// Suitable for testing and development. Not for production use. Counts
/// calls so tests can assert how often the store was hit.
#[derive(Debug, Default)]
pub struct InMemoryTradeRepository {
    trades: RwLock<HashMap<TradeId, Trade>>,
    inserts: AtomicUsize,
    replaces: AtomicUsize,
    loads: AtomicUsize,
}

impl InMemoryTradeRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with trades (for test setup).
    #[must_use]
    pub fn with_trades(trades: impl IntoIterator<Item = Trade>) -> Self {
        let repo = Self::new();
        {
            let mut stored = repo.trades.write();
            for trade in trades {
                stored.insert(trade.id().clone(), trade);
            }
        }
        repo
    }

    /// Stored trade by id.
    #[must_use]
    pub fn get(&self, id: &TradeId) -> Option<Trade> {
        self.trades.read().get(id).cloned()
    }

    /// Get the number of trades in the repository.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trades.read().len()
    }

    /// Check if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.read().is_empty()
    }

    /// Number of successful and failed `insert` calls.
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Number of `replace` calls.
    pub fn replace_calls(&self) -> usize {
        self.replaces.load(Ordering::SeqCst)
    }

    /// Number of `load_all` calls.
    pub fn load_calls(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradeRepository for InMemoryTradeRepository {
    async fn insert(&self, trade: &Trade) -> Result<(), RepositoryError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);

        let mut trades = self.trades.write();
        if trades.contains_key(trade.id()) {
            return Err(RepositoryError::Duplicate {
                trade_id: trade.id().to_string(),
            });
        }
        trades.insert(trade.id().clone(), trade.clone());
        Ok(())
    }

    async fn replace(&self, trade: &Trade) -> Result<(), RepositoryError> {
        self.replaces.fetch_add(1, Ordering::SeqCst);

        let mut trades = self.trades.write();
        match trades.get_mut(trade.id()) {
            Some(stored) => {
                *stored = trade.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound {
                trade_id: trade.id().to_string(),
            }),
        }
    }

    async fn load_all(&self) -> Result<Vec<Trade>, RepositoryError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.trades.read().values().cloned().collect())
    }
}
