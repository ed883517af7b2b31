//! Trade Cache
//!
//! Process-local id → trade map in front of the trade store. Entries are never
//! evicted. Whether the store snapshot has been merged in is tracked
//! explicitly, so an empty cache is not mistaken for a cold one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::domain::shared::TradeId;
use crate::domain::trade_lifecycle::{RepositoryError, Trade};

/// Load state of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// The store has not been read yet.
    Uninitialized,
    /// A store read is in flight.
    Loading,
    /// The store snapshot has been merged.
    Loaded,
}

/// Read-through/write-through trade cache.
#[derive(Debug, Default)]
pub struct TradeCache {
    entries: RwLock<HashMap<TradeId, Trade>>,
    loaded: AtomicBool,
    load_gate: tokio::sync::Mutex<()>,
}

impl TradeCache {
    /// Create an empty, unloaded cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current load state.
    pub fn state(&self) -> CacheState {
        if self.loaded.load(Ordering::Acquire) {
            CacheState::Loaded
        } else if self.load_gate.try_lock().is_err() {
            CacheState::Loading
        } else {
            CacheState::Uninitialized
        }
    }

    /// Whether the store snapshot has been merged.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Load from the store once.
    ///
    /// Concurrent callers wait for a single in-flight load. Entries already
    /// in the cache are kept over their stored versions. Returns `true` if
    /// this call performed the load.
    ///
    /// # Errors
    ///
    /// Propagates the loader's error; the cache stays unloaded and the next
    /// caller retries.
    pub async fn ensure_loaded<F, Fut>(&self, load: F) -> Result<bool, RepositoryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Trade>, RepositoryError>>,
    {
        if self.is_loaded() {
            return Ok(false);
        }

        let _gate = self.load_gate.lock().await;
        if self.is_loaded() {
            return Ok(false);
        }

        let trades = load().await?;
        let count = trades.len();
        self.merge(trades);
        self.loaded.store(true, Ordering::Release);

        tracing::debug!(count, "Trade cache loaded from store");
        Ok(true)
    }

    fn merge(&self, trades: Vec<Trade>) {
        let mut entries = self.entries.write();
        for trade in trades {
            entries.entry(trade.id().clone()).or_insert(trade);
        }
    }

    /// Cached trade by id.
    pub fn get(&self, id: &TradeId) -> Option<Trade> {
        self.entries.read().get(id).cloned()
    }

    /// Whether a trade is cached.
    pub fn contains(&self, id: &TradeId) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Insert or overwrite a trade.
    pub fn put(&self, trade: Trade) {
        self.entries.write().insert(trade.id().clone(), trade);
    }

    /// All cached trades, ordered by execution timestamp then id.
    pub fn snapshot(&self) -> Vec<Trade> {
        let mut trades: Vec<Trade> = self.entries.read().values().cloned().collect();
        trades.sort_by(|a, b| {
            a.execution_timestamp()
                .cmp(&b.execution_timestamp())
                .then_with(|| a.id().cmp(b.id()))
        });
        trades
    }

    /// Number of cached trades.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no trades.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
