//! Per-key async locks.
//!
//! Serializes work on the same key while letting different keys proceed in
//! parallel. Entries are removed once no task holds or waits on them.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lock for one key plus the number of tasks holding or waiting on it.
#[derive(Debug, Default)]
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    users: usize,
}

/// A set of async mutexes addressed by key.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Slot>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    /// Create an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    ///
    /// The guard owns a handle to the lock set, so it can be moved into a
    /// spawned task. Dropping this future while it waits releases its claim
    /// on the entry.
    pub async fn lock(self: &Arc<Self>, key: K) -> KeyedLockGuard<K> {
        let lock = {
            let mut locks = self.locks.lock();
            let slot = locks.entry(key.clone()).or_default();
            slot.users += 1;
            Arc::clone(&slot.lock)
        };

        // Built before waiting so a cancelled waiter still gives up its
        // claim in `Drop`.
        let mut pending = KeyedLockGuard {
            owner: Arc::clone(self),
            key,
            guard: None,
        };
        pending.guard = Some(lock.lock_owned().await);
        pending
    }

    /// Number of keys currently held or awaited.
    pub fn active_keys(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Exclusive access to one key; released on drop.
#[derive(Debug)]
pub struct KeyedLockGuard<K: Eq + Hash> {
    owner: Arc<KeyedLocks<K>>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyedLockGuard<K> {
    fn drop(&mut self) {
        self.guard.take();

        let mut locks = self.owner.locks.lock();
        if let Some(slot) = locks.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                locks.remove(&self.key);
            }
        }
    }
}
