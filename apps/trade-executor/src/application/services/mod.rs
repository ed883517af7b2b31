//! Application Services
//!
//! Application services coordinate domain logic and infrastructure adapters.
//! They differ from use cases in that they hold shared state or run as
//! background tasks.

mod keyed_locks;
mod publication_dispatcher;
mod trade_cache;

pub use keyed_locks::{KeyedLockGuard, KeyedLocks};
pub use publication_dispatcher::{DispatchOutcome, DispatcherConfig, PublicationDispatcher};
pub use trade_cache::{CacheState, TradeCache};
