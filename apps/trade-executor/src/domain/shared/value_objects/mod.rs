//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod identifiers;
mod timestamp;

pub use identifiers::{CustomerId, TradeId};
pub use timestamp::Timestamp;
