//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Aggregates**: The trade record and the rules for mutating it
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Repository Traits**: Persistence abstractions (implemented in adapters)
//!
//! # Bounded Contexts
//!
//! - [`trade_lifecycle`]: Trade creation, mutation and persistence contract

pub mod shared;
pub mod trade_lifecycle;
