//! Trade Lifecycle Bounded Context
//!
//! Owns the trade record and the persistence contract for it.
//!
//! # Key Concepts
//!
//! - **Trade Aggregate**: identity, status and execution time fixed at creation;
//!   terms replaced on every amendment
//! - **Repository**: insert / replace / load-all, keyed by trade id

pub mod aggregate;
pub mod errors;
pub mod repository;
pub mod value_objects;

pub use aggregate::{ReconstitutedTradeParams, Trade, TradeTerms};
pub use errors::RepositoryError;
pub use repository::TradeRepository;
pub use value_objects::{TradeStatus, TradeType};
