//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod trade_orchestrator;

pub use trade_orchestrator::TradeOrchestrator;
