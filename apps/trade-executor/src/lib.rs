// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Trade Executor - Rust Core Library
//!
//! Records trade orders, keeps them in PostgreSQL and announces every
//! creation and amendment on a Kafka topic.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (aggregates, value objects)
//!   - `trade_lifecycle`: Trade aggregate, type/status enums, repository port
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: Interfaces for external systems (`EventPublisherPort`)
//!   - `services`: Trade cache, per-id locks, publication dispatcher
//!   - `use_cases`: `TradeOrchestrator` (add, update, get, get all)
//!   - `dto`: Data transfer objects for API boundaries
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: Trade repository (PostgreSQL, in-memory)
//!   - `messaging`: Kafka REST proxy publisher
//!   - `http`: Axum REST controller
//!
//! Cross-cutting: `config` (YAML + env interpolation) and `observability`
//! (tracing, OpenTelemetry, Prometheus).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Logging, tracing export and metrics.
pub mod observability;

// =============================================================================
// Re-exports from Clean Architecture
// =============================================================================

// Domain re-exports
pub use domain::shared::{CustomerId, Timestamp, TradeId};
pub use domain::trade_lifecycle::{
    RepositoryError, Trade, TradeRepository, TradeStatus, TradeTerms, TradeType,
};

// Application re-exports
pub use application::dto::TradeMutationRequest;
pub use application::errors::TradeError;
pub use application::ports::{EventPublishError, EventPublisherPort, NoOpEventPublisher};
pub use application::services::{
    CacheState, DispatchOutcome, DispatcherConfig, PublicationDispatcher,
};
pub use application::use_cases::TradeOrchestrator;

// Infrastructure re-exports
pub use infrastructure::http::{AppState, create_router};
pub use infrastructure::messaging::{KafkaRestConfig, KafkaRestPublisher, PublisherConfigError};
pub use infrastructure::persistence::{InMemoryTradeRepository, PostgresTradeRepository};
