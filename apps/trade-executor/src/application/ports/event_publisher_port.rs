//! Event Publisher Port (Driven Port)
//!
//! Interface for announcing trade creations and updates to external systems.

use async_trait::async_trait;

use crate::domain::trade_lifecycle::Trade;

/// Event publishing error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EventPublishError {
    /// Broker could not be reached.
    #[error("Event publish connection error: {message}")]
    ConnectionError { message: String },

    /// Serialization error.
    #[error("Event serialization error: {message}")]
    SerializationError { message: String },

    /// Broker refused the record.
    #[error("Event rejected by broker: {message}")]
    Rejected { message: String },

    /// Publish did not complete within the allotted time.
    #[error("Event publish timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Port for publishing trade events.
///
/// Each call delivers one trade, keyed by its id, to the configured topic.
#[async_trait]
pub trait EventPublisherPort: Send + Sync {
    /// Publish the current state of a trade.
    async fn publish_trade(&self, trade: &Trade) -> Result<(), EventPublishError>;
}

/// No-op event publisher for running without a broker.
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisherPort for NoOpEventPublisher {
    async fn publish_trade(&self, _trade: &Trade) -> Result<(), EventPublishError> {
        Ok(())
    }
}
