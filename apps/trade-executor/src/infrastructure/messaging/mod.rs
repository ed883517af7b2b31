//! Messaging Adapters
//!
//! Event publisher implementations.

pub mod kafka_rest;

pub use kafka_rest::{
    KAFKA_JSON_CONTENT_TYPE, KafkaRestConfig, KafkaRestPublisher, PublisherConfigError,
};
