//! Application Ports (Driver and Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driver Ports** (Primary/Inbound): How the world uses our application
//! - **Driven Ports** (Secondary/Outbound): How our application uses external systems
//!
//! The trade store port lives with the domain as
//! [`TradeRepository`](crate::domain::trade_lifecycle::TradeRepository).

mod event_publisher_port;

pub use event_publisher_port::{EventPublishError, EventPublisherPort, NoOpEventPublisher};
