//! Infrastructure Layer
//!
//! This module contains all adapters (implementations) for the ports defined
//! in the domain and application layers. Following hexagonal architecture:
//!
//! - **Driven Adapters (Outbound)**: Implement ports for external systems
//!   - `persistence/`: Trade store adapters (PostgreSQL, in-memory)
//!   - `messaging/`: Event publishing adapters (Kafka REST proxy)
//!
//! - **Driver Adapters (Inbound)**: Expose application to external world
//!   - `http/`: REST API controllers

pub mod http;
pub mod messaging;
pub mod persistence;
