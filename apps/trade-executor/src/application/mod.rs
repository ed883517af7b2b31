//! Application Layer
//!
//! The application layer orchestrates domain logic through use cases.
//! It defines:
//!
//! - **Ports**: Interfaces for interacting with external systems
//! - **Services**: Shared state and background work (cache, locks, dispatcher)
//! - **Use Cases**: Application-specific business rules
//! - **DTOs**: Data transfer objects for API boundaries

pub mod dto;
pub mod errors;
pub mod ports;
pub mod services;
pub mod use_cases;

pub use dto::*;
pub use errors::TradeError;
pub use ports::*;
pub use use_cases::*;
