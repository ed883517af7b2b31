//! Observability module for logging, metrics and tracing.
//!
//! This module provides instrumentation for the trade executor,
//! including Prometheus metrics export and distributed tracing.

mod metrics;
mod tracing;

pub use metrics::{
    MetricsConfig, MetricsError, init_metrics, record_event_dropped, record_event_failed,
    record_event_published, record_store_error, record_trade_created, record_trade_updated,
};
pub use tracing::{TracingConfig, TracingError, TracingGuard, init_tracing};
