//! Prometheus metrics for the trade executor.
//!
//! Counters for trade mutations and store failures, plus counters and a
//! latency histogram for event publication.
//!
//! # Example
//!
//! ```ignore
//! use trade_executor::observability::{init_metrics, MetricsConfig};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config)?;
//!
//! record_trade_created();
//! ```

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for publish latency (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
            // 1ms to 10s
            latency_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Trade Metrics
// ============================================================================

/// Record a newly created trade.
pub fn record_trade_created() {
    counter!("trades_created_total").increment(1);
}

/// Record an amended trade.
pub fn record_trade_updated() {
    counter!("trades_updated_total").increment(1);
}

/// Record a failed store call.
///
/// # Arguments
///
/// * `operation` - Store operation (`"insert"`, `"replace"`, `"load_all"`)
pub fn record_store_error(operation: &'static str) {
    counter!("trade_store_errors_total", "operation" => operation).increment(1);
}

// ============================================================================
// Publication Metrics
// ============================================================================

/// Record a delivered trade event.
///
/// # Arguments
///
/// * `latency_seconds` - Time spent in the publisher call
pub fn record_event_published(latency_seconds: f64) {
    counter!("trade_events_published_total").increment(1);
    histogram!("trade_event_publish_seconds").record(latency_seconds);
}

/// Record a trade event that could not be delivered.
///
/// # Arguments
///
/// * `reason` - Failure kind (`"connection"`, `"serialization"`, `"rejected"`, `"timeout"`)
pub fn record_event_failed(reason: &'static str) {
    counter!("trade_events_failed_total", "reason" => reason).increment(1);
}

/// Record a trade event dropped before reaching the publisher.
pub fn record_event_dropped() {
    counter!("trade_events_dropped_total").increment(1);
}
