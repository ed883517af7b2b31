//! Observability configuration for logging, tracing export and metrics.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::defaults::default_true;

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// OpenTelemetry export configuration.
    #[serde(default)]
    pub tracing: TracingExportConfig,
    /// Prometheus exporter configuration.
    #[serde(default)]
    pub metrics: MetricsExportConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Pretty => write!(f, "pretty"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Include span information.
    #[serde(default = "default_true")]
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            include_spans: true,
        }
    }
}

/// OpenTelemetry OTLP export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingExportConfig {
    /// OTLP gRPC endpoint; export is off when absent or empty.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    /// Service name reported with spans.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl TracingExportConfig {
    /// Configured endpoint, ignoring empty strings left by env interpolation.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.otlp_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

impl Default for TracingExportConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: default_service_name(),
        }
    }
}

/// Prometheus exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsExportConfig {
    /// Start the `/metrics` listener.
    #[serde(default)]
    pub enabled: bool,
    /// Listener address.
    #[serde(default = "default_metrics_addr")]
    pub listen_addr: String,
}

impl Default for MetricsExportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_metrics_addr(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "trade-executor".to_string()
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}
