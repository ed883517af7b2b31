//! Logging and optional OpenTelemetry export for the trade executor.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter`, a JSON or
//! pretty formatting layer and, when an OTLP endpoint is configured, an
//! OpenTelemetry layer exporting spans over gRPC.
//!
//! # Example
//!
//! ```ignore
//! use trade_executor::observability::{init_tracing, TracingConfig};
//!
//! let guard = init_tracing(&TracingConfig::default())?;
//! // ...
//! if let Some(guard) = guard {
//!     guard.shutdown();
//! }
//! ```

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{BatchSpanProcessor, SdkTracerProvider};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, ObservabilityConfig};

/// Configuration for logging and span export.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,
    /// Output format.
    pub format: LogFormat,
    /// Emit span close events with timings.
    pub include_spans: bool,
    /// OTLP endpoint URL (e.g., "http://localhost:4317"); no export when `None`.
    pub otlp_endpoint: Option<String>,
    /// Service name for resource attributes.
    pub service_name: String,
    /// Service version for resource attributes.
    pub service_version: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            include_spans: true,
            otlp_endpoint: None,
            service_name: "trade-executor".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl TracingConfig {
    /// Build from the observability section of the config file.
    #[must_use]
    pub fn from_config(config: &ObservabilityConfig) -> Self {
        Self {
            log_level: config.logging.level.clone(),
            format: config.logging.format,
            include_spans: config.logging.include_spans,
            otlp_endpoint: config.tracing.endpoint().map(str::to_string),
            service_name: config.tracing.service_name.clone(),
            ..Default::default()
        }
    }

    /// Set the OTLP endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }
}

/// Error type for tracing operations.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// Failed to create OTLP exporter.
    #[error("failed to create OTLP exporter: {0}")]
    ExporterError(String),
    /// Failed to initialize tracing subscriber.
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberError(String),
}

/// Tracer provider handle for graceful shutdown.
pub struct TracingGuard {
    provider: SdkTracerProvider,
}

impl TracingGuard {
    /// Shutdown the tracer provider, flushing any pending spans.
    pub fn shutdown(self) {
        if let Err(e) = self.provider.shutdown() {
            tracing::error!(error = %e, "Failed to shutdown tracer provider");
        }
    }
}

/// Initialize logging, and span export when an endpoint is configured.
///
/// # Returns
///
/// A `TracingGuard` to hold until shutdown when OTLP export is active.
///
/// # Errors
///
/// Returns an error if the OTLP exporter cannot be built or a global
/// subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<Option<TracingGuard>, TracingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let span_events = if config.include_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let (json_layer, pretty_layer) = match config.format {
        LogFormat::Json => (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(config.include_spans)
                    .with_span_events(span_events),
            ),
            None,
        ),
        LogFormat::Pretty => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_span_events(span_events),
            ),
        ),
    };

    let provider = config
        .otlp_endpoint
        .as_deref()
        .map(|endpoint| build_provider(endpoint, config))
        .transpose()?;
    let otel_layer = provider
        .as_ref()
        .map(|p| OpenTelemetryLayer::new(p.tracer(config.service_name.clone())));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .map_err(|e| TracingError::SubscriberError(e.to_string()))?;

    if let Some(endpoint) = &config.otlp_endpoint {
        tracing::info!(
            endpoint = %endpoint,
            service = %config.service_name,
            "OpenTelemetry tracing initialized"
        );
    }

    Ok(provider.map(|provider| TracingGuard { provider }))
}

fn build_provider(
    endpoint: &str,
    config: &TracingConfig,
) -> Result<SdkTracerProvider, TracingError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TracingError::ExporterError(e.to_string()))?;

    let resource = Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", config.service_version.clone()),
        ])
        .build();

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_span_processor(BatchSpanProcessor::builder(exporter).build())
        .build())
}
