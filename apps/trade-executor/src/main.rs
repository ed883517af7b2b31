//! Trade Executor Binary
//!
//! Starts the trade executor HTTP service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin trade-executor
//! ```
//!
//! # Environment Variables
//!
//! - `TRADE_EXECUTOR_CONFIG`: Path to the YAML config (default: config.yaml)
//! - `RUST_LOG`: Log filter (default: `observability.logging.level`)
//!
//! Any `${VAR}` referenced by the config file is read from the environment
//! (or a `.env` file) at startup.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use trade_executor::config::{Config, PublisherConfig, ServerConfig, config_path, load_config};
use trade_executor::observability::{
    MetricsConfig, TracingConfig, init_metrics, init_tracing,
};
use trade_executor::{
    AppState, DispatcherConfig, EventPublisherPort, KafkaRestConfig, KafkaRestPublisher,
    NoOpEventPublisher, PostgresTradeRepository, PublicationDispatcher, TradeOrchestrator,
    create_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let path = config_path();
    let config = load_config(Some(&path)).with_context(|| format!("loading config from {path}"))?;

    let tracing_guard = init_tracing(&TracingConfig::from_config(&config.observability))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting trade executor");
    log_config(&config);

    if config.observability.metrics.enabled {
        let addr: SocketAddr = config.observability.metrics.listen_addr.parse()?;
        init_metrics(&MetricsConfig::with_addr(addr))?;
    }

    let repository = Arc::new(PostgresTradeRepository::connect(&config.persistence).await?);
    repository.ensure_schema().await?;

    let publisher = create_publisher(&config.publisher)?;
    let dispatcher = Arc::new(PublicationDispatcher::spawn(
        publisher,
        DispatcherConfig {
            queue_capacity: config.publisher.queue_capacity,
            publish_timeout: Duration::from_millis(config.publisher.timeout_ms),
        },
    ));

    let orchestrator = Arc::new(TradeOrchestrator::new(repository, Arc::clone(&dispatcher)));

    serve_http(&config.server, orchestrator).await?;

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    if !dispatcher.shutdown(shutdown_timeout).await {
        tracing::warn!("Some trade events were not published before exit");
    }

    if let Some(guard) = tracing_guard {
        guard.shutdown();
    }

    tracing::info!("Trade executor stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the loaded configuration.
fn log_config(config: &Config) {
    tracing::info!(
        http_port = config.server.http_port,
        bind_address = %config.server.bind_address,
        publisher_enabled = config.publisher.enabled,
        topic = %config.publisher.topic,
        queue_capacity = config.publisher.queue_capacity,
        log_format = %config.observability.logging.format,
        metrics_enabled = config.observability.metrics.enabled,
        "Configuration loaded"
    );
}

/// Build the event publisher; a misconfigured broker is fatal.
fn create_publisher(config: &PublisherConfig) -> anyhow::Result<Arc<dyn EventPublisherPort>> {
    if !config.enabled {
        tracing::warn!("Event publishing disabled, trade events will be discarded");
        return Ok(Arc::new(NoOpEventPublisher));
    }

    let publisher = KafkaRestPublisher::new(&KafkaRestConfig::from(config))
        .context("configuring Kafka REST publisher")?;
    Ok(Arc::new(publisher))
}

/// Serve the trade API until SIGINT/SIGTERM.
async fn serve_http(
    config: &ServerConfig,
    orchestrator: Arc<TradeOrchestrator<PostgresTradeRepository>>,
) -> anyhow::Result<()> {
    let app = create_router(AppState {
        orchestrator,
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    let ip: IpAddr = config.bind_address.parse()?;
    let addr = SocketAddr::new(ip, config.http_port);

    tracing::info!(%addr, "HTTP server starting");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /trades");
    tracing::info!("  GET  /trades/{{id}}");
    tracing::info!("  POST /trades/add");
    tracing::info!("  POST /trades/update/{{id}}");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. Failing at startup is
/// preferable to a process that ignores termination signals.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
