//! Order Service Binary
//!
//! Starts the order lifecycle core: adapters, the lifecycle event consumer
//! and the cache janitor, then waits for a shutdown signal.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin order-service
//! ```
//!
//! # Environment Variables
//!
//! - `ORDER_SERVICE_CONFIG`: path of the YAML configuration (default: `config.yaml`
//!   when present, built-in defaults otherwise)
//! - `RUST_LOG`: log filter, overrides `observability.logging.level`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use order_service::application::services::{
    ConsumerHandle, FanOutHandler, LoggingEventHandler, OrderProjection,
};
use order_service::config::{Config, load_config, load_config_from_string};
use order_service::infrastructure::cache::InMemoryOrderCache;
use order_service::infrastructure::config::Container;
use order_service::observability::init_metrics;
use order_service::telemetry::init_tracing;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between sweeps of expired cache entries.
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Default configuration path.
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config = read_config()?;
    init_tracing(&config.observability.logging).context("failed to initialize tracing")?;

    tracing::info!("Starting order service");
    log_config(&config);

    if config.observability.metrics.enabled {
        let exporter = config.observability.metrics.exporter_config()?;
        init_metrics(&exporter).context("failed to start metrics exporter")?;
        tracing::info!(addr = %exporter.listen_addr, "Metrics exporter listening");
    }

    let container = Container::from_config(&config);
    let shutdown_token = CancellationToken::new();

    let projection = Arc::new(OrderProjection::new());
    let handler = FanOutHandler::new()
        .with(Arc::new(LoggingEventHandler))
        .with(projection.clone());
    let consumer = container
        .event_consumer(Arc::new(handler))
        .spawn(shutdown_token.child_token());
    tracing::info!(
        group = %config.messaging.consumer_group,
        topic = %config.messaging.topic,
        "Lifecycle event consumer started"
    );

    let janitor = spawn_cache_janitor(container.cache(), shutdown_token.child_token());

    tracing::info!("Order service ready");

    shutdown_signal().await;

    shutdown(&container, consumer, janitor, &shutdown_token).await;

    tracing::info!(projected_orders = projection.len(), "Order service stopped");
    Ok(())
}

/// Load configuration from `ORDER_SERVICE_CONFIG`, `config.yaml`, or defaults.
fn read_config() -> anyhow::Result<Config> {
    if let Ok(path) = std::env::var("ORDER_SERVICE_CONFIG") {
        return load_config(Some(&path)).with_context(|| format!("loading {path}"));
    }

    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        return load_config(None).context("loading config.yaml");
    }

    load_config_from_string("").context("building default configuration")
}

/// Log the parsed configuration.
fn log_config(config: &Config) {
    tracing::info!(
        cache_ttl_secs = config.lifecycle.cache_ttl_secs,
        default_fee_rate = %config.lifecycle.default_fee_rate,
        max_conflict_retries = config.lifecycle.max_conflict_retries,
        partitions = config.messaging.partitions,
        metrics_enabled = config.observability.metrics.enabled,
        "Configuration loaded"
    );
}

/// Periodically drop expired cache entries until cancelled.
fn spawn_cache_janitor(
    cache: Arc<InMemoryOrderCache>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = interval.tick() => {
                    let purged = cache.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, "Expired cache entries removed");
                    }
                }
            }
        }
    })
}

/// Stop background tasks and drain the consumer.
async fn shutdown(
    container: &Container,
    consumer: ConsumerHandle,
    janitor: JoinHandle<()>,
    shutdown_token: &CancellationToken,
) {
    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );

    // No further appends; the consumer sees the end once it has drained.
    container.message_log().close();

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, consumer.join()).await {
        Ok(Ok(stats)) => tracing::info!(
            processed = stats.processed,
            poisoned = stats.poisoned,
            handler_failures = stats.handler_failures,
            source_errors = stats.source_errors,
            "Lifecycle event consumer stopped"
        ),
        Ok(Err(e)) => tracing::error!(error = %e, "Lifecycle event consumer task failed"),
        Err(_) => tracing::warn!("Lifecycle event consumer did not drain in time"),
    }

    shutdown_token.cancel();
    if let Err(e) = janitor.await {
        tracing::error!(error = %e, "Cache janitor task failed");
    }
}

/// Load .env file from current directory or any ancestor directory.
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

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed.
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
