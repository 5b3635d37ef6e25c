//! Prometheus metrics for the order service.
//!
//! Recording functions go through the `metrics` facade and are no-ops until a
//! recorder is installed with [`init_metrics`].

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for command latency (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            // 100us to 1s
            latency_buckets: vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Create a metrics configuration with a custom address.
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
/// Returns an error if the exporter fails to start (e.g., port already in use).
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
// Lifecycle Commands
// ============================================================================

/// Record a completed lifecycle command.
///
/// # Arguments
///
/// * `action` - Command (`create`, `cancel`, `fill`, `get`)
/// * `outcome` - `ok` or the error kind (e.g. `validation`, `cache_write`)
/// * `latency_seconds` - Wall time of the command
pub fn record_command(action: &str, outcome: &str, latency_seconds: f64) {
    counter!(
        "order_commands_total",
        "action" => action.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "order_command_latency_seconds",
        "action" => action.to_string()
    )
    .record(latency_seconds);
}

/// Record a post-commit propagation failure.
///
/// * `stage` - `cache` or `publish`
pub fn record_propagation_failure(stage: &str) {
    counter!(
        "order_propagation_failures_total",
        "stage" => stage.to_string()
    )
    .increment(1);
}

// ============================================================================
// Read Path
// ============================================================================

/// Record the result of a cache lookup (`hit`, `miss`, `corrupt`, `error`).
pub fn record_cache_lookup(result: &str) {
    counter!(
        "order_cache_lookups_total",
        "result" => result.to_string()
    )
    .increment(1);
}

/// Record a failed cache refresh after a store read.
pub fn record_cache_refresh_failure() {
    counter!("order_cache_refresh_failures_total").increment(1);
}

// ============================================================================
// Consumer
// ============================================================================

/// Record a consumed lifecycle event.
///
/// * `action` - Event action, or `unknown` if the payload did not decode
/// * `outcome` - `ok`, `poison`, `handler_error` or `handler_panic`
pub fn record_event_consumed(action: &str, outcome: &str) {
    counter!(
        "lifecycle_events_consumed_total",
        "action" => action.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
