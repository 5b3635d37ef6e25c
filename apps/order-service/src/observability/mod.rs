//! Observability module for metrics.
//!
//! Counters and histograms for lifecycle commands, the cache read path,
//! post-commit propagation and the event consumer.

mod metrics;

pub use metrics::{
    init_metrics, record_cache_lookup, record_cache_refresh_failure, record_command,
    record_event_consumed, record_propagation_failure, MetricsConfig, MetricsError,
};
