//! Message log and consumer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::services::ConsumerConfig;

/// Backing implementation of the lifecycle event log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagingKind {
    /// Process-local partitioned log.
    #[default]
    Memory,
}

/// Lifecycle event log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Log implementation.
    #[serde(default)]
    pub kind: MessagingKind,
    /// Topic lifecycle events are appended to.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Number of partitions of the topic.
    #[serde(default = "default_partitions")]
    pub partitions: usize,
    /// Consumer group of the in-process consumer loop.
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,
    /// First pause after a failed read, in milliseconds.
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    /// Upper bound of the read-error backoff, in milliseconds.
    #[serde(default = "default_max_error_backoff_ms")]
    pub max_error_backoff_ms: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            kind: MessagingKind::default(),
            topic: default_topic(),
            partitions: default_partitions(),
            consumer_group: default_consumer_group(),
            error_backoff_ms: default_error_backoff_ms(),
            max_error_backoff_ms: default_max_error_backoff_ms(),
        }
    }
}

impl MessagingConfig {
    /// Consumer loop settings.
    #[must_use]
    pub const fn consumer_config(&self) -> ConsumerConfig {
        ConsumerConfig {
            error_backoff: Duration::from_millis(self.error_backoff_ms),
            max_error_backoff: Duration::from_millis(self.max_error_backoff_ms),
        }
    }
}

fn default_topic() -> String {
    "orders".to_string()
}

const fn default_partitions() -> usize {
    8
}

fn default_consumer_group() -> String {
    "order-group".to_string()
}

const fn default_error_backoff_ms() -> u64 {
    100
}

const fn default_max_error_backoff_ms() -> u64 {
    5_000
}
