//! Event Publisher Port (Driven Port)
//!
//! Appends payloads to a partitioned message log. Ordering is only
//! guaranteed between payloads sharing a partition key.

use std::time::Duration;

use async_trait::async_trait;

/// Event publishing error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// Connection error.
    #[error("event publish connection error: {message}")]
    Unavailable { message: String },

    /// Serialization error.
    #[error("event serialization error: {message}")]
    Serialization { message: String },

    /// The log no longer accepts appends.
    #[error("message log is closed")]
    Closed,

    /// The call did not finish in time.
    #[error("event publish timed out after {0:?}")]
    Timeout(Duration),
}

/// Port for publishing lifecycle events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisherPort: Send + Sync {
    /// Append `payload` to the partition selected by `partition_key`.
    async fn publish(&self, partition_key: &str, payload: Vec<u8>) -> Result<(), PublishError>;
}
