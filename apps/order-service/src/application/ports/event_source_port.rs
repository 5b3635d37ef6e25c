//! Event Source Port (Driven Port)
//!
//! Consumer side of the message log.

use async_trait::async_trait;

/// A record read from the message log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Partition the record was appended to.
    pub partition: usize,
    /// Offset within the partition.
    pub offset: u64,
    /// Partition key (the order id).
    pub key: String,
    /// Serialized lifecycle event.
    pub payload: Vec<u8>,
}

/// Consume error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsumeError {
    /// The log could not be read.
    #[error("message log unavailable: {message}")]
    Unavailable { message: String },
}

/// Port for reading the message log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSourcePort: Send + Sync {
    /// Wait for the next record.
    ///
    /// Returns `Ok(None)` once the log is closed and drained. Dropping the
    /// future before it resolves must not lose a record.
    async fn recv(&self) -> Result<Option<LogRecord>, ConsumeError>;
}
