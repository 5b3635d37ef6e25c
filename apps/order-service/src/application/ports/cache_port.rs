//! Order Cache Port (Driven Port)
//!
//! Pure key-value access with per-entry TTL. The cache only accelerates
//! reads; it is never consulted for a decision that changes persisted state.

use std::time::Duration;

use async_trait::async_trait;

/// Cache error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Cache could not be reached or rejected the call.
    #[error("cache unavailable: {message}")]
    Unavailable { message: String },

    /// The value could not be encoded.
    #[error("cache serialization error: {message}")]
    Serialization { message: String },

    /// The call did not finish in time.
    #[error("cache call timed out after {0:?}")]
    Timeout(Duration),
}

/// Port for the order cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderCachePort: Send + Sync {
    /// Fetch a value; `None` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
}
