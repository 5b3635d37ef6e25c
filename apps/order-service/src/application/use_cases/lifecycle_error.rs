//! Caller-facing errors of the lifecycle manager.
//!
//! Variants before the store commit leave no trace. Variants after it carry
//! the committed order so the missing propagation can be replayed.

use std::fmt;

use super::command_context::Interrupted;
use crate::application::ports::{CacheError, PublishError};
use crate::domain::order_lifecycle::{Order, OrderError, OrderStatus, StoreError};
use crate::domain::shared::OrderId;

/// Post-commit step that did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationStage {
    /// Cache write.
    Cache,
    /// Event publish.
    Publish,
}

impl PropagationStage {
    /// Metric/log label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for PropagationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by `OrderLifecycleManager`.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Malformed or missing input.
    #[error("invalid order parameter '{field}': {message}")]
    Validation { field: String, message: String },

    /// Unknown order id.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// Transition not allowed from the current status.
    #[error("cannot {action} order {order_id} in status {status}")]
    InvalidState {
        order_id: OrderId,
        status: OrderStatus,
        action: &'static str,
    },

    /// The store failed; nothing was committed.
    #[error("order store error: {0}")]
    Store(#[source] StoreError),

    /// The caller cancelled before the store commit.
    #[error("command cancelled before commit")]
    Cancelled,

    /// The deadline passed before the store commit.
    #[error("command deadline exceeded before commit")]
    DeadlineExceeded,

    /// Store committed; the cache write failed so the cache may be stale and
    /// no event was published.
    #[error("order {} committed but cache write failed: {source}", .order.order_id())]
    CacheWrite {
        order: Box<Order>,
        #[source]
        source: CacheError,
    },

    /// Store and cache committed; the lifecycle event was not published.
    #[error("order {} committed but event publish failed: {source}", .order.order_id())]
    Publish {
        order: Box<Order>,
        #[source]
        source: PublishError,
    },

    /// Store committed, the caller went away and propagation stopped at `stage`.
    #[error("order {} committed with incomplete propagation at {stage}: {reason}", .order.order_id())]
    IncompletePropagation {
        order: Box<Order>,
        stage: PropagationStage,
        reason: String,
    },
}

impl LifecycleError {
    /// True if the store holds the new state despite the error.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(
            self,
            Self::CacheWrite { .. } | Self::Publish { .. } | Self::IncompletePropagation { .. }
        )
    }

    /// The committed order for post-commit failures.
    #[must_use]
    pub fn committed_order(&self) -> Option<&Order> {
        match self {
            Self::CacheWrite { order, .. }
            | Self::Publish { order, .. }
            | Self::IncompletePropagation { order, .. } => Some(&**order),
            _ => None,
        }
    }

    /// True if resending the same command is safe and may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Unavailable(_) | StoreError::VersionConflict { .. })
                | Self::DeadlineExceeded
        )
    }

    /// Short label for metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound(_) => "not_found",
            Self::InvalidState { .. } => "invalid_state",
            Self::Store(_) => "store",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::CacheWrite { .. } => "cache_write",
            Self::Publish { .. } => "publish",
            Self::IncompletePropagation { .. } => "incomplete_propagation",
        }
    }
}

impl From<OrderError> for LifecycleError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation { field, message } => Self::Validation { field, message },
            OrderError::InvalidState {
                order_id,
                status,
                action,
            } => Self::InvalidState {
                order_id,
                status,
                action,
            },
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(order_id) => Self::NotFound(order_id),
            other => Self::Store(other),
        }
    }
}

impl From<Interrupted> for LifecycleError {
    fn from(err: Interrupted) -> Self {
        match err {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}
