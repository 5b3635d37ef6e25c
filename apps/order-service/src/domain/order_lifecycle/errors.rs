//! Order lifecycle errors.

use std::fmt;

use super::value_objects::OrderStatus;
use crate::domain::shared::{DomainError, OrderId};

/// Errors raised by the Order aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Missing, malformed or non-positive input.
    Validation {
        /// Field with invalid value.
        field: String,
        /// Error message.
        message: String,
    },

    /// Transition not allowed from the current status.
    InvalidState {
        /// Order the transition was attempted on.
        order_id: OrderId,
        /// Current status.
        status: OrderStatus,
        /// Attempted action (`cancel`, `fill`).
        action: &'static str,
    },
}

impl OrderError {
    /// Build a `Validation` error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { field, message } => {
                write!(f, "Invalid order parameter '{field}': {message}")
            }
            Self::InvalidState {
                order_id,
                status,
                action,
            } => {
                write!(f, "Cannot {action} order {order_id} in status: {status}")
            }
        }
    }
}

impl std::error::Error for OrderError {}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidValue { field, message } => Self::Validation { field, message },
        }
    }
}
