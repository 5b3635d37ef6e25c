//! Order State Machine Service
//!
//! Validates status transitions and derives the status that follows a fill.

use rust_decimal::Decimal;

use crate::domain::order_lifecycle::errors::OrderError;
use crate::domain::order_lifecycle::value_objects::OrderStatus;
use crate::domain::shared::OrderId;

/// Order State Machine for validating transitions.
pub struct OrderStateMachine;

impl OrderStateMachine {
    /// Check if a state transition is valid.
    #[must_use]
    pub const fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        matches!(
            (from, to),
            (
                OrderStatus::Pending,
                OrderStatus::PartFilled
                    | OrderStatus::Filled
                    | OrderStatus::Cancelled
                    | OrderStatus::Rejected
            ) | (
                OrderStatus::PartFilled,
                OrderStatus::PartFilled | OrderStatus::Filled | OrderStatus::Cancelled
            )
        )
    }

    /// Validate a state transition requested by `action`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the transition is not allowed.
    pub fn validate_transition(
        order_id: &OrderId,
        from: OrderStatus,
        to: OrderStatus,
        action: &'static str,
    ) -> Result<(), OrderError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(OrderError::InvalidState {
                order_id: order_id.clone(),
                status: from,
                action,
            })
        }
    }

    /// Status implied by the cumulative filled quantity.
    ///
    /// Overshoot (`filled > amount`) still yields `Filled`.
    #[must_use]
    pub fn status_after_fill(
        current: OrderStatus,
        filled_amount: Decimal,
        amount: Decimal,
    ) -> OrderStatus {
        if filled_amount >= amount {
            OrderStatus::Filled
        } else if filled_amount > Decimal::ZERO {
            OrderStatus::PartFilled
        } else {
            current
        }
    }
}
