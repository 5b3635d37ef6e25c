//! Order Aggregate Root
//!
//! All mutation of an order goes through `cancel` and `apply_fill`; each
//! successful mutation bumps `version`, which the store uses for optimistic
//! concurrency.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Trade;
use crate::domain::order_lifecycle::errors::OrderError;
use crate::domain::order_lifecycle::services::OrderStateMachine;
use crate::domain::order_lifecycle::value_objects::{OrderSide, OrderStatus, OrderType};
use crate::domain::shared::{OrderId, Symbol, Timestamp, UserId};

/// Asset fees are charged in.
pub const DEFAULT_FEE_ASSET: &str = "USDT";

/// Input for creating an order.
///
/// Absent (or blank) `symbol`, `order_type` and `order_side` take their defaults.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Caller-supplied order identifier.
    pub order_id: OrderId,
    /// Owner.
    pub user_id: UserId,
    /// Trading pair, `BTC/USDT` when absent.
    pub symbol: Option<Symbol>,
    /// Order type, `limit` when absent.
    pub order_type: Option<OrderType>,
    /// Order side, `buy` when absent.
    pub order_side: Option<OrderSide>,
    /// Limit price.
    pub price: Decimal,
    /// Requested quantity.
    pub amount: Decimal,
}

/// Order Aggregate Root.
// `order_id`/`order_type`/`order_side` are the wire field names of the order object.
#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    order_id: OrderId,
    user_id: UserId,
    symbol: Symbol,
    order_type: OrderType,
    order_side: OrderSide,
    price: Decimal,
    amount: Decimal,
    filled_amount: Decimal,
    fee: Decimal,
    fee_asset: String,
    status: OrderStatus,
    #[serde(default)]
    cancel_reason: Option<String>,
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Order {
    /// Validate input and build a `pending` order with nothing filled.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `order_id`/`user_id` are blank, `price` or
    /// `amount` is not positive, or the symbol is malformed.
    pub fn create(input: NewOrder) -> Result<Self, OrderError> {
        if input.order_id.is_blank() {
            return Err(OrderError::validation("order_id", "order_id is required"));
        }
        if input.user_id.is_blank() {
            return Err(OrderError::validation("user_id", "user_id is required"));
        }
        if input.price <= Decimal::ZERO {
            return Err(OrderError::validation(
                "price",
                "price must be greater than zero",
            ));
        }
        if input.amount <= Decimal::ZERO {
            return Err(OrderError::validation(
                "amount",
                "amount must be greater than zero",
            ));
        }

        let symbol = input
            .symbol
            .filter(|s| !s.as_str().trim().is_empty())
            .unwrap_or_default();
        symbol.validate()?;

        let now = Timestamp::now();
        Ok(Self {
            order_id: input.order_id,
            user_id: input.user_id,
            symbol,
            order_type: input.order_type.unwrap_or_default(),
            order_side: input.order_side.unwrap_or_default(),
            price: input.price,
            amount: input.amount,
            filled_amount: Decimal::ZERO,
            fee: Decimal::ZERO,
            fee_asset: DEFAULT_FEE_ASSET.to_string(),
            status: OrderStatus::Pending,
            cancel_reason: None,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Cancel the order, recording `reason`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the order is `pending` or `part_filled`.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        OrderStateMachine::validate_transition(
            &self.order_id,
            self.status,
            OrderStatus::Cancelled,
            "cancel",
        )?;

        self.status = OrderStatus::Cancelled;
        self.cancel_reason = Some(reason.into());
        self.touch(Timestamp::now());
        Ok(())
    }

    /// Apply an execution and return the Trade it produced.
    ///
    /// A fill that pushes `filled_amount` past `amount` is accepted and
    /// leaves the order `filled`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a non-positive price or amount, a negative
    /// fee rate or a fill whose totals overflow, and `InvalidState` if the
    /// order no longer accepts fills. The order is unchanged on error.
    pub fn apply_fill(
        &mut self,
        price: Decimal,
        amount: Decimal,
        fee_rate: Decimal,
    ) -> Result<Trade, OrderError> {
        if price <= Decimal::ZERO {
            return Err(OrderError::validation(
                "price",
                "fill price must be greater than zero",
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(OrderError::validation(
                "amount",
                "fill amount must be greater than zero",
            ));
        }
        if fee_rate < Decimal::ZERO {
            return Err(OrderError::validation(
                "fee_rate",
                "fee rate must not be negative",
            ));
        }

        let filled_amount = self
            .filled_amount
            .checked_add(amount)
            .ok_or_else(|| OrderError::validation("amount", "filled amount overflows"))?;
        let next = OrderStateMachine::status_after_fill(self.status, filled_amount, self.amount);
        OrderStateMachine::validate_transition(&self.order_id, self.status, next, "fill")?;

        let fee = amount
            .checked_mul(price)
            .and_then(|notional| notional.checked_mul(fee_rate))
            .ok_or_else(|| OrderError::validation("amount", "fill notional overflows"))?;
        let total_fee = self
            .fee
            .checked_add(fee)
            .ok_or_else(|| OrderError::validation("amount", "accumulated fee overflows"))?;
        let now = Timestamp::now();

        self.filled_amount = filled_amount;
        self.fee = total_fee;
        self.status = next;
        self.touch(now);

        Ok(Trade::new(
            self.order_id.clone(),
            self.symbol.clone(),
            price,
            amount,
            fee,
            self.fee_asset.clone(),
            now,
        ))
    }

    fn touch(&mut self, now: Timestamp) {
        self.updated_at = now;
        self.version += 1;
    }

    // Getters

    /// Order identifier.
    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Owner.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Trading pair.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Order type.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Order side.
    #[must_use]
    pub const fn order_side(&self) -> OrderSide {
        self.order_side
    }

    /// Limit price.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// Requested quantity.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Cumulative executed quantity.
    #[must_use]
    pub const fn filled_amount(&self) -> Decimal {
        self.filled_amount
    }

    /// Cumulative fee.
    #[must_use]
    pub const fn fee(&self) -> Decimal {
        self.fee
    }

    /// Asset the fee is charged in.
    #[must_use]
    pub fn fee_asset(&self) -> &str {
        &self.fee_asset
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Reason given on cancel.
    #[must_use]
    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    /// Mutation counter, 1 at creation.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Time of the last mutation.
    #[must_use]
    pub const fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}
