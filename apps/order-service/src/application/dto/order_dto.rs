//! Order DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_lifecycle::{NewOrder, OrderError, OrderSide, OrderType};
use crate::domain::shared::{OrderId, Symbol, UserId};

/// DTO for creating an order.
///
/// Empty or absent `symbol`, `order_type` and `order_side` take their defaults
/// (`BTC/USDT`, `limit`, `buy`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrderDto {
    /// Caller-supplied order ID.
    pub order_id: String,
    /// Owner.
    pub user_id: String,
    /// Trading pair.
    #[serde(default)]
    pub symbol: Option<String>,
    /// `limit` or `market`.
    #[serde(default)]
    pub order_type: Option<String>,
    /// `buy` or `sell`.
    #[serde(default)]
    pub order_side: Option<String>,
    /// Limit price.
    pub price: Decimal,
    /// Requested quantity.
    pub amount: Decimal,
}

impl CreateOrderDto {
    /// Convert to the domain creation input.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `order_type` or `order_side` is not recognised.
    pub fn into_new_order(self) -> Result<NewOrder, OrderError> {
        let order_type = non_empty(self.order_type)
            .map(|s| s.parse::<OrderType>())
            .transpose()?;
        let order_side = non_empty(self.order_side)
            .map(|s| s.parse::<OrderSide>())
            .transpose()?;

        Ok(NewOrder {
            order_id: OrderId::new(self.order_id),
            user_id: UserId::new(self.user_id),
            symbol: non_empty(self.symbol).map(Symbol::new),
            order_type,
            order_side,
            price: self.price,
            amount: self.amount,
        })
    }
}

/// DTO for applying a fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillOrderDto {
    /// Execution price.
    pub price: Decimal,
    /// Executed quantity.
    pub amount: Decimal,
    /// Fee rate; absent or non-positive uses the configured default.
    #[serde(default)]
    pub fee_rate: Option<Decimal>,
}

impl FillOrderDto {
    /// Create a fill with an explicit fee rate.
    #[must_use]
    pub const fn new(price: Decimal, amount: Decimal, fee_rate: Option<Decimal>) -> Self {
        Self {
            price,
            amount,
            fee_rate,
        }
    }

    /// Fee rate to charge, falling back to `default` when unset or non-positive.
    #[must_use]
    pub fn effective_fee_rate(&self, default: Decimal) -> Decimal {
        match self.fee_rate {
            Some(rate) if rate > Decimal::ZERO => rate,
            _ => default,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
