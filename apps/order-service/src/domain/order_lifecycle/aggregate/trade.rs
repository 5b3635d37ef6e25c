//! Trade record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{OrderId, Symbol, Timestamp, TradeId};

/// Immutable execution record produced by a fill.
///
/// References its order by id; it does not own it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    trade_id: TradeId,
    order_id: OrderId,
    symbol: Symbol,
    price: Decimal,
    amount: Decimal,
    fee: Decimal,
    fee_asset: String,
    created_at: Timestamp,
}

impl Trade {
    pub(crate) fn new(
        order_id: OrderId,
        symbol: Symbol,
        price: Decimal,
        amount: Decimal,
        fee: Decimal,
        fee_asset: String,
        created_at: Timestamp,
    ) -> Self {
        Self {
            trade_id: TradeId::generate(),
            order_id,
            symbol,
            price,
            amount,
            fee,
            fee_asset,
            created_at,
        }
    }

    /// Trade identifier.
    #[must_use]
    pub const fn trade_id(&self) -> &TradeId {
        &self.trade_id
    }

    /// Order this trade executed against.
    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Trading pair.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Execution price.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// Executed quantity.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Fee charged for this execution.
    #[must_use]
    pub const fn fee(&self) -> Decimal {
        self.fee
    }

    /// Asset the fee is charged in.
    #[must_use]
    pub fn fee_asset(&self) -> &str {
        &self.fee_asset
    }

    /// Execution time.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
