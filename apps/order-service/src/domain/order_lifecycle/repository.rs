//! Order Repository Trait
//!
//! The persistence contract for orders and trades. The store is the system of
//! record; implementations must apply each call atomically.

use async_trait::async_trait;

use super::aggregate::{Order, Trade};
use super::value_objects::OrderStatus;
use crate::domain::shared::{OrderId, UserId};

/// Errors reported by an order store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Store could not be reached or the call failed.
    #[error("order store unavailable: {0}")]
    Unavailable(String),

    /// No row for the order id.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// An order with the same id already exists.
    #[error("duplicate order id: {0}")]
    Duplicate(OrderId),

    /// The row changed since it was read.
    #[error("version conflict on order {order_id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Order id.
        order_id: OrderId,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Write would break a uniqueness or reference constraint.
    #[error("store integrity violation: {0}")]
    Integrity(String),
}

/// Repository trait for Order and Trade persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a new order.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the id is taken, `Unavailable` on store failure.
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    /// Find an order by id.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Orders of a user, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_user(
        &self,
        user_id: &UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError>;

    /// Replace an order if the stored version equals `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `VersionConflict` or `Unavailable`.
    async fn update(&self, order: &Order, expected_version: u64) -> Result<(), StoreError>;

    /// Insert a trade record.
    ///
    /// # Errors
    ///
    /// Returns `Integrity` if the trade id is taken or the order is unknown.
    async fn insert_trade(&self, trade: &Trade) -> Result<(), StoreError>;

    /// Update an order and insert the trade its fill produced, in one
    /// transaction. Nothing is written if either part fails.
    ///
    /// # Errors
    ///
    /// Same as `update` and `insert_trade`.
    async fn update_with_trade(
        &self,
        order: &Order,
        expected_version: u64,
        trade: &Trade,
    ) -> Result<(), StoreError>;

    /// Trades of an order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_trades_by_order(&self, order_id: &OrderId) -> Result<Vec<Trade>, StoreError>;
}
