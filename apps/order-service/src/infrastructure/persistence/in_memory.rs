//! In-memory order store.
//!
//! Stands in for the relational system of record: an `orders` table unique on
//! `order_id` and a `trades` table unique on `trade_id`, indexed by order.
//! All state sits behind one mutex, so every call is atomic and
//! `update_with_trade` behaves like a single transaction.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::order_lifecycle::{Order, OrderRepository, OrderStatus, StoreError, Trade};
use crate::domain::shared::{OrderId, TradeId, UserId};

#[derive(Debug)]
struct OrderRow {
    row_id: u64,
    order: Order,
}

#[derive(Debug, Default)]
struct Tables {
    orders: HashMap<OrderId, OrderRow>,
    trades: Vec<Trade>,
    trade_ids: HashSet<TradeId>,
    next_row_id: u64,
}

impl Tables {
    fn check_version(&self, order: &Order, expected_version: u64) -> Result<(), StoreError> {
        let row = self
            .orders
            .get(order.order_id())
            .ok_or_else(|| StoreError::NotFound(order.order_id().clone()))?;

        if row.order.version() != expected_version {
            return Err(StoreError::VersionConflict {
                order_id: order.order_id().clone(),
                expected: expected_version,
                actual: row.order.version(),
            });
        }
        Ok(())
    }

    fn check_trade(&self, trade: &Trade) -> Result<(), StoreError> {
        if self.trade_ids.contains(trade.trade_id()) {
            return Err(StoreError::Integrity(format!(
                "duplicate trade id {}",
                trade.trade_id()
            )));
        }
        if !self.orders.contains_key(trade.order_id()) {
            return Err(StoreError::Integrity(format!(
                "trade {} references unknown order {}",
                trade.trade_id(),
                trade.order_id()
            )));
        }
        Ok(())
    }

    fn replace(&mut self, order: &Order) {
        if let Some(row) = self.orders.get_mut(order.order_id()) {
            row.order = order.clone();
        }
    }

    fn append_trade(&mut self, trade: &Trade) {
        self.trade_ids.insert(trade.trade_id().clone());
        self.trades.push(trade.clone());
    }
}

/// In-memory implementation of `OrderRepository`.
///
/// Suitable for tests and local runs. `set_available(false)` makes every
/// call fail with `StoreError::Unavailable`.
#[derive(Debug)]
pub struct InMemoryOrderRepository {
    tables: Mutex<Tables>,
    available: AtomicBool,
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryOrderRepository {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().orders.len()
    }

    /// True if no order is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().orders.is_empty()
    }

    /// Number of stored trades.
    #[must_use]
    pub fn trade_count(&self) -> usize {
        self.lock().trades.len()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("order store is unavailable".to_string()))
        }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut tables = self.lock();

        if tables.orders.contains_key(order.order_id()) {
            return Err(StoreError::Duplicate(order.order_id().clone()));
        }

        tables.next_row_id += 1;
        let row_id = tables.next_row_id;
        tables.orders.insert(
            order.order_id().clone(),
            OrderRow {
                row_id,
                order: order.clone(),
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        self.ensure_available()?;
        Ok(self.lock().orders.get(order_id).map(|row| row.order.clone()))
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError> {
        self.ensure_available()?;
        let tables = self.lock();

        let mut rows: Vec<&OrderRow> = tables
            .orders
            .values()
            .filter(|row| row.order.user_id() == user_id)
            .filter(|row| status.is_none_or(|s| row.order.status() == s))
            .collect();
        rows.sort_by(|a, b| {
            b.order
                .created_at()
                .cmp(&a.order.created_at())
                .then(b.row_id.cmp(&a.row_id))
        });

        Ok(rows.into_iter().map(|row| row.order.clone()).collect())
    }

    async fn update(&self, order: &Order, expected_version: u64) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut tables = self.lock();

        tables.check_version(order, expected_version)?;
        tables.replace(order);
        Ok(())
    }

    async fn insert_trade(&self, trade: &Trade) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut tables = self.lock();

        tables.check_trade(trade)?;
        tables.append_trade(trade);
        Ok(())
    }

    async fn update_with_trade(
        &self,
        order: &Order,
        expected_version: u64,
        trade: &Trade,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut tables = self.lock();

        if trade.order_id() != order.order_id() {
            return Err(StoreError::Integrity(format!(
                "trade {} belongs to order {}, not {}",
                trade.trade_id(),
                trade.order_id(),
                order.order_id()
            )));
        }
        tables.check_version(order, expected_version)?;
        tables.check_trade(trade)?;

        tables.replace(order);
        tables.append_trade(trade);
        Ok(())
    }

    async fn find_trades_by_order(&self, order_id: &OrderId) -> Result<Vec<Trade>, StoreError> {
        self.ensure_available()?;
        Ok(self
            .lock()
            .trades
            .iter()
            .filter(|trade| trade.order_id() == order_id)
            .cloned()
            .collect())
    }
}
