//! Per-Order Locks
//!
//! Serializes commands that touch the same order id inside one process.
//! Commands on different orders never share a lock. Rows written by other
//! processes are still guarded by the store's version check.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::shared::OrderId;

/// Exclusive locks keyed by exact order id.
///
/// An entry lives only while a command holds or waits for it.
#[derive(Debug, Default)]
pub(super) struct OrderLocks {
    held: Mutex<HashMap<OrderId, Arc<AsyncMutex<()>>>>,
}

impl OrderLocks {
    /// Wait for exclusive access to `order_id`.
    pub(super) async fn acquire(&self, order_id: &OrderId) -> OrderLockGuard<'_> {
        let lock = Arc::clone(self.held.lock().entry(order_id.clone()).or_default());
        let release = Release {
            locks: self,
            order_id: order_id.clone(),
        };
        let guard = lock.lock_owned().await;

        OrderLockGuard {
            _guard: guard,
            _release: release,
        }
    }

    /// Number of orders with a holder or waiter.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.held.lock().len()
    }

    fn release(&self, order_id: &OrderId) {
        let mut held = self.held.lock();
        if held
            .get(order_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            held.remove(order_id);
        }
    }
}

/// Held for the duration of one command on one order.
pub(super) struct OrderLockGuard<'a> {
    // Field order matters: the mutex guard drops before the entry is released.
    _guard: OwnedMutexGuard<()>,
    _release: Release<'a>,
}

/// Drops the registry entry once nobody holds or waits for it. Also runs
/// when an `acquire` is abandoned while waiting.
struct Release<'a> {
    locks: &'a OrderLocks,
    order_id: OrderId,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.order_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn different_orders_do_not_wait() {
        let locks = OrderLocks::default();
        let _a = locks.acquire(&OrderId::new("A")).await;

        let b = tokio::time::timeout(Duration::from_secs(1), locks.acquire(&OrderId::new("B")))
            .await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn same_order_waits_for_holder() {
        let locks = OrderLocks::default();
        let id = OrderId::new("A");
        let held = locks.acquire(&id).await;

        let waiting = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&id)).await;
        assert!(waiting.is_err());

        drop(held);
        let again = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&id)).await;
        assert!(again.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_are_dropped_after_release() {
        let locks = OrderLocks::default();
        let id = OrderId::new("A");

        let held = locks.acquire(&id).await;
        // An abandoned waiter must not pin the entry.
        let _ = tokio::time::timeout(Duration::from_millis(10), locks.acquire(&id)).await;
        assert_eq!(locks.len(), 1);

        drop(held);
        assert_eq!(locks.len(), 0);

        drop(locks.acquire(&OrderId::new("B")).await);
        assert_eq!(locks.len(), 0);
    }
}
