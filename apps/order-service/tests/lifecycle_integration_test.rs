//! Lifecycle Integration Tests
//!
//! Drives the lifecycle manager against the in-memory store, cache and
//! message log built by the container, and checks what each adapter holds
//! after every command.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Notify;

use order_service::application::dto::{CreateOrderDto, FillOrderDto};
use order_service::application::ports::LogRecord;
use order_service::application::use_cases::{
    CommandContext, LifecycleError, LifecycleSettings, LookupSource, OrderLifecycleManager,
    PropagationStage,
};
use order_service::config::Config;
use order_service::domain::order_lifecycle::{
    LifecycleAction, LifecycleEvent, Order, OrderRepository, OrderSide, OrderStatus, OrderType,
    StoreError, Trade,
};
use order_service::domain::shared::{OrderId, UserId};
use order_service::infrastructure::cache::InMemoryOrderCache;
use order_service::infrastructure::config::{Container, InMemoryLifecycleManager};
use order_service::infrastructure::messaging::InMemoryMessageLog;
use order_service::infrastructure::persistence::InMemoryOrderRepository;

// =============================================================================
// Helpers
// =============================================================================

fn setup() -> (Container, Arc<InMemoryLifecycleManager>) {
    let container = Container::from_config(&Config::default());
    let manager = container.lifecycle_manager();
    (container, manager)
}

fn order_dto(order_id: &str, price: Decimal, amount: Decimal) -> CreateOrderDto {
    CreateOrderDto {
        order_id: order_id.to_string(),
        user_id: "7".to_string(),
        price,
        amount,
        ..CreateOrderDto::default()
    }
}

fn fill(price: Decimal, amount: Decimal) -> FillOrderDto {
    FillOrderDto::new(price, amount, Some(dec!(0.001)))
}

/// Events on the partition of `order_id` that belong to it, in log order.
fn events_for(container: &Container, order_id: &str) -> Vec<LifecycleEvent> {
    let log = container.message_log();
    log.records(log.partition_for(order_id))
        .iter()
        .filter(|record: &&LogRecord| record.key == order_id)
        .map(|record| LifecycleEvent::decode(&record.payload).unwrap())
        .collect()
}

/// Store whose next `find_by_id` parks after reading until resumed.
#[derive(Default)]
struct PausingStore {
    inner: InMemoryOrderRepository,
    pause_next_read: AtomicBool,
    paused: Notify,
    resume: Notify,
}

#[async_trait]
impl OrderRepository for PausingStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        self.inner.insert(order).await
    }

    async fn find_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let found = self.inner.find_by_id(order_id).await?;
        if self.pause_next_read.swap(false, Ordering::SeqCst) {
            self.paused.notify_one();
            self.resume.notified().await;
        }
        Ok(found)
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreError> {
        self.inner.find_by_user(user_id, status).await
    }

    async fn update(&self, order: &Order, expected_version: u64) -> Result<(), StoreError> {
        self.inner.update(order, expected_version).await
    }

    async fn insert_trade(&self, trade: &Trade) -> Result<(), StoreError> {
        self.inner.insert_trade(trade).await
    }

    async fn update_with_trade(
        &self,
        order: &Order,
        expected_version: u64,
        trade: &Trade,
    ) -> Result<(), StoreError> {
        self.inner
            .update_with_trade(order, expected_version, trade)
            .await
    }

    async fn find_trades_by_order(&self, order_id: &OrderId) -> Result<Vec<Trade>, StoreError> {
        self.inner.find_trades_by_order(order_id).await
    }
}


fn actions_for(container: &Container, order_id: &str) -> Vec<LifecycleAction> {
    events_for(container, order_id)
        .into_iter()
        .map(|event| event.action)
        .collect()
}

// =============================================================================
// Command scenarios
// =============================================================================

#[tokio::test]
async fn two_fills_complete_order_then_cancel_is_rejected() {
    let (container, manager) = setup();
    let ctx = CommandContext::new();
    let id = OrderId::new("O1");

    let created = manager
        .create(&ctx, order_dto("O1", dec!(100), dec!(10)))
        .await
        .unwrap();
    assert_eq!(created.status(), OrderStatus::Pending);
    assert_eq!(created.symbol().as_str(), "BTC/USDT");
    assert_eq!(created.order_type(), OrderType::Limit);
    assert_eq!(created.order_side(), OrderSide::Buy);
    assert_eq!(created.fee_asset(), "USDT");

    let first = manager.fill(&ctx, &id, fill(dec!(100), dec!(4))).await.unwrap();
    assert_eq!(first.order.status(), OrderStatus::PartFilled);
    assert_eq!(first.order.filled_amount(), dec!(4));
    assert_eq!(first.order.fee(), dec!(0.4));
    assert_eq!(first.trade.amount(), dec!(4));
    assert_eq!(first.trade.fee(), dec!(0.4));

    let second = manager.fill(&ctx, &id, fill(dec!(100), dec!(6))).await.unwrap();
    assert_eq!(second.order.status(), OrderStatus::Filled);
    assert_eq!(second.order.filled_amount(), dec!(10));
    assert_eq!(second.order.fee(), dec!(1.0));

    let trades = manager.order_trades(&ctx, &id).await.unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].amount(), dec!(4));
    assert_eq!(trades[1].amount(), dec!(6));
    let traded: Decimal = trades.iter().map(|t| t.amount()).sum();
    assert_eq!(traded, second.order.filled_amount());

    let err = manager.cancel(&ctx, &id, "too late").await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidState {
            status: OrderStatus::Filled,
            ..
        }
    ));

    assert_eq!(
        actions_for(&container, "O1"),
        vec![
            LifecycleAction::Create,
            LifecycleAction::Fill,
            LifecycleAction::Fill
        ]
    );
}

#[tokio::test]
async fn cancelled_order_rejects_fills() {
    let (container, manager) = setup();
    let ctx = CommandContext::new();
    let id = OrderId::new("O2");

    manager
        .create(&ctx, order_dto("O2", dec!(50), dec!(5)))
        .await
        .unwrap();
    let cancelled = manager.cancel(&ctx, &id, "user requested").await.unwrap();
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    assert_eq!(cancelled.cancel_reason(), Some("user requested"));

    let err = manager
        .fill(&ctx, &id, fill(dec!(50), dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidState { .. }));

    let err = manager.cancel(&ctx, &id, "again").await.unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidState { .. }));

    assert!(manager.order_trades(&ctx, &id).await.unwrap().is_empty());
    assert_eq!(
        actions_for(&container, "O2"),
        vec![LifecycleAction::Create, LifecycleAction::Cancel]
    );
}

#[tokio::test]
async fn zero_price_creates_nothing() {
    let (container, manager) = setup();

    let err = manager
        .create(&CommandContext::new(), order_dto("O3", Decimal::ZERO, dec!(1)))
        .await
        .unwrap_err();

    let LifecycleError::Validation { field, .. } = &err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert_eq!(field, "price");
    assert!(container.store().is_empty());
    assert!(container.cache().is_empty());
    assert!(container.message_log().is_empty());
}

#[tokio::test]
async fn overshooting_fill_is_accepted_as_filled() {
    let (_container, manager) = setup();
    let ctx = CommandContext::new();
    let id = OrderId::new("O4");

    manager
        .create(&ctx, order_dto("O4", dec!(10), dec!(5)))
        .await
        .unwrap();
    let receipt = manager.fill(&ctx, &id, fill(dec!(10), dec!(8))).await.unwrap();

    assert_eq!(receipt.order.status(), OrderStatus::Filled);
    assert_eq!(receipt.order.filled_amount(), dec!(8));
}

#[tokio::test]
async fn missing_fee_rate_uses_configured_default() {
    let (_container, manager) = setup();
    let ctx = CommandContext::new();
    let id = OrderId::new("O5");

    manager
        .create(&ctx, order_dto("O5", dec!(200), dec!(2)))
        .await
        .unwrap();
    let receipt = manager
        .fill(&ctx, &id, FillOrderDto::new(dec!(200), dec!(2), None))
        .await
        .unwrap();

    assert_eq!(receipt.trade.fee(), dec!(0.4));
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let (_container, manager) = setup();
    let ctx = CommandContext::new();
    let id = OrderId::new("missing");

    assert!(matches!(
        manager.get(&ctx, &id).await.unwrap_err(),
        LifecycleError::NotFound(_)
    ));
    assert!(matches!(
        manager.cancel(&ctx, &id, "x").await.unwrap_err(),
        LifecycleError::NotFound(_)
    ));
}

#[tokio::test]
async fn duplicate_create_is_rejected_by_store() {
    let (container, manager) = setup();
    let ctx = CommandContext::new();

    manager
        .create(&ctx, order_dto("O6", dec!(1), dec!(1)))
        .await
        .unwrap();
    let err = manager
        .create(&ctx, order_dto("O6", dec!(2), dec!(2)))
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Store(StoreError::Duplicate(_))));
    assert_eq!(container.message_log().len(), 1);
}

// =============================================================================
// Read path
// =============================================================================

#[tokio::test]
async fn read_after_write_is_served_from_cache() {
    let (_container, manager) = setup();
    let ctx = CommandContext::new();
    let id = OrderId::new("R1");

    manager
        .create(&ctx, order_dto("R1", dec!(10), dec!(10)))
        .await
        .unwrap();
    manager.fill(&ctx, &id, fill(dec!(10), dec!(3))).await.unwrap();

    let lookup = manager.lookup(&ctx, &id).await.unwrap();
    assert_eq!(lookup.source, LookupSource::Cache);
    assert_eq!(lookup.order.filled_amount(), dec!(3));
    assert_eq!(lookup.order.status(), OrderStatus::PartFilled);
}

#[tokio::test]
async fn cache_miss_reads_store_and_repopulates() {
    let (container, manager) = setup();
    let ctx = CommandContext::new();
    let id = OrderId::new("R2");

    manager
        .create(&ctx, order_dto("R2", dec!(10), dec!(10)))
        .await
        .unwrap();
    assert!(container.cache().evict(&manager.cache_key(&id)));

    let lookup = manager.lookup(&ctx, &id).await.unwrap();
    assert_eq!(lookup.source, LookupSource::Store);
    assert!(!lookup.cache_refresh_failed);

    let again = manager.lookup(&ctx, &id).await.unwrap();
    assert_eq!(again.source, LookupSource::Cache);
}

#[tokio::test]
async fn cache_outage_on_read_falls_back_and_flags_refresh() {
    let (container, manager) = setup();
    let ctx = CommandContext::new();
    let id = OrderId::new("R3");

    manager
        .create(&ctx, order_dto("R3", dec!(10), dec!(10)))
        .await
        .unwrap();
    container.cache().set_available(false);

    let lookup = manager.lookup(&ctx, &id).await.unwrap();
    assert_eq!(lookup.source, LookupSource::Store);
    assert!(lookup.cache_refresh_failed);
    assert_eq!(lookup.order.order_id(), &id);
}

#[tokio::test]
async fn store_fallback_read_does_not_overwrite_newer_snapshot() {
    let store = Arc::new(PausingStore::default());
    let cache = Arc::new(InMemoryOrderCache::new());
    let manager = Arc::new(OrderLifecycleManager::new(
        Arc::clone(&store),
        Arc::clone(&cache),
        Arc::new(InMemoryMessageLog::new("orders", 4)),
        LifecycleSettings::default(),
    ));
    let ctx = CommandContext::new();
    let id = OrderId::new("R4");

    manager
        .create(&ctx, order_dto("R4", dec!(10), dec!(10)))
        .await
        .unwrap();
    assert!(cache.evict(&manager.cache_key(&id)));

    // The reader sees version 1 in the store and parks before refreshing.
    store.pause_next_read.store(true, Ordering::SeqCst);
    let reader = {
        let manager = Arc::clone(&manager);
        let id = id.clone();
        tokio::spawn(async move { manager.get(&CommandContext::new(), &id).await })
    };
    store.paused.notified().await;

    let canceller = {
        let manager = Arc::clone(&manager);
        let id = id.clone();
        tokio::spawn(async move {
            manager
                .cancel(&CommandContext::new(), &id, "user requested")
                .await
        })
    };
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
    store.resume.notify_one();

    assert_eq!(
        reader.await.unwrap().unwrap().status(),
        OrderStatus::Pending
    );
    canceller.await.unwrap().unwrap();

    let lookup = manager.lookup(&ctx, &id).await.unwrap();
    assert_eq!(lookup.source, LookupSource::Cache);
    assert_eq!(lookup.order.status(), OrderStatus::Cancelled);
}

#[tokio::test]
async fn user_orders_are_listed_newest_first() {
    let (_container, manager) = setup();
    let ctx = CommandContext::new();

    for id in ["U1", "U2", "U3"] {
        manager
            .create(&ctx, order_dto(id, dec!(1), dec!(1)))
            .await
            .unwrap();
    }
    manager
        .cancel(&ctx, &OrderId::new("U2"), "user requested")
        .await
        .unwrap();

    let user = UserId::new("7");
    let all = manager.user_orders(&ctx, &user, None).await.unwrap();
    let ids: Vec<&str> = all.iter().map(|o| o.order_id().as_str()).collect();
    assert_eq!(ids, vec!["U3", "U2", "U1"]);

    let pending = manager
        .user_orders(&ctx, &user, Some(OrderStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|o| o.status() == OrderStatus::Pending));
}

// =============================================================================
// Write path failures
// =============================================================================

#[tokio::test]
async fn store_outage_stops_before_cache_and_log() {
    let (container, manager) = setup();
    container.store().set_available(false);

    let err = manager
        .create(&CommandContext::new(), order_dto("W1", dec!(1), dec!(1)))
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Store(StoreError::Unavailable(_))));
    assert!(!err.is_committed());
    assert!(err.is_retryable());
    assert!(container.cache().is_empty());
    assert!(container.message_log().is_empty());
}

#[tokio::test]
async fn cache_outage_after_commit_skips_publish() {
    let (container, manager) = setup();
    container.cache().set_available(false);

    let err = manager
        .create(&CommandContext::new(), order_dto("W2", dec!(1), dec!(1)))
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::CacheWrite { .. }));
    assert!(err.is_committed());
    assert_eq!(
        err.committed_order().map(|o| o.order_id().as_str()),
        Some("W2")
    );
    assert_eq!(container.store().len(), 1);
    assert!(container.message_log().is_empty());
}

#[tokio::test]
async fn publish_outage_leaves_store_and_cache_updated() {
    let (container, manager) = setup();
    let ctx = CommandContext::new();
    let id = OrderId::new("W3");

    manager
        .create(&ctx, order_dto("W3", dec!(10), dec!(10)))
        .await
        .unwrap();
    container.message_log().set_available(false);

    let err = manager
        .fill(&ctx, &id, fill(dec!(10), dec!(10)))
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Publish { .. }));
    assert!(err.is_committed());

    let lookup = manager.lookup(&ctx, &id).await.unwrap();
    assert_eq!(lookup.source, LookupSource::Cache);
    assert_eq!(lookup.order.status(), OrderStatus::Filled);
    assert_eq!(container.store().trade_count(), 1);
    assert_eq!(actions_for(&container, "W3"), vec![LifecycleAction::Create]);
}

#[tokio::test]
async fn cancelled_context_writes_nothing() {
    let (container, manager) = setup();
    let ctx = CommandContext::new();
    ctx.cancel();

    let err = manager
        .create(&ctx, order_dto("W4", dec!(1), dec!(1)))
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Cancelled));
    assert!(container.store().is_empty());
    assert!(container.message_log().is_empty());
}

#[test]
fn propagation_stage_is_reported_on_error() {
    // The stage label is what operators see in logs.
    assert_eq!(PropagationStage::Cache.to_string(), "cache");
    assert_eq!(PropagationStage::Publish.to_string(), "publish");
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_fill_and_cancel_leave_consistent_state() {
    let container = Container::from_config(&Config::default());
    let manager = container.lifecycle_manager();
    let id = OrderId::new("C1");

    manager
        .create(&CommandContext::new(), order_dto("C1", dec!(10), dec!(10)))
        .await
        .unwrap();

    let filler = {
        let manager = Arc::clone(&manager);
        let id = id.clone();
        tokio::spawn(async move {
            manager
                .fill(&CommandContext::new(), &id, fill(dec!(10), dec!(10)))
                .await
        })
    };
    let canceller = {
        let manager = Arc::clone(&manager);
        let id = id.clone();
        tokio::spawn(async move {
            manager
                .cancel(&CommandContext::new(), &id, "race")
                .await
        })
    };

    let fill_result = filler.await.unwrap();
    let cancel_result = canceller.await.unwrap();
    assert!(
        fill_result.is_ok() != cancel_result.is_ok(),
        "exactly one command must win"
    );

    let ctx = CommandContext::new();
    let stored = container.store().find_by_id(&id).await.unwrap().unwrap();
    let traded: Decimal = manager
        .order_trades(&ctx, &id)
        .await
        .unwrap()
        .iter()
        .map(|t| t.amount())
        .sum();
    assert_eq!(traded, stored.filled_amount());

    if fill_result.is_ok() {
        assert_eq!(stored.status(), OrderStatus::Filled);
    } else {
        assert_eq!(stored.status(), OrderStatus::Cancelled);
        assert_eq!(stored.filled_amount(), Decimal::ZERO);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_fills_keep_trades_in_step_with_order() {
    let container = Container::from_config(&Config::default());
    let manager = container.lifecycle_manager();
    let id = OrderId::new("C2");

    manager
        .create(&CommandContext::new(), order_dto("C2", dec!(10), dec!(20)))
        .await
        .unwrap();

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let id = id.clone();
            tokio::spawn(async move {
                manager
                    .fill(&CommandContext::new(), &id, fill(dec!(10), dec!(1)))
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let ctx = CommandContext::new();
    let stored = container.store().find_by_id(&id).await.unwrap().unwrap();
    let trades = manager.order_trades(&ctx, &id).await.unwrap();

    assert_eq!(stored.filled_amount(), dec!(10));
    assert_eq!(stored.status(), OrderStatus::PartFilled);
    assert_eq!(trades.len(), 10);
    let traded: Decimal = trades.iter().map(|t| t.amount()).sum();
    assert_eq!(traded, stored.filled_amount());

    // Serialized commands publish in commit order.
    let versions: Vec<u64> = events_for(&container, "C2")
        .iter()
        .map(|event| event.data.version())
        .collect();
    assert_eq!(versions, (1..=11).collect::<Vec<u64>>());
}
