//! Order Lifecycle Use Case
//!
//! Every mutating command runs the same fixed sequence:
//!
//! 1. validate and compute the new order state (no side effects)
//! 2. commit to the order store
//! 3. write the snapshot into the cache
//! 4. publish the lifecycle event keyed by `order_id`
//!
//! A failure stops the sequence. Failures after step 2 are reported with the
//! committed order attached. Reads go cache first and fall back to the store,
//! refreshing the cache on the way out.
//!
//! Commands on the same order id are serialized inside one manager, so the
//! cache and the log see snapshots in commit order. A read that falls back
//! to the store takes the same lock before writing its snapshot back, so it
//! never overwrites a newer one. Only the exact order id is locked; across
//! managers the store's version check is what keeps rows consistent.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use super::command_context::CommandContext;
use super::lifecycle_error::{LifecycleError, PropagationStage};
use super::order_locks::OrderLocks;
use crate::application::dto::{CreateOrderDto, FillOrderDto};
use crate::application::ports::{CacheError, EventPublisherPort, OrderCachePort, PublishError};
use crate::domain::order_lifecycle::{
    LifecycleAction, LifecycleEvent, Order, OrderError, OrderRepository, OrderStatus, StoreError,
    Trade,
};
use crate::domain::shared::{OrderId, UserId};
use crate::observability;

/// Tunables of the lifecycle manager.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    /// TTL of cached order snapshots.
    pub cache_ttl: Duration,
    /// Prefix of cache keys (`order:` gives `order:{order_id}`).
    pub cache_key_prefix: String,
    /// Fee rate used when a fill carries none.
    pub default_fee_rate: Decimal,
    /// Re-read/re-validate attempts after a version conflict.
    pub max_conflict_retries: u32,
    /// Upper bound for each post-commit cache write and publish.
    pub propagation_timeout: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            cache_key_prefix: "order:".to_string(),
            default_fee_rate: Decimal::new(1, 3),
            max_conflict_retries: 3,
            propagation_timeout: Duration::from_secs(5),
        }
    }
}

/// Where a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    /// Cache hit.
    Cache,
    /// Cache miss, unreadable entry or cache failure; served by the store.
    Store,
}

/// Result of a read, with the cache path it took.
#[derive(Debug, Clone)]
pub struct OrderLookup {
    /// The order.
    pub order: Order,
    /// Where it came from.
    pub source: LookupSource,
    /// The store result could not be written back to the cache.
    pub cache_refresh_failed: bool,
}

/// Result of a fill.
#[derive(Debug, Clone)]
pub struct FillReceipt {
    /// Order after the fill.
    pub order: Order,
    /// Execution record the fill produced.
    pub trade: Trade,
}

/// What a mutation asks the store to write besides the order row.
trait Effect {
    fn trade(&self) -> Option<&Trade>;
}

impl Effect for () {
    fn trade(&self) -> Option<&Trade> {
        None
    }
}

impl Effect for Trade {
    fn trade(&self) -> Option<&Trade> {
        Some(self)
    }
}

/// Orchestrates create/cancel/fill across the store, cache and publisher.
pub struct OrderLifecycleManager<R, C, P>
where
    R: OrderRepository,
    C: OrderCachePort,
    P: EventPublisherPort,
{
    store: Arc<R>,
    cache: Arc<C>,
    publisher: Arc<P>,
    settings: LifecycleSettings,
    locks: OrderLocks,
}

impl<R, C, P> OrderLifecycleManager<R, C, P>
where
    R: OrderRepository,
    C: OrderCachePort,
    P: EventPublisherPort,
{
    /// Create a new manager over the given adapters.
    pub fn new(
        store: Arc<R>,
        cache: Arc<C>,
        publisher: Arc<P>,
        settings: LifecycleSettings,
    ) -> Self {
        Self {
            store,
            cache,
            publisher,
            settings,
            locks: OrderLocks::default(),
        }
    }

    /// Active settings.
    #[must_use]
    pub const fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Cache key for an order.
    #[must_use]
    pub fn cache_key(&self, order_id: &OrderId) -> String {
        format!("{}{}", self.settings.cache_key_prefix, order_id)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Create a `pending` order.
    ///
    /// # Errors
    ///
    /// `Validation` before anything is written; `Store`, `Cancelled` or
    /// `DeadlineExceeded` with nothing committed; `CacheWrite`, `Publish` or
    /// `IncompletePropagation` after the store commit.
    #[instrument(skip_all, fields(order_id = %dto.order_id, user_id = %dto.user_id))]
    pub async fn create(
        &self,
        ctx: &CommandContext,
        dto: CreateOrderDto,
    ) -> Result<Order, LifecycleError> {
        let started = Instant::now();
        let result = self.try_create(ctx, dto).await;
        observe(LifecycleAction::Create.as_str(), started, &result);
        result
    }

    /// Cancel an open order.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `InvalidState` unless the order is
    /// `pending` or `part_filled`, plus the store/propagation errors of `create`.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn cancel(
        &self,
        ctx: &CommandContext,
        order_id: &OrderId,
        reason: &str,
    ) -> Result<Order, LifecycleError> {
        let started = Instant::now();
        let result = self.try_cancel(ctx, order_id, reason).await;
        observe(LifecycleAction::Cancel.as_str(), started, &result);
        result
    }

    /// Apply a fill and record its trade.
    ///
    /// # Errors
    ///
    /// `Validation` for a non-positive price or amount, `NotFound`,
    /// `InvalidState` for an order that no longer accepts fills, plus the
    /// store/propagation errors of `create`.
    #[instrument(skip_all, fields(order_id = %order_id, price = %dto.price, amount = %dto.amount))]
    pub async fn fill(
        &self,
        ctx: &CommandContext,
        order_id: &OrderId,
        dto: FillOrderDto,
    ) -> Result<FillReceipt, LifecycleError> {
        let started = Instant::now();
        let result = self.try_fill(ctx, order_id, &dto).await;
        observe(LifecycleAction::Fill.as_str(), started, &result);
        result
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Read an order through the cache.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Store`, `Cancelled` or `DeadlineExceeded`.
    pub async fn get(
        &self,
        ctx: &CommandContext,
        order_id: &OrderId,
    ) -> Result<Order, LifecycleError> {
        self.lookup(ctx, order_id).await.map(|lookup| lookup.order)
    }

    /// Read an order through the cache, reporting the path taken.
    ///
    /// A failed cache refresh does not fail the read; it is logged, counted
    /// and flagged on the result.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Store`, `Cancelled` or `DeadlineExceeded`.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn lookup(
        &self,
        ctx: &CommandContext,
        order_id: &OrderId,
    ) -> Result<OrderLookup, LifecycleError> {
        let started = Instant::now();
        let result = self.try_lookup(ctx, order_id).await;
        observe("get", started, &result);
        result
    }

    /// Orders of a user, newest first.
    ///
    /// # Errors
    ///
    /// `Store`, `Cancelled` or `DeadlineExceeded`.
    pub async fn user_orders(
        &self,
        ctx: &CommandContext,
        user_id: &UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, LifecycleError> {
        Ok(ctx.guard(self.store.find_by_user(user_id, status)).await??)
    }

    /// Trades of an order, oldest first.
    ///
    /// # Errors
    ///
    /// `Store`, `Cancelled` or `DeadlineExceeded`.
    pub async fn order_trades(
        &self,
        ctx: &CommandContext,
        order_id: &OrderId,
    ) -> Result<Vec<Trade>, LifecycleError> {
        Ok(ctx.guard(self.store.find_trades_by_order(order_id)).await??)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn try_create(
        &self,
        ctx: &CommandContext,
        dto: CreateOrderDto,
    ) -> Result<Order, LifecycleError> {
        let order = Order::create(dto.into_new_order()?)?;
        let _serial = ctx.guard(self.locks.acquire(order.order_id())).await?;

        ctx.checkpoint()?;
        self.store.insert(&order).await?;
        debug!(status = %order.status(), "Order committed");

        self.propagate(ctx, LifecycleAction::Create, order).await
    }

    async fn try_cancel(
        &self,
        ctx: &CommandContext,
        order_id: &OrderId,
        reason: &str,
    ) -> Result<Order, LifecycleError> {
        let _serial = ctx.guard(self.locks.acquire(order_id)).await?;
        let (order, ()) = self
            .mutate(ctx, order_id, |order| order.cancel(reason))
            .await?;
        self.propagate(ctx, LifecycleAction::Cancel, order).await
    }

    async fn try_fill(
        &self,
        ctx: &CommandContext,
        order_id: &OrderId,
        dto: &FillOrderDto,
    ) -> Result<FillReceipt, LifecycleError> {
        let fee_rate = dto.effective_fee_rate(self.settings.default_fee_rate);
        let _serial = ctx.guard(self.locks.acquire(order_id)).await?;
        let (order, trade) = self
            .mutate(ctx, order_id, |order| {
                order.apply_fill(dto.price, dto.amount, fee_rate)
            })
            .await?;
        let order = self.propagate(ctx, LifecycleAction::Fill, order).await?;
        Ok(FillReceipt { order, trade })
    }

    /// Read-validate-write against the store, retrying on version conflicts.
    ///
    /// The order is always re-read from the store; the cache never feeds a
    /// state transition.
    async fn mutate<T, F>(
        &self,
        ctx: &CommandContext,
        order_id: &OrderId,
        mut apply: F,
    ) -> Result<(Order, T), LifecycleError>
    where
        T: Effect,
        F: FnMut(&mut Order) -> Result<T, OrderError>,
    {
        let mut conflicts = 0;
        loop {
            let mut order = ctx
                .guard(self.store.find_by_id(order_id))
                .await??
                .ok_or_else(|| LifecycleError::NotFound(order_id.clone()))?;
            let expected_version = order.version();
            let effect = apply(&mut order)?;

            ctx.checkpoint()?;
            let written = match effect.trade() {
                Some(trade) => {
                    self.store
                        .update_with_trade(&order, expected_version, trade)
                        .await
                }
                None => self.store.update(&order, expected_version).await,
            };

            match written {
                Ok(()) => {
                    debug!(
                        status = %order.status(),
                        version = order.version(),
                        "Order committed"
                    );
                    return Ok((order, effect));
                }
                Err(StoreError::VersionConflict { actual, .. })
                    if conflicts < self.settings.max_conflict_retries =>
                {
                    conflicts += 1;
                    debug!(
                        expected_version,
                        actual, conflicts, "Version conflict, re-reading order"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Steps 3 and 4 of the write path. Runs to completion even if the
    /// caller's context is cancelled; each step is bounded by the
    /// propagation timeout.
    async fn propagate(
        &self,
        ctx: &CommandContext,
        action: LifecycleAction,
        order: Order,
    ) -> Result<Order, LifecycleError> {
        if let Err(source) = self.write_cache(&order).await {
            warn!(
                action = %action,
                error = %source,
                "Order committed but cache write failed, event not published"
            );
            observability::record_propagation_failure(PropagationStage::Cache.as_str());
            return Err(if ctx.is_interrupted() {
                LifecycleError::IncompletePropagation {
                    order: Box::new(order),
                    stage: PropagationStage::Cache,
                    reason: source.to_string(),
                }
            } else {
                LifecycleError::CacheWrite {
                    order: Box::new(order),
                    source,
                }
            });
        }

        let event = LifecycleEvent::new(action, &order);
        if let Err(source) = self.publish_event(&event).await {
            warn!(
                action = %action,
                error = %source,
                "Order committed but event publish failed"
            );
            observability::record_propagation_failure(PropagationStage::Publish.as_str());
            return Err(if ctx.is_interrupted() {
                LifecycleError::IncompletePropagation {
                    order: Box::new(order),
                    stage: PropagationStage::Publish,
                    reason: source.to_string(),
                }
            } else {
                LifecycleError::Publish {
                    order: Box::new(order),
                    source,
                }
            });
        }

        info!(
            action = %action,
            status = %order.status(),
            version = order.version(),
            "Order lifecycle event published"
        );
        Ok(order)
    }

    async fn try_lookup(
        &self,
        ctx: &CommandContext,
        order_id: &OrderId,
    ) -> Result<OrderLookup, LifecycleError> {
        let key = self.cache_key(order_id);

        match ctx.guard(self.cache.get(&key)).await? {
            Ok(Some(bytes)) => match serde_json::from_slice::<Order>(&bytes) {
                Ok(order) if order.order_id() == order_id => {
                    observability::record_cache_lookup("hit");
                    return Ok(OrderLookup {
                        order,
                        source: LookupSource::Cache,
                        cache_refresh_failed: false,
                    });
                }
                Ok(other) => {
                    observability::record_cache_lookup("corrupt");
                    warn!(
                        cached_order_id = %other.order_id(),
                        "Cache entry holds a different order, reading store"
                    );
                }
                Err(e) => {
                    observability::record_cache_lookup("corrupt");
                    warn!(error = %e, "Undecodable cache entry, reading store");
                }
            },
            Ok(None) => observability::record_cache_lookup("miss"),
            Err(e) => {
                observability::record_cache_lookup("error");
                warn!(error = %e, "Cache read failed, reading store");
            }
        }

        let _serial = ctx.guard(self.locks.acquire(order_id)).await?;
        let order = ctx
            .guard(self.store.find_by_id(order_id))
            .await??
            .ok_or_else(|| LifecycleError::NotFound(order_id.clone()))?;

        let cache_refresh_failed = match self.write_cache(&order).await {
            Ok(()) => false,
            Err(e) => {
                observability::record_cache_refresh_failure();
                warn!(error = %e, "Cache refresh after store read failed");
                true
            }
        };

        Ok(OrderLookup {
            order,
            source: LookupSource::Store,
            cache_refresh_failed,
        })
    }

    async fn write_cache(&self, order: &Order) -> Result<(), CacheError> {
        let payload = serde_json::to_vec(order).map_err(|e| CacheError::Serialization {
            message: e.to_string(),
        })?;
        let key = self.cache_key(order.order_id());
        let timeout = self.settings.propagation_timeout;

        tokio::time::timeout(timeout, self.cache.set(&key, payload, self.settings.cache_ttl))
            .await
            .map_err(|_| CacheError::Timeout(timeout))?
    }

    async fn publish_event(&self, event: &LifecycleEvent) -> Result<(), PublishError> {
        let payload = event.encode().map_err(|e| PublishError::Serialization {
            message: e.to_string(),
        })?;
        let timeout = self.settings.propagation_timeout;

        tokio::time::timeout(
            timeout,
            self.publisher.publish(event.order_id.as_str(), payload),
        )
        .await
        .map_err(|_| PublishError::Timeout(timeout))?
    }
}

fn observe<T>(action: &str, started: Instant, result: &Result<T, LifecycleError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    observability::record_command(action, outcome, started.elapsed().as_secs_f64());
}
