//! Lifecycle Event Consumer
//!
//! Drains the message log in the background and dispatches each lifecycle
//! event to a handler. A bad message never stops the loop: undecodable
//! payloads, handler errors and handler panics are logged, counted and
//! skipped. Delivery is
//! at-least-once, so handlers must tolerate redelivery.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{EventSourcePort, LogRecord};
use crate::domain::order_lifecycle::{LifecycleAction, LifecycleEvent, Order};
use crate::domain::shared::OrderId;
use crate::observability;

/// Handler error.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// The handler could not process the event.
    #[error("event handler failed: {message}")]
    Failed {
        /// Error details.
        message: String,
    },
}

/// Reacts to lifecycle events.
#[async_trait]
pub trait LifecycleEventHandler: Send + Sync {
    /// Process one event.
    async fn handle(&self, event: &LifecycleEvent) -> Result<(), HandlerError>;
}

/// Logs every event by action.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventHandler;

#[async_trait]
impl LifecycleEventHandler for LoggingEventHandler {
    async fn handle(&self, event: &LifecycleEvent) -> Result<(), HandlerError> {
        let order = &event.data;
        match event.action {
            LifecycleAction::Create => tracing::info!(
                order_id = %event.order_id,
                user_id = %order.user_id(),
                symbol = %order.symbol(),
                "Order created"
            ),
            LifecycleAction::Cancel => tracing::info!(
                order_id = %event.order_id,
                reason = order.cancel_reason().unwrap_or_default(),
                "Order cancelled"
            ),
            LifecycleAction::Fill => tracing::info!(
                order_id = %event.order_id,
                filled_amount = %order.filled_amount(),
                status = %order.status(),
                "Order filled"
            ),
        }
        Ok(())
    }
}

/// Latest known snapshot of every order seen on the log.
///
/// Snapshots whose version is not newer than the held one are ignored, so
/// redelivered or replayed events leave the projection unchanged.
#[derive(Debug, Default)]
pub struct OrderProjection {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl OrderProjection {
    /// Create an empty projection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of an order, if seen.
    #[must_use]
    pub fn get(&self, order_id: &OrderId) -> Option<Order> {
        self.orders.read().get(order_id).cloned()
    }

    /// Number of orders tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    /// True if nothing has been projected yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }

    fn apply(&self, snapshot: &Order) -> bool {
        let mut orders = self.orders.write();
        match orders.get(snapshot.order_id()) {
            Some(current) if current.version() >= snapshot.version() => false,
            _ => {
                orders.insert(snapshot.order_id().clone(), snapshot.clone());
                true
            }
        }
    }
}

#[async_trait]
impl LifecycleEventHandler for OrderProjection {
    async fn handle(&self, event: &LifecycleEvent) -> Result<(), HandlerError> {
        if event.data.order_id() != &event.order_id {
            return Err(HandlerError::Failed {
                message: format!(
                    "envelope order_id {} does not match snapshot {}",
                    event.order_id,
                    event.data.order_id()
                ),
            });
        }

        if !self.apply(&event.data) {
            tracing::debug!(
                order_id = %event.order_id,
                version = event.data.version(),
                "Ignoring stale or duplicate snapshot"
            );
        }
        Ok(())
    }
}

/// Runs several handlers for each event.
///
/// Every handler sees every event; the first error is returned after all
/// handlers ran.
#[derive(Default)]
pub struct FanOutHandler {
    handlers: Vec<Arc<dyn LifecycleEventHandler>>,
}

impl FanOutHandler {
    /// Create an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler.
    #[must_use]
    pub fn with(mut self, handler: Arc<dyn LifecycleEventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }
}

#[async_trait]
impl LifecycleEventHandler for FanOutHandler {
    async fn handle(&self, event: &LifecycleEvent) -> Result<(), HandlerError> {
        let mut first_error = None;
        for handler in &self.handlers {
            if let Err(e) = handler.handle(event).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Consumer loop configuration.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// First pause after a source error.
    pub error_backoff: Duration,
    /// Upper bound for the doubling backoff.
    pub max_error_backoff: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            error_backoff: Duration::from_millis(100),
            max_error_backoff: Duration::from_secs(5),
        }
    }
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Events handled successfully.
    pub processed: u64,
    /// Payloads that did not decode.
    pub poisoned: u64,
    /// Events the handler rejected or panicked on.
    pub handler_failures: u64,
    /// Failed reads from the source.
    pub source_errors: u64,
}

/// Background consumer of lifecycle events.
pub struct LifecycleEventConsumer<S>
where
    S: EventSourcePort + 'static,
{
    source: Arc<S>,
    handler: Arc<dyn LifecycleEventHandler>,
    config: ConsumerConfig,
}

impl<S> LifecycleEventConsumer<S>
where
    S: EventSourcePort + 'static,
{
    /// Create a consumer with default configuration.
    #[must_use]
    pub fn new(source: Arc<S>, handler: Arc<dyn LifecycleEventHandler>) -> Self {
        Self::with_config(source, handler, ConsumerConfig::default())
    }

    /// Create a consumer with custom configuration.
    #[must_use]
    pub fn with_config(
        source: Arc<S>,
        handler: Arc<dyn LifecycleEventHandler>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            source,
            handler,
            config,
        }
    }

    /// Start the loop on the runtime. It stops when `shutdown` (or the
    /// returned handle) is cancelled or the source closes.
    #[must_use]
    pub fn spawn(self, shutdown: CancellationToken) -> ConsumerHandle {
        let token = shutdown.clone();
        let join = tokio::spawn(self.run(shutdown));
        ConsumerHandle { token, join }
    }

    /// Run the loop on the current task until shutdown or source close.
    pub async fn run(self, shutdown: CancellationToken) -> ConsumerStats {
        let mut stats = ConsumerStats::default();
        let mut backoff = self.config.error_backoff;

        tracing::info!("Lifecycle event consumer started");

        loop {
            let next = tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                next = self.source.recv() => next,
            };

            match next {
                Ok(Some(record)) => {
                    backoff = self.config.error_backoff;
                    self.dispatch(&record, &mut stats).await;
                }
                Ok(None) => {
                    tracing::info!("Message log closed");
                    break;
                }
                Err(e) => {
                    stats.source_errors += 1;
                    tracing::warn!(
                        error = %e,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "Failed to read message log, backing off"
                    );
                    tokio::select! {
                        biased;
                        () = shutdown.cancelled() => break,
                        () = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(self.config.max_error_backoff);
                }
            }
        }

        tracing::info!(
            processed = stats.processed,
            poisoned = stats.poisoned,
            handler_failures = stats.handler_failures,
            source_errors = stats.source_errors,
            "Lifecycle event consumer stopped"
        );
        stats
    }

    async fn dispatch(&self, record: &LogRecord, stats: &mut ConsumerStats) {
        let event = match LifecycleEvent::decode(&record.payload) {
            Ok(event) => event,
            Err(e) => {
                stats.poisoned += 1;
                observability::record_event_consumed("unknown", "poison");
                tracing::warn!(
                    partition = record.partition,
                    offset = record.offset,
                    key = %record.key,
                    error = %e,
                    "Skipping undecodable lifecycle event"
                );
                return;
            }
        };

        // The handler runs on its own task so a panic is contained to one event.
        let handler = Arc::clone(&self.handler);
        let handled = event.clone();
        let outcome = tokio::spawn(async move { handler.handle(&handled).await }).await;

        match outcome {
            Ok(Ok(())) => {
                stats.processed += 1;
                observability::record_event_consumed(event.action.as_str(), "ok");
            }
            Err(e) => {
                stats.handler_failures += 1;
                observability::record_event_consumed(event.action.as_str(), "handler_panic");
                tracing::error!(
                    partition = record.partition,
                    offset = record.offset,
                    order_id = %event.order_id,
                    action = %event.action,
                    error = %e,
                    "Lifecycle event handler panicked, skipping"
                );
            }
            Ok(Err(e)) => {
                stats.handler_failures += 1;
                observability::record_event_consumed(event.action.as_str(), "handler_error");
                tracing::warn!(
                    partition = record.partition,
                    offset = record.offset,
                    order_id = %event.order_id,
                    action = %event.action,
                    error = %e,
                    "Lifecycle event handler failed, skipping"
                );
            }
        }
    }
}

/// Owner handle of a spawned consumer.
#[derive(Debug)]
pub struct ConsumerHandle {
    token: CancellationToken,
    join: JoinHandle<ConsumerStats>,
}

impl ConsumerHandle {
    /// Ask the loop to stop after the current event.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// True once the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the loop to exit.
    ///
    /// # Errors
    ///
    /// Returns error if the task panicked or was aborted.
    pub async fn join(self) -> Result<ConsumerStats, JoinError> {
        self.join.await
    }

    /// Stop and wait.
    ///
    /// # Errors
    ///
    /// Returns error if the task panicked or was aborted.
    pub async fn shutdown(self) -> Result<ConsumerStats, JoinError> {
        self.stop();
        self.join().await
    }
}
