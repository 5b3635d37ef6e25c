//! Dependency Injection Container
//!
//! Builds the configured adapters and wires them into the lifecycle
//! manager and the event consumer.

use std::sync::Arc;

use crate::application::services::{
    ConsumerConfig, LifecycleEventConsumer, LifecycleEventHandler,
};
use crate::application::use_cases::OrderLifecycleManager;
use crate::config::{CacheKind, Config, MessagingKind, StoreKind};
use crate::infrastructure::cache::InMemoryOrderCache;
use crate::infrastructure::messaging::{InMemoryMessageLog, LogConsumer};
use crate::infrastructure::persistence::InMemoryOrderRepository;

/// Lifecycle manager over the in-process adapters.
pub type InMemoryLifecycleManager =
    OrderLifecycleManager<InMemoryOrderRepository, InMemoryOrderCache, InMemoryMessageLog>;

/// Dependency injection container.
///
/// Owns one instance of each adapter and a single lifecycle manager over
/// them; consumers handed out read the same log.
pub struct Container {
    store: Arc<InMemoryOrderRepository>,
    cache: Arc<InMemoryOrderCache>,
    log: Arc<InMemoryMessageLog>,
    manager: Arc<InMemoryLifecycleManager>,
    consumer_config: ConsumerConfig,
    consumer_group: String,
}

impl Container {
    /// Build adapters from configuration.
    pub fn from_config(config: &Config) -> Self {
        let store = match config.store.kind {
            StoreKind::Memory => Arc::new(InMemoryOrderRepository::new()),
        };
        let cache = match config.cache.kind {
            CacheKind::Memory => Arc::new(InMemoryOrderCache::new()),
        };
        let log = match config.messaging.kind {
            MessagingKind::Memory => Arc::new(InMemoryMessageLog::new(
                config.messaging.topic.clone(),
                config.messaging.partitions,
            )),
        };

        tracing::debug!(
            topic = %config.messaging.topic,
            partitions = config.messaging.partitions,
            "adapters built"
        );

        let manager = Arc::new(OrderLifecycleManager::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&log),
            config.lifecycle.to_settings(&config.cache),
        ));

        Self {
            store,
            cache,
            log,
            manager,
            consumer_config: config.messaging.consumer_config(),
            consumer_group: config.messaging.consumer_group.clone(),
        }
    }

    /// Get the order store.
    pub fn store(&self) -> Arc<InMemoryOrderRepository> {
        Arc::clone(&self.store)
    }

    /// Get the order cache.
    pub fn cache(&self) -> Arc<InMemoryOrderCache> {
        Arc::clone(&self.cache)
    }

    /// Get the lifecycle event log.
    pub fn message_log(&self) -> Arc<InMemoryMessageLog> {
        Arc::clone(&self.log)
    }

    /// Get the lifecycle manager.
    pub fn lifecycle_manager(&self) -> Arc<InMemoryLifecycleManager> {
        Arc::clone(&self.manager)
    }

    /// Create a consumer in the configured group feeding `handler`.
    pub fn event_consumer(
        &self,
        handler: Arc<dyn LifecycleEventHandler>,
    ) -> LifecycleEventConsumer<LogConsumer> {
        let source = Arc::new(self.log.subscribe(self.consumer_group.clone()));
        LifecycleEventConsumer::with_config(source, handler, self.consumer_config.clone())
    }
}
