// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Order Service - Order Lifecycle Core
//!
//! Owns the order state machine and keeps the system of record, the order
//! cache and the lifecycle event stream consistent.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic
//!   - `order_lifecycle`: Order aggregate, trades, status state machine,
//!     lifecycle events, store contract
//!   - `shared`: identifiers, trading pair, timestamps
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: cache, event publisher and event source contracts
//!   - `use_cases`: `OrderLifecycleManager` (create, cancel, fill, get)
//!   - `services`: lifecycle event consumer loop and handlers
//!   - `dto`: command payloads
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: order store
//!   - `cache`: order snapshot cache
//!   - `messaging`: partitioned lifecycle event log
//!   - `config`: dependency injection container
//!
//! # Write path
//!
//! Every command validates first, then commits to the store, refreshes the
//! cache and publishes a lifecycle event, in that order. A failure stops
//! the remaining steps and is reported with enough detail to tell whether
//! the store was updated.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// YAML configuration loading and validation.
pub mod config;

/// Prometheus metrics.
pub mod observability;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::order_lifecycle::{
    LifecycleAction, LifecycleEvent, NewOrder, Order, OrderError, OrderRepository, OrderSide,
    OrderStatus, OrderType, StoreError, Trade,
};
pub use domain::shared::{OrderId, Symbol, Timestamp, TradeId, UserId};

// Application re-exports
pub use application::dto::{CreateOrderDto, FillOrderDto};
pub use application::ports::{EventPublisherPort, EventSourcePort, OrderCachePort};
pub use application::services::{
    ConsumerHandle, LifecycleEventConsumer, LifecycleEventHandler, OrderProjection,
};
pub use application::use_cases::{
    CommandContext, FillReceipt, LifecycleError, LifecycleSettings, OrderLifecycleManager,
};

// Infrastructure re-exports
pub use infrastructure::cache::InMemoryOrderCache;
pub use infrastructure::config::Container;
pub use infrastructure::messaging::InMemoryMessageLog;
pub use infrastructure::persistence::InMemoryOrderRepository;
