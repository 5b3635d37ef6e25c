//! Order Lifecycle Bounded Context
//!
//! Owns the order state machine and the execution records produced by fills.
//!
//! # Key Concepts
//!
//! - **Order Aggregate**: `pending` → `part_filled`/`filled`/`cancelled`/`rejected`
//! - **Trade**: immutable execution record, one per fill
//! - **Lifecycle Event**: `{action, order_id, data}` envelope emitted after every mutation

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod repository;
pub mod services;
pub mod value_objects;

pub use aggregate::{NewOrder, Order, Trade};
pub use errors::OrderError;
pub use events::{LifecycleAction, LifecycleEvent};
pub use repository::{OrderRepository, StoreError};
pub use services::OrderStateMachine;
pub use value_objects::{OrderSide, OrderStatus, OrderType};
