//! Application Services
//!
//! Application services coordinate domain logic and infrastructure adapters.
//! They differ from use cases in that they run as background tasks.

mod event_consumer;

pub use event_consumer::{
    ConsumerConfig, ConsumerHandle, ConsumerStats, FanOutHandler, HandlerError,
    LifecycleEventConsumer, LifecycleEventHandler, LoggingEventHandler, OrderProjection,
};
