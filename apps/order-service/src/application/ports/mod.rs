//! Application Ports (Driven)
//!
//! Interfaces for the external systems the lifecycle manager coordinates.
//! The order store contract lives in the domain (`OrderRepository`); the
//! cache and the message log are defined here.

mod cache_port;
mod event_publisher_port;
mod event_source_port;

pub use cache_port::{CacheError, OrderCachePort};
pub use event_publisher_port::{EventPublisherPort, PublishError};
pub use event_source_port::{ConsumeError, EventSourcePort, LogRecord};

#[cfg(test)]
pub use cache_port::MockOrderCachePort;
#[cfg(test)]
pub use event_publisher_port::MockEventPublisherPort;
#[cfg(test)]
pub use event_source_port::MockEventSourcePort;
