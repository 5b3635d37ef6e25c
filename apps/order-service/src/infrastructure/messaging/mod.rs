//! Messaging Adapters
//!
//! Publisher and consumer sides of the partitioned message log.

pub mod in_memory_log;

pub use in_memory_log::{InMemoryMessageLog, LogConsumer};
