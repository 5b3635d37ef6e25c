//! Cache Adapters
//!
//! Implementations of `OrderCachePort`.

pub mod in_memory;

pub use in_memory::InMemoryOrderCache;
