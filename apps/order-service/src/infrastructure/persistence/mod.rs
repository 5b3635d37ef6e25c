//! Persistence Adapters
//!
//! Implementations of the order store contract.

pub mod in_memory;

pub use in_memory::InMemoryOrderRepository;
