//! Adapter wiring.

mod container;

pub use container::{Container, InMemoryLifecycleManager};
