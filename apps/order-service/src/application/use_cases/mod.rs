//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod command_context;
mod lifecycle_error;
mod order_lifecycle;
mod order_locks;

pub use command_context::{CommandContext, Interrupted};
pub use lifecycle_error::{LifecycleError, PropagationStage};
pub use order_lifecycle::{
    FillReceipt, LifecycleSettings, LookupSource, OrderLifecycleManager, OrderLookup,
};
