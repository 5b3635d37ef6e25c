//! Shared Domain Types
//!
//! Value objects and errors shared across the order lifecycle context.

pub mod errors;
pub mod value_objects;

pub use errors::DomainError;
pub use value_objects::{OrderId, Symbol, Timestamp, TradeId, UserId};
