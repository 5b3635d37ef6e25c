//! Shared Value Objects
//!
//! Immutable domain types compared by value, not identity.

mod identifiers;
mod symbol;
mod timestamp;

pub use identifiers::{OrderId, TradeId, UserId};
pub use symbol::Symbol;
pub use timestamp::Timestamp;
