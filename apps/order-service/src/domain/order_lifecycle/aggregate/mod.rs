//! Order Aggregate
//!
//! The Order aggregate is the root entity for lifecycle management; a Trade
//! is the immutable record each fill leaves behind.

mod order;
mod trade;

pub use order::{NewOrder, Order};
pub use trade::Trade;
