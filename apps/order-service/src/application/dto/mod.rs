//! Data Transfer Objects
//!
//! Command input as it arrives from callers, before domain validation.

mod order_dto;

pub use order_dto::{CreateOrderDto, FillOrderDto};
