//! Domain Layer
//!
//! Pure business logic for the order lifecycle. Depends on nothing outside
//! the domain except serialization and decimal arithmetic.

pub mod order_lifecycle;
pub mod shared;
