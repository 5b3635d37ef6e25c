//! Application Layer
//!
//! The application layer orchestrates domain logic through use cases.
//! It defines:
//!
//! - **Ports**: Interfaces for the cache and the message log
//! - **Use Cases**: The order lifecycle manager
//! - **Services**: The background lifecycle event consumer
//! - **DTOs**: Command input from callers

pub mod dto;
pub mod ports;
pub mod services;
pub mod use_cases;

pub use dto::*;
pub use ports::*;
pub use services::*;
pub use use_cases::*;
