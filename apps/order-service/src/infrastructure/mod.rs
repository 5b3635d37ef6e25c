//! Infrastructure Layer
//!
//! Adapters implementing the ports of the application layer:
//!
//! - `persistence/`: order store (system of record)
//! - `cache/`: order snapshot cache with TTL
//! - `messaging/`: partitioned lifecycle event log, publisher and consumer sides
//! - `config/`: dependency injection container

pub mod cache;
pub mod config;
pub mod messaging;
pub mod persistence;
