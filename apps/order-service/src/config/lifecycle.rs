//! Lifecycle manager and adapter configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::use_cases::LifecycleSettings;

/// Settings of the order lifecycle manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// TTL of cached order snapshots, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Fee rate applied to fills that carry none.
    #[serde(default = "default_fee_rate")]
    pub default_fee_rate: Decimal,
    /// Re-read attempts after an optimistic concurrency conflict.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    /// Bound for each post-commit cache write and publish, in milliseconds.
    #[serde(default = "default_propagation_timeout_ms")]
    pub propagation_timeout_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            default_fee_rate: default_fee_rate(),
            max_conflict_retries: default_max_conflict_retries(),
            propagation_timeout_ms: default_propagation_timeout_ms(),
        }
    }
}

impl LifecycleConfig {
    /// Build manager settings, taking the key prefix from the cache section.
    #[must_use]
    pub fn to_settings(&self, cache: &CacheConfig) -> LifecycleSettings {
        LifecycleSettings {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            cache_key_prefix: cache.key_prefix.clone(),
            default_fee_rate: self.default_fee_rate,
            max_conflict_retries: self.max_conflict_retries,
            propagation_timeout: Duration::from_millis(self.propagation_timeout_ms),
        }
    }
}

const fn default_cache_ttl_secs() -> u64 {
    86_400
}

fn default_fee_rate() -> Decimal {
    Decimal::new(1, 3)
}

const fn default_max_conflict_retries() -> u32 {
    3
}

const fn default_propagation_timeout_ms() -> u64 {
    5_000
}

/// Backing implementation of the order store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process-local tables.
    #[default]
    Memory,
}

/// Order store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store implementation.
    #[serde(default)]
    pub kind: StoreKind,
}

/// Backing implementation of the order cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    /// Process-local map with TTL.
    #[default]
    Memory,
}

/// Order cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache implementation.
    #[serde(default)]
    pub kind: CacheKind,
    /// Key prefix; entries are stored under `{prefix}{order_id}`.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: CacheKind::default(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_key_prefix() -> String {
    "order:".to_string()
}
