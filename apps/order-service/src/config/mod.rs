//! Configuration module for the order service.
//!
//! Loads a YAML file with environment variable interpolation and
//! validates it before any adapter is built.
//!
//! # Usage
//!
//! ```rust,ignore
//! use order_service::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/config.yaml"))?;
//!
//! println!("topic: {}", config.messaging.topic);
//! ```

mod lifecycle;
mod messaging;
mod observability;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use lifecycle::{CacheConfig, CacheKind, LifecycleConfig, StoreConfig, StoreKind};
pub use messaging::{MessagingConfig, MessagingKind};
pub use observability::{LoggingConfig, MetricsConfig, ObservabilityConfig};

/// Upper bound on the partition count of the in-process log.
const MAX_PARTITIONS: usize = 1024;

/// Upper bound on the cache TTL (ten years).
const MAX_CACHE_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Lifecycle manager settings.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Order store.
    #[serde(default)]
    pub store: StoreConfig,
    /// Order cache.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Lifecycle event log and consumer.
    #[serde(default)]
    pub messaging: MessagingConfig,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// A document with no content yields the defaults.
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);

    let config: Config = if is_empty_document(&interpolated) {
        Config::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };

    validate_config(&config)?;
    Ok(config)
}

fn is_empty_document(yaml: &str) -> bool {
    yaml.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#') || line == "---")
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let lifecycle = &config.lifecycle;

    if lifecycle.cache_ttl_secs == 0 || lifecycle.cache_ttl_secs > MAX_CACHE_TTL_SECS {
        return Err(ConfigError::ValidationError(format!(
            "lifecycle.cache_ttl_secs must be in 1..={MAX_CACHE_TTL_SECS}"
        )));
    }

    let fee_rate = lifecycle.default_fee_rate;
    if fee_rate.is_sign_negative() || fee_rate >= rust_decimal::Decimal::ONE {
        return Err(ConfigError::ValidationError(
            "lifecycle.default_fee_rate must be in [0, 1)".to_string(),
        ));
    }

    if lifecycle.propagation_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "lifecycle.propagation_timeout_ms must be positive".to_string(),
        ));
    }

    if config.cache.key_prefix.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.key_prefix must not be empty".to_string(),
        ));
    }

    let messaging = &config.messaging;
    if messaging.topic.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "messaging.topic must not be empty".to_string(),
        ));
    }

    if messaging.consumer_group.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "messaging.consumer_group must not be empty".to_string(),
        ));
    }

    if messaging.partitions == 0 || messaging.partitions > MAX_PARTITIONS {
        return Err(ConfigError::ValidationError(format!(
            "messaging.partitions must be between 1 and {MAX_PARTITIONS}"
        )));
    }

    if messaging.error_backoff_ms > messaging.max_error_backoff_ms {
        return Err(ConfigError::ValidationError(
            "messaging.error_backoff_ms must not exceed max_error_backoff_ms".to_string(),
        ));
    }

    let valid_formats = ["json", "pretty"];
    if !valid_formats.contains(&config.observability.logging.format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of: {valid_formats:?}"
        )));
    }

    if config.observability.metrics.enabled {
        config.observability.metrics.socket_addr()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.lifecycle.cache_ttl_secs, 86_400);
        assert_eq!(config.lifecycle.default_fee_rate, dec!(0.001));
        assert_eq!(config.lifecycle.max_conflict_retries, 3);
        assert_eq!(config.store.kind, StoreKind::Memory);
        assert_eq!(config.cache.key_prefix, "order:");
        assert_eq!(config.messaging.topic, "orders");
        assert_eq!(config.messaging.consumer_group, "order-group");
        assert_eq!(config.observability.logging.format, "json");
        assert!(!config.observability.metrics.enabled);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_document_is_valid() {
        let config = match load_config_from_string("# nothing configured\n") {
            Ok(c) => c,
            Err(e) => panic!("empty config should load: {e}"),
        };
        assert_eq!(config.messaging.partitions, 8);
    }

    #[test]
    fn test_load_partial_config() {
        let yaml = r#"
lifecycle:
  default_fee_rate: "0.002"
messaging:
  partitions: 4
"#;

        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load partial config: {e}"),
        };
        assert_eq!(config.lifecycle.default_fee_rate, dec!(0.002));
        assert_eq!(config.lifecycle.cache_ttl_secs, 86_400); // Default value
        assert_eq!(config.messaging.partitions, 4);
        assert_eq!(config.messaging.topic, "orders"); // Default value
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
lifecycle:
  cache_ttl_secs: 3600
  default_fee_rate: "0.0005"
  max_conflict_retries: 5
  propagation_timeout_ms: 1000
store:
  kind: memory
cache:
  kind: memory
  key_prefix: "ord:"
messaging:
  kind: memory
  topic: order-events
  partitions: 16
  consumer_group: projections
  error_backoff_ms: 50
  max_error_backoff_ms: 2000
observability:
  logging:
    level: debug
    format: pretty
  metrics:
    enabled: true
    listen_addr: "127.0.0.1:9100"
"#;

        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load full config: {e}"),
        };
        assert_eq!(config.lifecycle.cache_ttl_secs, 3600);
        assert_eq!(config.lifecycle.max_conflict_retries, 5);
        assert_eq!(config.cache.key_prefix, "ord:");
        assert_eq!(config.messaging.topic, "order-events");
        assert_eq!(config.messaging.consumer_group, "projections");
        assert_eq!(config.observability.logging.level, "debug");

        let exporter = config.observability.metrics.exporter_config().unwrap();
        assert_eq!(exporter.listen_addr.port(), 9100);
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        // Use a variable name unlikely to exist
        let input = "topic: ${ORDER_SERVICE_TEST_NONEXISTENT_VAR:-orders}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "topic: orders");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn test_env_var_with_default_uses_existing() {
        // PATH should always exist
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);

        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "group: ${ORDER_SERVICE_TEST_UNLIKELY_TO_EXIST}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "group: ");
    }

    #[test]
    fn test_interpolated_default_feeds_parser() {
        let yaml = "messaging:\n  partitions: ${ORDER_SERVICE_TEST_NO_PARTITIONS:-2}\n";
        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.messaging.partitions, 2);
    }

    #[test]
    fn test_validation_zero_partitions() {
        let yaml = "messaging:\n  partitions: 0\n";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("zero partitions should fail validation");
        };
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("messaging.partitions"));
    }

    #[test]
    fn test_validation_cache_ttl_bounds() {
        let Err(err) = load_config_from_string("lifecycle:\n  cache_ttl_secs: 0\n") else {
            panic!("zero ttl should fail validation");
        };
        assert!(err.to_string().contains("cache_ttl_secs"));

        let huge = format!("lifecycle:\n  cache_ttl_secs: {}\n", u64::MAX);
        let Err(err) = load_config_from_string(&huge) else {
            panic!("unbounded ttl should fail validation");
        };
        assert!(err.to_string().contains("cache_ttl_secs"));

        let ten_years = format!("lifecycle:\n  cache_ttl_secs: {MAX_CACHE_TTL_SECS}\n");
        assert!(load_config_from_string(&ten_years).is_ok());
    }

    #[test]
    fn test_validation_fee_rate_out_of_range() {
        let yaml = "lifecycle:\n  default_fee_rate: \"1.5\"\n";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("fee rate >= 1 should fail validation");
        };
        assert!(err.to_string().contains("default_fee_rate"));
    }

    #[test]
    fn test_validation_invalid_log_format() {
        let yaml = "observability:\n  logging:\n    format: xml\n";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("unknown log format should fail validation");
        };
        assert!(err.to_string().contains("logging.format"));
    }

    #[test]
    fn test_validation_bad_metrics_addr_only_when_enabled() {
        let disabled = "observability:\n  metrics:\n    listen_addr: nowhere\n";
        assert!(load_config_from_string(disabled).is_ok());

        let enabled = "observability:\n  metrics:\n    enabled: true\n    listen_addr: nowhere\n";
        assert!(load_config_from_string(enabled).is_err());
    }

    #[test]
    fn test_validation_backoff_order() {
        let yaml = "messaging:\n  error_backoff_ms: 10000\n  max_error_backoff_ms: 100\n";
        assert!(load_config_from_string(yaml).is_err());
    }

    #[test]
    fn test_unknown_store_kind_is_parse_error() {
        let yaml = "store:\n  kind: mysql\n";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("unsupported store kind should not parse");
        };
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache:\n  key_prefix: \"cached:\"").unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.cache.key_prefix, "cached:");
    }

    #[test]
    fn test_load_config_missing_file() {
        let Err(err) = load_config(Some("/definitely/not/here/config.yaml")) else {
            panic!("missing file should fail");
        };
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
