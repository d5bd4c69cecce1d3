//! Engine configuration
//!
//! Loaded from TOML, overridable from `WARDEN_`-prefixed environment
//! variables, validated before use.
//!
//! ```toml
//! [coordinator]
//! operation_ttl_secs = 86400
//! lock_timeout_ms = 5000
//! verification_timeout_ms = 2000
//!
//! [logging]
//! level = "info"
//! ansi = true
//!
//! [default_policy]
//! require_multi_sig = false
//! threshold = 1
//! high_value_threshold_wei = "1000000000000000000"
//! allowed_operation_kinds = ["all"]
//! ```

pub mod validation;

use crate::types::SigningPolicy;
use crate::{WardenError, WardenResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub use validation::{ConfigValidator, ValidationError};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "WARDEN_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Coordinator timing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Lifetime of an open operation
    pub operation_ttl_secs: u64,
    /// Longest wait for a per-operation or per-account lock
    pub lock_timeout_ms: u64,
    /// Longest wait for a signer back-end verdict
    pub verification_timeout_ms: u64,
}

impl CoordinatorConfig {
    /// TTL in milliseconds
    pub fn operation_ttl_ms(&self) -> u64 {
        self.operation_ttl_secs.saturating_mul(1000)
    }

    /// Lock timeout as a duration
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Verification timeout as a duration
    pub fn verification_timeout(&self) -> Duration {
        Duration::from_millis(self.verification_timeout_ms)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            operation_ttl_secs: 24 * 60 * 60, // 24 hours
            lock_timeout_ms: 5_000,
            verification_timeout_ms: 2_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter; `RUST_LOG` takes precedence
    pub level: String,
    /// Colored output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Coordinator timing
    pub coordinator: CoordinatorConfig,
    /// Logging
    pub logging: LoggingConfig,
    /// Policy applied to accounts that have none stored
    pub default_policy: SigningPolicy,
}

impl WardenConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> WardenResult<Self> {
        toml::from_str(content).map_err(|e| WardenError::invalid(format!("Invalid TOML: {e}")))
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> WardenResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WardenError::invalid(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load, apply environment overrides, and validate
    pub fn load(path: &Path) -> WardenResult<Self> {
        let mut config = Self::load_from_file(path)?;
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn merge_with_env(&mut self) -> WardenResult<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from `(name, value)` pairs; names without the
    /// `WARDEN_` prefix are ignored
    pub fn merge_with_vars<I>(&mut self, vars: I) -> WardenResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            if let Some(key) = name.strip_prefix(ENV_PREFIX) {
                self.set_from_string(&key.to_ascii_lowercase(), &value)?;
            }
        }
        Ok(())
    }

    /// Set a single value by its flattened key, e.g. `coordinator_lock_timeout_ms`
    pub fn set_from_string(&mut self, key: &str, value: &str) -> WardenResult<()> {
        match key {
            "coordinator_operation_ttl_secs" => {
                self.coordinator.operation_ttl_secs = parse_u64(key, value)?;
            }
            "coordinator_lock_timeout_ms" => {
                self.coordinator.lock_timeout_ms = parse_u64(key, value)?;
            }
            "coordinator_verification_timeout_ms" => {
                self.coordinator.verification_timeout_ms = parse_u64(key, value)?;
            }
            "logging_level" => self.logging.level = value.to_ascii_lowercase(),
            "logging_ansi" => {
                self.logging.ansi = value.parse::<bool>().map_err(|e| {
                    WardenError::invalid(format!("{key}: expected true/false: {e}"))
                })?;
            }
            other => {
                tracing::debug!(key = other, "ignoring unknown configuration override");
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> WardenResult<()> {
        let mut coordinator = ConfigValidator::for_field("coordinator");
        coordinator
            .range(
                "operation_ttl_secs",
                self.coordinator.operation_ttl_secs,
                Some(1),
                Some(30 * 24 * 60 * 60),
            )
            .range("lock_timeout_ms", self.coordinator.lock_timeout_ms, Some(1), Some(60_000))
            .range(
                "verification_timeout_ms",
                self.coordinator.verification_timeout_ms,
                Some(1),
                Some(60_000),
            );

        let mut logging = ConfigValidator::for_field("logging");
        logging.one_of("level", &self.logging.level, &LOG_LEVELS);

        let mut policy = ConfigValidator::for_field("default_policy");
        policy
            .range("threshold", u64::from(self.default_policy.threshold), Some(1), None)
            .check(
                "allowed_operation_kinds",
                !self.default_policy.allowed_operation_kinds.is_empty(),
                "must allow at least one operation kind",
            );

        let mut validator = ConfigValidator::new();
        validator.merge(coordinator).merge(logging).merge(policy);
        validator.finish()
    }
}

fn parse_u64(key: &str, value: &str) -> WardenResult<u64> {
    value
        .parse::<u64>()
        .map_err(|e| WardenError::invalid(format!("{key}: expected unsigned integer: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OperationCategory, Wei};
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        WardenConfig::default().validate().unwrap();
    }

    #[test]
    fn parses_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[coordinator]
operation_ttl_secs = 3600
lock_timeout_ms = 250

[logging]
level = "debug"

[default_policy]
require_multi_sig = true
threshold = 2
high_value_threshold_wei = "1000000000000000000"
time_delay_seconds = 600
allowed_operation_kinds = ["transfer", "token_approval"]
"#
        )
        .unwrap();

        let config = WardenConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.coordinator.operation_ttl_secs, 3600);
        assert_eq!(config.coordinator.lock_timeout_ms, 250);
        assert_eq!(config.coordinator.verification_timeout_ms, 2_000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.default_policy.threshold, 2);
        assert_eq!(
            config.default_policy.high_value_threshold_wei,
            Some(Wei(1_000_000_000_000_000_000))
        );
        assert!(config
            .default_policy
            .allowed_operation_kinds
            .contains(&OperationCategory::TokenApproval));
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = WardenConfig::default();
        config
            .merge_with_vars(vec![
                ("WARDEN_COORDINATOR_OPERATION_TTL_SECS".to_string(), "60".to_string()),
                ("WARDEN_LOGGING_LEVEL".to_string(), "WARN".to_string()),
                ("HOME".to_string(), "/root".to_string()),
            ])
            .unwrap();
        assert_eq!(config.coordinator.operation_ttl_secs, 60);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn bad_override_is_rejected() {
        let mut config = WardenConfig::default();
        let err = config
            .merge_with_vars(vec![(
                "WARDEN_COORDINATOR_LOCK_TIMEOUT_MS".to_string(),
                "soon".to_string(),
            )])
            .unwrap_err();
        assert!(matches!(err, WardenError::Invalid { .. }));
    }

    #[test]
    fn validation_reports_every_field() {
        let mut config = WardenConfig::default();
        config.coordinator.lock_timeout_ms = 0;
        config.logging.level = "loud".to_string();
        config.default_policy.threshold = 0;

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("coordinator.lock_timeout_ms"));
        assert!(message.contains("logging.level"));
        assert!(message.contains("default_policy.threshold"));
    }
}
