//! Configuration loading and the `validate-config` command

use anyhow::{Context, Result};
use std::path::Path;
use warden_core::WardenConfig;

/// Load `path` (or defaults), apply `WARDEN_*` overrides and validate
pub fn load_config(path: Option<&Path>) -> Result<WardenConfig> {
    match path {
        Some(path) => WardenConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => {
            let mut config = WardenConfig::default();
            config.merge_with_env()?;
            config.validate()?;
            Ok(config)
        }
    }
}

/// Report the effective configuration as JSON
pub fn validate_config(config: &WardenConfig) -> Result<String> {
    config.validate()?;
    let rendered = serde_json::to_string_pretty(config)?;
    Ok(format!("configuration is valid\n\n{rendered}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_load_without_a_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.coordinator.lock_timeout_ms, 5_000);
    }

    #[test]
    fn file_values_are_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[coordinator]
operation_ttl_secs = 600

[default_policy]
require_multi_sig = true
threshold = 2
allowed_operation_kinds = ["transfer"]
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.coordinator.operation_ttl_secs, 600);
        let report = validate_config(&config).unwrap();
        assert!(report.starts_with("configuration is valid"));
        assert!(report.contains("\"threshold\": 2"));
    }

    #[test]
    fn invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[coordinator]\nlock_timeout_ms = 0").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("lock_timeout_ms"));
    }
}
