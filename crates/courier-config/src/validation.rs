// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes, non-empty paths, and non-zero attempt caps.

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.client.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "client.base_url must not be empty".to_string(),
        });
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("client.base_url `{base_url}` must start with http:// or https://"),
        });
    }

    if config.client.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "client.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.staging_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.staging_dir must not be empty".to_string(),
        });
    }

    let attempt_caps = [
        ("retry.backoff_max_attempts", config.retry.backoff_max_attempts),
        ("retry.circuit_max_attempts", config.retry.circuit_max_attempts),
        ("retry.circuit_failure_threshold", config.retry.circuit_failure_threshold),
        ("retry.idempotent_max_attempts", config.retry.idempotent_max_attempts),
    ];
    for (key, value) in attempt_caps {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be at least 1"),
            });
        }
    }

    if config.resumable.chunk_size == 0 {
        errors.push(ConfigError::Validation {
            message: "resumable.chunk_size must be at least 1 byte".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = CourierConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = CourierConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn base_url_without_scheme_fails_validation() {
        let mut config = CourierConfig::default();
        config.client.base_url = "localhost:8080".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("http://"))));
    }

    #[test]
    fn zero_caps_are_all_reported() {
        let mut config = CourierConfig::default();
        config.retry.backoff_max_attempts = 0;
        config.retry.idempotent_max_attempts = 0;
        config.resumable.chunk_size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn parsed_partial_config_validates() {
        let toml_str = r#"
[resumable]
chunk_size = 4096

[delivery]
strategy = "level3"
"#;
        let config: CourierConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.resumable.chunk_size, 4096);
        assert_eq!(config.resumable.max_chunk_retries, 5);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn parsed_unknown_field_is_rejected() {
        let toml_str = r#"
[queue]
failure_pause = 10
"#;
        let result = toml::from_str::<CourierConfig>(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn parsed_zero_chunk_size_fails_validation() {
        let toml_str = r#"
[resumable]
chunk_size = 0
"#;
        let config: CourierConfig = toml::from_str(toml_str).unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
