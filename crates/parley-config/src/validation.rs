// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-empty paths and a well-formed agent endpoint.

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let endpoint = config.agent_api.endpoint.trim();
    if endpoint.is_empty() {
        errors.push(ConfigError::Validation {
            message: "agent_api.endpoint must not be empty".to_string(),
        });
    } else if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent_api.endpoint `{endpoint}` must start with http:// or https://"
            ),
        });
    }

    if config.agent_api.timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "agent_api.timeout_ms must be greater than zero".to_string(),
        });
    }

    let level = config.log.level.trim();
    if !matches!(level, "trace" | "debug" | "info" | "warn" | "error") {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{level}` is not one of trace, debug, info, warn, error"
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ParleyConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = ParleyConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))
        ));
    }

    #[test]
    fn non_http_endpoint_fails_validation() {
        let mut config = ParleyConfig::default();
        config.agent_api.endpoint = "ftp://agents.example.com".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("endpoint"))
        ));
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let mut config = ParleyConfig::default();
        config.agent_api.timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("timeout_ms"))
        ));
    }

    #[test]
    fn bad_log_level_fails_validation() {
        let mut config = ParleyConfig::default();
        config.log.level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("log.level"))
        ));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = ParleyConfig::default();
        config.storage.database_path = "".to_string();
        config.agent_api.timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
