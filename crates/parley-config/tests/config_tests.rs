// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading, validation, and diagnostics.

use parley_config::{ConfigError, ParleyConfig, load_and_validate_str};

#[test]
fn empty_config_yields_defaults() {
    let config = load_and_validate_str("").expect("empty config should validate");
    assert!(config.storage.database_path.ends_with("parley.db"));
    assert!(config.storage.wal_mode);
    assert_eq!(config.agent_api.endpoint, "http://localhost:8000");
    assert_eq!(config.agent_api.timeout_ms, 30_000);
    assert_eq!(config.log.level, "info");
}

#[test]
fn toml_overrides_defaults() {
    let toml = r#"
[storage]
database_path = "/var/lib/parley/relay.db"
wal_mode = false

[agent_api]
endpoint = "https://agents.example.com"
timeout_ms = 5000

[log]
level = "debug"
"#;
    let config = load_and_validate_str(toml).expect("config should validate");
    assert_eq!(config.storage.database_path, "/var/lib/parley/relay.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.agent_api.endpoint, "https://agents.example.com");
    assert_eq!(config.agent_api.timeout_ms, 5000);
    assert_eq!(config.log.level, "debug");
}

#[test]
fn partial_section_keeps_other_defaults() {
    let toml = r#"
[agent_api]
timeout_ms = 12000
"#;
    let config = load_and_validate_str(toml).expect("config should validate");
    assert_eq!(config.agent_api.timeout_ms, 12_000);
    assert_eq!(config.agent_api.endpoint, "http://localhost:8000");
}

#[test]
fn unknown_key_is_rejected_with_suggestion() {
    let toml = r#"
[agent_api]
endpont = "http://localhost:9000"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("expected an UnknownKey diagnostic");
    assert_eq!(unknown.0, "endpont");
    assert_eq!(unknown.1.as_deref(), Some("endpoint"));
}

#[test]
fn wrong_type_is_rejected() {
    let toml = r#"
[agent_api]
timeout_ms = "thirty seconds"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "expected an InvalidType diagnostic, got: {errors:?}"
    );
}

#[test]
fn validation_errors_surface_through_entry_point() {
    let toml = r#"
[agent_api]
endpoint = "agents.example.com"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("http://"))
    ));
}

#[test]
fn deny_unknown_fields_applies_to_top_level() {
    let toml = r#"
unknown_section_key = true
"#;
    assert!(load_and_validate_str(toml).is_err());
}

#[test]
fn config_round_trips_through_toml() {
    let config = ParleyConfig::default();
    let serialized = toml::to_string(&config).expect("defaults should serialize");
    let reparsed: ParleyConfig = toml::from_str(&serialized).expect("should reparse");
    assert_eq!(
        reparsed.agent_api.endpoint,
        config.agent_api.endpoint
    );
    assert_eq!(reparsed.storage.wal_mode, config.storage.wal_mode);
}
