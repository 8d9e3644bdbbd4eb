// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Conduit configuration system.

use conduit_config::diagnostic::ConfigError;
use conduit_config::model::ConduitConfig;
use conduit_config::{load_and_validate_str, load_config_from_str};
use conduit_core::types::{OrgRole, PluginKind};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_conduit_config() {
    let toml = r#"
[log]
level = "debug"

[metrics]
enabled = false

[live]
channel_capacity = 32

[principal]
user_id = 42
org_id = 3
login = "alice"
name = "Alice"
email = "alice@example.com"
role = "editor"

[[plugins]]
id = "testdata"
org_id = 3
json_data = { seed = 7 }
secure_json_data = { token = "s3cret" }

[[plugins]]
id = "annotations-app"
kind = "app"
org_id = 3

[[datasources]]
id = 11
uid = "ds-1"
org_id = 3
name = "TestData"
type = "testdata"
url = "http://localhost:3000"
basic_auth = true
basic_auth_user = "bob"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.log.level, "debug");
    assert!(!config.metrics.enabled);
    assert_eq!(config.live.channel_capacity, 32);
    assert_eq!(config.principal.login, "alice");
    assert_eq!(config.principal.role, OrgRole::Editor);
    assert_eq!(config.plugins.len(), 2);
    assert_eq!(config.plugins[0].json_data["seed"], 7);
    assert_eq!(
        config.plugins[0].secure_json_data.get("token").map(String::as_str),
        Some("s3cret")
    );
    assert_eq!(config.plugins[1].kind, PluginKind::App);
    assert_eq!(config.datasources[0].plugin_type, "testdata");
    assert!(config.datasources[0].basic_auth);
}

#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty config should load");
    assert_eq!(config.log.level, "info");
    assert!(config.metrics.enabled);
    assert_eq!(config.live.channel_capacity, 128);
    assert_eq!(config.principal.org_id, 1);
    assert_eq!(config.principal.role, OrgRole::Admin);
    assert!(config.plugins.is_empty());
    assert!(config.datasources.is_empty());
}

#[test]
fn plugin_defaults_apply_per_entry() {
    let config = load_config_from_str("[[plugins]]\nid = \"testdata\"\n").unwrap();
    let plugin = config.plugin("testdata").expect("plugin should be present");
    assert_eq!(plugin.kind, PluginKind::Datasource);
    assert_eq!(plugin.org_id, 1);
    assert!(plugin.enabled);
    assert!(plugin.json_data.is_object());
}

#[test]
fn principal_converts_to_signed_in_user() {
    let config = load_config_from_str("[principal]\nlogin = \"ops\"\norg_id = 9\n").unwrap();
    let user = config.principal.to_signed_in_user();
    assert_eq!(user.login, "ops");
    assert_eq!(user.org_id, 9);
}

#[test]
fn deny_unknown_fields_at_top_level() {
    let err = load_config_from_str("[plugin_settings]\nfoo = 1\n").expect_err("should reject");
    assert!(format!("{err}").contains("plugin_settings"));
}

#[test]
fn diagnostic_suggests_key_for_typo() {
    let errors = load_and_validate_str("[live]\nchanel_capacity = 4\n").expect_err("should fail");
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "chanel_capacity");
            assert_eq!(suggestion.as_deref(), Some("channel_capacity"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn diagnostic_suggests_value_for_role_typo() {
    let errors = load_and_validate_str("[principal]\nrole = \"admn\"\n").expect_err("should fail");
    match &errors[0] {
        ConfigError::UnknownValue {
            value, suggestion, ..
        } => {
            assert_eq!(value, "admn");
            assert_eq!(suggestion.as_deref(), Some("admin"));
        }
        other => panic!("expected UnknownValue, got {other:?}"),
    }
}

#[test]
fn diagnostic_reports_missing_data_source_uid() {
    let errors = load_and_validate_str("[[datasources]]\nname = \"x\"\ntype = \"testdata\"\n")
        .expect_err("should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::MissingKey { key } if key.ends_with("uid"))),
        "got: {errors:?}"
    );
}

#[test]
fn diagnostic_invalid_type_message() {
    let errors =
        load_and_validate_str("[live]\nchannel_capacity = \"lots\"\n").expect_err("should fail");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }), "got: {errors:?}");
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let errors = load_and_validate_str("[log]\nlevle = \"info\"\n").expect_err("should fail");
    let mut buf = String::new();
    let diagnostic: &dyn Diagnostic = &errors[0];
    GraphicalReportHandler::new()
        .render_report(&mut buf, diagnostic)
        .expect("render should succeed");
    assert!(buf.contains("levle"));
    assert!(buf.contains("level"));
}

#[test]
fn load_and_validate_runs_validation() {
    let errors = load_and_validate_str("[log]\nlevel = \"loud\"\n").expect_err("should fail");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn serialized_defaults_round_trip() {
    let json = serde_json::to_value(ConduitConfig::default()).unwrap();
    assert_eq!(json["live"]["channel_capacity"], 128);
    assert_eq!(json["principal"]["role"], "admin");
}
