// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::ConduitConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &ConduitConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.log.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "log.level `{}` must be one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.live.channel_capacity == 0 {
        errors.push(ConfigError::validation(
            "live.channel_capacity must be greater than 0",
        ));
    }

    let mut plugin_keys = HashSet::new();
    for (i, plugin) in config.plugins.iter().enumerate() {
        if plugin.id.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "plugins[{i}].id must not be empty"
            )));
            continue;
        }
        if !plugin_keys.insert((plugin.org_id, plugin.id.as_str())) {
            errors.push(ConfigError::validation(format!(
                "duplicate plugin `{}` for org {} in [[plugins]] array",
                plugin.id, plugin.org_id
            )));
        }
    }

    let known_plugins: HashSet<&str> = config.plugins.iter().map(|p| p.id.as_str()).collect();
    let mut data_source_keys = HashSet::new();
    for (i, ds) in config.datasources.iter().enumerate() {
        if ds.uid.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "datasources[{i}].uid must not be empty"
            )));
            continue;
        }
        if !data_source_keys.insert((ds.org_id, ds.uid.as_str())) {
            errors.push(ConfigError::validation(format!(
                "duplicate data source uid `{}` for org {} in [[datasources]] array",
                ds.uid, ds.org_id
            )));
        }
        if !known_plugins.contains(ds.plugin_type.as_str()) {
            errors.push(ConfigError::validation(format!(
                "data source `{}` has type `{}`, which is not a configured plugin",
                ds.uid, ds.plugin_type
            )));
        }
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
    use crate::loader::load_config_from_str;

    fn messages(result: Result<(), Vec<ConfigError>>) -> Vec<String> {
        result
            .expect_err("validation should fail")
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ConduitConfig::default()).is_ok());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = ConduitConfig::default();
        config.log.level = "verbose".into();
        let msgs = messages(validate_config(&config));
        assert!(msgs[0].contains("log.level"));
    }

    #[test]
    fn rejects_zero_channel_capacity() {
        let mut config = ConduitConfig::default();
        config.live.channel_capacity = 0;
        let msgs = messages(validate_config(&config));
        assert!(msgs[0].contains("channel_capacity"));
    }

    #[test]
    fn collects_all_plugin_and_data_source_errors() {
        let config = load_config_from_str(
            r#"
[[plugins]]
id = "testdata"

[[plugins]]
id = "testdata"

[[datasources]]
uid = "ds-a"
name = "A"
type = "testdata"

[[datasources]]
uid = "ds-a"
name = "A again"
type = "prometheus"
"#,
        )
        .unwrap();
        let msgs = messages(validate_config(&config));
        assert_eq!(msgs.len(), 3, "got: {msgs:?}");
        assert!(msgs.iter().any(|m| m.contains("duplicate plugin `testdata`")));
        assert!(msgs.iter().any(|m| m.contains("duplicate data source uid `ds-a`")));
        assert!(msgs.iter().any(|m| m.contains("`prometheus`")));
    }

    #[test]
    fn same_uid_in_different_orgs_is_allowed() {
        let config = load_config_from_str(
            r#"
[[plugins]]
id = "testdata"

[[datasources]]
uid = "shared"
name = "Org 1"
type = "testdata"

[[datasources]]
uid = "shared"
org_id = 2
name = "Org 2"
type = "testdata"
"#,
        )
        .unwrap();
        assert!(validate_config(&config).is_ok());
    }
}
