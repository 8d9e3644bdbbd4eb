// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Conduit plugin host.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::HashMap;

use conduit_core::types::{OrgRole, PluginKind, SignedInUser};
use serde::{Deserialize, Serialize};

/// Top-level Conduit configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConduitConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Plugin request metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// In-process live node settings.
    #[serde(default)]
    pub live: LiveConfig,

    /// The principal CLI calls are made on behalf of.
    #[serde(default)]
    pub principal: PrincipalConfig,

    /// Per-organization plugin settings.
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,

    /// Provisioned data sources.
    #[serde(default)]
    pub datasources: Vec<DataSourceConfig>,
}

impl ConduitConfig {
    /// Look up a plugin setting by plugin id.
    pub fn plugin(&self, id: &str) -> Option<&PluginConfig> {
        self.plugins.iter().find(|p| p.id == id)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder at startup.
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

/// Live node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LiveConfig {
    /// Publications buffered per channel before slow subscribers lag.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    128
}

/// Acting principal for calls made from the command line.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrincipalConfig {
    #[serde(default = "default_user_id")]
    pub user_id: i64,

    #[serde(default = "default_org_id")]
    pub org_id: i64,

    #[serde(default = "default_login")]
    pub login: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default = "default_role")]
    pub role: OrgRole,
}

impl Default for PrincipalConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            org_id: default_org_id(),
            login: default_login(),
            name: String::new(),
            email: String::new(),
            role: default_role(),
        }
    }
}

impl PrincipalConfig {
    pub fn to_signed_in_user(&self) -> SignedInUser {
        SignedInUser {
            user_id: self.user_id,
            org_id: self.org_id,
            login: self.login.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            org_role: self.role,
        }
    }
}

fn default_user_id() -> i64 {
    1
}

fn default_org_id() -> i64 {
    1
}

fn default_login() -> String {
    "admin".to_string()
}

fn default_role() -> OrgRole {
    OrgRole::Admin
}

/// Settings of one plugin within an organization.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    /// Plugin id, e.g. `testdata`.
    pub id: String,

    #[serde(default)]
    pub kind: PluginKind,

    #[serde(default = "default_org_id")]
    pub org_id: i64,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "empty_object")]
    pub json_data: serde_json::Value,

    /// Secret fields. Stored in plain text in the file; handed to plugins
    /// as decrypted secure data.
    #[serde(default)]
    pub secure_json_data: HashMap<String, String>,
}

fn default_enabled() -> bool {
    true
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// A provisioned data source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DataSourceConfig {
    #[serde(default)]
    pub id: i64,

    pub uid: String,

    #[serde(default = "default_org_id")]
    pub org_id: i64,

    pub name: String,

    /// Id of the plugin that serves this data source.
    #[serde(rename = "type")]
    pub plugin_type: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub database: String,

    #[serde(default)]
    pub basic_auth: bool,

    #[serde(default)]
    pub basic_auth_user: String,

    #[serde(default = "empty_object")]
    pub json_data: serde_json::Value,

    #[serde(default)]
    pub secure_json_data: HashMap<String, String>,
}
