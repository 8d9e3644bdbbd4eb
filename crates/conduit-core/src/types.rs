// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request, response, and context types exchanged with backend plugin handlers.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Role of a user within an organization.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    #[default]
    Viewer,
    Editor,
    Admin,
}

/// Whether a plugin serves data sources or is an app.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    #[default]
    Datasource,
    App,
}

/// The principal a call is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInUser {
    pub user_id: i64,
    pub org_id: i64,
    pub login: String,
    pub name: String,
    pub email: String,
    pub org_role: OrgRole,
}

/// The user as seen by a plugin handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub name: String,
    pub email: String,
    pub role: OrgRole,
}

impl From<&SignedInUser> for User {
    fn from(user: &SignedInUser) -> Self {
        Self {
            login: user.login.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.org_role,
        }
    }
}

/// Settings of an app plugin for one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInstanceSettings {
    pub json_data: serde_json::Value,
    pub decrypted_secure_json_data: HashMap<String, String>,
    pub updated: DateTime<Utc>,
}

/// Settings of one data source instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceInstanceSettings {
    pub id: i64,
    pub uid: String,
    pub name: String,
    pub url: String,
    pub user: String,
    pub database: String,
    pub basic_auth_enabled: bool,
    pub basic_auth_user: String,
    pub json_data: serde_json::Value,
    pub decrypted_secure_json_data: HashMap<String, String>,
    pub updated: DateTime<Utc>,
}

/// Execution context of a single plugin call.
///
/// Built fresh for every call; never shared between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginContext {
    pub org_id: i64,
    pub plugin_id: String,
    pub user: Option<User>,
    pub app_instance_settings: Option<AppInstanceSettings>,
    pub data_source_instance_settings: Option<DataSourceInstanceSettings>,
}

impl PluginContext {
    /// A bare context with no user and no settings.
    pub fn new(org_id: i64, plugin_id: impl Into<String>) -> Self {
        Self {
            org_id,
            plugin_id: plugin_id.into(),
            user: None,
            app_instance_settings: None,
            data_source_instance_settings: None,
        }
    }
}

// --- Health ---

/// Outcome of a plugin health check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HealthStatus {
    #[default]
    Unknown,
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckHealthRequest {
    pub plugin_context: PluginContext,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CheckHealthResult {
    pub status: HealthStatus,
    pub message: String,
    pub json_details: Vec<u8>,
}

// --- Resources ---

#[derive(Debug, Clone, PartialEq)]
pub struct CallResourceRequest {
    pub plugin_context: PluginContext,
    pub path: String,
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, Vec<String>>,
    pub body: Vec<u8>,
}

/// One chunk of a resource response. The first chunk carries the status
/// and headers; later chunks only extend the body.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResourceResponse {
    pub status: u16,
    pub headers: HashMap<String, Vec<String>>,
    pub body: Vec<u8>,
}

// --- Data queries ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// A single query inside a [`QueryDataRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct DataQuery {
    pub ref_id: String,
    pub query_type: String,
    pub max_data_points: i64,
    pub interval: Duration,
    pub time_range: TimeRange,
    pub json: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryDataRequest {
    pub plugin_context: PluginContext,
    pub headers: HashMap<String, String>,
    pub queries: Vec<DataQuery>,
}

/// A column of a [`DataFrame`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub values: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataFrame {
    pub name: String,
    pub fields: Vec<Field>,
}

impl DataFrame {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            values,
        });
        self
    }

    /// Number of rows, taken from the first field.
    pub fn rows(&self) -> usize {
        self.fields.first().map_or(0, |f| f.values.len())
    }
}

/// Result of one query, keyed by ref id in [`QueryDataResponse`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataResponse {
    pub frames: Vec<DataFrame>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryDataResponse {
    pub responses: BTreeMap<String, DataResponse>,
}

// --- Streams ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SubscribeStreamStatus {
    Ok,
    NotFound,
    PermissionDenied,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeToStreamRequest {
    pub plugin_context: PluginContext,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeToStreamResponse {
    pub status: SubscribeStreamStatus,
    /// Initial payload delivered to a new subscriber, if any.
    pub initial_data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunStreamRequest {
    pub plugin_context: PluginContext,
    pub path: String,
}

/// A unit of data pushed by a running stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPacket {
    pub data: Vec<u8>,
}

impl StreamPacket {
    /// Serialize a value as the packet's JSON payload.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            data: serde_json::to_vec(value)?,
        })
    }
}

// --- Metrics ---

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectMetricsResult {
    pub prometheus_metrics: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn org_role_parses_case_insensitively() {
        assert_eq!(OrgRole::from_str("Admin").unwrap(), OrgRole::Admin);
        assert_eq!(OrgRole::from_str("editor").unwrap(), OrgRole::Editor);
        assert_eq!(OrgRole::Viewer.to_string(), "viewer");
    }

    #[test]
    fn user_from_signed_in_user() {
        let signed_in = SignedInUser {
            user_id: 7,
            org_id: 2,
            login: "alice".into(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            org_role: OrgRole::Editor,
        };
        let user = User::from(&signed_in);
        assert_eq!(user.login, "alice");
        assert_eq!(user.role, OrgRole::Editor);
    }

    #[test]
    fn frame_rows_come_from_first_field() {
        let frame = DataFrame::new("A")
            .with_field("time", vec![1.into(), 2.into(), 3.into()])
            .with_field("value", vec![0.5.into(), 0.7.into(), 0.9.into()]);
        assert_eq!(frame.rows(), 3);
        assert_eq!(DataFrame::new("empty").rows(), 0);
    }

    #[test]
    fn health_status_display() {
        assert_eq!(HealthStatus::Ok.to_string(), "OK");
        assert_eq!(HealthStatus::default(), HealthStatus::Unknown);
    }
}
