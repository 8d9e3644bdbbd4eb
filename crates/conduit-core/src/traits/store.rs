// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings store consulted when resolving plugin contexts.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::BoxError;
use crate::legacy::DataSource;

/// Per-organization settings of a plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginSetting {
    pub org_id: i64,
    pub plugin_id: String,
    pub enabled: bool,
    pub json_data: serde_json::Value,
    pub decrypted_secure_json_data: HashMap<String, String>,
    pub updated: DateTime<Utc>,
}

/// Storage for plugin settings and data sources.
///
/// Lookups return `Ok(None)` for missing rows; `Err` is reserved for the
/// store itself being unavailable and is reported to callers as
/// [`PluginError::ContextResolution`](crate::error::PluginError::ContextResolution).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn plugin_setting(
        &self,
        org_id: i64,
        plugin_id: &str,
    ) -> Result<Option<PluginSetting>, BoxError>;

    async fn data_source_by_uid(
        &self,
        org_id: i64,
        uid: &str,
    ) -> Result<Option<DataSource>, BoxError>;
}
