// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixture builders and a settings store that always fails.

use async_trait::async_trait;
use chrono::Utc;

use conduit_core::legacy::{DataSource, DataTimeRange, LegacyDataQuery, LegacyQuery};
use conduit_core::types::{OrgRole, SignedInUser};
use conduit_core::{BoxError, PluginSetting, SettingsStore};

/// An editor in `org_id`.
pub fn test_user(org_id: i64) -> SignedInUser {
    SignedInUser {
        user_id: 1,
        org_id,
        login: "tester".to_string(),
        name: "Test User".to_string(),
        email: "tester@example.com".to_string(),
        org_role: OrgRole::Editor,
    }
}

/// A data source served by `plugin_type`, named after its uid.
pub fn test_data_source(org_id: i64, uid: &str, plugin_type: &str) -> DataSource {
    DataSource {
        id: 1,
        org_id,
        uid: uid.to_string(),
        name: uid.to_string(),
        plugin_type: plugin_type.to_string(),
        url: "http://localhost:3000".to_string(),
        user: String::new(),
        database: String::new(),
        basic_auth: false,
        basic_auth_user: String::new(),
        json_data: serde_json::json!({}),
        secure_json_data: Default::default(),
        updated: Utc::now(),
    }
}

/// A query batch over the last hour, made by `user`.
pub fn test_query(user: &SignedInUser, ref_ids: &[&str]) -> LegacyDataQuery {
    LegacyDataQuery {
        time_range: Some(DataTimeRange::new("now-1h", "now")),
        queries: ref_ids
            .iter()
            .map(|id| LegacyQuery::new(*id, serde_json::json!({})))
            .collect(),
        headers: Default::default(),
        user: Some(user.clone()),
    }
}

/// A settings store whose every lookup fails with the same message.
pub struct FailingStore {
    message: String,
}

impl FailingStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn error(&self) -> BoxError {
        Box::new(std::io::Error::other(self.message.clone()))
    }
}

#[async_trait]
impl SettingsStore for FailingStore {
    async fn plugin_setting(
        &self,
        _org_id: i64,
        _plugin_id: &str,
    ) -> Result<Option<PluginSetting>, BoxError> {
        Err(self.error())
    }

    async fn data_source_by_uid(
        &self,
        _org_id: i64,
        _uid: &str,
    ) -> Result<Option<DataSource>, BoxError> {
        Err(self.error())
    }
}
