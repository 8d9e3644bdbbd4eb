// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory settings store, usually filled from configuration.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use conduit_config::model::{ConduitConfig, DataSourceConfig, PluginConfig};
use conduit_core::legacy::DataSource;
use conduit_core::{BoxError, PluginSetting, SettingsStore};

/// Plugin settings and data sources keyed by organization.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: DashMap<(i64, String), PluginSetting>,
    data_sources: DashMap<(i64, String), DataSource>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding every `[[plugins]]` and `[[datasources]]` entry.
    pub fn from_config(config: &ConduitConfig) -> Self {
        let store = Self::new();
        for plugin in &config.plugins {
            store.insert_plugin_setting(plugin_setting(plugin));
        }
        for ds in &config.datasources {
            store.insert_data_source(data_source(ds));
        }
        store
    }

    pub fn insert_plugin_setting(&self, setting: PluginSetting) {
        self.settings
            .insert((setting.org_id, setting.plugin_id.clone()), setting);
    }

    pub fn insert_data_source(&self, ds: DataSource) {
        self.data_sources.insert((ds.org_id, ds.uid.clone()), ds);
    }

    /// Data sources of one organization, sorted by uid.
    pub fn data_sources(&self, org_id: i64) -> Vec<DataSource> {
        let mut out: Vec<DataSource> = self
            .data_sources
            .iter()
            .filter(|e| e.key().0 == org_id)
            .map(|e| e.value().clone())
            .collect();
        out.sort_by(|a, b| a.uid.cmp(&b.uid));
        out
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn plugin_setting(
        &self,
        org_id: i64,
        plugin_id: &str,
    ) -> Result<Option<PluginSetting>, BoxError> {
        Ok(self
            .settings
            .get(&(org_id, plugin_id.to_string()))
            .map(|e| e.value().clone()))
    }

    async fn data_source_by_uid(
        &self,
        org_id: i64,
        uid: &str,
    ) -> Result<Option<DataSource>, BoxError> {
        Ok(self
            .data_sources
            .get(&(org_id, uid.to_string()))
            .map(|e| e.value().clone()))
    }
}

fn plugin_setting(config: &PluginConfig) -> PluginSetting {
    PluginSetting {
        org_id: config.org_id,
        plugin_id: config.id.clone(),
        enabled: config.enabled,
        json_data: config.json_data.clone(),
        decrypted_secure_json_data: config.secure_json_data.clone(),
        updated: Utc::now(),
    }
}

fn data_source(config: &DataSourceConfig) -> DataSource {
    DataSource {
        id: config.id,
        org_id: config.org_id,
        uid: config.uid.clone(),
        name: config.name.clone(),
        plugin_type: config.plugin_type.clone(),
        url: config.url.clone(),
        user: config.user.clone(),
        database: config.database.clone(),
        basic_auth: config.basic_auth,
        basic_auth_user: config.basic_auth_user.clone(),
        json_data: config.json_data.clone(),
        secure_json_data: config.secure_json_data.clone(),
        updated: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_config::load_config_from_str;

    const CONFIG: &str = r#"
[[plugins]]
id = "testdata"
json_data = { seed = 3 }
secure_json_data = { api_key = "k" }

[[datasources]]
uid = "b"
name = "B"
type = "testdata"

[[datasources]]
uid = "a"
name = "A"
type = "testdata"

[[datasources]]
uid = "a"
org_id = 2
name = "Other org"
type = "testdata"
"#;

    #[tokio::test]
    async fn from_config_indexes_by_org() {
        let config = load_config_from_str(CONFIG).unwrap();
        let store = MemorySettingsStore::from_config(&config);

        let setting = store.plugin_setting(1, "testdata").await.unwrap().unwrap();
        assert_eq!(setting.json_data["seed"], 3);
        assert_eq!(setting.decrypted_secure_json_data["api_key"], "k");
        assert!(store.plugin_setting(2, "testdata").await.unwrap().is_none());

        let other = store.data_source_by_uid(2, "a").await.unwrap().unwrap();
        assert_eq!(other.name, "Other org");
        assert!(store.data_source_by_uid(3, "a").await.unwrap().is_none());
    }

    #[test]
    fn data_sources_are_listed_per_org_sorted_by_uid() {
        let config = load_config_from_str(CONFIG).unwrap();
        let store = MemorySettingsStore::from_config(&config);
        let uids: Vec<String> = store.data_sources(1).into_iter().map(|d| d.uid).collect();
        assert_eq!(uids, ["a", "b"]);
        assert_eq!(store.data_sources(2).len(), 1);
    }
}
