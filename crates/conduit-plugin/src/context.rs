// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of the per-call plugin context.

use std::sync::Arc;

use conduit_core::types::{AppInstanceSettings, PluginContext, PluginKind, SignedInUser, User};
use conduit_core::{PluginError, SettingsStore};

use crate::registry::{PluginRegistry, PluginStatus};

/// Builds a [`PluginContext`] for a plugin, an optional data source, and the
/// acting user.
///
/// Nothing is cached: every call reads the registry and the store again.
pub struct PluginContextProvider {
    registry: Arc<PluginRegistry>,
    store: Arc<dyn SettingsStore>,
}

impl PluginContextProvider {
    pub fn new(registry: Arc<PluginRegistry>, store: Arc<dyn SettingsStore>) -> Self {
        Self { registry, store }
    }

    /// Resolve the context, or `Ok(None)` when the plugin is not available
    /// or the data source does not exist in the user's organization.
    pub async fn get(
        &self,
        plugin_id: &str,
        data_source_uid: Option<&str>,
        user: &SignedInUser,
    ) -> Result<Option<PluginContext>, PluginError> {
        let Some(entry) = self
            .registry
            .get(plugin_id)
            .filter(|e| e.status == PluginStatus::Enabled)
        else {
            return Ok(None);
        };

        let mut pctx = PluginContext::new(user.org_id, plugin_id);
        pctx.user = Some(User::from(user));

        if entry.kind == PluginKind::App {
            let setting = self
                .store
                .plugin_setting(user.org_id, plugin_id)
                .await
                .map_err(|source| PluginError::ContextResolution { source })?;
            pctx.app_instance_settings = setting.map(|s| AppInstanceSettings {
                json_data: s.json_data,
                decrypted_secure_json_data: s.decrypted_secure_json_data,
                updated: s.updated,
            });
        }

        if let Some(uid) = data_source_uid {
            let ds = self
                .store
                .data_source_by_uid(user.org_id, uid)
                .await
                .map_err(|source| PluginError::ContextResolution { source })?;
            let Some(ds) = ds else {
                tracing::debug!(plugin_id, uid, org_id = user.org_id, "data source not found");
                return Ok(None);
            };
            pctx.data_source_instance_settings = Some(ds.instance_settings());
        }

        Ok(Some(pctx))
    }
}
