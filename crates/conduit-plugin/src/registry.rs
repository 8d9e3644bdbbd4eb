// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of backend plugins known to the host.
//!
//! The `PluginRegistry` stores one `PluginEntry` per plugin id. Each entry
//! holds the plugin instance built by its factory, the plugin kind, and its
//! status. Only enabled plugins are handed out for calls.

use std::collections::HashMap;
use std::sync::Arc;

use strum::Display;
use thiserror::Error;

use conduit_core::types::PluginKind;
use conduit_core::{BackendPlugin, CallContext, PluginError};

use crate::core_plugin::PluginFactoryFn;

/// Status of a plugin in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PluginStatus {
    /// Plugin is active and serves calls.
    Enabled,
    /// Plugin is explicitly disabled by configuration.
    Disabled,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("plugin `{plugin_id}` is already registered")]
    Duplicate { plugin_id: String },

    #[error("plugin `{plugin_id}` is not registered")]
    NotFound { plugin_id: String },

    #[error("failed to create plugin `{plugin_id}`: {source}")]
    Factory {
        plugin_id: String,
        #[source]
        source: PluginError,
    },

    #[error("failed to start plugin `{plugin_id}`: {source}")]
    Start {
        plugin_id: String,
        #[source]
        source: PluginError,
    },
}

/// A single entry in the plugin registry.
pub struct PluginEntry {
    pub plugin_id: String,
    pub kind: PluginKind,
    pub status: PluginStatus,
    pub plugin: Arc<dyn BackendPlugin>,
}

impl std::fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginEntry")
            .field("plugin_id", &self.plugin_id)
            .field("kind", &self.kind)
            .field("status", &self.status)
            .finish()
    }
}

/// Registry of backend plugins, keyed by plugin id.
///
/// Mutated while the host is assembled, then shared behind an `Arc`.
pub struct PluginRegistry {
    entries: HashMap<String, PluginEntry>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Build a plugin through `factory` and register it as enabled.
    ///
    /// The plugin gets its own `plugin` span carrying its id.
    pub fn register(
        &mut self,
        plugin_id: &str,
        kind: PluginKind,
        factory: &PluginFactoryFn,
    ) -> Result<(), RegistryError> {
        self.register_with_status(plugin_id, kind, factory, PluginStatus::Enabled)
    }

    pub fn register_with_status(
        &mut self,
        plugin_id: &str,
        kind: PluginKind,
        factory: &PluginFactoryFn,
        status: PluginStatus,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(plugin_id) {
            return Err(RegistryError::Duplicate {
                plugin_id: plugin_id.to_string(),
            });
        }

        let span = tracing::info_span!("plugin", plugin_id = %plugin_id);
        let plugin = factory(plugin_id, span).map_err(|source| RegistryError::Factory {
            plugin_id: plugin_id.to_string(),
            source,
        })?;

        tracing::debug!(plugin_id, %kind, %status, "plugin registered");
        self.entries.insert(
            plugin_id.to_string(),
            PluginEntry {
                plugin_id: plugin_id.to_string(),
                kind,
                status,
                plugin,
            },
        );
        Ok(())
    }

    /// Get a plugin entry by id, whatever its status.
    pub fn get(&self, plugin_id: &str) -> Option<&PluginEntry> {
        self.entries.get(plugin_id)
    }

    /// The plugin instance, if registered and enabled.
    pub fn plugin(&self, plugin_id: &str) -> Option<Arc<dyn BackendPlugin>> {
        self.entries
            .get(plugin_id)
            .filter(|e| e.status == PluginStatus::Enabled)
            .map(|e| Arc::clone(&e.plugin))
    }

    /// List all plugin entries, sorted by id.
    pub fn list_all(&self) -> Vec<&PluginEntry> {
        let mut entries: Vec<&PluginEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| a.plugin_id.cmp(&b.plugin_id));
        entries
    }

    /// Toggle a plugin's status between `Enabled` and `Disabled`.
    pub fn set_enabled(&mut self, plugin_id: &str, enabled: bool) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .get_mut(plugin_id)
            .ok_or_else(|| RegistryError::NotFound {
                plugin_id: plugin_id.to_string(),
            })?;
        entry.status = if enabled {
            PluginStatus::Enabled
        } else {
            PluginStatus::Disabled
        };
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start every enabled managed plugin in id order, stopping at the first
    /// failure.
    pub async fn start_all(&self, ctx: &CallContext) -> Result<(), RegistryError> {
        for entry in self.managed() {
            entry
                .plugin
                .start(ctx)
                .await
                .map_err(|source| RegistryError::Start {
                    plugin_id: entry.plugin_id.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Stop every enabled managed plugin. Failures are logged and do not stop
    /// the rest.
    pub async fn stop_all(&self, ctx: &CallContext) {
        for entry in self.managed() {
            if let Err(e) = entry.plugin.stop(ctx).await {
                tracing::warn!(plugin_id = %entry.plugin_id, error = %e, "plugin failed to stop");
            }
        }
    }

    fn managed(&self) -> impl Iterator<Item = &PluginEntry> {
        self.list_all()
            .into_iter()
            .filter(|e| e.status == PluginStatus::Enabled && e.plugin.is_managed())
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
