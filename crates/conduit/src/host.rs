// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly of the plugin host from configuration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use conduit_config::ConduitConfig;
use conduit_core::legacy::DataSource;
use conduit_core::types::{PluginContext, PluginKind, SignedInUser};
use conduit_core::{BackendPlugin, PluginContextGetter, PluginError, SettingsStore};
use conduit_live::{
    LiveError, LiveNode, PluginChannelPublisher, PluginContextResolver, PluginPresenceGetter,
};
use conduit_plugin::{
    Capability, CorePlugin, MemorySettingsStore, PluginContextProvider, PluginRegistry,
    PluginStatus, RegistryError,
};
use conduit_prometheus::ExporterError;

use crate::testdata::{self, TestData};

#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Live(#[from] LiveError),

    #[error(transparent)]
    Metrics(#[from] ExporterError),

    #[error("plugin `{0}` is not available")]
    UnknownPlugin(String),

    #[error("data source `{uid}` not found in org {org_id}")]
    UnknownDataSource { uid: String, org_id: i64 },

    #[error("data source `{uid}` is served by `{actual}`, not `{requested}`")]
    DataSourceMismatch {
        uid: String,
        actual: String,
        requested: String,
    },

    #[error("plugin `{plugin_id}` does not implement {endpoint}")]
    NotImplemented {
        plugin_id: String,
        endpoint: &'static str,
    },

    #[error("{0}")]
    Stream(String),

    #[error("metrics are disabled; set [metrics] enabled = true")]
    MetricsDisabled,
}

impl HostError {
    /// Map the not-implemented sentinel to a message naming the endpoint.
    pub fn from_call(plugin_id: &str, endpoint: &'static str, err: PluginError) -> Self {
        if err.is_not_implemented() {
            HostError::NotImplemented {
                plugin_id: plugin_id.to_string(),
                endpoint,
            }
        } else {
            HostError::Plugin(err)
        }
    }
}

/// Every service the commands need, wired once at startup.
pub struct Host {
    pub config: ConduitConfig,
    pub registry: Arc<PluginRegistry>,
    pub store: Arc<MemorySettingsStore>,
    pub node: LiveNode,
    pub publisher: Arc<PluginChannelPublisher>,
    pub resolver: Arc<PluginContextResolver>,
    capabilities: HashMap<String, Vec<Capability>>,
}

impl Host {
    pub fn new(config: ConduitConfig) -> Result<Self, HostError> {
        let node = LiveNode::new(config.live.channel_capacity);
        let publisher = Arc::new(PluginChannelPublisher::new(node.clone()));
        let presence = Arc::new(PluginPresenceGetter::new(node.clone()));

        let mut registry = PluginRegistry::new();
        let mut capabilities = HashMap::new();

        let tick = config
            .plugin(testdata::PLUGIN_ID)
            .and_then(|p| p.json_data.get("tick_interval_ms"))
            .and_then(|v| v.as_u64())
            .map_or(testdata::DEFAULT_TICK, Duration::from_millis);
        let opts = Arc::new(TestData::new(presence, tick)).serve_opts();
        capabilities.insert(testdata::PLUGIN_ID.to_string(), opts.capabilities());
        registry.register_with_status(
            testdata::PLUGIN_ID,
            PluginKind::Datasource,
            &CorePlugin::factory(opts),
            builtin_status(&config, testdata::PLUGIN_ID),
        )?;

        for plugin in &config.plugins {
            if registry.get(&plugin.id).is_none() {
                tracing::warn!(plugin_id = %plugin.id, "configured plugin has no implementation");
            }
        }

        let registry = Arc::new(registry);
        let store = Arc::new(MemorySettingsStore::from_config(&config));
        let provider = Arc::new(PluginContextProvider::new(registry.clone(), store.clone()));
        let resolver = Arc::new(PluginContextResolver::new(provider));

        Ok(Self {
            config,
            registry,
            store,
            node,
            publisher,
            resolver,
            capabilities,
        })
    }

    /// The principal calls are made on behalf of.
    pub fn user(&self) -> SignedInUser {
        self.config.principal.to_signed_in_user()
    }

    pub fn plugin(&self, plugin_id: &str) -> Result<Arc<dyn BackendPlugin>, HostError> {
        self.registry
            .plugin(plugin_id)
            .ok_or_else(|| HostError::UnknownPlugin(plugin_id.to_string()))
    }

    pub fn capabilities(&self, plugin_id: &str) -> &[Capability] {
        self.capabilities
            .get(plugin_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resolve the call context for `plugin_id`, optionally bound to a data
    /// source of the principal's org.
    pub async fn plugin_context(
        &self,
        plugin_id: &str,
        data_source_uid: Option<&str>,
    ) -> Result<PluginContext, HostError> {
        let user = self.user();
        match self
            .resolver
            .plugin_context(&user, plugin_id, data_source_uid)
            .await?
        {
            Some(pctx) => Ok(pctx),
            None => match data_source_uid {
                Some(uid) if self.registry.plugin(plugin_id).is_some() => {
                    Err(HostError::UnknownDataSource {
                        uid: uid.to_string(),
                        org_id: user.org_id,
                    })
                }
                _ => Err(HostError::UnknownPlugin(plugin_id.to_string())),
            },
        }
    }

    /// A data source of the principal's org.
    pub async fn data_source(&self, uid: &str) -> Result<DataSource, HostError> {
        let org_id = self.config.principal.org_id;
        self.store
            .data_source_by_uid(org_id, uid)
            .await
            .map_err(|source| PluginError::ContextResolution { source })?
            .ok_or_else(|| HostError::UnknownDataSource {
                uid: uid.to_string(),
                org_id,
            })
    }
}

/// Built-in plugins are enabled unless the principal's org disables them.
fn builtin_status(config: &ConduitConfig, plugin_id: &str) -> PluginStatus {
    let disabled = config
        .plugins
        .iter()
        .any(|p| p.id == plugin_id && p.org_id == config.principal.org_id && !p.enabled);
    if disabled {
        PluginStatus::Disabled
    } else {
        PluginStatus::Enabled
    }
}
