// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the plugin registry, an in-memory settings store,
//! the context provider, a live node, and the bridge services around it,
//! the same way the binary wires them at startup.

use std::sync::Arc;

use conduit_core::legacy::{DataSource, LegacyDataResponse};
use conduit_core::types::{PluginKind, SignedInUser};
use conduit_core::{BackendPlugin, CallContext, PluginError, PluginSetting};
use conduit_live::{
    LiveNode, LivePacketSender, PluginChannelPublisher, PluginContextResolver,
    PluginPresenceGetter, stream_channel,
};
use conduit_plugin::{
    CorePlugin, MemorySettingsStore, PluginContextProvider, PluginRegistry, RegistryError,
    ServeOpts,
};

use crate::fixtures::{test_query, test_user};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    plugins: Vec<(String, PluginKind, ServeOpts)>,
    data_sources: Vec<DataSource>,
    settings: Vec<PluginSetting>,
    channel_capacity: usize,
    user: SignedInUser,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            plugins: Vec::new(),
            data_sources: Vec::new(),
            settings: Vec::new(),
            channel_capacity: 64,
            user: test_user(1),
        }
    }

    /// Register a core plugin served with `opts`.
    pub fn with_plugin(mut self, plugin_id: &str, kind: PluginKind, opts: ServeOpts) -> Self {
        self.plugins.push((plugin_id.to_string(), kind, opts));
        self
    }

    pub fn with_data_source(mut self, data_source: DataSource) -> Self {
        self.data_sources.push(data_source);
        self
    }

    pub fn with_plugin_setting(mut self, setting: PluginSetting) -> Self {
        self.settings.push(setting);
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Act as `user` instead of the default editor in org 1.
    pub fn with_user(mut self, user: SignedInUser) -> Self {
        self.user = user;
        self
    }

    pub fn build(self) -> Result<TestHarness, RegistryError> {
        let mut registry = PluginRegistry::new();
        for (plugin_id, kind, opts) in self.plugins {
            registry.register(&plugin_id, kind, &CorePlugin::factory(opts))?;
        }
        let registry = Arc::new(registry);

        let store = Arc::new(MemorySettingsStore::new());
        for ds in self.data_sources {
            store.insert_data_source(ds);
        }
        for setting in self.settings {
            store.insert_plugin_setting(setting);
        }

        let provider = Arc::new(PluginContextProvider::new(registry.clone(), store.clone()));
        let node = LiveNode::new(self.channel_capacity);

        Ok(TestHarness {
            publisher: Arc::new(PluginChannelPublisher::new(node.clone())),
            presence: Arc::new(PluginPresenceGetter::new(node.clone())),
            resolver: Arc::new(PluginContextResolver::new(provider.clone())),
            registry,
            store,
            provider,
            node,
            user: self.user,
        })
    }
}

/// A complete in-process plugin host for tests.
pub struct TestHarness {
    pub registry: Arc<PluginRegistry>,
    pub store: Arc<MemorySettingsStore>,
    pub provider: Arc<PluginContextProvider>,
    pub node: LiveNode,
    pub publisher: Arc<PluginChannelPublisher>,
    pub presence: Arc<PluginPresenceGetter>,
    pub resolver: Arc<PluginContextResolver>,
    /// The principal harness calls are made on behalf of.
    pub user: SignedInUser,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// An enabled plugin by id.
    pub fn plugin(&self, plugin_id: &str) -> Result<Arc<dyn BackendPlugin>, PluginError> {
        self.registry
            .plugin(plugin_id)
            .ok_or_else(|| PluginError::InvalidRequest(format!("unknown plugin `{plugin_id}`")))
    }

    /// Run a query batch with the given ref ids against a stored data source,
    /// routed to the plugin named by the data source's type.
    pub async fn query(
        &self,
        ctx: &CallContext,
        data_source_uid: &str,
        ref_ids: &[&str],
    ) -> Result<LegacyDataResponse, PluginError> {
        let ds = self
            .store
            .data_sources(self.user.org_id)
            .into_iter()
            .find(|ds| ds.uid == data_source_uid)
            .ok_or_else(|| {
                PluginError::InvalidRequest(format!("unknown data source `{data_source_uid}`"))
            })?;
        let plugin = self.plugin(&ds.plugin_type)?;
        plugin
            .query_data(ctx, &ds, test_query(&self.user, ref_ids))
            .await
    }

    /// A sender publishing to the channel of `plugin_id`'s stream at `path`.
    pub fn stream_sender(&self, plugin_id: &str, path: &str) -> LivePacketSender {
        LivePacketSender::new(stream_channel(plugin_id, path), self.publisher.clone())
    }
}
