// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Services handed to plugins so they can reach the live node and the
//! plugin context provider.
//!
//! Each one is built once at startup and holds only an immutable `Arc`.

use std::sync::Arc;

use async_trait::async_trait;

use conduit_core::types::{PluginContext, SignedInUser};
use conduit_core::{ChannelPublisher, PluginContextGetter, PluginError, PresenceGetter};
use conduit_plugin::PluginContextProvider;

use crate::node::LiveNode;

/// Publishes plugin payloads on the live node.
#[derive(Debug, Clone)]
pub struct PluginChannelPublisher {
    node: LiveNode,
}

impl PluginChannelPublisher {
    pub fn new(node: LiveNode) -> Self {
        Self { node }
    }
}

#[async_trait]
impl ChannelPublisher for PluginChannelPublisher {
    async fn publish(&self, channel: &str, data: &[u8]) -> Result<(), PluginError> {
        let delivered = self
            .node
            .publish(channel, data)
            .map_err(|e| PluginError::Publish {
                channel: channel.to_string(),
                source: Box::new(e),
            })?;
        tracing::trace!(channel, delivered, bytes = data.len(), "published");
        Ok(())
    }
}

/// Reports how many clients are subscribed to a channel.
#[derive(Debug, Clone)]
pub struct PluginPresenceGetter {
    node: LiveNode,
}

impl PluginPresenceGetter {
    pub fn new(node: LiveNode) -> Self {
        Self { node }
    }
}

#[async_trait]
impl PresenceGetter for PluginPresenceGetter {
    async fn num_subscribers(&self, channel: &str) -> Result<usize, PluginError> {
        let stats = self
            .node
            .presence_stats(channel)
            .map_err(|e| PluginError::Presence {
                channel: channel.to_string(),
                source: Box::new(e),
            })?;
        Ok(stats.num_clients)
    }
}

/// Resolves plugin contexts for live subscriptions.
pub struct PluginContextResolver {
    provider: Arc<PluginContextProvider>,
}

impl PluginContextResolver {
    pub fn new(provider: Arc<PluginContextProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl PluginContextGetter for PluginContextResolver {
    async fn plugin_context(
        &self,
        user: &SignedInUser,
        plugin_id: &str,
        data_source_uid: Option<&str>,
    ) -> Result<Option<PluginContext>, PluginError> {
        self.provider.get(plugin_id, data_source_uid, user).await
    }
}
