// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Services a streaming plugin uses to reach the real-time pub/sub fabric.

use async_trait::async_trait;

use crate::error::PluginError;
use crate::types::{PluginContext, SignedInUser};

/// Publishes payloads to real-time channels.
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    /// Hand `data` to the engine for delivery to the channel's current
    /// subscribers. Best-effort and at-most-once.
    async fn publish(&self, channel: &str, data: &[u8]) -> Result<(), PluginError>;
}

/// Reports channel presence.
#[async_trait]
pub trait PresenceGetter: Send + Sync {
    /// Number of subscribers at call time. The value may be stale as soon as
    /// it is returned.
    async fn num_subscribers(&self, channel: &str) -> Result<usize, PluginError>;
}

/// Resolves the execution context for a plugin call.
#[async_trait]
pub trait PluginContextGetter: Send + Sync {
    /// Returns `Ok(None)` when the plugin or the data source does not exist.
    /// Store failures are errors.
    async fn plugin_context(
        &self,
        user: &SignedInUser,
        plugin_id: &str,
        data_source_uid: Option<&str>,
    ) -> Result<Option<PluginContext>, PluginError>;
}
