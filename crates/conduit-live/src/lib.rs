// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process live node and the services that connect plugins to it.
//!
//! [`LiveNode`] is a small pub/sub hub with per-channel presence. The
//! bridge types adapt it, and the plugin context provider, to the
//! narrow interfaces plugins are given.

pub mod bridge;
pub mod node;
pub mod sender;

pub use bridge::{PluginChannelPublisher, PluginContextResolver, PluginPresenceGetter};
pub use node::{LiveError, LiveNode, PresenceStats, Publication, Subscription};
pub use sender::LivePacketSender;

/// Channel a plugin stream publishes on: `plugin/<plugin_id>/<path>`.
pub fn stream_channel(plugin_id: &str, path: &str) -> String {
    format!("plugin/{plugin_id}/{}", path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_channel_joins_plugin_and_path() {
        assert_eq!(stream_channel("testdata", "ticks"), "plugin/testdata/ticks");
        assert_eq!(stream_channel("testdata", "/a/b"), "plugin/testdata/a/b");
    }
}
