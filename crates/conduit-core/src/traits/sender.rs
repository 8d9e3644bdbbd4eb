// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sinks that long-running handlers push their output into.

use async_trait::async_trait;

use crate::error::PluginError;
use crate::types::{CallResourceResponse, StreamPacket};

/// Receives the chunks of a resource response.
#[async_trait]
pub trait CallResourceResponseSender: Send + Sync {
    async fn send(&self, resp: CallResourceResponse) -> Result<(), PluginError>;
}

/// Receives packets from a running stream, in the order they are sent.
#[async_trait]
pub trait StreamPacketSender: Send + Sync {
    async fn send(&self, packet: StreamPacket) -> Result<(), PluginError>;
}
