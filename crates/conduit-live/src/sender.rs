// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stream sender that republishes packets on a live channel.

use std::sync::Arc;

use async_trait::async_trait;

use conduit_core::types::StreamPacket;
use conduit_core::{ChannelPublisher, PluginError, StreamPacketSender};

/// Sends every packet of a running stream to one channel, in push order.
pub struct LivePacketSender {
    channel: String,
    publisher: Arc<dyn ChannelPublisher>,
}

impl LivePacketSender {
    pub fn new(channel: impl Into<String>, publisher: Arc<dyn ChannelPublisher>) -> Self {
        Self {
            channel: channel.into(),
            publisher,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl StreamPacketSender for LivePacketSender {
    async fn send(&self, packet: StreamPacket) -> Result<(), PluginError> {
        self.publisher.publish(&self.channel, &packet.data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::PluginChannelPublisher;
    use crate::node::LiveNode;

    #[tokio::test]
    async fn packets_arrive_in_push_order() {
        let node = LiveNode::new(16);
        let mut sub = node.subscribe("plugin/testdata/ticks", 1).unwrap();
        let sender = LivePacketSender::new(
            "plugin/testdata/ticks",
            Arc::new(PluginChannelPublisher::new(node.clone())),
        );

        for i in 0..4u8 {
            sender.send(StreamPacket { data: vec![i] }).await.unwrap();
        }
        for i in 0..4u8 {
            assert_eq!(sub.recv().await.unwrap().data, vec![i]);
        }
        assert_eq!(sender.channel(), "plugin/testdata/ticks");
    }
}
