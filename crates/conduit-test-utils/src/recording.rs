// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Senders that capture everything a handler sends, for assertion in tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use conduit_core::types::{CallResourceResponse, StreamPacket};
use conduit_core::{CallResourceResponseSender, PluginError, StreamPacketSender};

/// Captures resource response chunks.
#[derive(Default)]
pub struct RecordingResourceSender {
    responses: Mutex<Vec<CallResourceResponse>>,
}

impl RecordingResourceSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn responses(&self) -> Vec<CallResourceResponse> {
        self.responses.lock().clone()
    }

    /// Bodies of all chunks, concatenated.
    pub fn body(&self) -> Vec<u8> {
        self.responses
            .lock()
            .iter()
            .flat_map(|r| r.body.iter().copied())
            .collect()
    }
}

#[async_trait]
impl CallResourceResponseSender for RecordingResourceSender {
    async fn send(&self, resp: CallResourceResponse) -> Result<(), PluginError> {
        self.responses.lock().push(resp);
        Ok(())
    }
}

/// Captures stream packets and wakes waiters on every packet.
#[derive(Default)]
pub struct RecordingPacketSender {
    packets: Mutex<Vec<StreamPacket>>,
    notify: Arc<Notify>,
}

impl RecordingPacketSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packets(&self) -> Vec<StreamPacket> {
        self.packets.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.packets.lock().len()
    }

    /// Wait until at least `n` packets have been sent.
    pub async fn wait_for(&self, n: usize) {
        loop {
            let notified = self.notify.notified();
            if self.count() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl StreamPacketSender for RecordingPacketSender {
    async fn send(&self, packet: StreamPacket) -> Result<(), PluginError> {
        self.packets.lock().push(packet);
        self.notify.notify_waiters();
        Ok(())
    }
}
