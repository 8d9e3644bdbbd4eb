// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process publish/subscribe node with per-channel presence.
//!
//! Every channel with at least one subscriber owns a broadcast sender.
//! Publications fan out to the subscribers present at publish time;
//! nothing is stored for clients that join later. A channel disappears
//! when its last [`Subscription`] is dropped.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LiveError {
    #[error("live node is shut down")]
    Closed,

    #[error("invalid channel name `{0}`")]
    InvalidChannel(String),

    #[error("subscriber lagged behind by {0} publications")]
    Lagged(u64),
}

/// A payload delivered on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub channel: String,
    pub data: Vec<u8>,
}

/// Presence snapshot of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceStats {
    /// Subscriptions currently open.
    pub num_clients: usize,
    /// Distinct users behind those subscriptions.
    pub num_users: usize,
}

struct ChannelState {
    tx: broadcast::Sender<Publication>,
    /// Client id to user id.
    clients: HashMap<u64, i64>,
}

struct NodeInner {
    capacity: usize,
    channels: Mutex<HashMap<String, ChannelState>>,
    next_client: AtomicU64,
    closed: AtomicBool,
}

impl NodeInner {
    fn leave(&self, channel: &str, client_id: u64) {
        let mut channels = self.channels.lock();
        let Some(state) = channels.get_mut(channel) else {
            return;
        };
        state.clients.remove(&client_id);
        if state.clients.is_empty() {
            channels.remove(channel);
            tracing::debug!(channel, "last subscriber left, channel removed");
        }
    }
}

/// Shared handle to the live node. Clones refer to the same node.
#[derive(Clone)]
pub struct LiveNode {
    inner: Arc<NodeInner>,
}

impl LiveNode {
    /// A node buffering up to `capacity` publications per channel.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                capacity: capacity.max(1),
                channels: Mutex::new(HashMap::new()),
                next_client: AtomicU64::new(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Join `channel` as `user_id`. Dropping the subscription leaves it.
    pub fn subscribe(&self, channel: &str, user_id: i64) -> Result<Subscription, LiveError> {
        self.ensure_open()?;
        validate_channel(channel)?;

        let client_id = self.inner.next_client.fetch_add(1, Ordering::Relaxed);
        let rx = {
            let mut channels = self.inner.channels.lock();
            let state = channels
                .entry(channel.to_string())
                .or_insert_with(|| ChannelState {
                    tx: broadcast::channel(self.inner.capacity).0,
                    clients: HashMap::new(),
                });
            state.clients.insert(client_id, user_id);
            state.tx.subscribe()
        };

        tracing::debug!(channel, client_id, user_id, "client subscribed");
        Ok(Subscription {
            channel: channel.to_string(),
            client_id,
            rx,
            node: Arc::downgrade(&self.inner),
        })
    }

    /// Deliver `data` to the current subscribers of `channel`.
    ///
    /// Returns how many subscribers received it; zero is not an error.
    pub fn publish(&self, channel: &str, data: &[u8]) -> Result<usize, LiveError> {
        self.ensure_open()?;
        validate_channel(channel)?;

        let channels = self.inner.channels.lock();
        let Some(state) = channels.get(channel) else {
            tracing::trace!(channel, "publish to channel without subscribers");
            return Ok(0);
        };
        let publication = Publication {
            channel: channel.to_string(),
            data: data.to_vec(),
        };
        Ok(state.tx.send(publication).unwrap_or(0))
    }

    pub fn presence_stats(&self, channel: &str) -> Result<PresenceStats, LiveError> {
        self.ensure_open()?;
        validate_channel(channel)?;

        let channels = self.inner.channels.lock();
        Ok(channels.get(channel).map_or_else(PresenceStats::default, |state| {
            let users: HashSet<i64> = state.clients.values().copied().collect();
            PresenceStats {
                num_clients: state.clients.len(),
                num_users: users.len(),
            }
        }))
    }

    /// Channels with at least one subscriber, sorted by name.
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.channels.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Close the node. Open subscriptions observe [`LiveError::Closed`] and
    /// every later call fails with it.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let dropped = std::mem::take(&mut *self.inner.channels.lock());
        tracing::info!(channels = dropped.len(), "live node shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), LiveError> {
        if self.is_closed() {
            Err(LiveError::Closed)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for LiveNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveNode")
            .field("capacity", &self.inner.capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn validate_channel(channel: &str) -> Result<(), LiveError> {
    if channel.trim().is_empty() || channel.chars().any(char::is_whitespace) {
        return Err(LiveError::InvalidChannel(channel.to_string()));
    }
    Ok(())
}

/// Membership of one client in one channel.
pub struct Subscription {
    channel: String,
    client_id: u64,
    rx: broadcast::Receiver<Publication>,
    node: Weak<NodeInner>,
}

impl Subscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Wait for the next publication.
    ///
    /// A slow subscriber gets [`LiveError::Lagged`] once and then resumes
    /// with the oldest publication still buffered.
    pub async fn recv(&mut self) -> Result<Publication, LiveError> {
        match self.rx.recv().await {
            Ok(publication) => Ok(publication),
            Err(RecvError::Lagged(n)) => {
                tracing::warn!(channel = %self.channel, skipped = n, "subscriber lagged");
                Err(LiveError::Lagged(n))
            }
            Err(RecvError::Closed) => Err(LiveError::Closed),
        }
    }

    /// The next buffered publication, or `Ok(None)` when nothing is pending.
    pub fn try_recv(&mut self) -> Result<Option<Publication>, LiveError> {
        match self.rx.try_recv() {
            Ok(publication) => Ok(Some(publication)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Lagged(n)) => {
                tracing::warn!(channel = %self.channel, skipped = n, "subscriber lagged");
                Err(LiveError::Lagged(n))
            }
            Err(TryRecvError::Closed) => Err(LiveError::Closed),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(node) = self.node.upgrade() {
            node.leave(&self.channel, self.client_id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("client_id", &self.client_id)
            .finish()
    }
}
