// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the Conduit plugin protocol.
//!
//! Handler and sender traits are implemented by plugin authors; the
//! [`BackendPlugin`] trait is the fixed surface the host talks to. All
//! async traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod handler;
pub mod live;
pub mod plugin;
pub mod sender;
pub mod store;

pub use handler::{CallResourceHandler, CheckHealthHandler, QueryDataHandler, StreamHandler};
pub use live::{ChannelPublisher, PluginContextGetter, PresenceGetter};
pub use plugin::BackendPlugin;
pub use sender::{CallResourceResponseSender, StreamPacketSender};
pub use store::{PluginSetting, SettingsStore};
