// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Conduit backend plugins.
//!
//! This crate defines the protocol surface ([`BackendPlugin`]), the optional
//! capability handlers plugin authors implement, the live bridge services,
//! the closed error taxonomy, and the request/response types shared by all
//! of them.

pub mod context;
pub mod error;
pub mod legacy;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use context::CallContext;
pub use error::{BoxError, PluginError};
pub use legacy::{DataSource, DataTimeRange, LegacyDataQuery, LegacyDataResponse, LegacyQuery};
pub use types::{PluginContext, PluginKind, SignedInUser};

pub use traits::{
    BackendPlugin, CallResourceHandler, CallResourceResponseSender, ChannelPublisher,
    CheckHealthHandler, PluginContextGetter, PluginSetting, PresenceGetter, QueryDataHandler,
    SettingsStore, StreamHandler, StreamPacketSender,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_error_has_all_variants() {
        let _not_implemented = PluginError::MethodNotImplemented;
        let _handler = PluginError::Handler {
            message: "test".into(),
            source: None,
        };
        let _resolution = PluginError::ContextResolution {
            source: Box::new(std::io::Error::other("test")),
        };
        let _publish = PluginError::Publish {
            channel: "room-1".into(),
            source: Box::new(std::io::Error::other("test")),
        };
        let _presence = PluginError::Presence {
            channel: "room-1".into(),
            source: Box::new(std::io::Error::other("test")),
        };
        let _invalid = PluginError::InvalidRequest("test".into());
        let _cancelled = PluginError::Cancelled;
        let _internal = PluginError::Internal("test".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Fails to compile if any trait is missing from the public API or
        // loses object safety.
        fn _assert_plugin(_: &dyn BackendPlugin) {}
        fn _assert_health(_: &dyn CheckHealthHandler) {}
        fn _assert_resource(_: &dyn CallResourceHandler) {}
        fn _assert_query(_: &dyn QueryDataHandler) {}
        fn _assert_stream(_: &dyn StreamHandler) {}
        fn _assert_resource_sender(_: &dyn CallResourceResponseSender) {}
        fn _assert_packet_sender(_: &dyn StreamPacketSender) {}
        fn _assert_publisher(_: &dyn ChannelPublisher) {}
        fn _assert_presence(_: &dyn PresenceGetter) {}
        fn _assert_context_getter(_: &dyn PluginContextGetter) {}
        fn _assert_store(_: &dyn SettingsStore) {}
    }
}
