// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core plugins, the plugin registry, and plugin context resolution.
//!
//! A core plugin runs inside the host process and is assembled from
//! optional capability handlers. The registry owns every plugin instance
//! and the context provider builds the per-call [`PluginContext`] from the
//! registry and a [`SettingsStore`].
//!
//! [`PluginContext`]: conduit_core::PluginContext
//! [`SettingsStore`]: conduit_core::SettingsStore

pub mod context;
pub mod core_plugin;
pub mod instrumentation;
pub mod query_adapter;
pub mod registry;
pub mod store;

pub use context::PluginContextProvider;
pub use core_plugin::{Capability, CorePlugin, PluginFactoryFn, ServeOpts};
pub use instrumentation::{InstrumentedQueryDataHandler, describe_metrics};
pub use query_adapter::QueryEndpointAdapter;
pub use registry::{PluginEntry, PluginRegistry, PluginStatus, RegistryError};
pub use store::MemorySettingsStore;
