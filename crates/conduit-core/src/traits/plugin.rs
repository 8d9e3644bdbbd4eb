// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fixed protocol surface every backend plugin presents to the host.

use async_trait::async_trait;

use crate::context::CallContext;
use crate::error::PluginError;
use crate::legacy::{DataSource, LegacyDataQuery, LegacyDataResponse};
use crate::traits::sender::{CallResourceResponseSender, StreamPacketSender};
use crate::types::{
    CallResourceRequest, CheckHealthRequest, CheckHealthResult, CollectMetricsResult,
    RunStreamRequest, SubscribeToStreamRequest, SubscribeToStreamResponse,
};

/// A backend plugin as seen by the hosting layer.
///
/// Every operation exists on every plugin. An operation the plugin cannot
/// serve returns [`PluginError::MethodNotImplemented`].
#[async_trait]
pub trait BackendPlugin: Send + Sync + 'static {
    /// Identity of this plugin instance.
    fn plugin_id(&self) -> &str;

    /// Logging span this plugin's work is recorded under.
    fn logger(&self) -> &tracing::Span;

    async fn start(&self, ctx: &CallContext) -> Result<(), PluginError>;

    async fn stop(&self, ctx: &CallContext) -> Result<(), PluginError>;

    /// Whether the host owns this plugin's lifecycle.
    fn is_managed(&self) -> bool;

    /// Whether the plugin's process has exited.
    fn exited(&self) -> bool;

    async fn collect_metrics(
        &self,
        ctx: &CallContext,
    ) -> Result<CollectMetricsResult, PluginError>;

    async fn check_health(
        &self,
        ctx: &CallContext,
        req: CheckHealthRequest,
    ) -> Result<CheckHealthResult, PluginError>;

    async fn call_resource(
        &self,
        ctx: &CallContext,
        req: CallResourceRequest,
        sender: &dyn CallResourceResponseSender,
    ) -> Result<(), PluginError>;

    /// Run a legacy query batch against `data_source`.
    async fn query_data(
        &self,
        ctx: &CallContext,
        data_source: &DataSource,
        query: LegacyDataQuery,
    ) -> Result<LegacyDataResponse, PluginError>;

    async fn can_subscribe_to_stream(
        &self,
        ctx: &CallContext,
        req: SubscribeToStreamRequest,
    ) -> Result<SubscribeToStreamResponse, PluginError>;

    async fn run_stream(
        &self,
        ctx: &CallContext,
        req: RunStreamRequest,
        sender: &dyn StreamPacketSender,
    ) -> Result<(), PluginError>;
}
