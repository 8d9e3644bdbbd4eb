// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process plugins assembled from optional capability handlers.
//!
//! A [`CorePlugin`] presents the full [`BackendPlugin`] surface over
//! whichever handlers its [`ServeOpts`] carries. Every dispatch method has
//! the same shape: if the handler is present the call is forwarded and its
//! result returned untouched, otherwise the call fails with
//! [`PluginError::MethodNotImplemented`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use strum::Display;
use tracing::{Instrument, Span};

use conduit_core::legacy::{DataSource, LegacyDataQuery, LegacyDataResponse};
use conduit_core::types::{
    CallResourceRequest, CheckHealthRequest, CheckHealthResult, CollectMetricsResult,
    RunStreamRequest, SubscribeToStreamRequest, SubscribeToStreamResponse,
};
use conduit_core::{
    BackendPlugin, CallContext, CallResourceHandler, CallResourceResponseSender,
    CheckHealthHandler, PluginError, QueryDataHandler, StreamHandler, StreamPacketSender,
};

use crate::instrumentation::InstrumentedQueryDataHandler;
use crate::query_adapter::QueryEndpointAdapter;

/// One of the optional capabilities a plugin may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Capability {
    Health,
    Resource,
    Query,
    Stream,
}

/// The capability set a plugin is served with.
///
/// Each slot is either a handler or `None`. Any combination is valid,
/// including none at all.
#[derive(Clone, Default)]
pub struct ServeOpts {
    pub check_health: Option<Arc<dyn CheckHealthHandler>>,
    pub call_resource: Option<Arc<dyn CallResourceHandler>>,
    pub query_data: Option<Arc<dyn QueryDataHandler>>,
    pub stream: Option<Arc<dyn StreamHandler>>,
}

impl ServeOpts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check_health(mut self, handler: Arc<dyn CheckHealthHandler>) -> Self {
        self.check_health = Some(handler);
        self
    }

    pub fn with_call_resource(mut self, handler: Arc<dyn CallResourceHandler>) -> Self {
        self.call_resource = Some(handler);
        self
    }

    pub fn with_query_data(mut self, handler: Arc<dyn QueryDataHandler>) -> Self {
        self.query_data = Some(handler);
        self
    }

    pub fn with_stream(mut self, handler: Arc<dyn StreamHandler>) -> Self {
        self.stream = Some(handler);
        self
    }

    /// Capabilities with a handler present, in a fixed order.
    pub fn capabilities(&self) -> Vec<Capability> {
        [
            (Capability::Health, self.check_health.is_some()),
            (Capability::Resource, self.call_resource.is_some()),
            (Capability::Query, self.query_data.is_some()),
            (Capability::Stream, self.stream.is_some()),
        ]
        .into_iter()
        .filter_map(|(capability, present)| present.then_some(capability))
        .collect()
    }
}

impl fmt::Debug for ServeOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServeOpts")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Builds a plugin instance for a plugin id and logging span.
pub type PluginFactoryFn =
    Box<dyn Fn(&str, Span) -> Result<Arc<dyn BackendPlugin>, PluginError> + Send + Sync>;

/// A plugin built into the host process.
///
/// The capability set is fixed at construction. The query handler is
/// wrapped once, here, in the instrumentation decorator and the legacy
/// query translation.
pub struct CorePlugin {
    plugin_id: String,
    logger: Span,
    check_health: Option<Arc<dyn CheckHealthHandler>>,
    call_resource: Option<Arc<dyn CallResourceHandler>>,
    query: Option<QueryEndpointAdapter>,
    stream: Option<Arc<dyn StreamHandler>>,
    capabilities: Vec<Capability>,
}

impl CorePlugin {
    pub fn new(plugin_id: impl Into<String>, logger: Span, opts: ServeOpts) -> Self {
        let plugin_id = plugin_id.into();
        let capabilities = opts.capabilities();
        let query = opts.query_data.map(|handler| {
            let instrumented = InstrumentedQueryDataHandler::new(plugin_id.clone(), handler);
            QueryEndpointAdapter::new(plugin_id.clone(), Arc::new(instrumented))
        });

        Self {
            plugin_id,
            logger,
            check_health: opts.check_health,
            call_resource: opts.call_resource,
            query,
            stream: opts.stream,
            capabilities,
        }
    }

    /// A factory producing core plugins that share `opts`' handlers.
    pub fn factory(opts: ServeOpts) -> PluginFactoryFn {
        Box::new(move |plugin_id, logger| {
            let plugin: Arc<dyn BackendPlugin> =
                Arc::new(CorePlugin::new(plugin_id, logger, opts.clone()));
            Ok(plugin)
        })
    }

    /// Capabilities this plugin was built with.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    fn not_implemented(&self, endpoint: &'static str) -> PluginError {
        tracing::debug!(parent: &self.logger, endpoint, "capability not implemented");
        PluginError::MethodNotImplemented
    }
}

impl fmt::Debug for CorePlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorePlugin")
            .field("plugin_id", &self.plugin_id)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

#[async_trait]
impl BackendPlugin for CorePlugin {
    fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    fn logger(&self) -> &Span {
        &self.logger
    }

    async fn start(&self, _ctx: &CallContext) -> Result<(), PluginError> {
        tracing::debug!(parent: &self.logger, "core plugin started");
        Ok(())
    }

    async fn stop(&self, _ctx: &CallContext) -> Result<(), PluginError> {
        tracing::debug!(parent: &self.logger, "core plugin stopped");
        Ok(())
    }

    fn is_managed(&self) -> bool {
        true
    }

    fn exited(&self) -> bool {
        false
    }

    async fn collect_metrics(
        &self,
        _ctx: &CallContext,
    ) -> Result<CollectMetricsResult, PluginError> {
        Err(self.not_implemented("collectMetrics"))
    }

    async fn check_health(
        &self,
        ctx: &CallContext,
        req: CheckHealthRequest,
    ) -> Result<CheckHealthResult, PluginError> {
        match &self.check_health {
            Some(handler) => {
                handler
                    .check_health(ctx, req)
                    .instrument(self.logger.clone())
                    .await
            }
            None => Err(self.not_implemented("checkHealth")),
        }
    }

    async fn call_resource(
        &self,
        ctx: &CallContext,
        req: CallResourceRequest,
        sender: &dyn CallResourceResponseSender,
    ) -> Result<(), PluginError> {
        match &self.call_resource {
            Some(handler) => {
                handler
                    .call_resource(ctx, req, sender)
                    .instrument(self.logger.clone())
                    .await
            }
            None => Err(self.not_implemented("callResource")),
        }
    }

    async fn query_data(
        &self,
        ctx: &CallContext,
        data_source: &DataSource,
        query: LegacyDataQuery,
    ) -> Result<LegacyDataResponse, PluginError> {
        match &self.query {
            Some(adapter) => {
                adapter
                    .query_data(ctx, data_source, query)
                    .instrument(self.logger.clone())
                    .await
            }
            None => Err(self.not_implemented("queryData")),
        }
    }

    async fn can_subscribe_to_stream(
        &self,
        ctx: &CallContext,
        req: SubscribeToStreamRequest,
    ) -> Result<SubscribeToStreamResponse, PluginError> {
        match &self.stream {
            Some(handler) => {
                handler
                    .can_subscribe_to_stream(ctx, req)
                    .instrument(self.logger.clone())
                    .await
            }
            None => Err(self.not_implemented("canSubscribeToStream")),
        }
    }

    async fn run_stream(
        &self,
        ctx: &CallContext,
        req: RunStreamRequest,
        sender: &dyn StreamPacketSender,
    ) -> Result<(), PluginError> {
        match &self.stream {
            Some(handler) => {
                handler
                    .run_stream(ctx, req, sender)
                    .instrument(self.logger.clone())
                    .await
            }
            None => Err(self.not_implemented("runStream")),
        }
    }
}
