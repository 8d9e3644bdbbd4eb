// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability handlers supplied by plugin authors.
//!
//! A plugin implements any subset of these. Each one is optional when a
//! core plugin is assembled.

use async_trait::async_trait;

use crate::context::CallContext;
use crate::error::PluginError;
use crate::traits::sender::{CallResourceResponseSender, StreamPacketSender};
use crate::types::{
    CallResourceRequest, CheckHealthRequest, CheckHealthResult, QueryDataRequest,
    QueryDataResponse, RunStreamRequest, SubscribeToStreamRequest, SubscribeToStreamResponse,
};

/// Reports whether the plugin (or the data source in the request context)
/// is reachable and correctly configured.
#[async_trait]
pub trait CheckHealthHandler: Send + Sync {
    async fn check_health(
        &self,
        ctx: &CallContext,
        req: CheckHealthRequest,
    ) -> Result<CheckHealthResult, PluginError>;
}

/// Serves arbitrary resources under the plugin's resource path.
#[async_trait]
pub trait CallResourceHandler: Send + Sync {
    /// Handle one resource request, sending zero or more response chunks
    /// through `sender` before returning.
    async fn call_resource(
        &self,
        ctx: &CallContext,
        req: CallResourceRequest,
        sender: &dyn CallResourceResponseSender,
    ) -> Result<(), PluginError>;
}

/// Executes data queries.
#[async_trait]
pub trait QueryDataHandler: Send + Sync {
    async fn query_data(
        &self,
        ctx: &CallContext,
        req: QueryDataRequest,
    ) -> Result<QueryDataResponse, PluginError>;
}

/// Produces real-time streams.
#[async_trait]
pub trait StreamHandler: Send + Sync {
    /// Decide whether a subscriber may join the stream at `req.path`.
    async fn can_subscribe_to_stream(
        &self,
        ctx: &CallContext,
        req: SubscribeToStreamRequest,
    ) -> Result<SubscribeToStreamResponse, PluginError>;

    /// Run the stream, pushing packets through `sender` until `ctx` is
    /// cancelled or the handler decides to stop.
    async fn run_stream(
        &self,
        ctx: &CallContext,
        req: RunStreamRequest,
        sender: &dyn StreamPacketSender,
    ) -> Result<(), PluginError>;
}
