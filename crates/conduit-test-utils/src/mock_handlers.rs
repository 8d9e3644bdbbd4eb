// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock capability handlers with configurable outcomes and call counters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use conduit_core::types::{
    CallResourceRequest, CallResourceResponse, CheckHealthRequest, CheckHealthResult, DataFrame,
    DataResponse, HealthStatus, QueryDataRequest, QueryDataResponse, RunStreamRequest,
    StreamPacket, SubscribeStreamStatus, SubscribeToStreamRequest, SubscribeToStreamResponse,
};
use conduit_core::{
    CallContext, CallResourceHandler, CallResourceResponseSender, CheckHealthHandler,
    PluginError, QueryDataHandler, StreamHandler, StreamPacketSender,
};

/// Health handler answering with a fixed message, or failing.
pub struct MockHealthHandler {
    outcome: Result<String, String>,
    calls: AtomicUsize,
}

impl MockHealthHandler {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            outcome: Ok(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckHealthHandler for MockHealthHandler {
    async fn check_health(
        &self,
        _ctx: &CallContext,
        _req: CheckHealthRequest,
    ) -> Result<CheckHealthResult, PluginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(message) => Ok(CheckHealthResult {
                status: HealthStatus::Ok,
                message: message.clone(),
                json_details: Vec::new(),
            }),
            Err(message) => Err(PluginError::handler(message.clone())),
        }
    }
}

/// Resource handler that streams a fixed body in chunks.
pub struct MockResourceHandler {
    status: u16,
    chunks: Vec<Vec<u8>>,
    requests: Mutex<Vec<CallResourceRequest>>,
}

impl MockResourceHandler {
    pub fn chunks(status: u16, chunks: Vec<Vec<u8>>) -> Self {
        Self {
            status,
            chunks,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<CallResourceRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CallResourceHandler for MockResourceHandler {
    async fn call_resource(
        &self,
        ctx: &CallContext,
        req: CallResourceRequest,
        sender: &dyn CallResourceResponseSender,
    ) -> Result<(), PluginError> {
        self.requests.lock().push(req);
        for (i, chunk) in self.chunks.iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(PluginError::Cancelled);
            }
            let mut headers = std::collections::HashMap::new();
            if i == 0 {
                headers.insert(
                    "Content-Type".to_string(),
                    vec!["application/octet-stream".to_string()],
                );
            }
            sender
                .send(CallResourceResponse {
                    status: self.status,
                    headers,
                    body: chunk.clone(),
                })
                .await?;
        }
        Ok(())
    }
}

/// Query handler that echoes each query back as a frame named by its ref id.
///
/// The frame carries the data source uid and org of the context the call
/// was made with, so tests can tell concurrent calls apart.
pub struct MockQueryHandler {
    failure: Option<String>,
    delay: Duration,
    requests: Mutex<Vec<QueryDataRequest>>,
}

impl MockQueryHandler {
    pub fn echo() -> Self {
        Self {
            failure: None,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::echo()
        }
    }

    /// Sleep for `delay` before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<QueryDataRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl QueryDataHandler for MockQueryHandler {
    async fn query_data(
        &self,
        _ctx: &CallContext,
        req: QueryDataRequest,
    ) -> Result<QueryDataResponse, PluginError> {
        self.requests.lock().push(req.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(PluginError::handler(message.clone()));
        }

        let uid = req
            .plugin_context
            .data_source_instance_settings
            .as_ref()
            .map(|ds| ds.uid.clone())
            .unwrap_or_default();
        let mut resp = QueryDataResponse::default();
        for query in req.queries {
            let frame = DataFrame::new(query.ref_id.clone())
                .with_field("data_source_uid", vec![uid.clone().into()])
                .with_field("org_id", vec![req.plugin_context.org_id.into()]);
            resp.responses.insert(
                query.ref_id,
                DataResponse {
                    frames: vec![frame],
                    error: None,
                },
            );
        }
        Ok(resp)
    }
}

enum StreamMode {
    /// Send these packets, then return.
    Fixed(Vec<StreamPacket>),
    /// Send a numbered tick every period until cancelled.
    Ticking(Duration),
}

/// Stream handler with a fixed subscribe answer.
pub struct MockStreamHandler {
    mode: StreamMode,
    subscribe_status: SubscribeStreamStatus,
    runs: AtomicUsize,
}

impl MockStreamHandler {
    pub fn new(packets: Vec<StreamPacket>) -> Self {
        Self {
            mode: StreamMode::Fixed(packets),
            subscribe_status: SubscribeStreamStatus::Ok,
            runs: AtomicUsize::new(0),
        }
    }

    pub fn ticking(period: Duration) -> Self {
        Self {
            mode: StreamMode::Ticking(period),
            subscribe_status: SubscribeStreamStatus::Ok,
            runs: AtomicUsize::new(0),
        }
    }

    pub fn with_subscribe_status(mut self, status: SubscribeStreamStatus) -> Self {
        self.subscribe_status = status;
        self
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamHandler for MockStreamHandler {
    async fn can_subscribe_to_stream(
        &self,
        _ctx: &CallContext,
        _req: SubscribeToStreamRequest,
    ) -> Result<SubscribeToStreamResponse, PluginError> {
        Ok(SubscribeToStreamResponse {
            status: self.subscribe_status,
            initial_data: None,
        })
    }

    async fn run_stream(
        &self,
        ctx: &CallContext,
        _req: RunStreamRequest,
        sender: &dyn StreamPacketSender,
    ) -> Result<(), PluginError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            StreamMode::Fixed(packets) => {
                for packet in packets {
                    if ctx.is_cancelled() {
                        break;
                    }
                    sender.send(packet.clone()).await?;
                }
                Ok(())
            }
            StreamMode::Ticking(period) => {
                let mut tick: u64 = 0;
                loop {
                    tokio::select! {
                        _ = ctx.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(*period) => {
                            let packet = StreamPacket::json(&serde_json::json!({ "tick": tick }))
                                .map_err(|e| PluginError::Internal(e.to_string()))?;
                            sender.send(packet).await?;
                            tick += 1;
                        }
                    }
                }
            }
        }
    }
}
