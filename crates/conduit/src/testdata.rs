// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The built-in `testdata` plugin.
//!
//! Answers health checks, generates random-walk and constant series for
//! queries, and runs tick streams. It has no resource handler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use conduit_core::types::{
    CheckHealthRequest, CheckHealthResult, DataFrame, DataQuery, DataResponse, HealthStatus,
    QueryDataRequest, QueryDataResponse, RunStreamRequest, StreamPacket, SubscribeStreamStatus,
    SubscribeToStreamRequest, SubscribeToStreamResponse,
};
use conduit_core::{
    CallContext, CheckHealthHandler, PluginError, PresenceGetter, QueryDataHandler, StreamHandler,
    StreamPacketSender,
};
use conduit_live::stream_channel;
use conduit_plugin::ServeOpts;

pub const PLUGIN_ID: &str = "testdata";

/// Default period between stream ticks.
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

const MAX_POINTS: i64 = 10_000;
const STREAM_PATHS: &[&str] = &["ticks", "random-walk"];

pub struct TestData {
    presence: Arc<dyn PresenceGetter>,
    tick: Duration,
}

impl TestData {
    pub fn new(presence: Arc<dyn PresenceGetter>, tick: Duration) -> Self {
        Self { presence, tick }
    }

    /// Health, query, and stream handlers, all backed by `self`.
    pub fn serve_opts(self: Arc<Self>) -> ServeOpts {
        ServeOpts::new()
            .with_check_health(self.clone())
            .with_query_data(self.clone())
            .with_stream(self)
    }
}

#[async_trait]
impl CheckHealthHandler for TestData {
    async fn check_health(
        &self,
        _ctx: &CallContext,
        req: CheckHealthRequest,
    ) -> Result<CheckHealthResult, PluginError> {
        let message = match req.plugin_context.data_source_instance_settings {
            Some(ds) => format!("Data source `{}` is working", ds.name),
            None => "Data source is working".to_string(),
        };
        Ok(CheckHealthResult {
            status: HealthStatus::Ok,
            message,
            json_details: Vec::new(),
        })
    }
}

#[async_trait]
impl QueryDataHandler for TestData {
    async fn query_data(
        &self,
        ctx: &CallContext,
        req: QueryDataRequest,
    ) -> Result<QueryDataResponse, PluginError> {
        let mut resp = QueryDataResponse::default();
        for query in req.queries {
            if ctx.is_cancelled() {
                return Err(PluginError::Cancelled);
            }
            tracing::debug!(ref_id = %query.ref_id, "running testdata query");
            let ref_id = query.ref_id.clone();
            resp.responses.insert(ref_id, run_query(&query));
        }
        Ok(resp)
    }
}

fn run_query(query: &DataQuery) -> DataResponse {
    let scenario = query
        .json
        .get("scenario")
        .and_then(|v| v.as_str())
        .unwrap_or("random_walk");
    let times = timestamps(query);

    let values: Vec<serde_json::Value> = match scenario {
        "random_walk" => {
            let seed = query
                .json
                .get("seed")
                .and_then(|v| v.as_u64())
                .unwrap_or_else(rand::random);
            let start = query
                .json
                .get("start_value")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            random_walk(seed, start, times.len())
                .into_iter()
                .map(Into::into)
                .collect()
        }
        "constant" => {
            let value = query
                .json
                .get("value")
                .and_then(|v| v.as_f64())
                .unwrap_or(1.0);
            vec![value.into(); times.len()]
        }
        other => {
            return DataResponse {
                frames: Vec::new(),
                error: Some(format!("unknown scenario `{other}`")),
            };
        }
    };

    let frame = DataFrame::new(query.ref_id.clone())
        .with_field("time", times.into_iter().map(Into::into).collect())
        .with_field("value", values);
    DataResponse {
        frames: vec![frame],
        error: None,
    }
}

/// Epoch-millisecond timestamps from the start of the range, one per step.
///
/// The step is the query interval, or the range split evenly over the
/// maximum number of points when no interval is set.
fn timestamps(query: &DataQuery) -> Vec<i64> {
    let from = query.time_range.from.timestamp_millis();
    let to = query.time_range.to.timestamp_millis();
    if to < from {
        return Vec::new();
    }
    let points = query.max_data_points.clamp(1, MAX_POINTS);
    let interval = i64::try_from(query.interval.as_millis()).unwrap_or(i64::MAX);
    let step = if interval > 0 {
        interval
    } else {
        ((to - from) / points).max(1)
    };

    (0..points)
        .map(|i| from.saturating_add(i.saturating_mul(step)))
        .take_while(|t| *t <= to)
        .collect()
}

fn random_walk(seed: u64, start: f64, len: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut value = start;
    (0..len)
        .map(|_| {
            let current = value;
            value += rng.gen_range(-0.5..0.5);
            current
        })
        .collect()
}

#[async_trait]
impl StreamHandler for TestData {
    async fn can_subscribe_to_stream(
        &self,
        _ctx: &CallContext,
        req: SubscribeToStreamRequest,
    ) -> Result<SubscribeToStreamResponse, PluginError> {
        let status = if STREAM_PATHS.contains(&req.path.as_str()) {
            SubscribeStreamStatus::Ok
        } else {
            SubscribeStreamStatus::NotFound
        };
        Ok(SubscribeToStreamResponse {
            status,
            initial_data: None,
        })
    }

    async fn run_stream(
        &self,
        ctx: &CallContext,
        req: RunStreamRequest,
        sender: &dyn StreamPacketSender,
    ) -> Result<(), PluginError> {
        let channel = stream_channel(&req.plugin_context.plugin_id, &req.path);
        let mut rng = StdRng::from_entropy();
        let mut interval = tokio::time::interval(self.tick);
        let mut tick: u64 = 0;
        let mut value = 0.0_f64;

        tracing::debug!(%channel, "stream started");
        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    tracing::debug!(%channel, ticks = tick, "stream cancelled");
                    return Ok(());
                }
                _ = interval.tick() => {
                    if self.presence.num_subscribers(&channel).await? == 0 {
                        tracing::trace!(%channel, "no subscribers, skipping tick");
                        continue;
                    }
                    value += rng.gen_range(-0.5..0.5);
                    let packet = StreamPacket::json(&serde_json::json!({
                        "tick": tick,
                        "time": chrono::Utc::now().timestamp_millis(),
                        "value": value,
                    }))
                    .map_err(|e| PluginError::Internal(e.to_string()))?;
                    sender.send(packet).await?;
                    tick += 1;
                }
            }
        }
    }
}
