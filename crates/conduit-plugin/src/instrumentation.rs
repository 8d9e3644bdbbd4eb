// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request metrics for plugin endpoints.
//!
//! Recorded through the metrics-rs facade, so whichever recorder the host
//! installs (Prometheus via `conduit-prometheus`, or none) collects them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{describe_counter, describe_histogram};

use conduit_core::types::{QueryDataRequest, QueryDataResponse};
use conduit_core::{CallContext, PluginError, QueryDataHandler};

pub const PLUGIN_REQUEST_TOTAL: &str = "conduit_plugin_request_total";
pub const PLUGIN_REQUEST_DURATION: &str = "conduit_plugin_request_duration_milliseconds";

pub const ENDPOINT_QUERY_DATA: &str = "queryData";

/// Register metric descriptions. Call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(
        PLUGIN_REQUEST_TOTAL,
        "Total plugin requests by plugin, endpoint and status"
    );
    describe_histogram!(
        PLUGIN_REQUEST_DURATION,
        metrics::Unit::Milliseconds,
        "Plugin request duration in milliseconds"
    );
}

/// Outcome label of a finished request: `ok`, `cancel`, or `error`.
pub fn request_status<T>(result: &Result<T, PluginError>, ctx: &CallContext) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(PluginError::Cancelled) => "cancel",
        Err(_) if ctx.is_cancelled() => "cancel",
        Err(_) => "error",
    }
}

/// Record one finished plugin request.
pub fn record_request(
    plugin_id: &str,
    endpoint: &'static str,
    status: &'static str,
    elapsed: Duration,
) {
    metrics::counter!(
        PLUGIN_REQUEST_TOTAL,
        "plugin_id" => plugin_id.to_string(),
        "endpoint" => endpoint,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        PLUGIN_REQUEST_DURATION,
        "plugin_id" => plugin_id.to_string(),
        "endpoint" => endpoint
    )
    .record(elapsed.as_secs_f64() * 1_000.0);
}

/// Query handler decorator that times every call and counts its outcome.
///
/// The wrapped handler's result is returned as-is.
pub struct InstrumentedQueryDataHandler {
    plugin_id: String,
    inner: Arc<dyn QueryDataHandler>,
}

impl InstrumentedQueryDataHandler {
    pub fn new(plugin_id: impl Into<String>, inner: Arc<dyn QueryDataHandler>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            inner,
        }
    }
}

#[async_trait]
impl QueryDataHandler for InstrumentedQueryDataHandler {
    async fn query_data(
        &self,
        ctx: &CallContext,
        req: QueryDataRequest,
    ) -> Result<QueryDataResponse, PluginError> {
        let start = Instant::now();
        let result = self.inner.query_data(ctx, req).await;
        let status = request_status(&result, ctx);
        record_request(&self.plugin_id, ENDPOINT_QUERY_DATA, status, start.elapsed());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_core::types::PluginContext;
    use conduit_test_utils::MockQueryHandler;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn status_labels() {
        let ctx = CallContext::new();
        assert_eq!(request_status(&Ok::<(), PluginError>(()), &ctx), "ok");
        assert_eq!(
            request_status(&Err::<(), _>(PluginError::handler("x")), &ctx),
            "error"
        );
        assert_eq!(
            request_status(&Err::<(), _>(PluginError::Cancelled), &ctx),
            "cancel"
        );

        ctx.cancel();
        assert_eq!(
            request_status(&Err::<(), _>(PluginError::handler("x")), &ctx),
            "cancel"
        );
    }

    #[test]
    fn record_request_reaches_the_recorder() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_request("testdata", ENDPOINT_QUERY_DATA, "ok", Duration::from_millis(12));
            record_request("testdata", ENDPOINT_QUERY_DATA, "error", Duration::from_millis(3));
        });

        let rendered = handle.render();
        assert!(rendered.contains(PLUGIN_REQUEST_TOTAL), "got: {rendered}");
        assert!(rendered.contains("plugin_id=\"testdata\""));
        assert!(rendered.contains("status=\"error\""));
        assert!(rendered.contains(PLUGIN_REQUEST_DURATION));
    }

    #[tokio::test]
    async fn decorator_returns_inner_result_unchanged() {
        let inner = Arc::new(MockQueryHandler::failing("upstream timeout"));
        let handler = InstrumentedQueryDataHandler::new("p", inner.clone());
        let req = QueryDataRequest {
            plugin_context: PluginContext::new(1, "p"),
            headers: Default::default(),
            queries: vec![],
        };

        let err = handler.query_data(&CallContext::new(), req).await.unwrap_err();
        assert_eq!(err.to_string(), "plugin handler error: upstream timeout");
        assert_eq!(inner.calls(), 1);
    }
}
