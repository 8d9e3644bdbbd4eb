// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation between the legacy query endpoint and a query handler.

use std::sync::Arc;
use std::time::Duration;

use conduit_core::legacy::{
    DataQueryResult, DataSource, LegacyDataQuery, LegacyDataResponse, LegacyQuery,
};
use conduit_core::types::{
    DataQuery, PluginContext, QueryDataRequest, QueryDataResponse, TimeRange, User,
};
use conduit_core::{CallContext, PluginError, QueryDataHandler};

/// Serves the legacy query endpoint of a core plugin.
///
/// Every call builds its own [`PluginContext`] from the data source and the
/// query's user; nothing is cached between calls.
pub struct QueryEndpointAdapter {
    plugin_id: String,
    handler: Arc<dyn QueryDataHandler>,
}

impl QueryEndpointAdapter {
    pub fn new(plugin_id: impl Into<String>, handler: Arc<dyn QueryDataHandler>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            handler,
        }
    }

    pub async fn query_data(
        &self,
        ctx: &CallContext,
        data_source: &DataSource,
        query: LegacyDataQuery,
    ) -> Result<LegacyDataResponse, PluginError> {
        let time_range = query
            .time_range
            .as_ref()
            .ok_or_else(|| PluginError::InvalidRequest("query has no time range".to_string()))?
            .resolve()?;

        let req = QueryDataRequest {
            plugin_context: self.plugin_context(data_source, &query),
            headers: query.headers,
            queries: query
                .queries
                .into_iter()
                .map(|q| to_data_query(q, time_range))
                .collect(),
        };

        let resp = self.handler.query_data(ctx, req).await?;
        Ok(to_legacy_response(resp))
    }

    fn plugin_context(&self, data_source: &DataSource, query: &LegacyDataQuery) -> PluginContext {
        PluginContext {
            org_id: data_source.org_id,
            plugin_id: self.plugin_id.clone(),
            user: query.user.as_ref().map(User::from),
            app_instance_settings: None,
            data_source_instance_settings: Some(data_source.instance_settings()),
        }
    }
}

fn to_data_query(query: LegacyQuery, time_range: TimeRange) -> DataQuery {
    DataQuery {
        ref_id: query.ref_id,
        query_type: query.query_type,
        max_data_points: query.max_data_points,
        interval: Duration::from_millis(u64::try_from(query.interval_ms).unwrap_or(0)),
        time_range,
        json: query.model,
    }
}

fn to_legacy_response(resp: QueryDataResponse) -> LegacyDataResponse {
    let results = resp
        .responses
        .into_iter()
        .map(|(ref_id, data)| {
            let result = DataQueryResult {
                ref_id: ref_id.clone(),
                dataframes: data.frames,
                error: data.error,
            };
            (ref_id, result)
        })
        .collect();
    LegacyDataResponse { results }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, Utc};
    use conduit_core::legacy::DataTimeRange;
    use conduit_core::types::{OrgRole, SignedInUser};
    use conduit_test_utils::{MockQueryHandler, test_data_source};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-05-04T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn query(queries: Vec<LegacyQuery>) -> LegacyDataQuery {
        LegacyDataQuery {
            time_range: Some(DataTimeRange {
                from: "now-1h".into(),
                to: "now".into(),
                now: now(),
            }),
            queries,
            headers: Default::default(),
            user: Some(SignedInUser {
                user_id: 5,
                org_id: 2,
                login: "carol".into(),
                name: "Carol".into(),
                email: "carol@example.com".into(),
                org_role: OrgRole::Viewer,
            }),
        }
    }

    #[tokio::test]
    async fn builds_context_from_data_source_and_user() {
        let handler = Arc::new(MockQueryHandler::echo());
        let adapter = QueryEndpointAdapter::new("testdata", handler.clone());
        let ds = test_data_source(2, "ds-a", "testdata");

        adapter
            .query_data(&CallContext::new(), &ds, query(vec![]))
            .await
            .unwrap();

        let seen = handler.requests();
        assert_eq!(seen.len(), 1);
        let pctx = &seen[0].plugin_context;
        assert_eq!(pctx.org_id, 2);
        assert_eq!(pctx.plugin_id, "testdata");
        assert_eq!(pctx.user.as_ref().unwrap().login, "carol");
        assert!(pctx.app_instance_settings.is_none());
        assert_eq!(
            pctx.data_source_instance_settings.as_ref().unwrap().uid,
            "ds-a"
        );
    }

    #[tokio::test]
    async fn maps_queries_and_results_by_ref_id() {
        let handler = Arc::new(MockQueryHandler::echo());
        let adapter = QueryEndpointAdapter::new("testdata", handler.clone());
        let ds = test_data_source(1, "ds-a", "testdata");

        let mut a = LegacyQuery::new("A", json!({ "scenario": "random_walk" }));
        a.interval_ms = 250;
        let mut b = LegacyQuery::new("B", json!({}));
        b.interval_ms = -5;

        let resp = adapter
            .query_data(&CallContext::new(), &ds, query(vec![a, b]))
            .await
            .unwrap();

        assert_eq!(resp.results.len(), 2);
        assert_eq!(resp.results["A"].ref_id, "A");
        assert_eq!(resp.results["B"].ref_id, "B");

        let req = &handler.requests()[0];
        assert_eq!(req.queries[0].interval, Duration::from_millis(250));
        assert_eq!(req.queries[1].interval, Duration::ZERO);
        assert_eq!(req.queries[0].json["scenario"], "random_walk");
        let range = req.queries[0].time_range;
        assert_eq!(range.to, now());
        assert_eq!(range.to - range.from, TimeDelta::hours(1));
    }

    #[tokio::test]
    async fn missing_time_range_is_rejected_before_the_handler() {
        let handler = Arc::new(MockQueryHandler::echo());
        let adapter = QueryEndpointAdapter::new("testdata", handler.clone());
        let ds = test_data_source(1, "ds-a", "testdata");
        let mut q = query(vec![]);
        q.time_range = None;

        let err = adapter
            .query_data(&CallContext::new(), &ds, q)
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::InvalidRequest(_)));
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test]
    async fn handler_error_is_returned_unchanged() {
        let handler = Arc::new(MockQueryHandler::failing("backend unreachable"));
        let adapter = QueryEndpointAdapter::new("testdata", handler);
        let ds = test_data_source(1, "ds-a", "testdata");

        let err = adapter
            .query_data(&CallContext::new(), &ds, query(vec![LegacyQuery::new("A", json!({}))]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "plugin handler error: backend unreachable");
    }
}
