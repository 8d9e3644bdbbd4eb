// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Implementations of the `conduit` subcommands.

use std::collections::HashMap;

use colored::Colorize;
use serde::Serialize;

use conduit_core::legacy::{DataTimeRange, LegacyDataQuery, LegacyDataResponse, LegacyQuery};
use conduit_core::types::{
    CheckHealthRequest, CheckHealthResult, HealthStatus, RunStreamRequest, SubscribeStreamStatus,
    SubscribeToStreamRequest,
};
use conduit_core::{CallContext, PluginError};
use conduit_live::{LiveError, LivePacketSender, Subscription, stream_channel};
use conduit_prometheus::PrometheusExporter;

use crate::host::{Host, HostError};

/// One row of `conduit plugins --json`.
#[derive(Debug, Serialize)]
struct PluginRow {
    id: String,
    kind: String,
    status: String,
    capabilities: Vec<String>,
}

fn plugin_rows(host: &Host) -> Vec<PluginRow> {
    host.registry
        .list_all()
        .into_iter()
        .map(|entry| PluginRow {
            id: entry.plugin_id.clone(),
            kind: entry.kind.to_string(),
            status: entry.status.to_string(),
            capabilities: host
                .capabilities(&entry.plugin_id)
                .iter()
                .map(ToString::to_string)
                .collect(),
        })
        .collect()
}

pub fn run_plugins(host: &Host, json: bool) -> Result<(), HostError> {
    let rows = plugin_rows(host);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).map_err(|e| PluginError::Internal(e.to_string()))?
        );
        return Ok(());
    }

    println!();
    println!("  {:<16} {:<12} {:<10} CAPABILITIES", "ID", "KIND", "STATUS");
    println!("  {}", "-".repeat(60));
    for row in rows {
        println!(
            "  {:<16} {:<12} {:<10} {}",
            row.id,
            row.kind,
            row.status,
            row.capabilities.join(",")
        );
    }
    println!();
    Ok(())
}

pub async fn check_health(
    host: &Host,
    ctx: &CallContext,
    plugin_id: &str,
) -> Result<CheckHealthResult, HostError> {
    let plugin = host.plugin(plugin_id)?;
    let plugin_context = host.plugin_context(plugin_id, None).await?;
    plugin
        .check_health(ctx, CheckHealthRequest { plugin_context })
        .await
        .map_err(|e| HostError::from_call(plugin_id, "checkHealth", e))
}

pub async fn run_health(
    host: &Host,
    ctx: &CallContext,
    plugin_id: &str,
    plain: bool,
) -> Result<(), HostError> {
    let result = check_health(host, ctx, plugin_id).await?;
    let status = match (result.status, plain) {
        (_, true) => result.status.to_string(),
        (HealthStatus::Ok, false) => result.status.to_string().green().to_string(),
        (HealthStatus::Error, false) => result.status.to_string().red().to_string(),
        (HealthStatus::Unknown, false) => result.status.to_string().yellow().to_string(),
    };
    println!("{plugin_id}: {status} {}", result.message);
    if !result.json_details.is_empty() {
        println!("{}", String::from_utf8_lossy(&result.json_details));
    }
    Ok(())
}

/// Arguments of `conduit query`.
#[derive(Debug, Clone)]
pub struct QueryArgs {
    pub data_source_uid: String,
    pub ref_id: String,
    pub from: String,
    pub to: String,
    pub model: serde_json::Value,
}

pub async fn query(
    host: &Host,
    ctx: &CallContext,
    plugin_id: &str,
    args: QueryArgs,
) -> Result<LegacyDataResponse, HostError> {
    let plugin = host.plugin(plugin_id)?;
    let ds = host.data_source(&args.data_source_uid).await?;
    if ds.plugin_type != plugin_id {
        return Err(HostError::DataSourceMismatch {
            uid: ds.uid,
            actual: ds.plugin_type,
            requested: plugin_id.to_string(),
        });
    }

    let request = LegacyDataQuery {
        time_range: Some(DataTimeRange::new(args.from, args.to)),
        queries: vec![LegacyQuery::new(args.ref_id, args.model)],
        headers: HashMap::new(),
        user: Some(host.user()),
    };
    plugin
        .query_data(ctx, &ds, request)
        .await
        .map_err(|e| HostError::from_call(plugin_id, "queryData", e))
}

/// JSON rendering of a query response, keyed by ref id.
pub fn response_json(resp: &LegacyDataResponse) -> serde_json::Value {
    let results: serde_json::Map<String, serde_json::Value> = resp
        .results
        .iter()
        .map(|(ref_id, result)| {
            (
                ref_id.clone(),
                serde_json::json!({
                    "frames": result.dataframes,
                    "error": result.error,
                }),
            )
        })
        .collect();
    serde_json::json!({ "results": results })
}

pub async fn run_query(
    host: &Host,
    ctx: &CallContext,
    plugin_id: &str,
    args: QueryArgs,
) -> Result<(), HostError> {
    let resp = query(host, ctx, plugin_id, args).await?;
    let rendered = serde_json::to_string_pretty(&response_json(&resp))
        .map_err(|e| PluginError::Internal(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}

/// Subscribe to a plugin stream and collect its first `packets` payloads.
///
/// The stream runs on a child of `ctx` and is cancelled once enough
/// packets have arrived or the stream ends on its own.
pub async fn collect_stream(
    host: &Host,
    ctx: &CallContext,
    plugin_id: &str,
    path: &str,
    packets: usize,
) -> Result<Vec<Vec<u8>>, HostError> {
    let plugin = host.plugin(plugin_id)?;
    let plugin_context = host.plugin_context(plugin_id, None).await?;

    let resp = plugin
        .can_subscribe_to_stream(
            ctx,
            SubscribeToStreamRequest {
                plugin_context: plugin_context.clone(),
                path: path.to_string(),
            },
        )
        .await
        .map_err(|e| HostError::from_call(plugin_id, "canSubscribeToStream", e))?;
    if resp.status != SubscribeStreamStatus::Ok {
        return Err(HostError::Stream(format!(
            "subscription to `{path}` refused: {}",
            resp.status
        )));
    }

    let channel = stream_channel(plugin_id, path);
    let mut subscription = host.node.subscribe(&channel, host.user().user_id)?;
    let mut received = Vec::with_capacity(packets);
    if let Some(initial) = resp.initial_data {
        received.push(initial);
    }

    let run_ctx = ctx.child();
    let sender = LivePacketSender::new(channel, host.publisher.clone());
    let request = RunStreamRequest {
        plugin_context,
        path: path.to_string(),
    };
    let mut task = tokio::spawn({
        let run_ctx = run_ctx.clone();
        async move { plugin.run_stream(&run_ctx, request, &sender).await }
    });

    let mut finished = None;
    while received.len() < packets {
        tokio::select! {
            biased;
            publication = subscription.recv() => match publication {
                Ok(publication) => received.push(publication.data),
                Err(LiveError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "stream subscriber lagged");
                }
                Err(e) => {
                    run_ctx.cancel();
                    return Err(e.into());
                }
            },
            joined = &mut task => {
                finished = Some(joined);
                break;
            }
        }
    }

    run_ctx.cancel();
    let joined = match finished {
        Some(joined) => {
            drain_pending(&mut subscription, &mut received, packets);
            joined
        }
        None => task.await,
    };
    drop(subscription);
    joined
        .map_err(|e| HostError::Stream(format!("stream task failed: {e}")))?
        .map_err(|e| HostError::from_call(plugin_id, "runStream", e))?;
    Ok(received)
}

/// Take publications already buffered for `subscription`, up to `limit`
/// collected in total.
fn drain_pending(subscription: &mut Subscription, received: &mut Vec<Vec<u8>>, limit: usize) {
    while received.len() < limit {
        match subscription.try_recv() {
            Ok(Some(publication)) => received.push(publication.data),
            Ok(None) => break,
            Err(LiveError::Lagged(skipped)) => {
                tracing::warn!(skipped, "stream subscriber lagged");
            }
            Err(_) => break,
        }
    }
}

pub async fn run_stream(
    host: &Host,
    ctx: &CallContext,
    plugin_id: &str,
    path: &str,
    packets: usize,
) -> Result<(), HostError> {
    for data in collect_stream(host, ctx, plugin_id, path, packets).await? {
        println!("{}", String::from_utf8_lossy(&data));
    }
    Ok(())
}

/// Query every data source of the principal's org once, then print the
/// collected request metrics.
pub async fn run_metrics(
    host: &Host,
    ctx: &CallContext,
    exporter: Option<&PrometheusExporter>,
) -> Result<(), HostError> {
    let exporter = exporter.ok_or(HostError::MetricsDisabled)?;

    for ds in host.store.data_sources(host.config.principal.org_id) {
        let args = QueryArgs {
            data_source_uid: ds.uid.clone(),
            ref_id: "A".to_string(),
            from: "now-1h".to_string(),
            to: "now".to_string(),
            model: serde_json::json!({}),
        };
        if let Err(e) = query(host, ctx, &ds.plugin_type, args).await {
            tracing::warn!(data_source = %ds.uid, error = %e, "query failed");
        }
    }

    print!("{}", exporter.render());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_config::load_and_validate_str;

    const CONFIG: &str = r#"
[[plugins]]
id = "testdata"
json_data = { tick_interval_ms = 10 }

[[datasources]]
uid = "td"
name = "TestData"
type = "testdata"

[[plugins]]
id = "elsewhere"

[[datasources]]
uid = "other"
name = "Other"
type = "elsewhere"
"#;

    fn host() -> Host {
        Host::new(load_and_validate_str(CONFIG).unwrap()).unwrap()
    }

    fn args(uid: &str, model: serde_json::Value) -> QueryArgs {
        QueryArgs {
            data_source_uid: uid.to_string(),
            ref_id: "A".to_string(),
            from: "now-1h".to_string(),
            to: "now".to_string(),
            model,
        }
    }

    #[test]
    fn plugin_rows_list_capabilities() {
        let rows = plugin_rows(&host());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "testdata");
        assert_eq!(rows[0].kind, "datasource");
        assert_eq!(rows[0].status, "enabled");
        assert_eq!(rows[0].capabilities, ["health", "query", "stream"]);
    }

    #[tokio::test]
    async fn health_of_testdata_is_ok() {
        let result = check_health(&host(), &CallContext::new(), "testdata")
            .await
            .unwrap();
        assert_eq!(result.status, HealthStatus::Ok);
    }

    #[tokio::test]
    async fn query_returns_constant_series() {
        let resp = query(
            &host(),
            &CallContext::new(),
            "testdata",
            args("td", serde_json::json!({"scenario": "constant", "value": 3})),
        )
        .await
        .unwrap();

        let json = response_json(&resp);
        let frame = &json["results"]["A"]["frames"][0];
        assert_eq!(frame["name"], "A");
        assert!(
            frame["fields"][1]["values"]
                .as_array()
                .unwrap()
                .iter()
                .all(|v| v == 3.0)
        );
        assert!(json["results"]["A"]["error"].is_null());
    }

    #[tokio::test]
    async fn query_rejects_data_source_of_another_plugin() {
        let err = query(
            &host(),
            &CallContext::new(),
            "testdata",
            args("other", serde_json::json!({})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HostError::DataSourceMismatch { .. }));

        let err = query(
            &host(),
            &CallContext::new(),
            "testdata",
            args("missing", serde_json::json!({})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HostError::UnknownDataSource { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn stream_collects_requested_packets_and_stops() {
        let host = host();
        let ctx = CallContext::new();
        let packets = collect_stream(&host, &ctx, "testdata", "ticks", 3)
            .await
            .unwrap();

        assert_eq!(packets.len(), 3);
        let ticks: Vec<u64> = packets
            .iter()
            .map(|p| {
                let packet: serde_json::Value = serde_json::from_slice(p).unwrap();
                packet["tick"].as_u64().unwrap()
            })
            .collect();
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
        assert!(!ctx.is_cancelled());
        assert_eq!(
            host.node
                .presence_stats("plugin/testdata/ticks")
                .unwrap()
                .num_clients,
            0
        );
    }

    #[test]
    fn drain_pending_keeps_publications_buffered_after_the_stream_ends() {
        let host = host();
        let channel = stream_channel("testdata", "ticks");
        let mut subscription = host.node.subscribe(&channel, 1).unwrap();
        for data in [b"1", b"2", b"3"] {
            host.node.publish(&channel, data).unwrap();
        }

        let mut received = vec![b"0".to_vec()];
        drain_pending(&mut subscription, &mut received, 3);
        assert_eq!(received, [b"0".to_vec(), b"1".to_vec(), b"2".to_vec()]);

        drain_pending(&mut subscription, &mut received, 10);
        assert_eq!(received.len(), 4);
        assert!(subscription.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn stream_on_unknown_path_is_refused() {
        let err = collect_stream(&host(), &CallContext::new(), "testdata", "nope", 1)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "subscription to `nope` refused: NotFound");
    }

    #[tokio::test]
    async fn metrics_require_an_exporter() {
        let err = run_metrics(&host(), &CallContext::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::MetricsDisabled));
    }
}
