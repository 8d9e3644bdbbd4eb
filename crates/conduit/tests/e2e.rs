// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests across the registry, context provider, and live node.
//!
//! Each test builds an isolated TestHarness. Tests are independent and
//! order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use conduit_core::types::{PluginKind, RunStreamRequest, StreamPacket};
use conduit_core::{
    CallContext, ChannelPublisher, PluginContextGetter, PluginSetting, PresenceGetter,
};
use conduit_live::{LiveError, stream_channel};
use conduit_plugin::ServeOpts;
use conduit_test_utils::{
    MockHealthHandler, MockQueryHandler, MockStreamHandler, TestHarness, test_data_source,
};

fn numbered(n: usize) -> Vec<StreamPacket> {
    (0..n)
        .map(|i| StreamPacket {
            data: i.to_string().into_bytes(),
        })
        .collect()
}

// ---- Streams ----

#[tokio::test]
async fn stream_packets_reach_subscriber_in_order() {
    let harness = TestHarness::builder()
        .with_plugin(
            "ticker",
            PluginKind::Datasource,
            ServeOpts::new().with_stream(Arc::new(MockStreamHandler::new(numbered(5)))),
        )
        .build()
        .unwrap();

    let channel = stream_channel("ticker", "feed");
    let mut subscription = harness.node.subscribe(&channel, harness.user.user_id).unwrap();

    let plugin = harness.plugin("ticker").unwrap();
    let sender = harness.stream_sender("ticker", "feed");
    assert_eq!(sender.channel(), channel);
    plugin
        .run_stream(
            &CallContext::new(),
            RunStreamRequest {
                plugin_context: conduit_core::PluginContext::new(1, "ticker"),
                path: "feed".into(),
            },
            &sender,
        )
        .await
        .unwrap();

    for i in 0..5 {
        let publication = subscription.recv().await.unwrap();
        assert_eq!(publication.channel, channel);
        assert_eq!(publication.data, i.to_string().into_bytes());
    }
}

#[tokio::test(start_paused = true)]
async fn cancelling_a_running_stream_returns_promptly() {
    let handler = Arc::new(MockStreamHandler::ticking(Duration::from_millis(10)));
    let harness = TestHarness::builder()
        .with_plugin(
            "ticker",
            PluginKind::Datasource,
            ServeOpts::new().with_stream(handler.clone()),
        )
        .build()
        .unwrap();

    let mut subscription = harness
        .node
        .subscribe(&stream_channel("ticker", "feed"), 1)
        .unwrap();
    let plugin = harness.plugin("ticker").unwrap();
    let sender = harness.stream_sender("ticker", "feed");
    let ctx = CallContext::new();
    let run_ctx = ctx.child();

    let task = tokio::spawn(async move {
        plugin
            .run_stream(
                &run_ctx,
                RunStreamRequest {
                    plugin_context: conduit_core::PluginContext::new(1, "ticker"),
                    path: "feed".into(),
                },
                &sender,
            )
            .await
    });

    for _ in 0..3 {
        subscription.recv().await.unwrap();
    }
    ctx.cancel();

    tokio::time::timeout(Duration::from_millis(50), task)
        .await
        .expect("stream should stop after cancellation")
        .unwrap()
        .unwrap();
    assert_eq!(handler.runs(), 1);

    while subscription.try_recv().unwrap().is_some() {}
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(
        subscription.try_recv().unwrap().is_none(),
        "nothing is published after cancellation"
    );
}

#[tokio::test]
async fn slow_subscriber_lags_then_resumes() {
    let harness = TestHarness::builder()
        .with_channel_capacity(2)
        .build()
        .unwrap();
    let mut subscription = harness.node.subscribe("room-1", 1).unwrap();

    for i in 0..5u8 {
        harness.publisher.publish("room-1", &[i]).await.unwrap();
    }

    assert!(matches!(
        subscription.recv().await,
        Err(LiveError::Lagged(3))
    ));
    assert_eq!(subscription.recv().await.unwrap().data, [3]);
    assert_eq!(subscription.recv().await.unwrap().data, [4]);
}

// ---- Presence ----

#[tokio::test]
async fn presence_follows_subscriptions() {
    let harness = TestHarness::builder().build().unwrap();

    let first = harness.node.subscribe("room-1", 1).unwrap();
    let second = harness.node.subscribe("room-1", 2).unwrap();
    assert_eq!(harness.presence.num_subscribers("room-1").await.unwrap(), 2);

    harness.publisher.publish("room-1", b"hello").await.unwrap();

    drop(first);
    drop(second);
    assert_eq!(harness.presence.num_subscribers("room-1").await.unwrap(), 0);
    harness.publisher.publish("room-1", b"nobody").await.unwrap();
    assert!(harness.node.channels().is_empty());
}

#[tokio::test]
async fn shutdown_closes_publish_and_presence() {
    let harness = TestHarness::builder().build().unwrap();
    harness.node.shutdown();

    assert!(harness.publisher.publish("room-1", b"x").await.is_err());
    assert!(harness.presence.num_subscribers("room-1").await.is_err());
    assert!(matches!(
        harness.node.subscribe("room-1", 1),
        Err(LiveError::Closed)
    ));
}

// ---- Context resolution ----

#[tokio::test]
async fn resolver_binds_data_source_and_reports_missing_ones() {
    let harness = TestHarness::builder()
        .with_plugin(
            "testdata",
            PluginKind::Datasource,
            ServeOpts::new().with_check_health(Arc::new(MockHealthHandler::ok("fine"))),
        )
        .with_data_source(test_data_source(1, "td", "testdata"))
        .build()
        .unwrap();

    let pctx = harness
        .resolver
        .plugin_context(&harness.user, "testdata", Some("td"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pctx.org_id, 1);
    assert_eq!(pctx.plugin_id, "testdata");
    assert_eq!(pctx.user.unwrap().login, harness.user.login);
    assert_eq!(pctx.data_source_instance_settings.unwrap().uid, "td");

    let missing = harness
        .resolver
        .plugin_context(&harness.user, "testdata", Some("missing"))
        .await
        .unwrap();
    assert!(missing.is_none());

    let unknown = harness
        .resolver
        .plugin_context(&harness.user, "nope", None)
        .await
        .unwrap();
    assert!(unknown.is_none());
}

#[tokio::test]
async fn app_settings_flow_into_context() {
    let harness = TestHarness::builder()
        .with_plugin(
            "notes-app",
            PluginKind::App,
            ServeOpts::new().with_check_health(Arc::new(MockHealthHandler::ok("fine"))),
        )
        .with_plugin_setting(PluginSetting {
            org_id: 1,
            plugin_id: "notes-app".into(),
            enabled: true,
            json_data: serde_json::json!({ "theme": "dark" }),
            decrypted_secure_json_data: [("token".to_string(), "s3cret".to_string())].into(),
            updated: Utc::now(),
        })
        .build()
        .unwrap();

    let pctx = harness
        .resolver
        .plugin_context(&harness.user, "notes-app", None)
        .await
        .unwrap()
        .unwrap();
    let app = pctx.app_instance_settings.unwrap();
    assert_eq!(app.json_data["theme"], "dark");
    assert_eq!(app.decrypted_secure_json_data["token"], "s3cret");
    assert!(pctx.data_source_instance_settings.is_none());
}

// ---- Queries ----

#[tokio::test]
async fn query_routes_to_plugin_of_data_source() {
    let handler = Arc::new(MockQueryHandler::echo());
    let harness = TestHarness::builder()
        .with_plugin(
            "testdata",
            PluginKind::Datasource,
            ServeOpts::new().with_query_data(handler.clone()),
        )
        .with_data_source(test_data_source(1, "td", "testdata"))
        .build()
        .unwrap();

    let resp = harness
        .query(&CallContext::new(), "td", &["A", "B"])
        .await
        .unwrap();
    assert_eq!(resp.results.len(), 2);

    let request = &handler.requests()[0];
    assert_eq!(request.plugin_context.plugin_id, "testdata");
    assert_eq!(
        request
            .plugin_context
            .data_source_instance_settings
            .as_ref()
            .unwrap()
            .uid,
        "td"
    );
}

#[tokio::test]
async fn query_failure_is_reported_to_the_caller() {
    let harness = TestHarness::builder()
        .with_plugin(
            "testdata",
            PluginKind::Datasource,
            ServeOpts::new().with_query_data(Arc::new(MockQueryHandler::failing("backend down"))),
        )
        .with_data_source(test_data_source(1, "td", "testdata"))
        .build()
        .unwrap();

    let err = harness
        .query(&CallContext::new(), "td", &["A"])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("backend down"));
    assert!(!err.is_not_implemented());
}
