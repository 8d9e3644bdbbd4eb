// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conduit - an in-process backend plugin host.
//!
//! This is the binary entry point. It assembles the host from configuration
//! and drives the built-in plugins from the command line.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod host;
mod testdata;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use conduit_config::ConduitConfig;
use conduit_core::CallContext;
use conduit_prometheus::PrometheusExporter;

use crate::commands::QueryArgs;
use crate::host::{Host, HostError};

/// Conduit - an in-process backend plugin host.
#[derive(Parser, Debug)]
#[command(name = "conduit", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered plugins and their capabilities.
    Plugins {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run a plugin's health check.
    Health {
        plugin: String,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Run one query against a data source.
    Query {
        plugin: String,
        /// Uid of the data source to query.
        #[arg(long)]
        datasource: String,
        #[arg(long, default_value = "A")]
        ref_id: String,
        #[arg(long, default_value = "now-1h")]
        from: String,
        #[arg(long, default_value = "now")]
        to: String,
        /// Query model as a JSON object.
        #[arg(long, default_value = "{}", value_parser = parse_model)]
        model: serde_json::Value,
    },
    /// Subscribe to a plugin stream and print its packets.
    Stream {
        plugin: String,
        path: String,
        /// Number of packets to print before stopping.
        #[arg(long, default_value_t = 5)]
        packets: usize,
    },
    /// Query every data source once and print the request metrics.
    Metrics,
}

fn parse_model(s: &str) -> Result<serde_json::Value, String> {
    match serde_json::from_str(s) {
        Ok(value @ serde_json::Value::Object(_)) => Ok(value),
        Ok(_) => Err("query model must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => conduit_config::load_and_validate_path(path),
        None => conduit_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            conduit_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let Some(command) = cli.command else {
        println!("conduit: use --help for available commands");
        return;
    };

    init_tracing(&config.log.level);

    if let Err(e) = run(command, config).await {
        eprintln!("conduit: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: ConduitConfig) -> Result<(), HostError> {
    let exporter = if config.metrics.enabled {
        Some(PrometheusExporter::install()?)
    } else {
        None
    };

    let host = Host::new(config)?;
    let ctx = CallContext::new();
    let shutdown = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            shutdown.cancel();
        }
    });

    host.registry.start_all(&ctx).await?;
    let result = dispatch(&host, &ctx, command, exporter.as_ref()).await;
    host.registry.stop_all(&ctx).await;
    host.node.shutdown();
    result
}

async fn dispatch(
    host: &Host,
    ctx: &CallContext,
    command: Commands,
    exporter: Option<&PrometheusExporter>,
) -> Result<(), HostError> {
    match command {
        Commands::Plugins { json } => commands::run_plugins(host, json),
        Commands::Health { plugin, plain } => {
            commands::run_health(host, ctx, &plugin, plain).await
        }
        Commands::Query {
            plugin,
            datasource,
            ref_id,
            from,
            to,
            model,
        } => {
            let args = QueryArgs {
                data_source_uid: datasource,
                ref_id,
                from,
                to,
                model,
            };
            commands::run_query(host, ctx, &plugin, args).await
        }
        Commands::Stream {
            plugin,
            path,
            packets,
        } => commands::run_stream(host, ctx, &plugin, &path, packets).await,
        Commands::Metrics => commands::run_metrics(host, ctx, exporter).await,
    }
}

/// Initialize the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("conduit={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
