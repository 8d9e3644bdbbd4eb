// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus exporter for Conduit.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Plugin request
//! metrics recorded by `conduit-plugin` are rendered in Prometheus text
//! format via [`PrometheusExporter::render`].

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use thiserror::Error;

use conduit_core::types::CollectMetricsResult;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("failed to install Prometheus recorder: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}

/// Renders collected metrics in Prometheus text format.
#[derive(Clone)]
pub struct PrometheusExporter {
    handle: PrometheusHandle,
}

impl PrometheusExporter {
    /// Install the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn install() -> Result<Self, ExporterError> {
        let handle = PrometheusBuilder::new().install_recorder()?;
        conduit_plugin::describe_metrics();
        tracing::info!("prometheus metrics recorder installed");
        Ok(Self { handle })
    }

    /// An exporter over a recorder that is not installed.
    ///
    /// The caller decides where the recorder applies, e.g. with
    /// [`metrics::with_local_recorder`].
    pub fn detached() -> (Self, PrometheusRecorder) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let exporter = Self {
            handle: recorder.handle(),
        };
        (exporter, recorder)
    }

    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// The rendered metrics as a plugin metrics result.
    pub fn collect_metrics_result(&self) -> CollectMetricsResult {
        CollectMetricsResult {
            prometheus_metrics: self.render().into_bytes(),
        }
    }
}

impl std::fmt::Debug for PrometheusExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusExporter").finish_non_exhaustive()
    }
}
