// src/metrics.rs
use anyhow::Context;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Fails if a recorder is already installed.
    pub fn init() -> anyhow::Result<Self> {
        // Default buckets; histograms render as summaries.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metric descriptions (so series show up on /metrics with help text).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scan_requests_total", "Scans requested (API and library).");
        describe_counter!("scan_blocks_total", "Candidate blocks produced by the segmenter.");
        describe_counter!("scan_events_total", "Events kept after extraction.");
        describe_counter!(
            "entity_strategy_failures_total",
            "Entity strategy errors or timeouts (block fell back to patterns)."
        );
        describe_histogram!("scan_duration_ms", "Scan wall time in milliseconds.");
    });
}
