//! Prometheus metrics for Conduit.
//!
//! The pipeline's metrics behavior records through the `metrics` facade; this
//! module installs the Prometheus recorder behind it.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `conduit_requests_total` | Counter | `request`, `family`, `outcome` | Completed dispatches |
//! | `conduit_request_duration_seconds` | Histogram | `request` | Dispatch latency |
//! | `conduit_in_flight_requests` | Gauge | - | Dispatches in progress |

use crate::error::TelemetryError;
use crate::TelemetryResult;
use conduit_pipeline::stages::metrics::{
    IN_FLIGHT_REQUESTS, REQUESTS_TOTAL, REQUEST_DURATION_SECONDS,
};
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Scrape endpoint address (e.g., "0.0.0.0:9090"). None installs the
    /// recorder without an HTTP listener; use [`render_metrics`] instead.
    pub listen_addr: Option<String>,

    /// Histogram buckets for dispatch duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: None,
            // 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

impl From<&conduit_config::MetricsConfig> for MetricsConfig {
    fn from(config: &conduit_config::MetricsConfig) -> Self {
        Self {
            enabled: config.enabled,
            listen_addr: config.listen_addr.clone(),
            ..Self::default()
        }
    }
}

/// Installs the global Prometheus recorder.
///
/// Disabled metrics is a successful no-op.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for a bad listen address and
/// `TelemetryError::MetricsInit` if the recorder cannot be installed. A
/// listen address must be bound from inside a Tokio runtime.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let handle = match &config.listen_addr {
        Some(addr) => {
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| TelemetryError::InvalidAddress(format!("{addr}: {e}")))?;
            install_with_listener(builder, addr)?
        }
        None => builder
            .install_recorder()
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?,
    };

    let _ = METRICS_HANDLE.set(handle);

    describe_metrics();

    Ok(())
}

// The scrape listener runs as a task on the current Tokio runtime.
fn install_with_listener(
    builder: PrometheusBuilder,
    addr: SocketAddr,
) -> TelemetryResult<PrometheusHandle> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
        TelemetryError::MetricsInit("a listen address requires a Tokio runtime".to_string())
    })?;

    let _entered = runtime.enter();
    let (recorder, exporter) = builder
        .with_http_listener(addr)
        .build()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let handle = recorder.handle();

    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    runtime.spawn(async move {
        if let Err(error) = exporter.await {
            tracing::warn!(%addr, error = ?error, "metrics listener stopped");
        }
    });

    Ok(handle)
}

/// Returns the global metrics handle if initialized.
pub fn metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for the standard metrics.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of dispatched requests");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Dispatch duration including behaviors and handler"
    );
    describe_gauge!(
        IN_FLIGHT_REQUESTS,
        "Number of requests currently being dispatched"
    );
}
