//! Prometheus metrics for Switchyard.
//!
//! The request pipeline records through the `metrics` facade; this module
//! installs the Prometheus recorder and its scrape endpoint.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `switchyard_requests_total` | Counter | `method`, `status` | Total requests |
//! | `switchyard_request_duration_seconds` | Histogram | `method` | Request latency |
//! | `switchyard_in_flight_requests` | Gauge | - | In-flight requests |

use std::net::SocketAddr;
use std::sync::OnceLock;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use switchyard_middleware::stages::telemetry::{
    IN_FLIGHT_REQUESTS, REQUESTS_TOTAL, REQUEST_DURATION_SECONDS,
};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Handle of the installed recorder, kept for `render_metrics`.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Where and how request metrics are exported.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether the Prometheus endpoint is started.
    pub enabled: bool,

    /// Scrape endpoint address, `host:port`.
    pub addr: String,

    /// Value of the `service` label attached to every metric.
    pub service_name: String,

    /// Bucket bounds, in seconds, for the request duration histogram.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
            service_name: "switchyard".to_string(),
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder.
///
/// Installs the global Prometheus recorder and spawns its HTTP listener on
/// the current tokio runtime. Does nothing when metrics are disabled.
///
/// # Errors
///
/// Fails if `addr` does not parse, the exporter rejects the buckets, or a
/// recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|source| TelemetryError::InvalidAddress {
            addr: config.addr.clone(),
            source,
        })?;

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service", config.service_name.clone())
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )?
        .build()?;

    let handle = recorder.handle();
    metrics::set_global_recorder(recorder).map_err(|_| TelemetryError::RecorderInstalled)?;
    let _ = METRICS_HANDLE.set(handle);

    tokio::spawn(async move {
        if let Err(e) = exporter.await {
            tracing::error!(error = ?e, "prometheus exporter stopped");
        }
    });

    register_metric_descriptions();
    tracing::info!(addr = %addr, "metrics endpoint started");

    Ok(())
}

/// Returns the current scrape text, or `None` before [`init_metrics`]
/// installed a recorder.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Attaches help text and units to the request metrics.
fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Requests that reached a route, by method and status");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Time spent in the handler chain"
    );
    describe_gauge!(
        IN_FLIGHT_REQUESTS,
        "Requests currently inside the handler chain"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
        assert!(!config.duration_buckets.is_empty());
    }

    #[test]
    fn test_disabled_metrics_is_noop() {
        let config = MetricsConfig {
            addr: "not an address".to_string(),
            ..Default::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            enabled: true,
            addr: "not an address".to_string(),
            ..Default::default()
        };

        let err = init_metrics(&config).unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidAddress { .. }));
    }

    #[test]
    fn test_render_metrics_without_init() {
        // May be Some if another test in this process installed a recorder
        let _ = render_metrics();
    }
}
