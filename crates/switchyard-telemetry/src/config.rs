//! Telemetry configuration.

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;

/// Default service name used in logs and as the metrics `service` label.
pub const DEFAULT_SERVICE_NAME: &str = "switchyard";

/// Logging and metrics settings for one process.
///
/// The service name is the single source of the metrics `service` label:
/// [`with_metrics`](Self::with_metrics) overwrites whatever label the
/// passed config carried.
///
/// ```
/// use switchyard_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};
///
/// let config = TelemetryConfig::new("gateway")
///     .with_logging(LogConfig::development())
///     .with_metrics(MetricsConfig { enabled: true, ..MetricsConfig::default() });
///
/// assert_eq!(config.metrics.service_name, "gateway");
/// ```
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name.
    pub service_name: String,

    /// Metrics configuration.
    pub metrics: MetricsConfig,

    /// Logging configuration.
    pub logging: LogConfig,
}

impl TelemetryConfig {
    /// Creates the default setup for `service_name`: JSON logs at `info`,
    /// metrics off.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        let service_name = service_name.into();
        Self {
            metrics: MetricsConfig {
                service_name: service_name.clone(),
                ..MetricsConfig::default()
            },
            logging: LogConfig::default(),
            service_name,
        }
    }

    /// Replaces the logging setup.
    #[must_use]
    pub fn with_logging(mut self, logging: LogConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Replaces the metrics setup, keeping this config's service label.
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = MetricsConfig {
            service_name: self.service_name.clone(),
            ..metrics
        };
        self
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}
