//! Observability setup for Switchyard.
//!
//! - **Logging**: `tracing-subscriber` with JSON or pretty output, to stdout
//!   or a file
//! - **Metrics**: Prometheus exporter behind the `metrics` facade
//!
//! The instrumentation middleware in `switchyard-middleware` emits the
//! request metrics; this crate only decides where they go.
//!
//! # Example
//!
//! ```rust,ignore
//! use switchyard_telemetry::{init_telemetry, MetricsConfig, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::new("gateway").with_metrics(MetricsConfig {
//!         enabled: true,
//!         ..MetricsConfig::default()
//!     });
//!
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// Must be called from inside a tokio runtime when metrics are enabled.
///
/// # Errors
///
/// Returns `TelemetryError` if any subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;

    tracing::info!(service = %config.service_name, "telemetry initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_telemetry_disabled() {
        let mut config = TelemetryConfig::default();
        config.logging.enabled = false;

        assert!(init_telemetry(&config).is_ok());
    }
}
