//! Telemetry setup errors.

use std::io;
use std::net::AddrParseError;
use std::path::PathBuf;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;

/// Why logging or metrics could not be installed.
///
/// All of these are startup failures; nothing here is raised once the
/// subscriber and recorder are in place.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level string is not a valid `EnvFilter` directive.
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter {
        /// Directive as configured.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// Another global subscriber was installed first.
    #[error("a global tracing subscriber is already installed")]
    SubscriberInstalled,

    /// The log file or its directory could not be opened.
    #[error("cannot open log file {path}")]
    LogFile {
        /// Configured file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// The metrics listen address does not parse.
    #[error("invalid metrics address '{addr}'")]
    InvalidAddress {
        /// Address as configured.
        addr: String,
        /// Parser failure.
        #[source]
        source: AddrParseError,
    },

    /// The Prometheus exporter rejected its configuration.
    #[error("cannot build prometheus exporter: {0}")]
    Exporter(#[from] BuildError),

    /// Another global metrics recorder was installed first.
    #[error("a global metrics recorder is already installed")]
    RecorderInstalled,
}
