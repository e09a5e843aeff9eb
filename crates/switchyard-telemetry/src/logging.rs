//! Structured logging for Switchyard.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] built from
//! the configured level. Output is JSON (production) or pretty (development)
//! and goes to stdout unless a log file is configured.
//!
//! # Example
//!
//! ```rust,ignore
//! use switchyard_telemetry::logging::{LogConfig, init_logging};
//!
//! init_logging(&LogConfig::default())?;
//!
//! tracing::info!(listener = "http", addr = ":10002", "listener started");
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Where logs go and how they are formatted.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// When false, `init_logging` installs nothing.
    pub enabled: bool,

    /// Log level or filter directive (e.g., "info", "switchyard=debug").
    pub level: String,

    /// JSON lines when true, pretty multi-line output otherwise.
    pub json_format: bool,

    /// Append logs to this file instead of stdout.
    pub file: Option<PathBuf>,

    /// Adds source file and line to each event.
    pub file_line_info: bool,

    /// Adds the thread id to each event.
    pub thread_ids: bool,

    /// Adds the module path to each event.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            file: None,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Pretty output at `debug` with source locations, for local runs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            file_line_info: true,
            ..Self::default()
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Fails if the level does not parse, the log file cannot be opened, or a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let layer = match config.file.as_deref() {
        Some(path) => output_layer(config, Mutex::new(open_log_file(path)?), false),
        None => output_layer(config, std::io::stdout, !config.json_format),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|_| TelemetryError::SubscriberInstalled)
}

/// Builds the JSON or pretty formatting layer over `writer`.
fn output_layer<S, W>(
    config: &LogConfig,
    writer: W,
    ansi: bool,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_ids(config.thread_ids)
        .with_target(config.include_target);

    if config.json_format {
        layer.json().with_ansi(false).boxed()
    } else {
        layer.pretty().with_ansi(ansi).boxed()
    }
}

/// Parses a level or filter directive such as `info` or
/// `switchyard_server=debug,hyper=warn`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when the directive does not
/// parse.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })
}

/// Opens `path` for appending, creating it and its parent directory.
fn open_log_file(path: &Path) -> TelemetryResult<File> {
    let log_file_error = |source: std::io::Error| TelemetryError::LogFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(log_file_error)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(log_file_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert!(config.json_format);
        assert!(config.file.is_none());
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert!(!config.json_format);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_create_env_filter_valid() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("switchyard_server=debug,hyper=warn").is_ok());
    }

    #[test]
    fn test_create_env_filter_invalid() {
        let err = create_env_filter("switchyard=loud").unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidFilter { .. }));
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            level: "switchyard=loud".to_string(),
            ..Default::default()
        };

        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_open_log_file_creates_parent_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("server.log");

        open_log_file(&path).unwrap().write_all(b"first\n").unwrap();
        open_log_file(&path).unwrap().write_all(b"second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
