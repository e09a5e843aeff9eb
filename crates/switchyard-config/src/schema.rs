//! Configuration schema types.
//!
//! This module defines the structure of every section of `config.yml`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One listener entry of the `server` section.
///
/// # Example
///
/// ```
/// use switchyard_config::ListenerConfig;
///
/// let listener = ListenerConfig {
///     name: "http".to_string(),
///     listen: ":10002".to_string(),
///     protocol: "http".to_string(),
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ListenerConfig {
    /// Listener name, used in logs and shutdown hooks.
    pub name: String,

    /// Bind address, either `host:port` or `:port`.
    pub listen: String,

    /// Wire protocol served on this listener.
    #[serde(rename = "http", default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    "http".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// The `log` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Log file path. Logs go to stdout when unset or empty.
    #[serde(default)]
    pub path: Option<String>,

    /// Log level or filter directive (e.g. `info`, `switchyard=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LogConfig {
    /// Returns the log file path if one is configured.
    #[must_use]
    pub fn file_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// The `metrics` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Expose a Prometheus scrape endpoint.
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus endpoint bind address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

/// One entry of the `clients` section.
///
/// Describes a downstream dependency such as a message broker. `addr` may
/// hold several comma-separated addresses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Lookup name.
    #[serde(default)]
    pub name: String,

    /// Client kind (e.g. `rabbitmq`, `kafka`).
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Comma-separated addresses.
    #[serde(default)]
    pub addr: String,

    /// Optional user name.
    #[serde(default)]
    pub user: String,

    /// Optional credential.
    #[serde(default)]
    pub auth: String,

    /// Read timeout in milliseconds; 0 means unset.
    #[serde(default)]
    pub read_timeout: u64,

    /// Write timeout in milliseconds; 0 means unset.
    #[serde(default)]
    pub write_timeout: u64,
}

impl ClientConfig {
    /// Returns the individual addresses listed in `addr`.
    pub fn addrs(&self) -> impl Iterator<Item = &str> {
        self.addr
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// Returns the read timeout, if set.
    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout > 0).then(|| Duration::from_millis(self.read_timeout))
    }

    /// Returns the write timeout, if set.
    #[must_use]
    pub fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout > 0).then(|| Duration::from_millis(self.write_timeout))
    }
}

/// The `shutdown` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ShutdownConfig {
    /// Deadline handed to each shutdown hook, in seconds.
    #[serde(default = "default_hook_timeout")]
    pub hook_timeout_secs: u64,

    /// Deadline for the whole shutdown sequence, in seconds.
    #[serde(default = "default_hard_deadline")]
    pub hard_deadline_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            hook_timeout_secs: default_hook_timeout(),
            hard_deadline_secs: default_hard_deadline(),
        }
    }
}

impl ShutdownConfig {
    /// Returns the per-hook timeout.
    #[must_use]
    pub const fn hook_timeout(&self) -> Duration {
        Duration::from_secs(self.hook_timeout_secs)
    }

    /// Returns the hard deadline.
    #[must_use]
    pub const fn hard_deadline(&self) -> Duration {
        Duration::from_secs(self.hard_deadline_secs)
    }
}

const fn default_hook_timeout() -> u64 {
    10
}

const fn default_hard_deadline() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_protocol_key() {
        let listener: ListenerConfig =
            serde_yaml::from_str("name: api\nlisten: \":8080\"\nhttp: http\n").unwrap();
        assert_eq!(listener.protocol, "http");
        assert_eq!(listener.listen, ":8080");
    }

    #[test]
    fn test_listener_protocol_defaults() {
        let listener: ListenerConfig =
            serde_yaml::from_str("name: api\nlisten: \"127.0.0.1:8080\"\n").unwrap();
        assert_eq!(listener.protocol, "http");
    }

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.file_path().is_none());
    }

    #[test]
    fn test_log_empty_path_is_stdout() {
        let config: LogConfig = serde_yaml::from_str("path: \"\"\nlevel: debug\n").unwrap();
        assert!(config.file_path().is_none());
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_log_format_deserialize() {
        let config: LogConfig = serde_yaml::from_str("format: pretty\n").unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_log_rejects_unknown_field() {
        let result: Result<LogConfig, _> = serde_yaml::from_str("colour: true\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_client_type_key_and_timeouts() {
        let client: ClientConfig = serde_yaml::from_str(
            "name: kafka\ntype: kafka\naddr: \"a:9092, b:9092\"\nread_timeout: 500\n",
        )
        .unwrap();

        assert_eq!(client.kind, "kafka");
        assert_eq!(client.addrs().collect::<Vec<_>>(), vec!["a:9092", "b:9092"]);
        assert_eq!(client.read_timeout(), Some(Duration::from_millis(500)));
        assert_eq!(client.write_timeout(), None);
    }

    #[test]
    fn test_shutdown_defaults() {
        let config = ShutdownConfig::default();
        assert_eq!(config.hook_timeout(), Duration::from_secs(10));
        assert_eq!(config.hard_deadline(), Duration::from_secs(60));
    }

    #[test]
    fn test_metrics_defaults() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
    }
}
