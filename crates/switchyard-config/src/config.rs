//! Main configuration type.
//!
//! This module provides the top-level [`SwitchyardConfig`] struct.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{ClientConfig, ConfigError, ListenerConfig, LogConfig, MetricsConfig, ShutdownConfig};

/// Complete Switchyard configuration, mirroring `config.yml`.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from a file and
/// environment variables.
///
/// # Example
///
/// ```
/// use switchyard_config::{ListenerConfig, SwitchyardConfig};
///
/// let config = SwitchyardConfig {
///     server: vec![ListenerConfig {
///         name: "http".to_string(),
///         listen: ":10002".to_string(),
///         protocol: "http".to_string(),
///     }],
///     ..Default::default()
/// };
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SwitchyardConfig {
    /// Listeners to start. At least one is required.
    #[serde(default)]
    pub server: Vec<ListenerConfig>,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,

    /// Metrics exporter configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Downstream clients, looked up by name.
    #[serde(default)]
    pub clients: Vec<ClientConfig>,

    /// Shutdown deadlines.
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl SwitchyardConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if no listener is configured
    /// or a client lacks a name or address, and
    /// `ConfigError::InvalidValue` if an address or deadline is malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.is_empty() {
            return Err(ConfigError::validation_error("empty servers"));
        }

        for (idx, listener) in self.server.iter().enumerate() {
            if !is_listen_addr(&listener.listen) {
                return Err(ConfigError::invalid_value(
                    format!("server[{idx}].listen"),
                    format!("invalid listen address: {}", listener.listen),
                ));
            }
        }

        if self.clients.iter().any(|c| c.name.is_empty() || c.addr.is_empty()) {
            return Err(ConfigError::validation_error("empty client name or addr"));
        }

        if self.metrics.enabled && self.metrics.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "metrics.addr",
                format!("invalid socket address: {}", self.metrics.addr),
            ));
        }

        if self.shutdown.hook_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "shutdown.hook_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.shutdown.hard_deadline_secs < self.shutdown.hook_timeout_secs {
            return Err(ConfigError::invalid_value(
                "shutdown.hard_deadline_secs",
                "must not be shorter than shutdown.hook_timeout_secs",
            ));
        }

        Ok(())
    }

    /// Looks up a client section by name.
    ///
    /// When several clients share a name the last one wins.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownClient` if no client has this name.
    pub fn client(&self, name: &str) -> Result<&ClientConfig, ConfigError> {
        self.clients
            .iter()
            .rev()
            .find(|c| c.name == name)
            .ok_or_else(|| ConfigError::unknown_client(name))
    }
}

/// Accepts `host:port` and the `:port` shorthand.
fn is_listen_addr(addr: &str) -> bool {
    match addr.strip_prefix(':') {
        Some(port) => port.parse::<u16>().is_ok(),
        None => addr.parse::<SocketAddr>().is_ok(),
    }
}
