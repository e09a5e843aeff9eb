//! Listener configuration.
//!
//! # Example
//!
//! ```rust
//! use switchyard_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .name("public")
//!     .http_addr("127.0.0.1:10002")
//!     .connection_drain_timeout(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(config.name(), "public");
//! assert_eq!(config.http_addr(), "127.0.0.1:10002");
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::ServerError;

/// Default listener name.
pub const DEFAULT_NAME: &str = "http";

/// Default HTTP bind address.
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:10002";

/// Default time open connections get to close after the accept loop stops.
pub const DEFAULT_CONNECTION_DRAIN_SECS: u64 = 30;

/// Configuration of one HTTP listener.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listener name used in logs and shutdown errors
    name: String,

    /// HTTP bind address (e.g., "0.0.0.0:10002")
    http_addr: String,

    /// How long open connections may keep running after accepting stops
    connection_drain_timeout: Duration,
}

impl ServerConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the listener name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the HTTP bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Parses the bind address.
    ///
    /// A bare `:port`, as found in many config files, binds all interfaces.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidAddress`] if the address does not parse.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = if self.http_addr.starts_with(':') {
            format!("0.0.0.0{}", self.http_addr)
        } else {
            self.http_addr.clone()
        };
        addr.parse().map_err(|source| ServerError::InvalidAddress {
            addr: self.http_addr.clone(),
            source,
        })
    }

    /// Returns how long open connections may run after accepting stops.
    #[must_use]
    pub fn connection_drain_timeout(&self) -> Duration {
        self.connection_drain_timeout
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    name: String,
    http_addr: String,
    connection_drain_timeout: Duration,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            connection_drain_timeout: Duration::from_secs(DEFAULT_CONNECTION_DRAIN_SECS),
        }
    }

    /// Sets the listener name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    /// Sets how long open connections may run after accepting stops.
    #[must_use]
    pub fn connection_drain_timeout(mut self, timeout: Duration) -> Self {
        self.connection_drain_timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            name: self.name,
            http_addr: self.http_addr,
            connection_drain_timeout: self.connection_drain_timeout,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
