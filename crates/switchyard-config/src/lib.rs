//! Typed configuration for Switchyard.
//!
//! The configuration is a single YAML document with these sections:
//!
//! - `server` - listeners to start (at least one)
//! - `log` - log file, level and format
//! - `metrics` - optional Prometheus endpoint
//! - `clients` - downstream dependencies, looked up by name
//! - `shutdown` - per-hook timeout and hard deadline
//!
//! Unknown fields are rejected.
//!
//! # Example
//!
//! ```no_run
//! use switchyard_config::ConfigLoader;
//!
//! # fn main() -> Result<(), switchyard_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_file("config/config.yml")?
//!     .with_env_prefix("SWITCHYARD")
//!     .load()?;
//!
//! let broker = config.client("rabbitmq")?;
//! println!("broker at {}", broker.addr);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```yaml
//! server:
//!   - name: http
//!     listen: ":10002"
//!     http: http
//! log:
//!   path: ""
//!   level: info
//!   format: json
//! clients:
//!   - name: rabbitmq
//!     type: rabbitmq
//!     addr: "127.0.0.1:5672"
//! shutdown:
//!   hook_timeout_secs: 10
//!   hard_deadline_secs: 60
//! ```

mod config;
mod error;
mod loader;
mod schema;

pub use config::SwitchyardConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{ClientConfig, ListenerConfig, LogConfig, LogFormat, MetricsConfig, ShutdownConfig};
