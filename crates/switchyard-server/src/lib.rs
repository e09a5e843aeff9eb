//! # Switchyard Server
//!
//! HTTP listener and graceful shutdown for Switchyard.
//!
//! This crate provides:
//!
//! - [`HttpServer`]: hyper HTTP/1.1 accept loop feeding a shared pipeline
//! - [`GracefulShutdown`]: in-flight request counting, the reject guard and
//!   the drain wait
//! - [`ShutdownHooks`]: ordered shutdown hooks under a hard deadline
//!
//! ## Shutdown Sequence
//!
//! ```text
//! SIGINT/SIGTERM
//!      │
//!      ▼
//! listeners ──▶ drain ──▶ resource hooks ──▶ exit 0
//!      └──────── hard deadline overrun ─────▶ exit 1
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use switchyard_middleware::Pipeline;
//! use switchyard_server::{
//!     wait_for_shutdown, GracefulShutdown, HttpServer, Listener, ServerConfig, ShutdownHooks,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let shutdown = Arc::new(GracefulShutdown::new());
//! let pipeline = Arc::new(
//!     Pipeline::builder()
//!         .middleware(shutdown.reject_guard())
//!         .build(),
//! );
//!
//! let server = HttpServer::bind(ServerConfig::default(), pipeline).await?;
//! let listeners: Vec<Arc<dyn Listener>> = vec![Arc::new(server.spawn())];
//!
//! let stop = Arc::clone(&shutdown);
//! let drain = Arc::clone(&shutdown);
//! let hooks = ShutdownHooks::new()
//!     .on_shutdown("listeners", move |timeout| {
//!         let stop = Arc::clone(&stop);
//!         let listeners = listeners.clone();
//!         async move { stop.wait_listeners_shutdown(&listeners, timeout).await }
//!     })
//!     .on_shutdown("drain", move |timeout| {
//!         let drain = Arc::clone(&drain);
//!         async move { drain.reject_and_wait(timeout).await }
//!     });
//!
//! wait_for_shutdown(&hooks).await?;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
pub mod lifecycle;
mod server;
pub mod shutdown;
mod signal;

pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_CONNECTION_DRAIN_SECS, DEFAULT_HTTP_ADDR,
    DEFAULT_NAME,
};
pub use error::{ServerError, ShutdownError};
pub use lifecycle::{
    wait_for_shutdown, ShutdownHook, ShutdownHooks, DEFAULT_HARD_DEADLINE, DEFAULT_HOOK_TIMEOUT,
};
pub use server::{HttpServer, ListenerHandle};
pub use shutdown::{
    GracefulShutdown, InFlightToken, Listener, RejectRequests, DRAIN_HOOK, LISTENERS_HOOK,
    SHUTTING_DOWN_BODY,
};
pub use signal::{wait_for_os_signal, ShutdownSignal};
