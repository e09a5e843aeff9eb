//! # Switchyard
//!
//! **In-process HTTP dispatch engine**
//!
//! Switchyard maps `(method, path)` to ordered handler chains, runs each
//! request through global middlewares and its chain, and shuts down without
//! dropping in-flight requests:
//!
//! - **Prefix-tree routing** – literal segments beat a trailing `*`
//! - **Onion middlewares** – `next()` to continue, `abort()` to stop
//! - **Graceful drain** – new requests get `503` while in-flight ones finish
//! - **Ordered shutdown hooks** – per-hook timeout under a hard deadline
//!
//! ## Request Path
//!
//! ```text
//! Request → RejectGuard → Instrumentation → route handlers
//!                                                 ↓
//! Response ←──────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use switchyard::app::App;
//! use switchyard::config::ConfigLoader;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ConfigLoader::new().with_file("config/config.yml")?.load()?;
//! let app = App::start(&config).await?;
//!
//! switchyard::server::wait_for_shutdown(app.hooks()).await?;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;

// Re-export core types
pub use switchyard_core as core;

// Re-export router types
pub use switchyard_router as router;

// Re-export pipeline types
pub use switchyard_middleware as middleware;

// Re-export listener and shutdown types
pub use switchyard_server as server;

// Re-export configuration types
pub use switchyard_config as config;

// Re-export telemetry setup
pub use switchyard_telemetry as telemetry;

// Re-export domain services
pub use switchyard_service as service;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use switchyard::prelude::*;
///
/// let deny: BoxedHandler = handler_fn(|ctx| Box::pin(async move { ctx.abort() }));
/// assert_eq!(deny.name(), "fn");
/// ```
pub mod prelude {
    pub use switchyard_core::{handler_fn, BoxFuture, BoxedHandler, Context, Handler};
    pub use switchyard_middleware::{Instrumentation, Pipeline, PipelineBuilder, Routable};
    pub use switchyard_router::RouteError;
    pub use switchyard_server::{
        GracefulShutdown, HttpServer, Listener, ServerConfig, ShutdownError, ShutdownHooks,
    };
}
