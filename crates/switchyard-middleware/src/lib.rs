//! # Switchyard Middleware
//!
//! Request pipeline for Switchyard.
//!
//! The [`Pipeline`] owns the global middlewares and the route tree. For
//! every request it resolves the handler chain, prepends the globals and
//! drives the chain through a [`Context`](switchyard_core::Context).
//!
//! ```text
//! Request → RejectGuard → Instrumentation → route handlers
//!                                                 ↓
//! Response ←──────────────────────────────────────┘
//! ```
//!
//! Global middlewares run in registration order for every matched request.
//! A request that matches no route never reaches them and receives a fixed
//! `404 not found`.
//!
//! ## Example
//!
//! ```
//! use http::{Method, StatusCode};
//! use switchyard_core::handler_fn;
//! use switchyard_middleware::{Pipeline, Routable};
//! use switchyard_middleware::stages::Instrumentation;
//!
//! let mut builder = Pipeline::builder().middleware(Instrumentation::new());
//! builder
//!     .route(
//!         Method::GET,
//!         "/user/list",
//!         vec![handler_fn(|ctx| {
//!             Box::pin(async move { ctx.write_text(StatusCode::OK, "[]") })
//!         })],
//!     )
//!     .unwrap();
//!
//! let pipeline = builder.build();
//! assert_eq!(pipeline.route_count(), 1);
//! assert_eq!(pipeline.middleware_names(), vec!["instrumentation"]);
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod pipeline;
pub mod stages;

// Re-export main types at crate root
pub use pipeline::{Pipeline, PipelineBuilder, Routable, NOT_FOUND_BODY};
pub use stages::{Instrumentation, RequestId, REQUEST_ID_HEADER};
