//! Core dispatch types for Switchyard.
//!
//! This crate defines what every other Switchyard crate builds on:
//!
//! - [`Handler`]: the single abstraction for middlewares and route handlers
//! - [`Context`]: per-request state, with [`Context::next`] and
//!   [`Context::abort`] driving the handler chain
//! - [`ResponseWriter`]: status, headers and body of the response
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use http::StatusCode;
//! use switchyard_core::{handler_fn, Context};
//!
//! let timing = handler_fn(|ctx| {
//!     Box::pin(async move {
//!         ctx.next().await;
//!         ctx.writer().insert_header("x-handled", http::HeaderValue::from_static("1"));
//!     })
//! });
//! let hello = handler_fn(|ctx| {
//!     Box::pin(async move { ctx.write_text(StatusCode::OK, "hello") })
//! });
//!
//! let request = http::Request::builder().uri("/").body(Bytes::new()).unwrap();
//! let mut ctx = Context::new(request, vec![timing, hello]);
//! # tokio_test::block_on(async {
//! ctx.next().await;
//! # });
//! assert_eq!(ctx.response().status(), Some(StatusCode::OK));
//! ```

mod context;
mod error;
mod handler;
mod response;
mod types;

pub use context::Context;
pub use error::BodyError;
pub use handler::{handler_fn, BoxFuture, BoxedHandler, FnHandler, Handler};
pub use response::ResponseWriter;
pub use types::{Request, Response};
