//! Core handler trait and types.
//!
//! Middlewares and route handlers are the same thing in Switchyard: a
//! [`Handler`] receives the request's [`Context`] and may read the request,
//! write the response, continue the chain with [`Context::next`] or stop it
//! with [`Context::abort`].
//!
//! # Example
//!
//! ```
//! use switchyard_core::{BoxFuture, Context, Handler};
//!
//! struct Logging;
//!
//! impl Handler for Logging {
//!     fn name(&self) -> &'static str {
//!         "logging"
//!     }
//!
//!     fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, ()> {
//!         Box::pin(async move {
//!             println!("-> {}", ctx.path());
//!             ctx.next().await;
//!             println!("<- {:?}", ctx.response().status());
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased handler that can be shared between route chains.
pub type BoxedHandler = Arc<dyn Handler>;

/// The core handler trait.
///
/// # Invariants
///
/// - A middleware calls `ctx.next()` at most once; handlers that produce
///   the terminal response usually never call it
/// - After `ctx.abort()` no later handler in the chain runs
/// - Exactly one handler in a chain is expected to write the response
pub trait Handler: Send + Sync + 'static {
    /// Returns a short name used in logs.
    fn name(&self) -> &'static str {
        "handler"
    }

    /// Runs this handler against the request context.
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, ()>;
}

/// A handler built from a closure.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use switchyard_core::handler_fn;
///
/// let ping = handler_fn(|ctx| {
///     Box::pin(async move {
///         ctx.write_text(StatusCode::OK, "pong");
///     })
/// });
/// ```
pub struct FnHandler<F> {
    name: &'static str,
    func: F,
}

impl<F> FnHandler<F> {
    /// Creates a new named closure handler.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, ()> {
        (self.func)(ctx)
    }
}

/// Wraps a closure into a shareable handler.
///
/// The closure signature is pinned here so that closures passed inline get
/// the higher-ranked lifetime they need.
pub fn handler_fn<F>(func: F) -> BoxedHandler
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    Arc::new(FnHandler::new("fn", func))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;

    fn empty_request() -> crate::Request {
        http::Request::builder()
            .uri("/ping")
            .body(Bytes::new())
            .unwrap()
    }

    #[tokio::test]
    async fn test_handler_fn_runs() {
        let ping = handler_fn(|ctx| {
            Box::pin(async move {
                ctx.write_text(StatusCode::OK, "pong");
            })
        });

        let mut ctx = Context::new(empty_request(), vec![ping]);
        ctx.next().await;

        assert_eq!(ctx.response().status(), Some(StatusCode::OK));
        assert_eq!(ctx.response().body(), b"pong");
    }

    #[test]
    fn test_handler_fn_name() {
        let handler = handler_fn(|ctx| Box::pin(async move { ctx.abort() }));
        assert_eq!(handler.name(), "fn");
    }
}
