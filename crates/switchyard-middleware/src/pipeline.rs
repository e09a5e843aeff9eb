//! Request pipeline.
//!
//! The pipeline is assembled once at startup through [`PipelineBuilder`]
//! and frozen by [`PipelineBuilder::build`]. After that it is only read, so
//! a single `Arc<Pipeline>` serves every connection without locking.
//!
//! ## Chain Layout
//!
//! For a matched request the chain is the global middlewares, in the order
//! they were added, followed by the route's own handlers:
//!
//! ```text
//! [global 1, global 2, ..., route handler 1, route handler 2, ...]
//! ```
//!
//! The shutdown reject guard should be added first so that it sees every
//! request before any domain code does.

use std::sync::Arc;

use http::header::HeaderValue;
use http::{Method, StatusCode};
use switchyard_core::{BoxedHandler, Context, Handler, Request, Response, ResponseWriter};
use switchyard_router::{Registration, RouteError, RouteTree};

/// Body of the response sent when no route matches.
pub const NOT_FOUND_BODY: &str = "not found";

/// Something handler chains can be registered on.
///
/// Domain services take `&mut dyn Routable` so that they do not depend on
/// how the pipeline is assembled.
pub trait Routable {
    /// Registers `handlers` for `method` and `path`.
    ///
    /// A path that is already registered keeps its first chain; the new one
    /// is dropped and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when the path is malformed.
    fn route(
        &mut self,
        method: Method,
        path: &str,
        handlers: Vec<BoxedHandler>,
    ) -> Result<(), RouteError>;

    /// Registers a `GET` route.
    fn get(&mut self, path: &str, handlers: Vec<BoxedHandler>) -> Result<(), RouteError> {
        self.route(Method::GET, path, handlers)
    }

    /// Registers a `POST` route.
    fn post(&mut self, path: &str, handlers: Vec<BoxedHandler>) -> Result<(), RouteError> {
        self.route(Method::POST, path, handlers)
    }
}

/// The frozen request pipeline.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http::StatusCode;
/// use switchyard_middleware::Pipeline;
///
/// # tokio_test::block_on(async {
/// let pipeline = Pipeline::builder().build();
/// let request = http::Request::builder().uri("/missing").body(Bytes::new()).unwrap();
///
/// let response = pipeline.serve(request).await;
/// assert_eq!(response.status(), StatusCode::NOT_FOUND);
/// # });
/// ```
pub struct Pipeline {
    /// Global middlewares, run first for every matched request
    globals: Vec<BoxedHandler>,

    /// Route tree built during registration
    tree: RouteTree<BoxedHandler>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("middlewares", &self.middleware_names())
            .field("routes", &self.tree.len())
            .finish()
    }
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Dispatches one request and returns its response.
    ///
    /// A routing miss returns `404 not found` without running any handler,
    /// global middlewares included. A hit runs the global middlewares and
    /// then the route's chain through one [`Context`].
    pub async fn serve(&self, request: Request) -> Response {
        let Some(handlers) = self.tree.lookup(request.method(), request.uri().path()) else {
            tracing::debug!(
                method = %request.method(),
                path = %request.uri().path(),
                "no route matched"
            );
            return not_found();
        };

        let chain: Vec<BoxedHandler> = self.globals.iter().chain(handlers).cloned().collect();

        let mut ctx = Context::new(request, chain);
        ctx.next().await;
        ctx.into_response()
    }

    /// Returns the names of the global middlewares in order.
    #[must_use]
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.globals.iter().map(|h| h.name()).collect()
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.tree.len()
    }
}

/// Builds the fixed `404` response.
fn not_found() -> Response {
    let mut writer = ResponseWriter::new();
    writer.insert_header(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    writer.write_header(StatusCode::NOT_FOUND);
    writer.write(NOT_FOUND_BODY.as_bytes());
    writer.into_response()
}

/// Builder for constructing a [`Pipeline`].
///
/// Routes are registered through the [`Routable`] trait.
#[derive(Default)]
pub struct PipelineBuilder {
    globals: Vec<BoxedHandler>,
    tree: RouteTree<BoxedHandler>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a global middleware.
    #[must_use]
    pub fn middleware<H: Handler>(self, handler: H) -> Self {
        self.shared_middleware(Arc::new(handler))
    }

    /// Appends a global middleware that is already shared.
    #[must_use]
    pub fn shared_middleware(mut self, handler: BoxedHandler) -> Self {
        self.globals.push(handler);
        self
    }

    /// Freezes the builder into a pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        tracing::debug!(
            middlewares = self.globals.len(),
            routes = self.tree.len(),
            "pipeline built"
        );
        Pipeline {
            globals: self.globals,
            tree: self.tree,
        }
    }
}

impl Routable for PipelineBuilder {
    fn route(
        &mut self,
        method: Method,
        path: &str,
        handlers: Vec<BoxedHandler>,
    ) -> Result<(), RouteError> {
        match self.tree.register(method.clone(), path, handlers)? {
            Registration::Added => {
                tracing::debug!(%method, path, "route registered");
            }
            Registration::Ignored => {
                tracing::warn!(%method, path, "path already registered, keeping the first chain");
            }
        }
        Ok(())
    }
}
