//! Per-request dispatch context.
//!
//! A [`Context`] owns the request, the response being written, and the
//! ordered handler chain selected for the request. Handlers drive the chain
//! forward with [`Context::next`] and cut it short with [`Context::abort`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use http::header::HeaderValue;
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::BodyError;
use crate::handler::{BoxFuture, BoxedHandler};
use crate::response::ResponseWriter;
use crate::types::{Request, Response};

/// State for one request moving through its handler chain.
///
/// The chain is executed by index: `cursor` always points at the next
/// handler that has not started yet. A handler that calls
/// [`next`](Self::next) runs every remaining handler before its own code
/// after the call resumes, so middlewares see the downstream response.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http::StatusCode;
/// use switchyard_core::{handler_fn, Context};
///
/// # tokio_test::block_on(async {
/// let hello = handler_fn(|ctx| {
///     Box::pin(async move { ctx.write_text(StatusCode::OK, "hello") })
/// });
///
/// let request = http::Request::builder().uri("/").body(Bytes::new()).unwrap();
/// let mut ctx = Context::new(request, vec![hello]);
/// ctx.next().await;
///
/// assert_eq!(ctx.response().body(), b"hello");
/// # });
/// ```
pub struct Context {
    request: Request,
    writer: ResponseWriter,
    chain: Vec<BoxedHandler>,
    cursor: usize,
    aborted: bool,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("path", &self.request.uri().path())
            .field("chain_len", &self.chain.len())
            .field("cursor", &self.cursor)
            .field("aborted", &self.aborted)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates a context for `request` that will run `chain` in order.
    #[must_use]
    pub fn new(request: Request, chain: Vec<BoxedHandler>) -> Self {
        Self {
            request,
            writer: ResponseWriter::new(),
            chain,
            cursor: 0,
            aborted: false,
            extensions: HashMap::new(),
        }
    }

    /// Runs the remaining handlers of the chain.
    ///
    /// Each handler is started at most once. When a handler itself calls
    /// `next`, the nested call drains the rest of the chain, so the outer
    /// loop finds nothing left when control returns to it.
    pub fn next(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            while self.cursor < self.chain.len() {
                let handler = Arc::clone(&self.chain[self.cursor]);
                self.cursor += 1;
                tracing::trace!(handler = handler.name(), "running handler");
                handler.call(self).await;
            }
        })
    }

    /// Stops the chain. No handler that has not started yet will run.
    ///
    /// The calling handler keeps running and may still write the response.
    pub fn abort(&mut self) {
        self.cursor = self.chain.len();
        self.aborted = true;
    }

    /// Returns true if [`abort`](Self::abort) was called.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Returns the request.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Returns the response written so far.
    #[must_use]
    pub fn response(&self) -> &ResponseWriter {
        &self.writer
    }

    /// Returns the response writer.
    pub fn writer(&mut self) -> &mut ResponseWriter {
        &mut self.writer
    }

    /// Decodes the request body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::Empty`] for an empty body and
    /// [`BodyError::Json`] when the body does not decode into `T`.
    pub fn read_json<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        let body = self.request.body();
        if body.is_empty() {
            return Err(BodyError::Empty);
        }
        Ok(serde_json::from_slice(body)?)
    }

    /// Decodes the whole query string into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError::Query`] when the query does not decode.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        let raw = self.request.uri().query().unwrap_or("");
        Ok(serde_urlencoded::from_str(raw)?)
    }

    /// Returns the first value of query parameter `key`.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<String> {
        let pairs: Vec<(String, String)> = self.query().ok()?;
        pairs.into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Writes `value` as a JSON response.
    ///
    /// A value that fails to serialize produces a `500` instead.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.writer.insert_header(
                    http::header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                self.writer.write_header(status);
                self.writer.write(&body);
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to encode response body");
                self.write_text(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
            }
        }
    }

    /// Writes a plain-text response.
    pub fn write_text(&mut self, status: StatusCode, text: &str) {
        self.writer.insert_header(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.writer.write_header(status);
        self.writer.write(text.as_bytes());
    }

    /// Stores a typed value for later handlers in the chain.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed value stored by an earlier handler.
    #[must_use]
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Finishes the request and returns the response.
    #[must_use]
    pub fn into_response(self) -> Response {
        self.writer.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use serde::Deserialize;

    fn request(uri: &str, body: &'static str) -> Request {
        http::Request::builder()
            .uri(uri)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    /// Records its label, optionally calling `next` in between.
    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        label: &'static str,
        call_next: bool,
    ) -> BoxedHandler {
        let log = Arc::clone(log);
        handler_fn(move |ctx| {
            let log = Arc::clone(&log);
            Box::pin(async move {
                log.lock().push(format!("{label}:before"));
                if call_next {
                    ctx.next().await;
                }
                log.lock().push(format!("{label}:after"));
            })
        })
    }

    #[tokio::test]
    async fn test_next_runs_onion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = vec![
            recorder(&log, "a", true),
            recorder(&log, "b", true),
            recorder(&log, "c", false),
        ];

        let mut ctx = Context::new(request("/", ""), chain);
        ctx.next().await;

        assert_eq!(
            *log.lock(),
            vec!["a:before", "b:before", "c:before", "c:after", "b:after", "a:after"]
        );
    }

    #[tokio::test]
    async fn test_chain_without_next_runs_each_handler_once() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = vec![recorder(&log, "a", false), recorder(&log, "b", false)];

        let mut ctx = Context::new(request("/", ""), chain);
        ctx.next().await;

        assert_eq!(*log.lock(), vec!["a:before", "a:after", "b:before", "b:after"]);
    }

    #[tokio::test]
    async fn test_abort_stops_later_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let guard = handler_fn(|ctx| {
            Box::pin(async move {
                ctx.write_text(StatusCode::SERVICE_UNAVAILABLE, "closed");
                ctx.abort();
            })
        });
        let chain = vec![guard, recorder(&log, "handler", false)];

        let mut ctx = Context::new(request("/", ""), chain);
        ctx.next().await;

        assert!(ctx.is_aborted());
        assert!(log.lock().is_empty());
        assert_eq!(ctx.response().status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_abort_inside_middleware_after_next() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let outer = handler_fn(|ctx| {
            Box::pin(async move {
                ctx.next().await;
                ctx.abort();
            })
        });
        let chain = vec![outer, recorder(&log, "inner", false)];

        let mut ctx = Context::new(request("/", ""), chain);
        ctx.next().await;

        assert_eq!(*log.lock(), vec!["inner:before", "inner:after"]);
    }

    #[tokio::test]
    async fn test_next_after_exhaustion_is_noop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = Context::new(request("/", ""), vec![recorder(&log, "a", false)]);

        ctx.next().await;
        ctx.next().await;

        assert_eq!(log.lock().len(), 2);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct SignUp {
        name: String,
        age: u32,
    }

    #[test]
    fn test_read_json() {
        let ctx = Context::new(request("/", r#"{"name":"one","age":10}"#), vec![]);
        let body: SignUp = ctx.read_json().unwrap();
        assert_eq!(
            body,
            SignUp {
                name: "one".to_string(),
                age: 10
            }
        );
    }

    #[test]
    fn test_read_json_empty_body() {
        let ctx = Context::new(request("/", ""), vec![]);
        assert!(matches!(ctx.read_json::<SignUp>(), Err(BodyError::Empty)));
    }

    #[test]
    fn test_read_json_invalid_body() {
        let ctx = Context::new(request("/", "{"), vec![]);
        assert!(matches!(ctx.read_json::<SignUp>(), Err(BodyError::Json(_))));
    }

    #[test]
    fn test_query_param() {
        let ctx = Context::new(request("/user/list?delay=200&x=a%20b", ""), vec![]);
        assert_eq!(ctx.query_param("delay").as_deref(), Some("200"));
        assert_eq!(ctx.query_param("x").as_deref(), Some("a b"));
        assert!(ctx.query_param("missing").is_none());
    }

    #[test]
    fn test_query_typed() {
        #[derive(Deserialize)]
        struct Delay {
            delay: u64,
        }

        let ctx = Context::new(request("/user/list?delay=15", ""), vec![]);
        assert_eq!(ctx.query::<Delay>().unwrap().delay, 15);
    }

    #[test]
    fn test_write_json_sets_content_type() {
        let mut ctx = Context::new(request("/", ""), vec![]);
        ctx.write_json(StatusCode::OK, &serde_json::json!({"code": 0}));

        let response = ctx.into_response();
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct RequestTag(u32);

        let mut ctx = Context::new(request("/", ""), vec![]);
        assert!(ctx.extension::<RequestTag>().is_none());

        ctx.set_extension(RequestTag(7));
        assert_eq!(ctx.extension::<RequestTag>(), Some(&RequestTag(7)));
    }

    #[test]
    fn test_request_accessors() {
        let ctx = Context::new(request("/user/list?delay=1", ""), vec![]);
        assert_eq!(ctx.method(), Method::GET);
        assert_eq!(ctx.path(), "/user/list");
    }
}
