//! HTTP listener.
//!
//! [`HttpServer`] accepts TCP connections, serves each with hyper's
//! HTTP/1.1 connection driver and hands every request to the shared
//! [`Pipeline`].
//!
//! # Shutdown
//!
//! When its [`ShutdownSignal`] fires the accept loop stops, then every open
//! connection is asked to finish gracefully: requests already being served
//! complete, idle keep-alive connections close. Nothing in flight is
//! cancelled.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use switchyard_middleware::Pipeline;
//! use switchyard_server::{HttpServer, Listener, ServerConfig};
//!
//! # async fn run() -> Result<(), switchyard_server::ServerError> {
//! let pipeline = Arc::new(Pipeline::builder().build());
//! let config = ServerConfig::builder().http_addr("127.0.0.1:10002").build();
//!
//! let server = HttpServer::bind(config, pipeline).await?;
//! let handle = server.spawn();
//!
//! // ... later
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::HeaderValue;
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use switchyard_core::{BoxFuture, Response, ResponseWriter};
use switchyard_middleware::Pipeline;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::shutdown::Listener;
use crate::signal::ShutdownSignal;

/// A bound HTTP listener, ready to run.
pub struct HttpServer {
    config: ServerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    pipeline: Arc<Pipeline>,
}

impl std::fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServer")
            .field("name", &self.config.name())
            .field("local_addr", &self.local_addr)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl HttpServer {
    /// Binds the configured address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn bind(
        config: ServerConfig,
        pipeline: Arc<Pipeline>,
    ) -> Result<Self, ServerError> {
        let addr = config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        tracing::info!(name = config.name(), addr = %local_addr, "server listening");

        Ok(Self {
            config,
            listener,
            local_addr,
            pipeline,
        })
    }

    /// Returns the address actually bound (useful with port 0).
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the listener name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.config.name()
    }

    /// Runs the accept loop on a new task.
    ///
    /// The returned handle stops it.
    #[must_use]
    pub fn spawn(self) -> ListenerHandle {
        let shutdown = ShutdownSignal::new();
        let (stopped_tx, stopped_rx) = watch::channel(false);
        let name = self.config.name().to_string();

        let signal = shutdown.clone();
        tokio::spawn(async move {
            self.run_with_shutdown(signal, Some(stopped_tx)).await;
        });

        ListenerHandle {
            name,
            shutdown,
            stopped: stopped_rx,
        }
    }

    /// Runs the accept loop until `shutdown` fires.
    ///
    /// Accepting stops first; open connections then get the configured
    /// drain timeout to finish.
    pub async fn serve(self, shutdown: ShutdownSignal) {
        self.run_with_shutdown(shutdown, None).await;
    }

    async fn run_with_shutdown(
        self,
        shutdown: ShutdownSignal,
        stopped: Option<watch::Sender<bool>>,
    ) {
        let Self {
            config,
            listener,
            pipeline,
            ..
        } = self;
        let (connections_tx, connections) = watch::channel(0usize);
        let connections_tx = Arc::new(connections_tx);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let pipeline = Arc::clone(&pipeline);
                            let shutdown = shutdown.clone();
                            let token = ConnectionToken::acquire(&connections_tx);

                            tokio::spawn(async move {
                                if let Err(e) = serve_connection(stream, pipeline, shutdown).await {
                                    tracing::debug!(%remote_addr, error = %e, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!(name = config.name(), "stopped accepting connections");
                    break;
                }
            }
        }

        drop(listener);
        if let Some(stopped) = stopped {
            stopped.send_replace(true);
        }

        let open = *connections.borrow();
        if open > 0 {
            let timeout = config.connection_drain_timeout();
            tracing::info!(open, ?timeout, "waiting for open connections");
            let mut connections = connections;
            let closed = tokio::time::timeout(timeout, connections.wait_for(|n| *n == 0))
                .await
                .is_ok();
            if !closed {
                tracing::warn!(
                    open = *connections.borrow(),
                    "connections still open after drain timeout"
                );
            }
        }

        tracing::info!(name = config.name(), "server stopped");
    }
}

/// Counts one open connection until dropped.
struct ConnectionToken {
    open: Arc<watch::Sender<usize>>,
}

impl ConnectionToken {
    fn acquire(open: &Arc<watch::Sender<usize>>) -> Self {
        open.send_modify(|n| *n += 1);
        Self {
            open: Arc::clone(open),
        }
    }
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        self.open.send_modify(|n| *n -= 1);
    }
}

/// Serves one connection until it closes or shutdown completes it.
async fn serve_connection(
    stream: TcpStream,
    pipeline: Arc<Pipeline>,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req: http::Request<Incoming>| {
        let pipeline = Arc::clone(&pipeline);
        async move { Ok::<_, Infallible>(handle_request(&pipeline, req).await) }
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

/// Collects the body and dispatches the request through the pipeline.
async fn handle_request(pipeline: &Pipeline, req: http::Request<Incoming>) -> Response {
    let (parts, body) = req.into_parts();
    let body: Bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read request body");
            return bad_request();
        }
    };

    pipeline.serve(http::Request::from_parts(parts, body)).await
}

fn bad_request() -> Response {
    let mut writer = ResponseWriter::new();
    writer.insert_header(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    writer.write_header(StatusCode::BAD_REQUEST);
    writer.write(b"failed to read request body");
    writer.into_response()
}

/// Handle to a spawned [`HttpServer`].
#[derive(Debug, Clone)]
pub struct ListenerHandle {
    name: String,
    shutdown: ShutdownSignal,
    stopped: watch::Receiver<bool>,
}

impl ListenerHandle {
    /// Returns true once the accept loop has exited.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.stopped.borrow()
    }
}

impl Listener for ListenerHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn shutdown(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.shutdown.trigger();
            let mut stopped = self.stopped.clone();
            // Sender dropped means the accept task is gone too.
            let _ = stopped.wait_for(|stopped| *stopped).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use switchyard_core::handler_fn;
    use switchyard_middleware::Routable;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn pipeline() -> Arc<Pipeline> {
        let mut builder = Pipeline::builder();
        builder
            .get(
                "/ping",
                vec![handler_fn(|ctx| {
                    Box::pin(async move { ctx.write_text(StatusCode::OK, "pong") })
                })],
            )
            .unwrap();
        builder
            .post(
                "/echo",
                vec![handler_fn(|ctx| {
                    Box::pin(async move {
                        let body = ctx.request().body().clone();
                        ctx.writer().write_header(StatusCode::OK);
                        ctx.writer().write(&body);
                    })
                })],
            )
            .unwrap();
        Arc::new(builder.build())
    }

    fn local_config() -> ServerConfig {
        ServerConfig::builder()
            .name("test")
            .http_addr("127.0.0.1:0")
            .connection_drain_timeout(Duration::from_secs(1))
            .build()
    }

    async fn roundtrip(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8(response).unwrap()
    }

    #[tokio::test]
    async fn test_bind_invalid_address() {
        let config = ServerConfig::builder().http_addr("not-a-valid-address").build();
        let err = HttpServer::bind(config, pipeline()).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_serves_requests() {
        let server = HttpServer::bind(local_config(), pipeline()).await.unwrap();
        let addr = server.local_addr();
        let handle = server.spawn();

        let response = roundtrip(
            addr,
            "GET /ping HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("pong"));

        let response = roundtrip(
            addr,
            "POST /echo HTTP/1.1\r\nhost: localhost\r\ncontent-length: 5\r\nconnection: close\r\n\r\nhello",
        )
        .await;
        assert!(response.ends_with("hello"));

        let response = roundtrip(
            addr,
            "GET /missing HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found"));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_accepting() {
        let server = HttpServer::bind(local_config(), pipeline()).await.unwrap();
        let addr = server.local_addr();
        let handle = server.spawn();
        assert_eq!(handle.name(), "test");
        assert!(!handle.is_stopped());

        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("listener should stop");
        assert!(handle.is_stopped());

        // Give the runtime a moment to release the socket
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_serve_returns_after_signal() {
        let server = HttpServer::bind(local_config(), pipeline()).await.unwrap();
        let signal = ShutdownSignal::new();
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(5), server.serve(signal))
            .await
            .expect("serve should return");
    }
}
