//! Graceful shutdown integration tests.
//!
//! These tests run a real listener on a loopback port and verify that:
//!
//! 1. In-flight requests finish before the drain completes
//! 2. Requests arriving after closing began are rejected with 503
//! 3. The shutdown hooks compose in listener → drain order

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::StatusCode;
use switchyard_core::handler_fn;
use switchyard_middleware::{Pipeline, Routable};
use switchyard_server::{
    GracefulShutdown, HttpServer, Listener, ServerConfig, ShutdownHooks, SHUTTING_DOWN_BODY,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Builds a pipeline guarded by `shutdown` with a slow and a fast route.
fn guarded_pipeline(shutdown: &Arc<GracefulShutdown>) -> Arc<Pipeline> {
    let mut builder = Pipeline::builder().middleware(shutdown.reject_guard());
    builder
        .get(
            "/slow",
            vec![handler_fn(|ctx| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    ctx.write_text(StatusCode::OK, "done");
                })
            })],
        )
        .unwrap();
    builder
        .get(
            "/fast",
            vec![handler_fn(|ctx| {
                Box::pin(async move { ctx.write_text(StatusCode::OK, "fast") })
            })],
        )
        .unwrap();
    Arc::new(builder.build())
}

async fn start(shutdown: &Arc<GracefulShutdown>) -> (SocketAddr, Arc<dyn Listener>) {
    let config = ServerConfig::builder()
        .name("it")
        .http_addr("127.0.0.1:0")
        .connection_drain_timeout(Duration::from_secs(2))
        .build();
    let server = HttpServer::bind(config, guarded_pipeline(shutdown))
        .await
        .unwrap();
    let addr = server.local_addr();
    (addr, Arc::new(server.spawn()))
}

async fn get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

async fn wait_for_in_flight(shutdown: &GracefulShutdown, expected: usize) {
    for _ in 0..200 {
        if shutdown.in_flight() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("in-flight count never reached {expected}");
}

#[tokio::test]
async fn test_in_flight_request_completes_during_shutdown() {
    let shutdown = Arc::new(GracefulShutdown::new());
    let (addr, listener) = start(&shutdown).await;

    let client = tokio::spawn(async move { get(addr, "/slow").await });
    wait_for_in_flight(&shutdown, 1).await;

    let stop = Arc::clone(&shutdown);
    let drain = Arc::clone(&shutdown);
    let listeners = vec![listener];
    let hooks = ShutdownHooks::new()
        .hook_timeout(Duration::from_secs(5))
        .on_shutdown("listeners", move |timeout| {
            let stop = Arc::clone(&stop);
            let listeners = listeners.clone();
            async move { stop.wait_listeners_shutdown(&listeners, timeout).await }
        })
        .on_shutdown("drain", move |timeout| {
            let drain = Arc::clone(&drain);
            async move { drain.reject_and_wait(timeout).await }
        });

    let started = Instant::now();
    hooks.run().await.unwrap();

    // The drain had to wait for the slow handler
    assert!(started.elapsed() >= Duration::from_millis(150));
    assert!(shutdown.is_drained());
    assert_eq!(shutdown.zero_notifications(), 1);

    let response = client.await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("done"));
}

#[tokio::test]
async fn test_requests_rejected_after_closing() {
    let shutdown = Arc::new(GracefulShutdown::new());
    let (addr, listener) = start(&shutdown).await;

    let response = get(addr, "/fast").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));

    shutdown.begin_closing();

    let response = get(addr, "/fast").await;
    assert!(response.starts_with("HTTP/1.1 503 Service Unavailable"));
    assert!(response.ends_with(SHUTTING_DOWN_BODY));
    assert_eq!(shutdown.in_flight(), 0);

    listener.shutdown().await;
}

#[tokio::test]
async fn test_unmatched_route_during_shutdown_is_still_not_found() {
    let shutdown = Arc::new(GracefulShutdown::new());
    let (addr, listener) = start(&shutdown).await;
    shutdown.begin_closing();

    // Routing misses never reach the guard
    let response = get(addr, "/missing").await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found"));

    listener.shutdown().await;
}
