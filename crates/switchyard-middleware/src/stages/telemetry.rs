//! Request instrumentation middleware.
//!
//! # Metrics Emitted
//!
//! - `switchyard_requests_total` - Counter by method and status
//! - `switchyard_request_duration_seconds` - Histogram of request latency
//! - `switchyard_in_flight_requests` - Gauge of requests inside the chain
//!
//! # Log Fields
//!
//! - `request_id` - Unique request identifier
//! - `method` / `path` - Request line
//! - `status` - Final response status
//! - `latency_us` - Time spent in the downstream chain, in microseconds

use std::time::Instant;

use http::header::HeaderValue;
use http::StatusCode;
use metrics::{counter, gauge, histogram};
use switchyard_core::{BoxFuture, Context, Handler};

use super::request_id::{RequestId, REQUEST_ID_HEADER};

/// Counter of finished requests.
pub const REQUESTS_TOTAL: &str = "switchyard_requests_total";

/// Histogram of request latency in seconds.
pub const REQUEST_DURATION_SECONDS: &str = "switchyard_request_duration_seconds";

/// Gauge of requests currently inside the handler chain.
pub const IN_FLIGHT_REQUESTS: &str = "switchyard_in_flight_requests";

/// Middleware that tags each request with a [`RequestId`] and records its
/// latency.
///
/// It should run right after the shutdown reject guard. Rejected requests
/// are therefore neither logged nor counted here.
#[derive(Debug, Clone, Default)]
pub struct Instrumentation {
    /// Whether to echo the request ID as a response header.
    expose_header: bool,
}

impl Instrumentation {
    /// Creates the middleware with the `x-request-id` response header on.
    #[must_use]
    pub fn new() -> Self {
        Self {
            expose_header: true,
        }
    }

    /// Sets whether the request ID is echoed in the response.
    #[must_use]
    pub fn expose_header(mut self, expose: bool) -> Self {
        self.expose_header = expose;
        self
    }
}

impl Handler for Instrumentation {
    fn name(&self) -> &'static str {
        "instrumentation"
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let request_id = RequestId::new();
            let method = ctx.method().to_string();
            let path = ctx.path().to_string();
            ctx.set_extension(request_id);

            tracing::info!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "request started"
            );
            gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
            let start = Instant::now();

            ctx.next().await;

            let elapsed = start.elapsed();
            gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);

            let status = ctx.response().status().unwrap_or(StatusCode::OK);
            let latency_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
            tracing::info!(
                request_id = %request_id,
                status = status.as_u16(),
                latency_us,
                "request finished"
            );

            counter!(
                REQUESTS_TOTAL,
                "method" => method.clone(),
                "status" => status.as_u16().to_string()
            )
            .increment(1);
            histogram!(REQUEST_DURATION_SECONDS, "method" => method).record(elapsed.as_secs_f64());

            if self.expose_header {
                if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                    ctx.writer().insert_header(REQUEST_ID_HEADER, value);
                }
            }
        })
    }
}
