//! Common HTTP types used by handlers and the transport.

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type seen by handlers.
///
/// The transport collects the body before dispatch, so handlers read it
/// synchronously.
pub type Request = http::Request<Bytes>;

/// The HTTP response type handed back to the transport.
pub type Response = http::Response<Full<Bytes>>;
