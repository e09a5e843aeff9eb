//! Per-request response writer.
//!
//! The writer follows the usual status-then-body model: the first
//! [`write_header`](ResponseWriter::write_header) fixes the status, and a
//! body write without a prior status implies `200 OK`.

use bytes::BytesMut;
use http::header::{HeaderMap, HeaderValue, IntoHeaderName};
use http::StatusCode;
use http_body_util::Full;

use crate::types::Response;

/// Accumulates the status, headers and body of one response.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status written so far, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Sets a header, replacing any previous value.
    ///
    /// Headers set after the status was written are still sent, since the
    /// response is only flushed once the chain returns.
    pub fn insert_header<K: IntoHeaderName>(&mut self, name: K, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Returns the body written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns true once a status or body byte has been written.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.status.is_some()
    }

    /// Writes the response status.
    ///
    /// Only the first call takes effect.
    pub fn write_header(&mut self, status: StatusCode) {
        if let Some(existing) = self.status {
            tracing::warn!(
                existing = existing.as_u16(),
                ignored = status.as_u16(),
                "superfluous write_header call"
            );
            return;
        }
        self.status = Some(status);
    }

    /// Appends bytes to the body, writing `200 OK` first if no status is set.
    pub fn write(&mut self, data: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
    }

    /// Converts the writer into the response handed to the transport.
    ///
    /// A chain that wrote nothing yields an empty `200 OK`.
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut response = http::Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_status_wins() {
        let mut writer = ResponseWriter::new();
        writer.write_header(StatusCode::SERVICE_UNAVAILABLE);
        writer.write_header(StatusCode::OK);

        assert_eq!(writer.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[test]
    fn test_write_implies_ok() {
        let mut writer = ResponseWriter::new();
        writer.write(b"hello");

        assert_eq!(writer.status(), Some(StatusCode::OK));
        assert_eq!(writer.body(), b"hello");
    }

    #[test]
    fn test_body_appends() {
        let mut writer = ResponseWriter::new();
        writer.write_header(StatusCode::CREATED);
        writer.write(b"ab");
        writer.write(b"cd");

        assert_eq!(writer.body(), b"abcd");
        assert_eq!(writer.status(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_into_response() {
        let mut writer = ResponseWriter::new();
        writer.insert_header(http::header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        writer.write_header(StatusCode::NOT_FOUND);

        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
    }

    #[test]
    fn test_empty_writer_is_ok() {
        let response = ResponseWriter::new().into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
