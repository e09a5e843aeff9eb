//! Built-in middleware stages.
//!
//! - [`request_id`] - Per-request identifier (UUID v7)
//! - [`telemetry`] - Request logging, latency and metrics
//!
//! The shutdown reject guard lives in `switchyard-server`, next to the
//! coordinator whose state it reads.

pub mod request_id;
pub mod telemetry;

// Re-export main types
pub use request_id::{RequestId, REQUEST_ID_HEADER};
pub use telemetry::Instrumentation;
