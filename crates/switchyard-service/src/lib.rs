//! # Switchyard Service
//!
//! Domain routes served through the Switchyard pipeline.
//!
//! | Route | Service |
//! |-------|---------|
//! | `GET /user/list`, `GET /user/*` | [`UserService::list`] |
//! | `POST /user/signup` | [`UserService::sign_up`] |
//! | `POST /mq/exchange` | [`MqService::create_exchange`] |
//! | `POST /mq/queue/bind` | [`MqService::bind_queue`] |
//! | `POST /mq/push` | [`MqService::push`] |
//! | `POST /kafka/publish` | [`KafkaService::publish`] |
//!
//! Broker calls run under [`BROKER_CALL_TIMEOUT`]; failures answer `500`
//! and malformed bodies answer `400`.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use switchyard_middleware::Pipeline;
//! use switchyard_service::{register_mq_service, register_user_service};
//! use switchyard_service::{InMemoryBroker, MqService, UserService};
//!
//! let mut builder = Pipeline::builder();
//! register_user_service(&mut builder, UserService::new()).unwrap();
//! register_mq_service(&mut builder, MqService::new(Arc::new(InMemoryBroker::new()))).unwrap();
//!
//! assert_eq!(builder.build().route_count(), 6);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dto;
mod error;
pub mod events;
mod kafka_service;
pub mod mq;
mod mq_service;
mod user;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use switchyard_core::{handler_fn, BoxFuture, BoxedHandler, Context};

pub use error::MqError;
pub use events::{EventPublisher, InMemoryEventLog};
pub use kafka_service::{register_kafka_service, KafkaService};
pub use mq::{graceful_close, ExchangeKind, InMemoryBroker, MessageBroker};
pub use mq_service::{register_mq_service, MqService};
pub use user::{register_user_service, UserService};

/// Deadline for a single broker or event log call.
pub const BROKER_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Wraps a service method into a route handler.
fn endpoint<S, F>(service: &Arc<S>, call: F) -> BoxedHandler
where
    S: Send + Sync + 'static,
    F: for<'a> Fn(Arc<S>, &'a mut Context) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    let service = Arc::clone(service);
    handler_fn(move |ctx| call(Arc::clone(&service), ctx))
}

/// Runs a broker call, mapping an overrun to [`MqError::Timeout`].
async fn with_timeout<F>(timeout: Duration, call: F) -> Result<(), MqError>
where
    F: Future<Output = Result<(), MqError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(MqError::Timeout(timeout)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_overrun() {
        let result = with_timeout(Duration::from_secs(5), std::future::pending()).await;
        assert_eq!(result, Err(MqError::Timeout(Duration::from_secs(5))));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let result = with_timeout(Duration::from_secs(5), async { Err(MqError::Closed) }).await;
        assert_eq!(result, Err(MqError::Closed));
    }
}
