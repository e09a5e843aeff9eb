//! Event log routes.

use std::sync::Arc;

use switchyard_core::Context;
use switchyard_middleware::Routable;
use switchyard_router::RouteError;

use crate::dto::PublishRequest;
use crate::events::EventPublisher;
use crate::mq_service::{read_body, respond};
use crate::{endpoint, with_timeout, BROKER_CALL_TIMEOUT};

/// Exposes an [`EventPublisher`] over HTTP.
#[derive(Clone)]
pub struct KafkaService {
    publisher: Arc<dyn EventPublisher>,
}

impl KafkaService {
    /// Creates the service around `publisher`.
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    /// `POST /kafka/publish`
    pub async fn publish(&self, ctx: &mut Context) {
        let Some(req) = read_body::<PublishRequest>(ctx) else {
            return;
        };

        let result = with_timeout(
            BROKER_CALL_TIMEOUT,
            self.publisher.publish(&req.topic, req.msgs),
        )
        .await;
        respond(ctx, "publish", result);
    }
}

/// Registers `POST /kafka/publish`.
///
/// # Errors
///
/// Returns [`RouteError`] if the path is rejected.
pub fn register_kafka_service(
    router: &mut dyn Routable,
    service: KafkaService,
) -> Result<(), RouteError> {
    let service = Arc::new(service);
    router.post(
        "/kafka/publish",
        vec![endpoint(&service, |svc, ctx| {
            Box::pin(async move { svc.publish(ctx).await })
        })],
    )?;
    Ok(())
}
