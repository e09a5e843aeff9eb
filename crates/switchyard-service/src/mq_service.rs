//! Message queue routes.

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use switchyard_core::Context;
use switchyard_middleware::Routable;
use switchyard_router::RouteError;

use crate::dto::{ApiResponse, CreateExchangeRequest, PushRequest, QueueBindRequest};
use crate::mq::{ExchangeKind, MessageBroker};
use crate::{endpoint, with_timeout, BROKER_CALL_TIMEOUT};

/// Exposes a [`MessageBroker`] over HTTP.
#[derive(Clone)]
pub struct MqService {
    broker: Arc<dyn MessageBroker>,
}

impl MqService {
    /// Creates the service around `broker`.
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self { broker }
    }

    /// `POST /mq/exchange`
    pub async fn create_exchange(&self, ctx: &mut Context) {
        let Some(req) = read_body::<CreateExchangeRequest>(ctx) else {
            return;
        };

        let kind = match req.exchange_type.parse::<ExchangeKind>() {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting exchange declaration");
                ctx.writer().write_header(StatusCode::BAD_REQUEST);
                return;
            }
        };

        let result = with_timeout(
            BROKER_CALL_TIMEOUT,
            self.broker.create_exchange(&req.exchange_name, kind),
        )
        .await;
        respond(ctx, "create exchange", result);
    }

    /// `POST /mq/queue/bind`
    pub async fn bind_queue(&self, ctx: &mut Context) {
        let Some(req) = read_body::<QueueBindRequest>(ctx) else {
            return;
        };

        let result = with_timeout(
            BROKER_CALL_TIMEOUT,
            self.broker
                .declare_and_bind_queue(&req.queue_name, &req.binding_key, &req.exchange_name),
        )
        .await;
        respond(ctx, "bind queue", result);
    }

    /// `POST /mq/push`
    pub async fn push(&self, ctx: &mut Context) {
        let Some(req) = read_body::<PushRequest>(ctx) else {
            return;
        };

        let result = with_timeout(
            BROKER_CALL_TIMEOUT,
            self.broker
                .push(&req.exchange_name, &req.routing_key, Bytes::from(req.body)),
        )
        .await;
        respond(ctx, "push", result);
    }
}

/// Decodes the JSON body or answers 400.
pub(crate) fn read_body<T: serde::de::DeserializeOwned>(ctx: &mut Context) -> Option<T> {
    match ctx.read_json() {
        Ok(req) => Some(req),
        Err(e) => {
            tracing::warn!(path = %ctx.path(), error = %e, "invalid request body");
            ctx.writer().write_header(StatusCode::BAD_REQUEST);
            None
        }
    }
}

/// Answers the success envelope, or 500 on a broker failure.
pub(crate) fn respond(ctx: &mut Context, op: &'static str, result: Result<(), crate::MqError>) {
    match result {
        Ok(()) => ctx.write_json(StatusCode::OK, &ApiResponse::success()),
        Err(e) => {
            tracing::error!(op, error = %e, "broker call failed");
            ctx.writer().write_header(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

/// Registers `POST /mq/exchange`, `POST /mq/queue/bind` and `POST /mq/push`.
///
/// # Errors
///
/// Returns [`RouteError`] if a path is rejected.
pub fn register_mq_service(router: &mut dyn Routable, service: MqService) -> Result<(), RouteError> {
    let service = Arc::new(service);

    router.post(
        "/mq/exchange",
        vec![endpoint(&service, |svc, ctx| {
            Box::pin(async move { svc.create_exchange(ctx).await })
        })],
    )?;
    router.post(
        "/mq/queue/bind",
        vec![endpoint(&service, |svc, ctx| {
            Box::pin(async move { svc.bind_queue(ctx).await })
        })],
    )?;
    router.post(
        "/mq/push",
        vec![endpoint(&service, |svc, ctx| {
            Box::pin(async move { svc.push(ctx).await })
        })],
    )?;
    Ok(())
}
