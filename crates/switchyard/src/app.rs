//! Application wiring.
//!
//! [`App::start`] turns a loaded [`SwitchyardConfig`] into running
//! listeners and the shutdown hooks that stop them:
//!
//! 1. `listeners` - stop accepting on every listener
//! 2. `drain` - reject new requests with `503` and wait for in-flight ones
//! 3. `broker` - close the message broker
//! 4. `events` - close the event log

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use switchyard_config::{LogFormat, SwitchyardConfig};
use switchyard_middleware::{Instrumentation, Pipeline};
use switchyard_router::RouteError;
use switchyard_server::{
    GracefulShutdown, HttpServer, Listener, ServerConfig, ShutdownError, ShutdownHooks,
    DRAIN_HOOK, LISTENERS_HOOK,
};
use switchyard_service::mq::BROKER_HOOK;
use switchyard_service::{
    graceful_close, register_kafka_service, register_mq_service, register_user_service,
    EventPublisher, InMemoryBroker, InMemoryEventLog, KafkaService, MessageBroker, MqService,
    UserService,
};
use switchyard_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};

/// Name of the event log shutdown hook.
pub const EVENTS_HOOK: &str = "events";

/// Client section that must be present for the message broker.
pub const BROKER_CLIENT: &str = "rabbitmq";

/// Client section of the event log.
pub const EVENTS_CLIENT: &str = "kafka";

/// A running application.
pub struct App {
    shutdown: Arc<GracefulShutdown>,
    local_addrs: Vec<SocketAddr>,
    broker: Arc<InMemoryBroker>,
    events: Arc<InMemoryEventLog>,
    hooks: ShutdownHooks,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("local_addrs", &self.local_addrs)
            .field("hooks", &self.hooks.hook_names())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Builds the pipeline, binds every configured listener and prepares
    /// the shutdown hooks.
    ///
    /// # Errors
    ///
    /// Fails if the broker client is not configured, a route is rejected
    /// or a listener cannot bind.
    pub async fn start(config: &SwitchyardConfig) -> anyhow::Result<Self> {
        let broker_client = config
            .client(BROKER_CLIENT)
            .context("message broker client is not configured")?;
        tracing::info!(addr = %broker_client.addr, kind = %broker_client.kind, "message broker ready");

        match config.client(EVENTS_CLIENT) {
            Ok(client) => tracing::info!(addr = %client.addr, "event log ready"),
            Err(_) => tracing::info!("no event log client configured, using in-process log"),
        }

        let shutdown = Arc::new(GracefulShutdown::new());
        let broker = Arc::new(InMemoryBroker::new());
        let events = Arc::new(InMemoryEventLog::new());

        let pipeline = Arc::new(
            build_pipeline(&shutdown, broker.clone(), events.clone())
                .context("failed to register routes")?,
        );

        let drain_timeout = config.shutdown.hook_timeout();
        let mut listeners: Vec<Arc<dyn Listener>> = Vec::with_capacity(config.server.len());
        let mut local_addrs = Vec::with_capacity(config.server.len());

        for listener in &config.server {
            let server_config = ServerConfig::builder()
                .name(listener.name.clone())
                .http_addr(listener.listen.clone())
                .connection_drain_timeout(drain_timeout)
                .build();
            let server = HttpServer::bind(server_config, Arc::clone(&pipeline))
                .await
                .with_context(|| format!("failed to start listener '{}'", listener.name))?;

            local_addrs.push(server.local_addr());
            listeners.push(Arc::new(server.spawn()));
        }

        let hooks = shutdown_hooks(config, &shutdown, listeners, &broker, &events);

        Ok(Self {
            shutdown,
            local_addrs,
            broker,
            events,
            hooks,
        })
    }

    /// Returns the bound address of every listener, in config order.
    #[must_use]
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    /// Returns the shutdown hooks.
    #[must_use]
    pub fn hooks(&self) -> &ShutdownHooks {
        &self.hooks
    }

    /// Returns the drain coordinator.
    #[must_use]
    pub fn shutdown(&self) -> &Arc<GracefulShutdown> {
        &self.shutdown
    }

    /// Returns the message broker.
    #[must_use]
    pub fn broker(&self) -> &Arc<InMemoryBroker> {
        &self.broker
    }

    /// Returns the event log.
    #[must_use]
    pub fn events(&self) -> &Arc<InMemoryEventLog> {
        &self.events
    }
}

/// Builds the request pipeline.
///
/// The reject guard runs first so that rejected requests are never
/// instrumented.
///
/// # Errors
///
/// Returns [`RouteError`] if a service registers a malformed path.
pub fn build_pipeline(
    shutdown: &Arc<GracefulShutdown>,
    broker: Arc<dyn MessageBroker>,
    events: Arc<dyn EventPublisher>,
) -> Result<Pipeline, RouteError> {
    let mut builder = Pipeline::builder()
        .middleware(shutdown.reject_guard())
        .middleware(Instrumentation::new());

    register_user_service(&mut builder, UserService::new())?;
    register_mq_service(&mut builder, MqService::new(broker))?;
    register_kafka_service(&mut builder, KafkaService::new(events))?;

    Ok(builder.build())
}

fn shutdown_hooks(
    config: &SwitchyardConfig,
    shutdown: &Arc<GracefulShutdown>,
    listeners: Vec<Arc<dyn Listener>>,
    broker: &Arc<InMemoryBroker>,
    events: &Arc<InMemoryEventLog>,
) -> ShutdownHooks {
    let listeners = Arc::new(listeners);
    let stop = Arc::clone(shutdown);
    let drain = Arc::clone(shutdown);
    let broker = Arc::clone(broker);
    let events = Arc::clone(events);

    ShutdownHooks::new()
        .hook_timeout(config.shutdown.hook_timeout())
        .hard_deadline(config.shutdown.hard_deadline())
        .on_shutdown(LISTENERS_HOOK, move |timeout| {
            let stop = Arc::clone(&stop);
            let listeners = Arc::clone(&listeners);
            async move { stop.wait_listeners_shutdown(&listeners, timeout).await }
        })
        .on_shutdown(DRAIN_HOOK, move |timeout| {
            let drain = Arc::clone(&drain);
            async move { drain.reject_and_wait(timeout).await }
        })
        .on_shutdown(BROKER_HOOK, move |timeout| {
            let broker = Arc::clone(&broker);
            async move { graceful_close(&*broker, timeout).await }
        })
        .on_shutdown(EVENTS_HOOK, move |timeout| {
            let events = Arc::clone(&events);
            async move {
                match tokio::time::timeout(timeout, events.close()).await {
                    Ok(result) => {
                        result.map_err(|e| ShutdownError::hook_failed(EVENTS_HOOK, e.to_string()))
                    }
                    Err(_) => Err(ShutdownError::hook_timeout(EVENTS_HOOK, timeout)),
                }
            }
        })
}

/// Maps the `log` and `metrics` sections onto the telemetry setup.
#[must_use]
pub fn telemetry_config(config: &SwitchyardConfig) -> TelemetryConfig {
    let logging = LogConfig {
        level: config.log.level.clone(),
        json_format: config.log.format == LogFormat::Json,
        file: config.log.file_path().map(PathBuf::from),
        ..LogConfig::default()
    };

    let metrics = MetricsConfig {
        enabled: config.metrics.enabled,
        addr: config.metrics.addr.clone(),
        ..MetricsConfig::default()
    };

    TelemetryConfig::default()
        .with_logging(logging)
        .with_metrics(metrics)
}
