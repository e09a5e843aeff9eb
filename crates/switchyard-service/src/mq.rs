//! Message broker client interface and an in-memory broker.
//!
//! [`MessageBroker`] is the narrow surface the HTTP services need from an
//! AMQP-style broker: declare exchanges, declare and bind queues, publish
//! and close. [`InMemoryBroker`] implements the routing rules in process.
//!
//! # Routing
//!
//! | Exchange | Delivered to |
//! |----------|--------------|
//! | `direct` | queues whose binding key equals the routing key |
//! | `fanout` | every bound queue |
//! | `topic` | queues whose pattern matches (`*` one word, `#` zero or more) |
//! | `headers` | every bound queue |
//!
//! The default exchange (empty name) delivers straight to the queue named by
//! the routing key. Unroutable messages are dropped.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use switchyard_core::BoxFuture;
use switchyard_server::ShutdownError;

use crate::error::MqError;

/// Name of the broker shutdown hook.
pub const BROKER_HOOK: &str = "broker";

/// Exchange type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeKind {
    /// Exact binding key match.
    Direct,
    /// Broadcast to every bound queue.
    Fanout,
    /// Dotted-word pattern match.
    Topic,
    /// Header match; every bound queue here.
    Headers,
}

impl ExchangeKind {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Fanout => "fanout",
            Self::Topic => "topic",
            Self::Headers => "headers",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeKind {
    type Err = MqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "fanout" => Ok(Self::Fanout),
            "topic" => Ok(Self::Topic),
            "headers" => Ok(Self::Headers),
            other => Err(MqError::InvalidExchangeType(other.to_string())),
        }
    }
}

/// An AMQP-style message broker client.
pub trait MessageBroker: Send + Sync {
    /// Declares an exchange. Redeclaring with the same type is a no-op.
    fn create_exchange<'a>(
        &'a self,
        name: &'a str,
        kind: ExchangeKind,
    ) -> BoxFuture<'a, Result<(), MqError>>;

    /// Declares `queue` and, when `exchange` is not empty, binds it with
    /// `binding_key`.
    fn declare_and_bind_queue<'a>(
        &'a self,
        queue: &'a str,
        binding_key: &'a str,
        exchange: &'a str,
    ) -> BoxFuture<'a, Result<(), MqError>>;

    /// Publishes `body` to `exchange` with `routing_key`.
    fn push<'a>(
        &'a self,
        exchange: &'a str,
        routing_key: &'a str,
        body: Bytes,
    ) -> BoxFuture<'a, Result<(), MqError>>;

    /// Closes the connection. Later calls fail with [`MqError::Closed`].
    fn close(&self) -> BoxFuture<'_, Result<(), MqError>>;
}

/// Closes `broker` within `timeout`, as a shutdown hook.
///
/// # Errors
///
/// Returns [`ShutdownError::HookTimeout`] when close overruns and
/// [`ShutdownError::HookFailed`] when it fails.
pub async fn graceful_close(
    broker: &dyn MessageBroker,
    timeout: Duration,
) -> Result<(), ShutdownError> {
    match tokio::time::timeout(timeout, broker.close()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ShutdownError::hook_failed(BROKER_HOOK, e.to_string())),
        Err(_) => Err(ShutdownError::hook_timeout(BROKER_HOOK, timeout)),
    }
}

#[derive(Debug)]
struct Exchange {
    kind: ExchangeKind,
    /// `(queue, binding key)` in bind order
    bindings: Vec<(String, String)>,
}

impl Exchange {
    fn route(&self, routing_key: &str) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for (queue, binding_key) in &self.bindings {
            let hit = match self.kind {
                ExchangeKind::Direct => binding_key == routing_key,
                ExchangeKind::Fanout | ExchangeKind::Headers => true,
                ExchangeKind::Topic => topic_matches(binding_key, routing_key),
            };
            if hit && !targets.contains(&queue.as_str()) {
                targets.push(queue.as_str());
            }
        }
        targets
    }
}

#[derive(Debug, Default)]
struct BrokerState {
    exchanges: HashMap<String, Exchange>,
    queues: HashMap<String, VecDeque<Bytes>>,
    closed: bool,
}

impl BrokerState {
    fn ensure_open(&self) -> Result<(), MqError> {
        if self.closed {
            Err(MqError::Closed)
        } else {
            Ok(())
        }
    }
}

/// A broker that routes messages into in-process queues.
///
/// # Example
///
/// ```
/// use switchyard_service::{ExchangeKind, InMemoryBroker, MessageBroker};
///
/// # tokio_test::block_on(async {
/// let broker = InMemoryBroker::new();
/// broker.create_exchange("logs", ExchangeKind::Topic).await.unwrap();
/// broker.declare_and_bind_queue("errors", "*.error", "logs").await.unwrap();
///
/// broker.push("logs", "db.error", "disk full".into()).await.unwrap();
/// broker.push("logs", "db.info", "ok".into()).await.unwrap();
///
/// assert_eq!(broker.queue_len("errors"), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBroker {
    state: Mutex<BrokerState>,
}

impl InMemoryBroker {
    /// Creates an empty, open broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of messages waiting in `queue`.
    #[must_use]
    pub fn queue_len(&self, queue: &str) -> usize {
        self.state.lock().queues.get(queue).map_or(0, VecDeque::len)
    }

    /// Removes and returns the oldest message of `queue`.
    pub fn pop(&self, queue: &str) -> Option<Bytes> {
        self.state.lock().queues.get_mut(queue)?.pop_front()
    }

    /// Returns true once [`MessageBroker::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn do_create_exchange(&self, name: &str, kind: ExchangeKind) -> Result<(), MqError> {
        if name.is_empty() {
            return Err(MqError::EmptyName("exchange"));
        }

        let mut state = self.state.lock();
        state.ensure_open()?;

        if let Some(existing) = state.exchanges.get(name) {
            if existing.kind != kind {
                return Err(MqError::ExchangeKindMismatch {
                    name: name.to_string(),
                    existing: existing.kind,
                    requested: kind,
                });
            }
            return Ok(());
        }

        state.exchanges.insert(
            name.to_string(),
            Exchange {
                kind,
                bindings: Vec::new(),
            },
        );
        tracing::debug!(exchange = name, kind = %kind, "exchange declared");
        Ok(())
    }

    fn do_declare_and_bind(
        &self,
        queue: &str,
        binding_key: &str,
        exchange: &str,
    ) -> Result<(), MqError> {
        if queue.is_empty() {
            return Err(MqError::EmptyName("queue"));
        }

        let mut state = self.state.lock();
        state.ensure_open()?;

        if !exchange.is_empty() {
            let target = state
                .exchanges
                .get_mut(exchange)
                .ok_or_else(|| MqError::UnknownExchange(exchange.to_string()))?;
            let binding = (queue.to_string(), binding_key.to_string());
            if !target.bindings.contains(&binding) {
                target.bindings.push(binding);
            }
        }

        state.queues.entry(queue.to_string()).or_default();
        tracing::debug!(queue, binding_key, exchange, "queue declared");
        Ok(())
    }

    fn do_push(&self, exchange: &str, routing_key: &str, body: Bytes) -> Result<(), MqError> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        let targets: Vec<String> = if exchange.is_empty() {
            vec![routing_key.to_string()]
        } else {
            state
                .exchanges
                .get(exchange)
                .ok_or_else(|| MqError::UnknownExchange(exchange.to_string()))?
                .route(routing_key)
                .into_iter()
                .map(str::to_string)
                .collect()
        };

        let mut delivered = 0;
        for target in targets {
            if let Some(queue) = state.queues.get_mut(&target) {
                queue.push_back(body.clone());
                delivered += 1;
            }
        }

        if delivered == 0 {
            tracing::debug!(exchange, routing_key, "message unroutable, dropped");
        }
        Ok(())
    }
}

impl MessageBroker for InMemoryBroker {
    fn create_exchange<'a>(
        &'a self,
        name: &'a str,
        kind: ExchangeKind,
    ) -> BoxFuture<'a, Result<(), MqError>> {
        Box::pin(async move { self.do_create_exchange(name, kind) })
    }

    fn declare_and_bind_queue<'a>(
        &'a self,
        queue: &'a str,
        binding_key: &'a str,
        exchange: &'a str,
    ) -> BoxFuture<'a, Result<(), MqError>> {
        Box::pin(async move { self.do_declare_and_bind(queue, binding_key, exchange) })
    }

    fn push<'a>(
        &'a self,
        exchange: &'a str,
        routing_key: &'a str,
        body: Bytes,
    ) -> BoxFuture<'a, Result<(), MqError>> {
        Box::pin(async move { self.do_push(exchange, routing_key, body) })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), MqError>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            if !state.closed {
                state.closed = true;
                tracing::info!("message broker closed");
            }
            Ok(())
        })
    }
}

/// Matches a dotted routing key against a topic pattern.
///
/// `*` matches exactly one word and `#` matches zero or more words.
#[must_use]
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = routing_key.split('.').collect();
    match_words(&pattern, &key)
}

fn match_words(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&"#", rest)) => (0..=key.len()).any(|skip| match_words(rest, &key[skip..])),
        Some((&word, rest)) => match key.split_first() {
            Some((&first, key_rest)) => (word == "*" || word == first) && match_words(rest, key_rest),
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_kind_parse() {
        assert_eq!("direct".parse::<ExchangeKind>().unwrap(), ExchangeKind::Direct);
        assert_eq!("headers".parse::<ExchangeKind>().unwrap(), ExchangeKind::Headers);
        assert_eq!(
            "Direct".parse::<ExchangeKind>().unwrap_err(),
            MqError::InvalidExchangeType("Direct".to_string())
        );
    }

    #[test]
    fn test_topic_matches() {
        assert!(topic_matches("a.b", "a.b"));
        assert!(topic_matches("*.error", "db.error"));
        assert!(!topic_matches("*.error", "db.pool.error"));
        assert!(topic_matches("#.error", "db.pool.error"));
        assert!(topic_matches("#", "anything.at.all"));
        assert!(topic_matches("db.#", "db"));
        assert!(topic_matches("a.#.z", "a.z"));
        assert!(topic_matches("a.#.z", "a.b.c.z"));
        assert!(!topic_matches("a.*.z", "a.z"));
        assert!(!topic_matches("a.b", "a.b.c"));
    }

    #[tokio::test]
    async fn test_direct_routing() {
        let broker = InMemoryBroker::new();
        broker.create_exchange("orders", ExchangeKind::Direct).await.unwrap();
        broker.declare_and_bind_queue("paid", "paid", "orders").await.unwrap();
        broker.declare_and_bind_queue("refunded", "refunded", "orders").await.unwrap();

        broker.push("orders", "paid", Bytes::from_static(b"#1")).await.unwrap();

        assert_eq!(broker.queue_len("paid"), 1);
        assert_eq!(broker.queue_len("refunded"), 0);
        assert_eq!(broker.pop("paid"), Some(Bytes::from_static(b"#1")));
    }

    #[tokio::test]
    async fn test_fanout_and_headers_reach_all_bound_queues() {
        let broker = InMemoryBroker::new();
        for (name, kind) in [("fan", ExchangeKind::Fanout), ("hdr", ExchangeKind::Headers)] {
            broker.create_exchange(name, kind).await.unwrap();
            broker.declare_and_bind_queue(&format!("{name}-a"), "x", name).await.unwrap();
            broker.declare_and_bind_queue(&format!("{name}-b"), "y", name).await.unwrap();
            broker.push(name, "z", Bytes::from_static(b"m")).await.unwrap();

            assert_eq!(broker.queue_len(&format!("{name}-a")), 1);
            assert_eq!(broker.queue_len(&format!("{name}-b")), 1);
        }
    }

    #[tokio::test]
    async fn test_queue_bound_twice_gets_one_copy() {
        let broker = InMemoryBroker::new();
        broker.create_exchange("logs", ExchangeKind::Topic).await.unwrap();
        broker.declare_and_bind_queue("all", "#", "logs").await.unwrap();
        broker.declare_and_bind_queue("all", "db.*", "logs").await.unwrap();

        broker.push("logs", "db.error", Bytes::from_static(b"m")).await.unwrap();
        assert_eq!(broker.queue_len("all"), 1);
    }

    #[tokio::test]
    async fn test_default_exchange_routes_by_queue_name() {
        let broker = InMemoryBroker::new();
        broker.declare_and_bind_queue("jobs", "", "").await.unwrap();

        broker.push("", "jobs", Bytes::from_static(b"j")).await.unwrap();
        broker.push("", "missing", Bytes::from_static(b"j")).await.unwrap();

        assert_eq!(broker.queue_len("jobs"), 1);
    }

    #[tokio::test]
    async fn test_unknown_exchange() {
        let broker = InMemoryBroker::new();

        let err = broker.push("nope", "k", Bytes::new()).await.unwrap_err();
        assert_eq!(err, MqError::UnknownExchange("nope".to_string()));

        let err = broker.declare_and_bind_queue("q", "k", "nope").await.unwrap_err();
        assert_eq!(err, MqError::UnknownExchange("nope".to_string()));
    }

    #[tokio::test]
    async fn test_redeclare_exchange() {
        let broker = InMemoryBroker::new();
        broker.create_exchange("logs", ExchangeKind::Fanout).await.unwrap();
        broker.create_exchange("logs", ExchangeKind::Fanout).await.unwrap();

        let err = broker.create_exchange("logs", ExchangeKind::Topic).await.unwrap_err();
        assert!(matches!(err, MqError::ExchangeKindMismatch { .. }));
    }

    #[tokio::test]
    async fn test_empty_names_rejected() {
        let broker = InMemoryBroker::new();
        assert_eq!(
            broker.create_exchange("", ExchangeKind::Direct).await,
            Err(MqError::EmptyName("exchange"))
        );
        assert_eq!(
            broker.declare_and_bind_queue("", "k", "").await,
            Err(MqError::EmptyName("queue"))
        );
    }

    #[tokio::test]
    async fn test_push_after_close_fails() {
        let broker = InMemoryBroker::new();
        broker.declare_and_bind_queue("jobs", "", "").await.unwrap();
        broker.close().await.unwrap();
        broker.close().await.unwrap();

        assert!(broker.is_closed());
        assert_eq!(
            broker.push("", "jobs", Bytes::new()).await,
            Err(MqError::Closed)
        );
    }

    #[tokio::test]
    async fn test_graceful_close() {
        let broker = InMemoryBroker::new();
        graceful_close(&broker, Duration::from_secs(1)).await.unwrap();
        assert!(broker.is_closed());
    }

    struct StuckBroker;

    impl MessageBroker for StuckBroker {
        fn create_exchange<'a>(
            &'a self,
            _name: &'a str,
            _kind: ExchangeKind,
        ) -> BoxFuture<'a, Result<(), MqError>> {
            Box::pin(async { Ok(()) })
        }

        fn declare_and_bind_queue<'a>(
            &'a self,
            _queue: &'a str,
            _binding_key: &'a str,
            _exchange: &'a str,
        ) -> BoxFuture<'a, Result<(), MqError>> {
            Box::pin(async { Ok(()) })
        }

        fn push<'a>(
            &'a self,
            _exchange: &'a str,
            _routing_key: &'a str,
            _body: Bytes,
        ) -> BoxFuture<'a, Result<(), MqError>> {
            Box::pin(async { Ok(()) })
        }

        fn close(&self) -> BoxFuture<'_, Result<(), MqError>> {
            Box::pin(std::future::pending())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_graceful_close_timeout() {
        let err = graceful_close(&StuckBroker, Duration::from_secs(10))
            .await
            .unwrap_err();

        assert!(err.is_hook_timeout());
        assert!(err.to_string().contains(BROKER_HOOK));
    }
}
