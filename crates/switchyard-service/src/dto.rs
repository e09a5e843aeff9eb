//! Request and response bodies of the domain routes.

use serde::{Deserialize, Serialize};

/// Envelope of every successful JSON response.
///
/// ```json
/// {"code": 0, "msg": "success", "data": [...]}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiResponse<T> {
    /// Application status code, `0` on success.
    pub code: i32,
    /// Human-readable status.
    pub msg: String,
    /// Payload, omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl ApiResponse<()> {
    /// A success envelope without payload.
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: 0,
            msg: "success".to_string(),
            data: None,
        }
    }
}

impl<T> ApiResponse<T> {
    /// A success envelope carrying `data`.
    pub fn with_data(data: T) -> Self {
        Self {
            code: 0,
            msg: "success".to_string(),
            data: Some(data),
        }
    }
}

/// A user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u32,
}

/// Query string of `GET /user/list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Milliseconds to wait before answering.
    #[serde(default)]
    pub delay: Option<String>,
}

impl ListQuery {
    /// Returns the delay in milliseconds; unparsable values count as zero.
    #[must_use]
    pub fn delay_ms(&self) -> u64 {
        self.delay
            .as_deref()
            .and_then(|d| d.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Body of `POST /mq/exchange`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateExchangeRequest {
    /// Exchange name.
    pub exchange_name: String,
    /// One of `direct`, `fanout`, `topic` or `headers`.
    pub exchange_type: String,
}

/// Body of `POST /mq/queue/bind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueBindRequest {
    /// Queue to declare.
    pub queue_name: String,
    /// Binding key used by direct and topic exchanges.
    #[serde(default)]
    pub binding_key: String,
    /// Exchange to bind to; empty only declares the queue.
    #[serde(default)]
    pub exchange_name: String,
}

/// Body of `POST /mq/push`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushRequest {
    /// Target exchange; empty means the default exchange.
    #[serde(default)]
    pub exchange_name: String,
    /// Routing key.
    #[serde(default)]
    pub routing_key: String,
    /// Message payload.
    pub body: String,
}

/// One keyed event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventMessage {
    /// Partitioning key.
    #[serde(default)]
    pub key: String,
    /// Payload.
    pub value: String,
}

/// Body of `POST /kafka/publish`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishRequest {
    /// Target topic.
    pub topic: String,
    /// Messages, appended in order.
    #[serde(default)]
    pub msgs: Vec<EventMessage>,
}
