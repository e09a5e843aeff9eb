//! Event log client interface and an in-memory log.

use std::collections::HashMap;

use parking_lot::Mutex;
use switchyard_core::BoxFuture;

use crate::dto::EventMessage;
use crate::error::MqError;

/// A Kafka-style append-only event log client.
pub trait EventPublisher: Send + Sync {
    /// Appends `msgs` to `topic`, in order.
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        msgs: Vec<EventMessage>,
    ) -> BoxFuture<'a, Result<(), MqError>>;

    /// Closes the client. Later publishes fail with [`MqError::Closed`].
    fn close(&self) -> BoxFuture<'_, Result<(), MqError>>;
}

/// A stored event with its offset in the topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Position in the topic, starting at 0.
    pub offset: u64,
    /// Partitioning key.
    pub key: String,
    /// Payload.
    pub value: String,
}

#[derive(Debug, Default)]
struct LogState {
    topics: HashMap<String, Vec<Record>>,
    closed: bool,
}

/// An event log that keeps every topic in memory.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    state: Mutex<LogState>,
}

impl InMemoryEventLog {
    /// Creates an empty, open log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record in `topic`.
    #[must_use]
    pub fn records(&self, topic: &str) -> Vec<Record> {
        self.state.lock().topics.get(topic).cloned().unwrap_or_default()
    }

    fn append(&self, topic: &str, msgs: Vec<EventMessage>) -> Result<(), MqError> {
        if topic.is_empty() {
            return Err(MqError::EmptyName("topic"));
        }

        let mut state = self.state.lock();
        if state.closed {
            return Err(MqError::Closed);
        }

        let count = msgs.len();
        let records = state.topics.entry(topic.to_string()).or_default();
        for msg in msgs {
            let offset = records.len() as u64;
            records.push(Record {
                offset,
                key: msg.key,
                value: msg.value,
            });
        }

        tracing::debug!(topic, count, "events appended");
        Ok(())
    }
}

impl EventPublisher for InMemoryEventLog {
    fn publish<'a>(
        &'a self,
        topic: &'a str,
        msgs: Vec<EventMessage>,
    ) -> BoxFuture<'a, Result<(), MqError>> {
        Box::pin(async move { self.append(topic, msgs) })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), MqError>> {
        Box::pin(async move {
            self.state.lock().closed = true;
            Ok(())
        })
    }
}
