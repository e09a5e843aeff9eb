//! Broker error types.

use std::time::Duration;

use thiserror::Error;

use crate::mq::ExchangeKind;

/// Errors raised by the message broker and event log clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MqError {
    /// The exchange type is not one of direct, fanout, topic or headers.
    #[error("illegal exchange type: {0}")]
    InvalidExchangeType(String),

    /// A required name was empty.
    #[error("{0} name must not be empty")]
    EmptyName(&'static str),

    /// The exchange has not been declared.
    #[error("unknown exchange: {0}")]
    UnknownExchange(String),

    /// The exchange exists with another type.
    #[error("exchange '{name}' already declared as {existing}, not {requested}")]
    ExchangeKindMismatch {
        /// Exchange name.
        name: String,
        /// Type it was declared with.
        existing: ExchangeKind,
        /// Type of the rejected declaration.
        requested: ExchangeKind,
    },

    /// The client has been closed.
    #[error("connection closed")]
    Closed,

    /// The call did not finish in time.
    #[error("broker call timed out after {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            MqError::InvalidExchangeType("x-delayed".to_string()).to_string(),
            "illegal exchange type: x-delayed"
        );
        assert_eq!(MqError::EmptyName("queue").to_string(), "queue name must not be empty");
    }

    #[test]
    fn test_kind_mismatch_display() {
        let err = MqError::ExchangeKindMismatch {
            name: "logs".to_string(),
            existing: ExchangeKind::Fanout,
            requested: ExchangeKind::Topic,
        };
        assert_eq!(
            err.to_string(),
            "exchange 'logs' already declared as fanout, not topic"
        );
    }
}
