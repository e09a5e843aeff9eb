//! Error types for the listener and the shutdown sequence.

use std::io;
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

use thiserror::Error;

/// Errors raised while coordinating shutdown.
#[derive(Error, Debug)]
pub enum ShutdownError {
    /// A hook did not finish within its timeout.
    #[error("shutdown hook '{hook}' timed out after {timeout:?}")]
    HookTimeout {
        /// Hook name
        hook: String,
        /// Timeout the hook was given
        timeout: Duration,
    },

    /// A hook reported a failure of its own.
    #[error("shutdown hook '{hook}' failed: {message}")]
    HookFailed {
        /// Hook name
        hook: String,
        /// Failure description
        message: String,
    },

    /// One or more hooks failed; the others still ran.
    #[error("shutdown hooks failed: {0}")]
    HooksFailed(String),

    /// The whole shutdown sequence overran the hard deadline.
    #[error("shutdown did not complete within {deadline:?}")]
    DeadlineExceeded {
        /// The hard deadline
        deadline: Duration,
    },

    /// OS signal handlers could not be installed.
    #[error("failed to listen for shutdown signals: {0}")]
    Signal(#[source] io::Error),
}

impl ShutdownError {
    /// Creates a hook timeout error.
    pub fn hook_timeout(hook: impl Into<String>, timeout: Duration) -> Self {
        Self::HookTimeout {
            hook: hook.into(),
            timeout,
        }
    }

    /// Creates a hook failure error.
    pub fn hook_failed(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HookFailed {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Returns true for [`ShutdownError::HookTimeout`].
    #[must_use]
    pub fn is_hook_timeout(&self) -> bool {
        matches!(self, Self::HookTimeout { .. })
    }
}

/// Errors raised by the HTTP listener.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The configured listen address does not parse.
    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address
        addr: String,
        /// Parse failure
        #[source]
        source: AddrParseError,
    },

    /// Binding the listening socket failed.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address that could not be bound
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// I/O error during server operation.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
