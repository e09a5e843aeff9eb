//! Shutdown signals.
//!
//! [`ShutdownSignal`] is a one-shot, cloneable trigger used to stop accept
//! loops and to let connections know they should wind down.
//!
//! # Example
//!
//! ```rust
//! use switchyard_server::ShutdownSignal;
//!
//! let shutdown = ShutdownSignal::new();
//! let observer = shutdown.clone();
//!
//! assert!(shutdown.trigger());
//! assert!(!shutdown.trigger());
//! assert!(observer.is_shutdown());
//! ```

use std::io;
use std::sync::Arc;

use tokio::sync::watch;

/// A signal that can be used to trigger and await shutdown.
///
/// All clones share one state. The state is held by a `watch` channel, so
/// a waiter that subscribes after the trigger still sees it.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates a new, untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Triggers the signal.
    ///
    /// Returns `true` only for the call that actually flipped it.
    pub fn trigger(&self) -> bool {
        self.sender.send_if_modified(|triggered| {
            if *triggered {
                false
            } else {
                *triggered = true;
                true
            }
        })
    }

    /// Returns `true` if the signal has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    /// Completes once the signal is triggered.
    ///
    /// Completes immediately if it already was.
    pub async fn recv(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }

    /// Creates a signal that triggers on SIGTERM or SIGINT.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();

        tokio::spawn(async move {
            match wait_for_os_signal().await {
                Ok(name) => {
                    tracing::info!(signal = name, "received shutdown signal");
                    trigger.trigger();
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to install signal handlers");
                }
            }
        });

        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for an OS shutdown signal and returns its name.
///
/// On Unix this is SIGTERM or SIGINT; elsewhere only Ctrl+C.
///
/// # Errors
///
/// Returns an error if the signal handlers cannot be registered.
pub async fn wait_for_os_signal() -> io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => Ok("SIGTERM"),
            _ = sigint.recv() => Ok("SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok("ctrl-c")
    }
}
