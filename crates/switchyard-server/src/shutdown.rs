//! Graceful shutdown coordination.
//!
//! [`GracefulShutdown`] tracks requests that are inside the handler chain
//! and lets the shutdown sequence wait until they are all done.
//!
//! # States
//!
//! ```text
//! RUNNING ──begin_closing──▶ DRAINING ──last request leaves──▶ DRAINED
//!    │                                                            ▲
//!    └──────────── begin_closing with nothing in flight ──────────┘
//! ```
//!
//! The closing flag and the in-flight count sit under one lock, so entering
//! a request, leaving it and starting to close are each a single atomic
//! step. Whichever step observes `closing && in_flight == 0` first flips the
//! drained flag. The flag lives in a `watch` channel: it holds state rather
//! than queueing messages, so the notification can be neither lost nor
//! delivered twice, and the sender never blocks.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use switchyard_server::GracefulShutdown;
//!
//! # tokio_test::block_on(async {
//! let shutdown = Arc::new(GracefulShutdown::new());
//!
//! let token = shutdown.try_enter().expect("accepting requests");
//! assert_eq!(shutdown.in_flight(), 1);
//! drop(token);
//!
//! shutdown.reject_and_wait(Duration::from_secs(5)).await.unwrap();
//! assert!(shutdown.try_enter().is_none());
//! # });
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use http::StatusCode;
use parking_lot::Mutex;
use switchyard_core::{BoxFuture, Context, Handler};
use tokio::sync::watch;

use crate::error::ShutdownError;

/// Body of the response sent to requests rejected during shutdown.
pub const SHUTTING_DOWN_BODY: &str = "server is shutting down";

/// Name used for the drain hook in errors and logs.
pub const DRAIN_HOOK: &str = "drain";

/// Name used for the listener hook in errors and logs.
pub const LISTENERS_HOOK: &str = "listeners";

#[derive(Debug, Default)]
struct DrainState {
    in_flight: usize,
    closing: bool,
}

/// Process-wide shutdown coordinator.
///
/// Create one per process, wrap it in an `Arc`, and share it between the
/// reject guard and the shutdown hooks.
#[derive(Debug)]
pub struct GracefulShutdown {
    state: Mutex<DrainState>,
    drained: watch::Sender<bool>,
    zero_notifications: AtomicUsize,
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl GracefulShutdown {
    /// Creates a coordinator in the running state.
    #[must_use]
    pub fn new() -> Self {
        let (drained, _) = watch::channel(false);
        Self {
            state: Mutex::new(DrainState::default()),
            drained,
            zero_notifications: AtomicUsize::new(0),
        }
    }

    /// Registers a request as in flight.
    ///
    /// Returns `None` once closing has begun. The returned token releases
    /// the slot when dropped, including when the handler panics.
    #[must_use]
    pub fn try_enter(self: &Arc<Self>) -> Option<InFlightToken> {
        let mut state = self.state.lock();
        if state.closing {
            return None;
        }
        state.in_flight += 1;
        Some(InFlightToken {
            shutdown: Arc::clone(self),
        })
    }

    fn leave(&self) {
        let drained = {
            let mut state = self.state.lock();
            state.in_flight -= 1;
            state.closing && state.in_flight == 0
        };
        if drained {
            self.notify_drained();
        }
    }

    fn notify_drained(&self) {
        let flipped = self.drained.send_if_modified(|drained| {
            if *drained {
                false
            } else {
                *drained = true;
                true
            }
        });
        if flipped {
            self.zero_notifications.fetch_add(1, Ordering::SeqCst);
            tracing::info!("all in-flight requests drained");
        }
    }

    /// Stops admitting requests.
    ///
    /// Returns `true` for the call that actually started closing. If
    /// nothing is in flight at that moment the coordinator is drained
    /// immediately.
    pub fn begin_closing(&self) -> bool {
        let (first, drained, in_flight) = {
            let mut state = self.state.lock();
            let first = !state.closing;
            state.closing = true;
            (first, state.in_flight == 0, state.in_flight)
        };
        if first {
            tracing::info!(in_flight, "rejecting new requests");
        }
        if drained {
            self.notify_drained();
        }
        first
    }

    /// Starts closing and waits until every in-flight request has left.
    ///
    /// Returns as soon as the count reaches zero, or right away when it
    /// already is.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::HookTimeout`] when requests are still in
    /// flight after `timeout`. They are not cancelled.
    pub async fn reject_and_wait(&self, timeout: Duration) -> Result<(), ShutdownError> {
        self.begin_closing();

        let mut drained = self.drained.subscribe();
        // The sender lives in `self`, so `wait_for` can only end on the flag.
        let wait = async move {
            let _ = drained.wait_for(|drained| *drained).await;
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(()) => Ok(()),
            Err(_) => {
                tracing::warn!(
                    in_flight = self.in_flight(),
                    ?timeout,
                    "in-flight requests did not drain in time"
                );
                Err(ShutdownError::hook_timeout(DRAIN_HOOK, timeout))
            }
        }
    }

    /// Stops every listener and waits for all of them to finish.
    ///
    /// The listeners are shut down concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::HookTimeout`] if they do not all finish
    /// within `timeout`.
    pub async fn wait_listeners_shutdown(
        &self,
        listeners: &[Arc<dyn Listener>],
        timeout: Duration,
    ) -> Result<(), ShutdownError> {
        let names: Vec<&str> = listeners.iter().map(|l| l.name()).collect();
        tracing::info!(listeners = ?names, "stopping listeners");

        let all = join_all(listeners.iter().map(|l| l.shutdown()));
        match tokio::time::timeout(timeout, all).await {
            Ok(_) => {
                tracing::info!("all listeners stopped");
                Ok(())
            }
            Err(_) => Err(ShutdownError::hook_timeout(LISTENERS_HOOK, timeout)),
        }
    }

    /// Returns the number of requests inside the chain.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    /// Returns true once closing has begun.
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.state.lock().closing
    }

    /// Returns true once closing has begun and nothing is in flight.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        *self.drained.borrow()
    }

    /// Returns how many times the drained notification fired (0 or 1).
    #[must_use]
    pub fn zero_notifications(&self) -> usize {
        self.zero_notifications.load(Ordering::SeqCst)
    }

    /// Returns the reject guard middleware for this coordinator.
    #[must_use]
    pub fn reject_guard(self: &Arc<Self>) -> RejectRequests {
        RejectRequests {
            shutdown: Arc::clone(self),
        }
    }
}

/// Marks one request as in flight until dropped.
#[derive(Debug)]
pub struct InFlightToken {
    shutdown: Arc<GracefulShutdown>,
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.shutdown.leave();
    }
}

/// Middleware that counts requests and rejects new ones during shutdown.
///
/// Register it as the first global middleware. A rejected request gets
/// `503` with [`SHUTTING_DOWN_BODY`], its chain is aborted and it is not
/// counted.
#[derive(Debug, Clone)]
pub struct RejectRequests {
    shutdown: Arc<GracefulShutdown>,
}

impl RejectRequests {
    /// Creates a guard for `shutdown`.
    #[must_use]
    pub fn new(shutdown: Arc<GracefulShutdown>) -> Self {
        Self { shutdown }
    }
}

impl Handler for RejectRequests {
    fn name(&self) -> &'static str {
        "reject_requests"
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let Some(token) = self.shutdown.try_enter() else {
                tracing::debug!(path = ctx.path(), "rejecting request during shutdown");
                ctx.write_text(StatusCode::SERVICE_UNAVAILABLE, SHUTTING_DOWN_BODY);
                ctx.abort();
                return;
            };

            ctx.next().await;
            drop(token);
        })
    }
}

/// A transport listener that can be asked to stop.
pub trait Listener: Send + Sync {
    /// Returns the listener's name for logs.
    fn name(&self) -> &str;

    /// Stops accepting connections; completes once the accept loop exited.
    fn shutdown(&self) -> BoxFuture<'_, ()>;
}
