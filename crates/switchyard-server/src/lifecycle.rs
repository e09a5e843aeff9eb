//! Shutdown hooks and the process shutdown sequence.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use switchyard_server::{GracefulShutdown, ShutdownHooks};
//!
//! let shutdown = Arc::new(GracefulShutdown::new());
//! let drain = Arc::clone(&shutdown);
//!
//! let hooks = ShutdownHooks::new()
//!     .hook_timeout(Duration::from_secs(10))
//!     .hard_deadline(Duration::from_secs(60))
//!     .on_shutdown("drain", move |timeout| {
//!         let drain = Arc::clone(&drain);
//!         async move { drain.reject_and_wait(timeout).await }
//!     });
//!
//! assert_eq!(hooks.hook_names(), vec!["drain"]);
//! ```
//!
//! # Execution Order
//!
//! Hooks run one at a time, in registration order. A failing hook is logged
//! and the next one still runs. The usual order is listeners, then the
//! request drain, then resource clean-up.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use switchyard_core::BoxFuture;

use crate::error::ShutdownError;
use crate::signal::wait_for_os_signal;

/// Default time each hook is given.
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Default limit for the whole shutdown sequence.
pub const DEFAULT_HARD_DEADLINE: Duration = Duration::from_secs(60);

/// A shutdown hook callback.
///
/// Receives the time it is allowed to take.
pub type ShutdownHook =
    Arc<dyn Fn(Duration) -> BoxFuture<'static, Result<(), ShutdownError>> + Send + Sync>;

/// Ordered set of shutdown hooks.
#[must_use]
pub struct ShutdownHooks {
    hooks: Vec<(String, ShutdownHook)>,
    hook_timeout: Duration,
    hard_deadline: Duration,
}

impl Default for ShutdownHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShutdownHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownHooks")
            .field("hooks", &self.hook_names())
            .field("hook_timeout", &self.hook_timeout)
            .field("hard_deadline", &self.hard_deadline)
            .finish()
    }
}

impl ShutdownHooks {
    /// Creates an empty hook set with default timeouts.
    pub fn new() -> Self {
        Self {
            hooks: Vec::new(),
            hook_timeout: DEFAULT_HOOK_TIMEOUT,
            hard_deadline: DEFAULT_HARD_DEADLINE,
        }
    }

    /// Sets the time each hook is given.
    pub fn hook_timeout(mut self, timeout: Duration) -> Self {
        self.hook_timeout = timeout;
        self
    }

    /// Sets the limit for the whole sequence.
    pub fn hard_deadline(mut self, deadline: Duration) -> Self {
        self.hard_deadline = deadline;
        self
    }

    /// Registers a named hook.
    pub fn on_shutdown<F, Fut>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(Duration) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ShutdownError>> + Send + 'static,
    {
        let hook: ShutdownHook = Arc::new(move |timeout| Box::pin(hook(timeout)));
        self.hooks.push((name.into(), hook));
        self
    }

    /// Returns the hook names in execution order.
    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Returns the number of hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns true if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook under the hard deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::DeadlineExceeded`] if the sequence overran
    /// the deadline, or [`ShutdownError::HooksFailed`] summarizing the hooks
    /// that failed.
    pub async fn run(&self) -> Result<(), ShutdownError> {
        let deadline = self.hard_deadline;
        match tokio::time::timeout(deadline, self.run_hooks()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(?deadline, "shutdown overran the hard deadline");
                Err(ShutdownError::DeadlineExceeded { deadline })
            }
        }
    }

    async fn run_hooks(&self) -> Result<(), ShutdownError> {
        let mut errors: Vec<String> = Vec::new();

        for (name, hook) in &self.hooks {
            tracing::debug!(hook = %name, "running shutdown hook");
            let attempt = tokio::time::timeout(self.hook_timeout, hook(self.hook_timeout));
            let result = match attempt.await {
                Ok(result) => result,
                Err(_) => Err(ShutdownError::hook_timeout(name.as_str(), self.hook_timeout)),
            };

            match result {
                Ok(()) => {
                    tracing::info!(hook = %name, "shutdown hook completed");
                }
                Err(e) => {
                    tracing::error!(hook = %name, error = %e, "shutdown hook failed");
                    errors.push(format!("{name}: {e}"));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError::HooksFailed(errors.join("; ")))
        }
    }
}

/// Waits for SIGINT or SIGTERM, then runs `hooks`.
///
/// # Errors
///
/// Returns [`ShutdownError::Signal`] if signal handlers cannot be
/// installed, otherwise whatever [`ShutdownHooks::run`] returns.
pub async fn wait_for_shutdown(hooks: &ShutdownHooks) -> Result<(), ShutdownError> {
    let signal = wait_for_os_signal().await.map_err(ShutdownError::Signal)?;
    tracing::info!(signal, "received signal, shutting down");
    hooks.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    type HookFuture = BoxFuture<'static, Result<(), ShutdownError>>;

    fn recorder(
        order: &Arc<Mutex<Vec<u32>>>,
        id: u32,
    ) -> impl Fn(Duration) -> HookFuture + Send + Sync + 'static {
        let order = Arc::clone(order);
        move |_| -> HookFuture {
            let order = Arc::clone(&order);
            Box::pin(async move {
                order.lock().push(id);
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_empty_hooks() {
        let hooks = ShutdownHooks::new();
        assert!(hooks.is_empty());
        assert!(hooks.run().await.is_ok());
    }

    #[tokio::test]
    async fn test_hooks_run_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let hooks = ShutdownHooks::new()
            .on_shutdown("listeners", recorder(&order, 1))
            .on_shutdown("drain", recorder(&order, 2))
            .on_shutdown("broker", recorder(&order, 3));

        hooks.run().await.unwrap();

        assert_eq!(*order.lock(), vec![1, 2, 3]);
        assert_eq!(hooks.hook_names(), vec!["listeners", "drain", "broker"]);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_hooks() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let hooks = ShutdownHooks::new()
            .on_shutdown("first", recorder(&order, 1))
            .on_shutdown("broken", |_| async {
                Err(ShutdownError::hook_failed("broken", "boom"))
            })
            .on_shutdown("third", recorder(&order, 3));

        let err = hooks.run().await.unwrap_err();

        assert!(matches!(err, ShutdownError::HooksFailed(ref msg) if msg.contains("boom")));
        assert_eq!(*order.lock(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_hook_receives_timeout() {
        let seen = Arc::new(Mutex::new(None));
        let seen_in_hook = Arc::clone(&seen);
        let hooks = ShutdownHooks::new()
            .hook_timeout(Duration::from_secs(3))
            .on_shutdown("probe", move |timeout| {
                let seen = Arc::clone(&seen_in_hook);
                async move {
                    *seen.lock() = Some(timeout);
                    Ok(())
                }
            });

        hooks.run().await.unwrap();
        assert_eq!(*seen.lock(), Some(Duration::from_secs(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_hook_times_out_and_sequence_continues() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let hooks = ShutdownHooks::new()
            .hook_timeout(Duration::from_secs(1))
            .on_shutdown("stuck", |_| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .on_shutdown("after", recorder(&order, 2));

        let err = hooks.run().await.unwrap_err();

        assert!(matches!(err, ShutdownError::HooksFailed(ref msg) if msg.contains("stuck")));
        assert_eq!(*order.lock(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_deadline() {
        let hooks = ShutdownHooks::new()
            .hook_timeout(Duration::from_secs(10))
            .hard_deadline(Duration::from_secs(15))
            .on_shutdown("slow_a", |_| async {
                tokio::time::sleep(Duration::from_secs(8)).await;
                Ok(())
            })
            .on_shutdown("slow_b", |_| async {
                tokio::time::sleep(Duration::from_secs(8)).await;
                Ok(())
            });

        let err = hooks.run().await.unwrap_err();
        assert!(matches!(err, ShutdownError::DeadlineExceeded { .. }));
    }

    #[test]
    fn test_debug() {
        let hooks = ShutdownHooks::new().on_shutdown("drain", |_| async { Ok(()) });
        let debug = format!("{hooks:?}");
        assert!(debug.contains("drain"));
    }
}
