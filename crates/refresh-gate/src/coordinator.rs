//! Refresh coordinator state machine and waiter queue
//!
//! Guarantees at most one renewal operation is in flight at any time.
//! The first caller to hit an expired session becomes the leader and
//! runs the renewal; callers that fail while it is in flight suspend as
//! FIFO waiters and share its outcome.
//!
//! Transitions:
//! - Idle → Refreshing (a request failed with an expired session)
//! - Refreshing → Idle (the renewal resolved; the entire waiter queue is
//!   drained atomically with the transition, so no work is admitted
//!   mid-flush and nothing is left queued)
//!
//! A failed renewal is never retried here — it surfaces to every waiter
//! and to the auth failure notifier, and the next renewal happens only
//! on the next subsequent expiry failure.
//!
//! A leader whose future is dropped mid-renewal (the caller timed out or
//! went away) restores `Idle` and fails the queued waiters, so the next
//! expiry starts a fresh cycle instead of queueing forever.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use session_auth::{AuthFailureNotifier, SessionStore, renew_session};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use transport::Transport;

use crate::classify::ClassifiedError;
use crate::config::GateConfig;
use crate::metrics;

/// Coordinator state. `Refreshing` means exactly one renewal is in
/// flight and new expiry failures must queue rather than start another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// A suspended caller awaiting the in-flight renewal's outcome.
type Waiter = oneshot::Sender<Result<(), ClassifiedError>>;

struct Inner {
    state: RefreshState,
    waiters: VecDeque<Waiter>,
}

/// Restores the machine when the leader's future is dropped before the
/// renewal resolved. Without this, an abandoned leader would leave the
/// state `Refreshing` with no renewal in flight, and every later expiry
/// would queue a waiter that never resolves.
struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    completed: bool,
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.coordinator.abandon();
        }
    }
}

/// Single-flight renewal coordinator.
///
/// The mutex owns both the state and the waiter queue; it is never held
/// across an await point. Constructed once at application start and
/// cycles for the lifetime of the process.
pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    store: Arc<SessionStore>,
    notifier: Arc<AuthFailureNotifier>,
    renewal_path: String,
    renewal_timeout: Duration,
    session_key: String,
    inner: Mutex<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<SessionStore>,
        notifier: Arc<AuthFailureNotifier>,
        config: &GateConfig,
    ) -> Self {
        Self {
            transport,
            store,
            notifier,
            renewal_path: config.renewal_path.clone(),
            renewal_timeout: Duration::from_secs(config.renewal_timeout_secs),
            session_key: config.session_key.clone(),
            inner: Mutex::new(Inner {
                state: RefreshState::Idle,
                waiters: VecDeque::new(),
            }),
        }
    }

    /// Recover from an expired-session failure.
    ///
    /// From `Idle` this starts the single renewal and resolves with its
    /// outcome; while `Refreshing` it suspends as a waiter and resolves,
    /// in arrival order, when the in-flight renewal concludes. `Ok(())`
    /// means the caller may replay its request.
    pub async fn recover(&self) -> Result<(), ClassifiedError> {
        let waiter = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            match inner.state {
                RefreshState::Idle => {
                    inner.state = RefreshState::Refreshing;
                    None
                }
                RefreshState::Refreshing => {
                    let (tx, rx) = oneshot::channel();
                    inner.waiters.push_back(tx);
                    Some(rx)
                }
            }
        };

        match waiter {
            None => self.lead_renewal().await,
            Some(rx) => {
                debug!("renewal in flight, suspending until it resolves");
                rx.await.unwrap_or_else(|_| {
                    Err(ClassifiedError::Other(
                        "refresh coordinator dropped before resolving waiter".into(),
                    ))
                })
            }
        }
    }

    /// Current state (for diagnostics and tests).
    pub fn state(&self) -> RefreshState {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).state
    }

    /// Number of suspended waiters (for diagnostics and tests).
    pub fn waiter_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .waiters
            .len()
    }

    /// Run the one in-flight renewal and resolve every waiter.
    async fn lead_renewal(&self) -> Result<(), ClassifiedError> {
        let mut guard = LeaderGuard {
            coordinator: self,
            completed: false,
        };
        info!("session expired, starting renewal");
        let result = renew_session(
            self.transport.as_ref(),
            &self.renewal_path,
            self.renewal_timeout,
        )
        .await;

        let outcome = match result {
            Ok(()) => {
                info!("session renewal succeeded");
                metrics::record_renewal("success");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "session renewal failed, session lost");
                metrics::record_renewal("failure");
                metrics::record_session_lost();
                // Clear local session state and fire the notifier exactly
                // once, before any waiter observes the failure.
                self.clear_session().await;
                self.notifier.notify(&err);
                Err(ClassifiedError::RefreshEndpointFailure(err.to_string()))
            }
        };

        // Drain the whole queue and return to Idle in one step. Failures
        // arriving from here on observe Idle and start a new cycle.
        let waiters = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.state = RefreshState::Idle;
            std::mem::take(&mut inner.waiters)
        };
        guard.completed = true;

        if !waiters.is_empty() {
            debug!(waiters = waiters.len(), "flushing waiter queue");
            metrics::record_waiters_flushed(waiters.len());
        }
        for waiter in waiters {
            // A waiter whose caller went away is fine to skip.
            let _ = waiter.send(outcome.clone());
        }

        outcome
    }

    fn abandon(&self) {
        let waiters = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.state = RefreshState::Idle;
            std::mem::take(&mut inner.waiters)
        };
        warn!(
            waiters = waiters.len(),
            "renewal abandoned before completion, failing queued waiters"
        );
        for waiter in waiters {
            let _ = waiter.send(Err(ClassifiedError::Other(
                "session renewal abandoned before completion".into(),
            )));
        }
    }

    async fn clear_session(&self) {
        match self.store.remove(&self.session_key).await {
            Ok(Some(_)) => debug!(key = %self.session_key, "cleared session marker"),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "failed to clear session marker"),
        }
    }
}
