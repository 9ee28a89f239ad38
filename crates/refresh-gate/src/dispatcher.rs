//! Request dispatcher
//!
//! The thin wrapper every outgoing call passes through. Forwards the
//! request unmodified to the transport; on failure it classifies the
//! outcome and either passes the error through, or recovers via the
//! coordinator and replays the request exactly once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use session_auth::{AuthFailureNotifier, SessionStore};
use session_auth::notifier::FailureHandler;
use tracing::debug;
use transport::{ReqwestTransport, Request, Response, Transport, TransportError};

use crate::classify::{ClassifiedError, classify};
use crate::config::GateConfig;
use crate::coordinator::RefreshCoordinator;
use crate::error::GateError;
use crate::metrics;

/// One request's dispatch lifecycle: the immutable original descriptor
/// plus a retry count. A request is replayed at most once after a
/// successful renewal; the count is what blocks a second refresh cycle
/// for the same request.
#[derive(Debug)]
struct Attempt {
    request: Request,
    retries: u32,
}

impl Attempt {
    fn new(request: Request) -> Self {
        Self {
            request,
            retries: 0,
        }
    }

    fn request(&self) -> &Request {
        &self.request
    }

    fn retried(&self) -> bool {
        self.retries > 0
    }

    fn mark_retried(&mut self) {
        self.retries += 1;
    }
}

/// HTTP access layer with silent session renewal.
///
/// Cheap to share behind an `Arc`; all mutability lives inside the
/// coordinator and the session store.
pub struct SessionGate {
    transport: Arc<dyn Transport>,
    coordinator: RefreshCoordinator,
    notifier: Arc<AuthFailureNotifier>,
    request_timeout: Duration,
    renewal_path: String,
    fresh_replay_timeout: bool,
}

impl SessionGate {
    pub fn new(
        config: &GateConfig,
        transport: Arc<dyn Transport>,
        store: Arc<SessionStore>,
        notifier: Arc<AuthFailureNotifier>,
    ) -> Self {
        let coordinator =
            RefreshCoordinator::new(transport.clone(), store, notifier.clone(), config);
        Self {
            transport,
            coordinator,
            notifier,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            renewal_path: config.renewal_path.clone(),
            fresh_replay_timeout: config.fresh_replay_timeout,
        }
    }

    /// Build a gate from config with the production transport and a
    /// freshly loaded session store.
    pub async fn from_config(config: &GateConfig) -> session_auth::Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(
            reqwest::Client::new(),
            config.base_url.clone(),
        ));
        let store = Arc::new(SessionStore::load(config.session_file.clone()).await?);
        let notifier = Arc::new(AuthFailureNotifier::new());
        Ok(Self::new(config, transport, store, notifier))
    }

    /// Register the handler invoked once per irrecoverable session loss.
    /// Re-registration overwrites (last writer wins).
    pub fn set_auth_failure_handler(&self, handler: FailureHandler) {
        self.notifier.set_handler(handler);
    }

    /// Dispatch a request.
    ///
    /// An expired session (401) triggers recovery through the
    /// coordinator and, on success, one replay of the request. All other
    /// failures — network errors, other statuses, renewal-endpoint
    /// failures — pass through classified. A caller-supplied timeout on
    /// the request wins over the configured default.
    pub async fn send(&self, request: Request) -> Result<Response, GateError> {
        let started = Instant::now();
        let original_timeout = request.timeout.unwrap_or(self.request_timeout);
        let renewal_endpoint = is_renewal_endpoint(&request.path, &self.renewal_path);
        let mut attempt = Attempt::new(request);

        loop {
            let outcome = self.dispatch(&attempt, started, original_timeout).await;

            let (status, body, transport_error) = match outcome {
                Ok(response) if response.is_ok() => {
                    metrics::record_request(&attempt.request().method, "ok");
                    return Ok(response);
                }
                Ok(response) => (Some(response.status), Some(response.text()), None),
                Err(err) => (None, None, Some(err)),
            };

            let classified = classify(
                status,
                body.as_deref(),
                transport_error.as_ref(),
                renewal_endpoint,
            );
            debug!(
                method = %attempt.request().method,
                path = %attempt.request().path,
                error = %classified,
                retried = attempt.retried(),
                "request failed"
            );

            // Expired session, first failure for this request: recover
            // and replay. A retried request propagates instead — one
            // request never drives two refresh cycles.
            if matches!(classified, ClassifiedError::AuthExpired) && !attempt.retried() {
                match self.coordinator.recover().await {
                    Ok(()) => {
                        attempt.mark_retried();
                        continue;
                    }
                    Err(renewal_error) => {
                        metrics::record_request(&attempt.request().method, "session_lost");
                        return Err(GateError::SessionLost(renewal_error));
                    }
                }
            }

            metrics::record_request(&attempt.request().method, "error");
            return Err(GateError::Request(classified));
        }
    }

    /// One transport call with the effective timeout for this attempt.
    ///
    /// A replay either gets a fresh full timeout or the original
    /// request's remaining budget, per configuration.
    async fn dispatch(
        &self,
        attempt: &Attempt,
        started: Instant,
        original_timeout: Duration,
    ) -> Result<Response, TransportError> {
        let timeout = if !attempt.retried() || self.fresh_replay_timeout {
            original_timeout
        } else {
            original_timeout.saturating_sub(started.elapsed())
        };
        let mut request = attempt.request().clone();
        request.timeout = Some(timeout);
        self.transport.send(&request).await
    }
}

/// Whether the path targets the renewal endpoint. The configured path
/// must be followed by end-of-string, a query string, or a further path
/// segment — a sibling like `/auth/refresh-status` is an ordinary
/// request and keeps its own refresh cycle.
fn is_renewal_endpoint(path: &str, renewal_path: &str) -> bool {
    match path.strip_prefix(renewal_path) {
        Some(rest) => rest.is_empty() || rest.starts_with('?') || rest.starts_with('/'),
        None => false,
    }
}
