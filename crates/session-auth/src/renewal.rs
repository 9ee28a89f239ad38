//! Silent session renewal
//!
//! Wraps the single call to the renewal endpoint. The request carries no
//! body — the expiring credential travels as a cookie — and runs under
//! its own timeout, longer than the ordinary per-request budget since
//! renewal may involve extra server-side round trips.
//!
//! This function is never invoked concurrently with itself; the refresh
//! coordinator enforces single-flight, not this module.

use std::time::Duration;

use tracing::{debug, warn};
use transport::{Request, Transport};

use crate::error::{Error, Result};

/// Issue exactly one renewal call.
///
/// Success is any non-error HTTP status; local state is untouched either
/// way. Error statuses are captured with their body for diagnostics,
/// transport failures are passed through for classification.
pub async fn renew_session(
    transport: &dyn Transport,
    path: &str,
    timeout: Duration,
) -> Result<()> {
    let request = Request::post(path).with_timeout(timeout);

    let response = transport.send(&request).await.map_err(|e| {
        warn!(error = %e, "session renewal transport failure");
        Error::Transport(e)
    })?;

    if response.is_ok() {
        debug!(status = %response.status, "session renewal succeeded");
        return Ok(());
    }

    let status = response.status.as_u16();
    let body = response.text();
    warn!(status, "session renewal rejected");
    Err(Error::Endpoint { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use reqwest::StatusCode;
    use reqwest::header::HeaderMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use transport::{Response, TransportError};

    /// Transport that answers every send with a fixed scripted outcome
    /// and records the requests it saw.
    struct FixedTransport {
        outcome: std::result::Result<(StatusCode, &'static str), TransportError>,
        seen: Mutex<Vec<Request>>,
    }

    impl FixedTransport {
        fn status(status: StatusCode, body: &'static str) -> Self {
            Self {
                outcome: Ok((status, body)),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: TransportError) -> Self {
            Self {
                outcome: Err(err),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for FixedTransport {
        fn send<'a>(
            &'a self,
            request: &'a Request,
        ) -> Pin<Box<dyn Future<Output = std::result::Result<Response, TransportError>> + Send + 'a>>
        {
            self.seen.lock().unwrap().push(request.clone());
            let outcome = self.outcome.clone();
            Box::pin(async move {
                let (status, body) = outcome?;
                Ok(Response {
                    status,
                    headers: HeaderMap::new(),
                    body: Bytes::from_static(body.as_bytes()),
                })
            })
        }
    }

    #[tokio::test]
    async fn succeeds_on_ok_status() {
        let transport = FixedTransport::status(StatusCode::OK, "");
        renew_session(&transport, "/auth/refresh", Duration::from_secs(15))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn succeeds_on_any_non_error_status() {
        let transport = FixedTransport::status(StatusCode::NO_CONTENT, "");
        renew_session(&transport, "/auth/refresh", Duration::from_secs(15))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sends_empty_post_with_own_timeout() {
        let transport = FixedTransport::status(StatusCode::OK, "");
        renew_session(&transport, "/auth/refresh", Duration::from_secs(15))
            .await
            .unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, reqwest::Method::POST);
        assert_eq!(seen[0].path, "/auth/refresh");
        assert!(seen[0].body.is_none());
        assert_eq!(seen[0].timeout, Some(Duration::from_secs(15)));
    }

    #[tokio::test]
    async fn error_status_captures_status_and_body() {
        let transport = FixedTransport::status(StatusCode::UNAUTHORIZED, "session revoked");
        let err = renew_session(&transport, "/auth/refresh", Duration::from_secs(15))
            .await
            .unwrap_err();

        match err {
            Error::Endpoint { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "session revoked");
            }
            other => panic!("expected Endpoint error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_passes_through() {
        let transport =
            FixedTransport::failing(TransportError::Timeout("deadline exceeded".into()));
        let err = renew_session(&transport, "/auth/refresh", Duration::from_secs(15))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Timeout(_))));
    }
}
