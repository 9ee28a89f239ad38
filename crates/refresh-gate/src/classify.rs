//! Failure classification
//!
//! Pure triage of a failed request/response pair. The classification
//! drives the dispatcher's policy: `AuthExpired` is absorbed into a
//! refresh cycle, everything else passes through to the caller
//! untouched. Deterministic for the same inputs, no side effects.

use reqwest::StatusCode;
use transport::TransportError;

/// A failure tagged with the category used to decide retry/propagation
/// policy. Carries the originating error as a diagnostic string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifiedError {
    /// Response received with status 401 — recoverable via renewal.
    #[error("authentication expired (401)")]
    AuthExpired,

    /// No usable response; connection or timeout condition. Not
    /// attributable to the server's authentication decision.
    #[error("network error: {0}")]
    Network(String),

    /// The renewal endpoint itself failed — terminal for the current
    /// refresh cycle.
    #[error("renewal endpoint failure: {0}")]
    RefreshEndpointFailure(String),

    /// Anything else; passed through untouched.
    #[error("request error: {0}")]
    Other(String),
}

/// Classify a failed request given its response status and body (if a
/// response arrived), the transport error (if none did), and whether the
/// request targeted the renewal endpoint.
///
/// The renewal endpoint is checked first: its failures must never look
/// like `AuthExpired`, or the gate would recurse into a new refresh
/// cycle for the very call that is supposed to end one.
pub fn classify(
    status: Option<StatusCode>,
    body: Option<&str>,
    transport_error: Option<&TransportError>,
    renewal_endpoint: bool,
) -> ClassifiedError {
    if renewal_endpoint {
        let detail = match (status, transport_error) {
            (Some(status), _) => format!("renewal endpoint returned {status}"),
            (None, Some(err)) => err.to_string(),
            (None, None) => "renewal endpoint failed without a response".into(),
        };
        return ClassifiedError::RefreshEndpointFailure(detail);
    }

    match (status, transport_error) {
        (None, Some(err)) if is_network_failure(err) => ClassifiedError::Network(err.to_string()),
        (None, Some(err)) => ClassifiedError::Other(err.to_string()),
        (None, None) => ClassifiedError::Other("request failed without a response".into()),
        (Some(StatusCode::UNAUTHORIZED), _) => ClassifiedError::AuthExpired,
        (Some(status), _) => {
            let detail = match body {
                Some(body) if !body.is_empty() => {
                    format!("request returned {status}: {}", body_snippet(body))
                }
                _ => format!("request returned {status}"),
            };
            ClassifiedError::Other(detail)
        }
    }
}

/// Upper bound on how much of an error body travels in diagnostics.
const BODY_SNIPPET_MAX: usize = 256;

/// A bounded slice of the response body, truncated at a char boundary.
fn body_snippet(body: &str) -> String {
    if body.len() <= BODY_SNIPPET_MAX {
        return body.to_string();
    }
    let mut end = BODY_SNIPPET_MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

/// Whether a transport failure is a connection/timeout condition.
///
/// `Other` errors are sniffed by message for the reset/timeout cases
/// the underlying stack reports without a dedicated variant.
fn is_network_failure(err: &TransportError) -> bool {
    match err {
        TransportError::Timeout(_) | TransportError::Connect(_) => true,
        TransportError::Other(msg) => {
            let msg = msg.to_lowercase();
            msg.contains("timeout") || msg.contains("connection reset")
        }
    }
}
