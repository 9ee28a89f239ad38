//! Gate error surface

use crate::classify::ClassifiedError;

/// Errors returned to callers of `SessionGate::send`.
///
/// `SessionLost` is the synthesized error for an irrecoverable renewal
/// failure — distinguishable from an ordinary request error so the host
/// can react differently (force logout vs. inline error).
#[derive(Debug, Clone, thiserror::Error)]
pub enum GateError {
    #[error("request failed: {0}")]
    Request(ClassifiedError),

    #[error("session renewal failed: {0}")]
    SessionLost(ClassifiedError),
}

impl GateError {
    /// Whether this error terminated the session.
    pub fn is_session_lost(&self) -> bool {
        matches!(self, GateError::SessionLost(_))
    }

    /// The underlying classification.
    pub fn classified(&self) -> &ClassifiedError {
        match self {
            GateError::Request(c) | GateError::SessionLost(c) => c,
        }
    }
}
