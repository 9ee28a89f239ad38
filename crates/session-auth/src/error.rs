//! Error types for session authentication operations

use transport::TransportError;

/// Errors from session authentication operations.
///
/// Clone is required: a single renewal failure fans out to every caller
/// that was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("renewal endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("renewal request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("session store error: {0}")]
    Storage(String),
}

/// Result alias for session auth operations.
pub type Result<T> = std::result::Result<T, Error>;
