//! Transport abstraction for outbound HTTP calls
//!
//! Defines the `Transport` trait that decouples the refresh gate from the
//! concrete HTTP client. `ReqwestTransport` wraps a `reqwest::Client`;
//! tests substitute scripted transports behind the same trait. The gate
//! requires only `send(request) -> Response | TransportError`.

pub mod client;

pub use client::ReqwestTransport;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

/// An outbound HTTP call descriptor.
///
/// `path` is joined to the transport's base URL and may carry a query
/// string. `timeout` overrides the dispatcher's per-request default when
/// set; the renewal operation uses it for its own longer budget.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: reqwest::Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn new(method: reqwest::Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(reqwest::Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(reqwest::Method::POST, path)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    /// Whether the status is outside the error ranges (4xx/5xx).
    pub fn is_ok(&self) -> bool {
        !self.status.is_client_error() && !self.status.is_server_error()
    }

    /// Response body as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| TransportError::Other(format!("invalid JSON body: {e}")))
    }
}

/// Transport-level failures — no usable response was received.
///
/// `Timeout` and `Connect` cover the conditions the gate treats as
/// network failures; everything else lands in `Other` with the
/// underlying message preserved for classification and diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// Abstraction over the HTTP client issuing requests.
///
/// Uses a `Pin<Box<dyn Future>>` return type for dyn-compatibility
/// (`Arc<dyn Transport>` is shared by the dispatcher and coordinator).
pub trait Transport: Send + Sync {
    /// Issue one request and buffer the response.
    ///
    /// A response with an error status is still `Ok` here — status
    /// triage belongs to the caller, not the transport.
    fn send<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send + 'a>>;
}
