//! reqwest-backed transport
//!
//! Joins the configured base URL with each request path, applies the
//! per-call timeout when set, and buffers the response body. Error
//! statuses from the server are returned as responses, not errors —
//! classification happens above this layer.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::{Request, Response, Transport, TransportError};

/// Production transport wrapping a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build the full URL by appending the request path to the base.
    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Transport for ReqwestTransport {
    fn send<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            let url = self.url_for(&request.path);
            debug!(method = %request.method, url = %url, "sending request");

            let mut builder = self
                .client
                .request(request.method.clone(), &url)
                .headers(request.headers.clone());
            if let Some(timeout) = request.timeout {
                builder = builder.timeout(timeout);
            }
            if let Some(ref body) = request.body {
                builder = builder.body(body.clone());
            }

            let response = builder.send().await.map_err(map_reqwest_error)?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Other(format!("reading response body: {e}")))?;

            Ok(Response {
                status,
                headers,
                body,
            })
        })
    }
}

/// Map reqwest failures onto the transport error taxonomy.
fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
