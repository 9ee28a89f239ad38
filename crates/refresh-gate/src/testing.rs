//! Scripted transport for gate tests
//!
//! Answers each path from a queue of scripted steps (a status + body, or
//! a transport failure) and records every call it sees. A path can be
//! gated behind a semaphore so a test can hold a renewal in flight while
//! it enqueues waiters.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use tokio::sync::Semaphore;
use transport::{Request, Response, Transport, TransportError};

pub(crate) enum Step {
    Status(u16, &'static str),
    Fail(TransportError),
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<(reqwest::Method, String)>>,
    timeouts: Mutex<Vec<Option<Duration>>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response for the given path.
    pub(crate) fn script_status(&self, path: &str, status: u16, body: &'static str) {
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Step::Status(status, body));
    }

    /// Queue a transport failure for the given path.
    pub(crate) fn script_failure(&self, path: &str, err: TransportError) {
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Step::Fail(err));
    }

    /// Gate sends to the given path behind a zero-permit semaphore.
    /// Each `add_permits(1)` releases one held call.
    pub(crate) fn gate(&self, path: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), gate.clone());
        gate
    }

    /// All calls seen, in arrival order.
    pub(crate) fn calls(&self) -> Vec<(reqwest::Method, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls to the given path.
    pub(crate) fn count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, p)| p == path)
            .count()
    }

    /// Per-call timeouts, in arrival order.
    pub(crate) fn timeouts(&self) -> Vec<Option<Duration>> {
        self.timeouts.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: &'a Request,
    ) -> Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            // Record before gating so tests can observe an in-flight call.
            self.calls
                .lock()
                .unwrap()
                .push((request.method.clone(), request.path.clone()));
            self.timeouts.lock().unwrap().push(request.timeout);

            let gate = self.gates.lock().unwrap().get(&request.path).cloned();
            if let Some(gate) = gate {
                let permit = gate
                    .acquire()
                    .await
                    .map_err(|_| TransportError::Other("gate closed".into()))?;
                permit.forget();
            }

            let step = self
                .scripts
                .lock()
                .unwrap()
                .get_mut(&request.path)
                .and_then(|queue| queue.pop_front());

            match step {
                Some(Step::Fail(err)) => Err(err),
                Some(Step::Status(status, body)) => Ok(Response {
                    status: StatusCode::from_u16(status).unwrap(),
                    headers: HeaderMap::new(),
                    body: Bytes::from_static(body.as_bytes()),
                }),
                None => Ok(Response {
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    body: Bytes::new(),
                }),
            }
        })
    }
}
