//! Auth failure notification
//!
//! A single handler slot the hosting application fills at startup
//! (typically to force a logout screen). The gate invokes it exactly
//! once per irrecoverable session loss, after local session state has
//! been cleared. A faulty handler must not be able to corrupt the
//! coordinator's state transition, so panics are caught and logged
//! rather than propagated.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::error::Error;

/// Handler invoked with the terminating renewal error.
pub type FailureHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Process-wide auth failure handler slot.
///
/// Re-registration overwrites silently (last writer wins); the
/// replacement is logged at debug level.
#[derive(Default)]
pub struct AuthFailureNotifier {
    handler: RwLock<Option<FailureHandler>>,
}

impl AuthFailureNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the failure handler.
    pub fn set_handler(&self, handler: FailureHandler) {
        let mut slot = self.handler.write().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            debug!("replacing existing auth failure handler");
        }
        *slot = Some(handler);
    }

    /// Invoke the current handler, if any, with the terminating error.
    ///
    /// A panic inside the handler is swallowed and logged.
    pub fn notify(&self, error: &Error) {
        let handler = {
            let slot = self.handler.read().unwrap_or_else(|e| e.into_inner());
            slot.clone()
        };

        let Some(handler) = handler else {
            debug!("session lost with no auth failure handler registered");
            return;
        };

        if catch_unwind(AssertUnwindSafe(|| handler(error))).is_err() {
            warn!("auth failure handler panicked");
        }
    }
}
