//! Refresh gate — HTTP access layer with silent session renewal
//!
//! Every outgoing call passes through the `SessionGate` dispatcher. When
//! a request fails because the session credential expired (401), the
//! gate performs a single renewal on behalf of all callers, queues the
//! requests that arrive while renewal is in flight, and replays them
//! once the renewal concludes. When renewal itself fails, local session
//! state is cleared and the registered auth failure handler fires once.
//!
//! Request lifecycle:
//! 1. Host loads `GateConfig`, builds a `SessionGate`, and registers an
//!    auth failure handler at startup
//! 2. `SessionGate::send()` forwards the request to the transport
//! 3. On failure, `classify()` decides: pass through, or recover via
//!    the `RefreshCoordinator`
//! 4. The coordinator runs at most one renewal at a time; concurrent
//!    callers suspend as FIFO waiters
//! 5. Renewal success → each suspended request is replayed exactly once;
//!    renewal failure → session marker cleared, notifier fired once,
//!    every caller gets a `GateError::SessionLost`

pub mod classify;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod metrics;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{ClassifiedError, classify};
pub use config::{ConfigError, GateConfig};
pub use coordinator::{RefreshCoordinator, RefreshState};
pub use dispatcher::SessionGate;
pub use error::GateError;
