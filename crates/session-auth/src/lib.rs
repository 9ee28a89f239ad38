//! Session authentication primitives
//!
//! Provides the silent renewal operation, the persistent session store,
//! and the auth failure notifier for the refresh gate. This crate is a
//! standalone library with no dependency on the gate itself — it can be
//! tested and used independently.
//!
//! Renewal flow:
//! 1. The gate detects an expired session (401) on an ordinary request
//! 2. The coordinator calls `renewal::renew_session()` exactly once
//! 3. On success the server has rotated the session cookie; nothing
//!    local changes
//! 4. On irrecoverable failure the gate removes the session marker via
//!    `store::SessionStore::remove()` and fires the
//!    `notifier::AuthFailureNotifier` once

pub mod error;
pub mod notifier;
pub mod renewal;
pub mod store;

pub use error::{Error, Result};
pub use notifier::AuthFailureNotifier;
pub use renewal::renew_session;
pub use store::SessionStore;
