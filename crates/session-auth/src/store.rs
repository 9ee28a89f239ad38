//! Persistent session marker storage
//!
//! The hosting application keeps a small set of session markers (current
//! user, auth method) in a JSON file of string keys to string values.
//! All writes use atomic temp-file + rename to prevent corruption on
//! crash. A tokio Mutex serializes concurrent access.
//!
//! The gate's only contract with this store is `remove()` on
//! irrecoverable renewal failure — the equivalent of logging the user
//! out locally. Removal failures are logged by the caller, never
//! propagated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Thread-safe session marker file manager.
pub struct SessionStore {
    path: PathBuf,
    state: Mutex<HashMap<String, String>>,
}

impl SessionStore {
    /// Load session markers from the given file path.
    ///
    /// If the file doesn't exist, creates it as `{}` (cold start with no
    /// active session).
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Storage(format!("reading session file: {e}")))?;
            let markers: HashMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::Storage(format!("parsing session file: {e}")))?;
            info!(path = %path.display(), markers = markers.len(), "loaded session markers");
            markers
        } else {
            info!(path = %path.display(), "session file not found, starting with empty store");
            let markers = HashMap::new();
            write_atomic(&path, &markers).await?;
            markers
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Get a clone of a marker value.
    pub async fn get(&self, key: &str) -> Option<String> {
        let state = self.state.lock().await;
        state.get(key).cloned()
    }

    /// Add or replace a marker and persist to disk.
    pub async fn set(&self, key: String, value: String) -> Result<()> {
        let mut state = self.state.lock().await;
        state.insert(key.clone(), value);
        debug!(key, "stored session marker");
        write_atomic(&self.path, &state).await
    }

    /// Remove a marker and persist to disk.
    ///
    /// Returns the removed value if it existed.
    pub async fn remove(&self, key: &str) -> Result<Option<String>> {
        let mut state = self.state.lock().await;
        let removed = state.remove(key);
        if removed.is_some() {
            debug!(key, "removed session marker");
            write_atomic(&self.path, &state).await?;
        }
        Ok(removed)
    }

    /// Number of stored markers.
    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Write session markers to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it
/// over the target. Sets file permissions to 0600 since the markers
/// identify an authenticated session.
async fn write_atomic(path: &Path, data: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Storage(format!("serializing session markers: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Storage("session file path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".session.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Storage(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Storage(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Storage(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted session markers");
    Ok(())
}
