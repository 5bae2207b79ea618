//! Durable session snapshot storage.
//!
//! The credential and identity are written under the stable keys
//! `access_token` and `user_info` inside one JSON document. Storage never
//! fails the caller: corrupt content is discarded with a warning and
//! treated as an empty session.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// On-disk shape of the session. The identity is kept as raw JSON so a
/// corrupt `user_info` entry can be dropped without losing a readable
/// credential.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PersistedSession {
    #[serde(
        rename = "access_token",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub credential: Option<String>,
    #[serde(rename = "user_info", default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<serde_json::Value>,
}

impl PersistedSession {
    pub fn is_empty(&self) -> bool {
        self.credential.is_none() && self.identity.is_none()
    }
}

/// Persistence seam for the session store.
pub trait SessionStorage: Send + Sync + 'static {
    /// Load the persisted snapshot. Never errors; unreadable or corrupt
    /// content loads as an empty session.
    fn load(&self) -> PersistedSession;
    /// Write-through save. Best effort; failures are logged, not raised.
    fn save(&self, snapshot: &PersistedSession);
    /// Remove the persisted snapshot entirely.
    fn clear(&self);
}

/// JSON file under the platform config directory.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at `<config_dir>/qbank-admin/session.json`.
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        FileStorage {
            path: base.join("qbank-admin").join("session.json"),
        }
    }

    /// Storage at an explicit path (tests use this with a temp dir).
    pub fn at_path(path: PathBuf) -> Self {
        FileStorage { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> PersistedSession {
        if !self.path.exists() {
            return PersistedSession::default();
        }
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("discarding corrupt session file at {:?}: {}", self.path, e);
                    let _ = fs::remove_file(&self.path);
                    PersistedSession::default()
                }
            },
            Err(e) => {
                warn!("failed to read session file at {:?}: {}", self.path, e);
                PersistedSession::default()
            }
        }
    }

    fn save(&self, snapshot: &PersistedSession) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("failed to create session dir {:?}: {}", parent, e);
                return;
            }
        }
        match serde_json::to_string_pretty(snapshot) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!("failed to write session file at {:?}: {}", self.path, e);
                }
            }
            Err(e) => warn!("failed to encode session snapshot: {}", e),
        }
    }

    fn clear(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to remove session file at {:?}: {}", self.path, e);
            }
        }
    }
}

/// In-memory storage for tests.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<PersistedSession>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded storage, as if a previous run had persisted a session.
    pub fn seeded(snapshot: PersistedSession) -> Self {
        MemoryStorage {
            inner: Mutex::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> PersistedSession {
        self.inner.lock().unwrap().clone()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> PersistedSession {
        self.inner.lock().unwrap().clone()
    }

    fn save(&self, snapshot: &PersistedSession) {
        *self.inner.lock().unwrap() = snapshot.clone();
    }

    fn clear(&self) {
        *self.inner.lock().unwrap() = PersistedSession::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::at_path(dir.path().join("session.json"));
        let snapshot = PersistedSession {
            credential: Some("tok-1".into()),
            identity: Some(serde_json::json!({"id": 1, "username": "alice"})),
        };
        storage.save(&snapshot);
        assert_eq!(storage.load(), snapshot);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::at_path(dir.path().join("session.json"));
        assert!(storage.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let storage = FileStorage::at_path(path.clone());
        assert!(storage.load().is_empty());
        // The corrupt entry is removed, not left to fail again.
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_removes_the_file() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::at_path(dir.path().join("session.json"));
        storage.save(&PersistedSession {
            credential: Some("tok".into()),
            identity: None,
        });
        storage.clear();
        assert!(!storage.path().exists());
        // Clearing twice is a no-op.
        storage.clear();
    }

    #[test]
    fn test_stable_keys_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let storage = FileStorage::at_path(path.clone());
        storage.save(&PersistedSession {
            credential: Some("tok".into()),
            identity: Some(serde_json::json!({"id": 1})),
        });
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("access_token"));
        assert!(raw.contains("user_info"));
    }
}
