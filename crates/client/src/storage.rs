//! Key-value persistence behind the session store.
//!
//! The session only ever needs string keys mapped to string values, so the
//! backend contract is three calls. Backends must be shareable across
//! concurrently running requests.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage I/O error: {0}")]
    Io(String),
    #[error("corrupt storage contents: {0}")]
    Corrupt(String),
}

/// String-keyed persistent storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key was never set or was removed.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or overwrite a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StorageError {
    StorageError::Unavailable("lock poisoned".to_string())
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

/// JSON-file-backed store, one flat object per file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at the default per-user location (see [`default_session_path`]).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::new(default_session_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StorageError::Io(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .map_err(|e| StorageError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Io(format!("failed to create directory {}: {e}", parent.display()))
            })?;
        }

        let payload = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Corrupt(format!("failed to serialize entries: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, payload)
            .map_err(|e| StorageError::Io(format!("failed to write {}: {e}", tmp.display())))?;
        restrict_permissions(&tmp);
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            StorageError::Io(format!(
                "failed to move {} into place: {e}",
                self.path.display()
            ))
        })
    }

    fn update<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut entries = self.load()?;
        if mutate(&mut entries) {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// The file holds a bearer token: keep it readable by the owner only.
#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(err) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::warn!("failed to restrict permissions on {}: {err}", path.display());
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

/// Resolve the default session file:
/// `{app_data_dir}/ecowiser/session.json`.
#[cfg(not(target_arch = "wasm32"))]
pub fn default_session_path() -> Result<PathBuf, StorageError> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .ok_or_else(|| {
            StorageError::Unavailable(
                "failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share"
                    .to_string(),
            )
        })?;

    Ok(base.join("ecowiser").join("session.json"))
}
