//! On-device persistence.
//!
//! Everything the SDK keeps between runs lives in one JSON key-value file:
//! the generated user id, offline snapshots, pending comments and drafts.
//! Values are stored as JSON and written through on every change.

pub mod draft;
pub mod offline;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::utils::random_uuid;

pub use draft::DraftRepository;
pub use offline::{OfflineRepository, PreferenceOfflineRepository};

/// File name of the preference store inside the data directory.
pub const PREFERENCES_FILE: &str = "preferences.json";

const USER_ID_KEY: &str = "user_id";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// JSON key-value store, optionally backed by a file.
#[derive(Debug)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: Mutex<Map<String, Value>>,
}

impl PreferenceStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = load(&path)?.unwrap_or_default();
        log::debug!("Opened preference store {} ({} keys)", path.display(), values.len());
        Ok(Self {
            path: Some(path),
            values: Mutex::new(values),
        })
    }

    /// Store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(Map::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Value under `key`. Entries that no longer deserialize are treated as
    /// absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.lock().get(key).cloned()?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("Ignoring unreadable preference {}: {}", key, e);
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)?;
        let mut values = self.lock();
        values.insert(key.to_string(), value);
        self.flush(&values)
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.lock();
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Stable id of this installation, generated on first use.
    pub fn user_id(&self) -> Result<String, StorageError> {
        if let Some(id) = self.get::<String>(USER_ID_KEY).filter(|id| !id.is_empty()) {
            return Ok(id);
        }
        let id = random_uuid();
        self.set(USER_ID_KEY, &id)?;
        log::info!("Generated new user id {}", id);
        Ok(id)
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn flush(&self, values: &Map<String, Value>) -> Result<(), StorageError> {
        match &self.path {
            Some(path) => save(path, values),
            None => Ok(()),
        }
    }
}

fn load(path: &Path) -> Result<Option<Map<String, Value>>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    let values = serde_json::from_str::<Map<String, Value>>(&contents)?;
    Ok(Some(values))
}

fn save(path: &Path, values: &Map<String, Value>) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(values)?;
    std::fs::write(path, contents)?;
    Ok(())
}
