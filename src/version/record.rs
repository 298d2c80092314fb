//! Persisted version record.
//!
//! A tiny string key-value store. The what's-new flow keeps exactly one
//! entry in it: the last version that ran, under [`RECORD_KEY`].

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed key for the last-seen version.
pub const RECORD_KEY: &str = "ahnafnafee.postscript-preview";

/// State file name inside the state directory
const STATE_FILE: &str = "state.json";

/// Errors from writing the record. Reads never fail: unreadable means absent.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to write version record `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to encode version record")]
    Encode(#[from] serde_json::Error),
}

/// Key-value persistence boundary.
pub trait StateStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), RecordError>;
}

/// On-disk shape of the state file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
struct StateFile {
    entries: FxHashMap<String, String>,
}

/// JSON file store, `<dir>/state.json`.
///
/// The file is read on first access and rewritten whole on every `set`.
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<Option<StateFile>>,
}

impl JsonFileStore {
    /// Store under an explicit directory.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STATE_FILE),
            state: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> StateFile {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StateFile::default(),
            Err(e) => {
                crate::debug!("notice"; "ignoring unreadable {}: {}", path.display(), e);
                return StateFile::default();
            }
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            crate::debug!("notice"; "ignoring unreadable {}: {}", path.display(), e);
            StateFile::default()
        })
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        let mut state = self.state.lock();
        state
            .get_or_insert_with(|| Self::load(&self.path))
            .entries
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RecordError> {
        let mut guard = self.state.lock();
        let state = guard.get_or_insert_with(|| Self::load(&self.path));
        state.entries.insert(key.to_string(), value.to_string());

        let json = serde_json::to_string_pretty(state)?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| RecordError::Io(dir.to_path_buf(), e))?;
        }
        fs::write(&self.path, json).map_err(|e| RecordError::Io(self.path.clone(), e))?;

        crate::debug!("notice"; "recorded {} = {}", key, value);
        Ok(())
    }
}

/// In-memory store.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<FxHashMap<String, String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.entries.lock().insert(key.to_string(), value.to_string());
        store
    }
}

#[cfg(test)]
impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RecordError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Default state directory: `<data_dir>/pspreview`.
pub fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pspreview")
}
