//! File-based session store for native platforms.

use super::{BoxFuture, LoadedSession, SaveRequest, SessionRecord, SessionStore, StorageError, StorageResult, session_key};
use crate::clock::{Clock, SystemClock};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Stores one JSON file per participant in a directory.
pub struct FileStore {
    base_path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path, clock: Arc::new(SystemClock) })
    }

    /// Create a store in the default location.
    ///
    /// On Unix: `~/.local/share/bodymap/sessions/`
    /// On Windows: `%LOCALAPPDATA%\bodymap\sessions\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("bodymap").join("sessions"))
    }

    /// Use `clock` to stamp `lastEdited`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn record_path(&self, id: &str, name: &str) -> PathBuf {
        let safe_key: String = session_key(id, name)
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_key))
    }

    fn read_record(path: &PathBuf) -> StorageResult<SessionRecord> {
        let json = fs::read_to_string(path).map_err(|e| {
            StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        SessionRecord::from_json(&json).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

impl SessionStore for FileStore {
    fn load_existing_participant_data(&self, id: &str, name: &str) -> BoxFuture<'_, StorageResult<LoadedSession>> {
        let path = self.record_path(id, name);
        Box::pin(async move {
            if !path.exists() {
                return Ok(LoadedSession::default());
            }
            Ok(Self::read_record(&path)?.into_loaded())
        })
    }

    fn save_session_data(&self, id: &str, name: &str, request: SaveRequest) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(id, name);
        let json = SessionRecord::from_request(id.trim(), name.trim(), request, self.clock.now())
            .and_then(|record| {
                record
                    .to_json()
                    .map_err(|e| StorageError::Serialization(e.to_string()))
            });
        Box::pin(async move {
            let json = json?;
            fs::write(&path, json).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })
        })
    }

    fn key_already_exists(&self, id: &str, name: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.record_path(id, name);
        Box::pin(async move { Ok(path.exists()) })
    }

    fn list_records(&self) -> BoxFuture<'_, StorageResult<Vec<SessionRecord>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base).map_err(|e| {
                StorageError::Io(format!("Failed to read directory: {}", e))
            })?;

            let mut paths: Vec<PathBuf> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|e| e == "json"))
                .collect();
            paths.sort();

            let mut records = Vec::with_capacity(paths.len());
            for path in paths {
                match Self::read_record(&path) {
                    Ok(record) => records.push(record),
                    Err(e) => log::warn!("Skipping unreadable session file: {}", e),
                }
            }
            Ok(records)
        })
    }
}
