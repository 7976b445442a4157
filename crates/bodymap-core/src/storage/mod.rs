//! Persistence contract for participant sessions.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

use crate::point::{ContactPoint, Questionnaire, SessionData};
use crate::validation::validate_save_payload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    /// The payload failed validation; retrying will not help.
    #[error("Save rejected: {0}")]
    Rejected(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// What a lookup for a participant returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedSession {
    pub exists: bool,
    pub points: Vec<ContactPoint>,
    pub earliest_timestamp: Option<DateTime<Utc>>,
    pub session_data: Option<SessionData>,
}

/// Everything needed to persist a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub notes: String,
    pub confidence: u8,
    pub questionnaire: Questionnaire,
    pub points: Vec<ContactPoint>,
    /// The session's first-entry anchor; may predate every remaining point.
    pub earliest_timestamp: Option<DateTime<Utc>>,
}

/// On-disk shape of a participant's session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub participant_id: String,
    pub participant_name: String,
    pub points: Vec<ContactPoint>,
    #[serde(default)]
    pub earliest_timestamp: Option<DateTime<Utc>>,
    pub session_data: SessionData,
}

impl SessionRecord {
    /// Validate a save request and stamp it with `now` as `lastEdited`.
    pub fn from_request(
        id: &str,
        name: &str,
        request: SaveRequest,
        now: DateTime<Utc>,
    ) -> StorageResult<Self> {
        validate_save_payload(id, name, request.confidence, &request.questionnaire)
            .map_err(|e| StorageError::Rejected(e.to_string()))?;
        let oldest_point = request.points.iter().map(|p| p.timestamp()).min();
        let earliest_timestamp = match (request.earliest_timestamp, oldest_point) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Ok(Self {
            participant_id: id.to_string(),
            participant_name: name.to_string(),
            points: request.points,
            earliest_timestamp,
            session_data: SessionData {
                notes: request.notes,
                confidence: request.confidence,
                questionnaire: request.questionnaire,
                last_edited: now,
            },
        })
    }

    pub fn into_loaded(self) -> LoadedSession {
        LoadedSession {
            exists: true,
            points: self.points,
            earliest_timestamp: self.earliest_timestamp,
            session_data: Some(self.session_data),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Storage key for a participant.
pub fn session_key(id: &str, name: &str) -> String {
    format!("{}_{}", id.trim(), name.trim())
}

/// Trait for session storage backends.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait SessionStore: Send + Sync {
    /// Look up a participant. A missing participant is `exists: false`, not an error.
    fn load_existing_participant_data(&self, id: &str, name: &str) -> BoxFuture<'_, StorageResult<LoadedSession>>;

    /// Persist a session, replacing any earlier save for the participant.
    fn save_session_data(&self, id: &str, name: &str, request: SaveRequest) -> BoxFuture<'_, StorageResult<()>>;

    /// Whether a session is stored for the participant.
    fn key_already_exists(&self, id: &str, name: &str) -> BoxFuture<'_, StorageResult<bool>>;

    /// Every stored session.
    fn list_records(&self) -> BoxFuture<'_, StorageResult<Vec<SessionRecord>>>;
}

/// Trait for session storage backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait SessionStore {
    fn load_existing_participant_data(&self, id: &str, name: &str) -> BoxFuture<'_, StorageResult<LoadedSession>>;

    fn save_session_data(&self, id: &str, name: &str, request: SaveRequest) -> BoxFuture<'_, StorageResult<()>>;

    fn key_already_exists(&self, id: &str, name: &str) -> BoxFuture<'_, StorageResult<bool>>;

    fn list_records(&self) -> BoxFuture<'_, StorageResult<Vec<SessionRecord>>>;
}
