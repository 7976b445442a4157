//! In-memory session store.

use super::{BoxFuture, LoadedSession, SaveRequest, SessionRecord, SessionStore, StorageError, StorageResult, session_key};
use crate::clock::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// In-memory storage for testing and ephemeral use.
pub struct MemoryStore {
    records: RwLock<HashMap<String, SessionRecord>>,
    clock: Arc<dyn Clock>,
    offline: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `clock` to stamp `lastEdited`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            clock,
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate a connectivity outage: every operation fails with `Io`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StorageError::Io("store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl SessionStore for MemoryStore {
    fn load_existing_participant_data(&self, id: &str, name: &str) -> BoxFuture<'_, StorageResult<LoadedSession>> {
        let key = session_key(id, name);
        Box::pin(async move {
            self.check_online()?;
            let records = self.records.read().map_err(|e| {
                StorageError::Other(format!("Lock error: {}", e))
            })?;
            Ok(records
                .get(&key)
                .cloned()
                .map(SessionRecord::into_loaded)
                .unwrap_or_default())
        })
    }

    fn save_session_data(&self, id: &str, name: &str, request: SaveRequest) -> BoxFuture<'_, StorageResult<()>> {
        let key = session_key(id, name);
        let record = SessionRecord::from_request(id.trim(), name.trim(), request, self.clock.now());
        Box::pin(async move {
            let record = record?;
            self.check_online()?;
            let mut records = self.records.write().map_err(|e| {
                StorageError::Other(format!("Lock error: {}", e))
            })?;
            records.insert(key, record);
            Ok(())
        })
    }

    fn key_already_exists(&self, id: &str, name: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let key = session_key(id, name);
        Box::pin(async move {
            self.check_online()?;
            let records = self.records.read().map_err(|e| {
                StorageError::Other(format!("Lock error: {}", e))
            })?;
            Ok(records.contains_key(&key))
        })
    }

    fn list_records(&self) -> BoxFuture<'_, StorageResult<Vec<SessionRecord>>> {
        Box::pin(async move {
            self.check_online()?;
            let records = self.records.read().map_err(|e| {
                StorageError::Other(format!("Lock error: {}", e))
            })?;
            let mut all: Vec<SessionRecord> = records.values().cloned().collect();
            all.sort_by(|a, b| a.participant_id.cmp(&b.participant_id));
            Ok(all)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{ContactPoint, Direction, Figure, QuestionKey, Questionnaire};
    use crate::storage::test_util::block_on;
    use chrono::{TimeZone, Utc};

    fn request() -> SaveRequest {
        let mut questionnaire = Questionnaire::default();
        for key in QuestionKey::ALL {
            questionnaire.set(key, "a".into());
        }
        let at = Utc.with_ymd_and_hms(2025, 4, 4, 4, 4, 4).unwrap();
        SaveRequest {
            notes: "ok".into(),
            confidence: 3,
            questionnaire,
            points: vec![ContactPoint::new("5", "Cy", Figure::Right, Direction::TouchedBy, 0.1, 0.9, at).unwrap()],
            earliest_timestamp: Some(at),
        }
    }

    #[test]
    fn test_save_and_load() {
        let store = MemoryStore::new();
        block_on(store.save_session_data("5", "Cy", request())).unwrap();
        let loaded = block_on(store.load_existing_participant_data("5", "Cy")).unwrap();
        assert!(loaded.exists);
        assert_eq!(loaded.points.len(), 1);
        assert_eq!(loaded.session_data.unwrap().notes, "ok");
    }

    #[test]
    fn test_missing_participant() {
        let store = MemoryStore::new();
        let loaded = block_on(store.load_existing_participant_data("9", "Nobody")).unwrap();
        assert!(!loaded.exists);
        assert!(loaded.points.is_empty());
        assert!(!block_on(store.key_already_exists("9", "Nobody")).unwrap());
    }

    #[test]
    fn test_rejected_save_is_not_stored() {
        let store = MemoryStore::new();
        let mut bad = request();
        bad.confidence = 9;
        let result = block_on(store.save_session_data("5", "Cy", bad));
        assert!(matches!(result, Err(StorageError::Rejected(_))));
        assert!(!block_on(store.key_already_exists("5", "Cy")).unwrap());
    }

    #[test]
    fn test_offline() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let result = block_on(store.save_session_data("5", "Cy", request()));
        assert!(matches!(result, Err(StorageError::Io(_))));
        store.set_offline(false);
        block_on(store.save_session_data("5", "Cy", request())).unwrap();
        assert_eq!(block_on(store.list_records()).unwrap().len(), 1);
    }
}
