//! Wires the interaction engine to a session store.

use crate::{AppError, AppResult};
use bodymap_core::storage::SessionStore;
use bodymap_core::{ContactPoint, Error, FigureSurface, GestureRejected, InteractionEngine};
use std::sync::Arc;

/// Owns the engine for one participant at a time and drives persistence.
///
/// Store calls suspend the caller; the engine is only touched again once
/// they resolve, so no mutation interleaves with a pending load or save.
pub struct Coordinator<S: FigureSurface, St: SessionStore + ?Sized> {
    engine: InteractionEngine<S>,
    store: Arc<St>,
}

impl<S: FigureSurface, St: SessionStore + ?Sized> Coordinator<S, St> {
    pub fn new(engine: InteractionEngine<S>, store: Arc<St>) -> Self {
        Self { engine, store }
    }

    pub fn engine(&self) -> &InteractionEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut InteractionEngine<S> {
        &mut self.engine
    }

    pub fn store(&self) -> &Arc<St> {
        &self.store
    }

    fn identity_gate(&self) -> AppResult<()> {
        let session = self.engine.session();
        if session.id_is_valid() && session.name_is_valid() {
            Ok(())
        } else {
            Err(AppError::Rejected(GestureRejected::InvalidIdentity))
        }
    }

    /// Switch to a participant and load whatever the store has for them.
    ///
    /// Returns whether an earlier session existed. On a load failure the
    /// session is left empty with the new identity so the load can be retried.
    pub async fn begin_participant(&mut self, id: &str, name: &str) -> AppResult<bool> {
        let session = self.engine.session_mut();
        session.reset();
        session.set_identity(id, name);
        self.identity_gate()?;

        let session = self.engine.session();
        let (id, name) = (session.participant_id().to_string(), session.participant_name().to_string());
        let loaded = self
            .store
            .load_existing_participant_data(&id, &name)
            .await
            .map_err(|e| Error::LoadFailure(e.to_string()))?;
        let exists = loaded.exists;
        self.engine.load_session(loaded).map_err(Error::from)?;
        if exists {
            log::info!("Resuming session for participant {}", id);
        } else {
            log::info!("Starting new session for participant {}", id);
        }
        Ok(exists)
    }

    /// Whether the participant already has a stored session.
    pub async fn participant_exists(&self, id: &str, name: &str) -> AppResult<bool> {
        self.store
            .key_already_exists(id, name)
            .await
            .map_err(|e| AppError::Core(Error::LoadFailure(e.to_string())))
    }

    /// Remove a point while the edit window is open.
    pub fn remove_point(&mut self, index: usize) -> AppResult<ContactPoint> {
        if !self.engine.session_mut().can_edit() {
            return Err(AppError::Rejected(GestureRejected::EditWindowClosed));
        }
        Ok(self.engine.remove_point(index).map_err(Error::from)?)
    }

    /// Drop every point while the edit window is open.
    pub fn clear_all_points(&mut self) -> AppResult<()> {
        if !self.engine.session_mut().can_edit() {
            return Err(AppError::Rejected(GestureRejected::EditWindowClosed));
        }
        self.engine.clear_all_points();
        Ok(())
    }

    /// Persist the current session.
    ///
    /// Failures leave the in-memory session untouched so the save can be retried.
    pub async fn save(&mut self) -> AppResult<()> {
        self.identity_gate()?;
        let session = self.engine.session();
        let request = session.save_request().map_err(Error::from)?;
        let points = request.points.len();
        self.store
            .save_session_data(session.participant_id(), session.participant_name(), request)
            .await
            .map_err(Error::from)?;
        log::info!("Saved {} points for participant {}", points, session.participant_id());
        Ok(())
    }

    pub fn into_engine(self) -> InteractionEngine<S> {
        self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodymap_core::storage::MemoryStore;
    use bodymap_core::{
        EngineConfig, Figure, ManualClock, MarkingMode, QuestionKey, RecordOutcome, RecordingSurface, SessionState,
    };
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap()
    }

    fn coordinator() -> (Coordinator<RecordingSurface, MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(t0()));
        let config = EngineConfig::default();
        let session = SessionState::new(config.edit_time_limit(), clock.clone());
        let mut engine = InteractionEngine::new(session, config);
        for figure in Figure::ALL {
            engine.setup_figure(figure, RecordingSurface::new(100.0, 200.0));
        }
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        (Coordinator::new(engine, store), clock)
    }

    fn fill_session_data(c: &mut Coordinator<RecordingSurface, MemoryStore>) {
        let session = c.engine_mut().session_mut();
        session.set_session_data("calm", 4).unwrap();
        for key in QuestionKey::ALL {
            session.set_questionnaire_response(key, "yes");
        }
    }

    #[test]
    fn test_invalid_identity_is_rejected() {
        let (mut c, _) = coordinator();
        let result = pollster::block_on(c.begin_participant("abc", "Ada"));
        assert!(matches!(result, Err(AppError::Rejected(GestureRejected::InvalidIdentity))));
    }

    #[test]
    fn test_save_then_resume() {
        let (mut c, clock) = coordinator();
        assert!(!pollster::block_on(c.begin_participant("12", "Ada")).unwrap());
        c.engine_mut().set_marking_mode(MarkingMode::MarkTouched);
        assert!(matches!(c.engine_mut().record_point(Figure::Front, 50.0, 100.0), RecordOutcome::Recorded { .. }));
        fill_session_data(&mut c);
        pollster::block_on(c.save()).unwrap();
        assert!(pollster::block_on(c.participant_exists("12", "Ada")).unwrap());

        clock.advance(TimeDelta::minutes(10));
        assert!(pollster::block_on(c.begin_participant("12", "Ada")).unwrap());
        let session = c.engine().session();
        assert!(session.is_existing_session());
        assert_eq!(session.points_count(), 1);
        assert_eq!(session.first_entry_timestamp(), Some(t0()));
        assert_eq!(session.notes(), "calm");
    }

    #[test]
    fn test_failed_save_keeps_points() {
        let (mut c, _) = coordinator();
        pollster::block_on(c.begin_participant("12", "Ada")).unwrap();
        c.engine_mut().set_marking_mode(MarkingMode::MarkTouchedBy);
        c.engine_mut().record_point(Figure::Back, 10.0, 10.0);
        fill_session_data(&mut c);

        c.store().set_offline(true);
        let err = pollster::block_on(c.save()).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(c.engine().session().points_count(), 1);

        c.store().set_offline(false);
        pollster::block_on(c.save()).unwrap();
    }

    #[test]
    fn test_incomplete_questionnaire_is_not_retryable() {
        let (mut c, _) = coordinator();
        pollster::block_on(c.begin_participant("12", "Ada")).unwrap();
        c.engine_mut().session_mut().set_session_data("", 2).unwrap();
        let err = pollster::block_on(c.save()).unwrap_err();
        assert!(matches!(err, AppError::Core(Error::Validation(_))));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_load_failure_is_retryable() {
        let (mut c, _) = coordinator();
        c.store().set_offline(true);
        let err = pollster::block_on(c.begin_participant("12", "Ada")).unwrap_err();
        assert!(matches!(err, AppError::Core(Error::LoadFailure(_))));
        assert_eq!(c.engine().session().participant_id(), "12");
    }

    #[test]
    fn test_edits_gated_after_window_closes() {
        let (mut c, clock) = coordinator();
        pollster::block_on(c.begin_participant("12", "Ada")).unwrap();
        c.engine_mut().set_marking_mode(MarkingMode::MarkTouched);
        c.engine_mut().record_point(Figure::Left, 20.0, 20.0);

        clock.advance(TimeDelta::hours(2));
        assert!(matches!(c.remove_point(0), Err(AppError::Rejected(GestureRejected::EditWindowClosed))));
        assert!(c.clear_all_points().is_err());
        assert_eq!(c.engine().session().points_count(), 1);
    }

    #[test]
    fn test_remove_point_out_of_range() {
        let (mut c, _) = coordinator();
        pollster::block_on(c.begin_participant("12", "Ada")).unwrap();
        let err = c.remove_point(3).unwrap_err();
        assert!(matches!(err, AppError::Core(Error::IndexOutOfRange { index: 3, len: 0 })));
    }
}
