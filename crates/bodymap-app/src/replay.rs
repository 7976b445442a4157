//! Drive a coordinator through a replay script.

use crate::coordinator::Coordinator;
use crate::script::{ReplayScript, ScriptStep};
use crate::{AppError, AppResult};
use bodymap_core::storage::SessionStore;
use bodymap_core::{Error, FigureSurface, ManualClock, PointerEvent, PointerKind, PointerOutcome, QuestionKey};
use chrono::TimeDelta;
use kurbo::Point;

/// What happened while replaying.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// An earlier session was loaded.
    pub resumed: bool,
    pub recorded: usize,
    pub rejected: usize,
    pub scrolled: usize,
    pub removed: usize,
    /// The edit window closed during a `wait`.
    pub window_closed: bool,
}

impl ReplayReport {
    fn count(&mut self, outcome: PointerOutcome) {
        match outcome {
            PointerOutcome::Recorded { .. } => self.recorded += 1,
            PointerOutcome::Rejected(reason) => {
                log::info!("Gesture rejected: {}", reason);
                self.rejected += 1;
            }
            PointerOutcome::Scrolled => self.scrolled += 1,
            PointerOutcome::Idle | PointerOutcome::Suppressed => {}
        }
    }
}

/// Replay `script` against `coordinator`, advancing `clock` on `wait` steps.
///
/// The coordinator's session must read time from `clock`. Gated steps are
/// counted as rejected rather than failing the replay.
pub async fn run_replay<S, St>(
    coordinator: &mut Coordinator<S, St>,
    script: &ReplayScript,
    clock: &ManualClock,
) -> AppResult<ReplayReport>
where
    S: FigureSurface,
    St: SessionStore + ?Sized,
{
    let mut report = ReplayReport {
        resumed: coordinator
            .begin_participant(&script.participant_id, &script.participant_name)
            .await?,
        ..Default::default()
    };

    let session = coordinator.engine_mut().session_mut();
    if let Some(confidence) = script.confidence {
        session.set_session_data(&script.notes, confidence).map_err(Error::from)?;
    }
    for key in QuestionKey::ALL {
        if let Some(answer) = script.questionnaire.get(key) {
            session.set_questionnaire_response(key, answer);
        }
    }

    for step in &script.steps {
        match step {
            ScriptStep::Mode { mode } => coordinator.engine_mut().set_marking_mode(*mode),
            ScriptStep::Filter { filter } => coordinator.engine_mut().set_display_filter(*filter),
            ScriptStep::Pointer { figure, event } => {
                let outcome = coordinator.engine_mut().handle_pointer_event(*figure, event.clone());
                report.count(outcome);
            }
            ScriptStep::Tap { figure, x, y } => {
                let position = Point::new(*x, *y);
                let engine = coordinator.engine_mut();
                engine.handle_pointer_event(*figure, PointerEvent::Down { position, kind: PointerKind::Mouse });
                let outcome = engine.handle_pointer_event(*figure, PointerEvent::Up { position, kind: PointerKind::Mouse });
                report.count(outcome);
            }
            ScriptStep::RemovePoint { index } => match coordinator.remove_point(*index) {
                Ok(_) => report.removed += 1,
                Err(e) => {
                    log::warn!("Could not remove point {}: {}", index, e);
                    report.rejected += 1;
                }
            },
            ScriptStep::ClearAll => match coordinator.clear_all_points() {
                Ok(()) => {}
                Err(e) => {
                    log::warn!("Could not clear points: {}", e);
                    report.rejected += 1;
                }
            },
            ScriptStep::Wait { seconds } => {
                let delta = TimeDelta::try_seconds(*seconds)
                    .filter(|d| *d >= TimeDelta::zero())
                    .ok_or_else(|| AppError::Script(format!("wait out of range: {} seconds", seconds)))?;
                if !clock.advance(delta) {
                    return Err(AppError::Script(format!("wait out of range: {} seconds", seconds)));
                }
                if coordinator.engine_mut().tick() {
                    log::info!("Edit window closed");
                    report.window_closed = true;
                }
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodymap_core::storage::MemoryStore;
    use bodymap_core::{Clock, EngineConfig, Figure, InteractionEngine, RecordingSurface, SessionState};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn setup() -> (Coordinator<RecordingSurface, MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 5, 5, 12, 0, 0).unwrap()));
        let config = EngineConfig::default();
        let session = SessionState::new(config.edit_time_limit(), clock.clone());
        let mut engine = InteractionEngine::new(session, config);
        for figure in Figure::ALL {
            engine.setup_figure(figure, RecordingSurface::new(100.0, 200.0).with_display_size(50.0, 100.0));
        }
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        (Coordinator::new(engine, store), clock)
    }

    fn script(steps: &str) -> ReplayScript {
        let json = format!(
            r#"{{ "participantId": "3", "participantName": "Cy", "confidence": 4,
                 "questionnaire": {{ "q1": "a", "q2": "b", "q3": "c", "q4": "d" }},
                 "steps": [{}] }}"#,
            steps
        );
        ReplayScript::from_json(&json).unwrap()
    }

    #[test]
    fn test_taps_scale_from_display() {
        let (mut c, clock) = setup();
        let s = script(
            r#"{ "action": "mode", "mode": "mark_touched_by" },
               { "action": "tap", "figure": "right", "x": 25, "y": 50 }"#,
        );
        let report = pollster::block_on(run_replay(&mut c, &s, &clock)).unwrap();
        assert_eq!(report.recorded, 1);
        let point = &c.engine().session().points()[0];
        assert_eq!((point.x_norm(), point.y_norm()), (0.5, 0.5));
        assert_eq!(c.engine().session().confidence(), Some(4));
    }

    #[test]
    fn test_view_mode_and_scroll_record_nothing() {
        let (mut c, clock) = setup();
        let s = script(
            r#"{ "action": "tap", "figure": "front", "x": 5, "y": 5 },
               { "action": "mode", "mode": "mark_touched" },
               { "action": "pointer", "figure": "front",
                 "event": { "type": "down", "position": { "x": 0, "y": 0 }, "kind": "touch" } },
               { "action": "pointer", "figure": "front",
                 "event": { "type": "up", "position": { "x": 30, "y": 0 }, "kind": "touch" } }"#,
        );
        let report = pollster::block_on(run_replay(&mut c, &s, &clock)).unwrap();
        assert_eq!(report.rejected, 1);
        assert_eq!(report.scrolled, 1);
        assert_eq!(report.recorded, 0);
    }

    #[test]
    fn test_wait_closes_window() {
        let (mut c, clock) = setup();
        let s = script(
            r#"{ "action": "mode", "mode": "mark_touched" },
               { "action": "tap", "figure": "back", "x": 10, "y": 10 },
               { "action": "wait", "seconds": 3601 },
               { "action": "tap", "figure": "back", "x": 20, "y": 20 },
               { "action": "remove_point", "index": 0 }"#,
        );
        let report = pollster::block_on(run_replay(&mut c, &s, &clock)).unwrap();
        assert!(report.window_closed);
        assert_eq!(report.recorded, 1);
        assert_eq!(report.rejected, 2);
        assert_eq!(c.engine().session().points_count(), 1);
    }

    #[test]
    fn test_wait_out_of_range_is_a_script_error() {
        for seconds in [i64::MAX, -1, 9_000_000_000_000] {
            let (mut c, clock) = setup();
            let before = clock.now();
            let s = script(&format!(r#"{{ "action": "wait", "seconds": {} }}"#, seconds));
            let result = pollster::block_on(run_replay(&mut c, &s, &clock));
            assert!(matches!(result, Err(AppError::Script(_))), "{seconds}");
            assert_eq!(clock.now(), before);
        }
    }

    #[test]
    fn test_replay_then_save() {
        let (mut c, clock) = setup();
        let s = script(
            r#"{ "action": "mode", "mode": "mark_touched" },
               { "action": "tap", "figure": "left", "x": 10, "y": 10 },
               { "action": "tap", "figure": "left", "x": 12, "y": 30 },
               { "action": "remove_point", "index": 0 }"#,
        );
        let report = pollster::block_on(run_replay(&mut c, &s, &clock)).unwrap();
        assert_eq!(report.removed, 1);
        pollster::block_on(c.save()).unwrap();

        let again = pollster::block_on(run_replay(&mut c, &script(""), &clock)).unwrap();
        assert!(again.resumed);
        assert_eq!(c.engine().session().points_count(), 1);
    }
}
