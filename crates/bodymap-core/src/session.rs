//! Session state for the active participant.
//!
//! [`SessionState`] owns every piece of session-scoped data: the recorded
//! points, identity validity flags, questionnaire answers, the marking mode
//! and display filter, and the edit window. It performs no I/O.

use crate::clock::{Clock, SystemClock};
use crate::edit_window::{EditWindow, EditWindowState};
use crate::error::{SessionError, SessionResult};
use crate::mode::{DisplayFilter, MarkingMode, derive_filter_and_direction};
use crate::point::{ContactPoint, Direction, Figure, QuestionKey, Questionnaire};
use crate::storage::{LoadedSession, SaveRequest, SessionRecord};
use crate::validation::{is_valid_name, is_valid_numeric_id, validate_confidence};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;

/// All mutable state for one participant's session.
pub struct SessionState {
    participant_id: String,
    participant_name: String,
    id_is_valid: bool,
    name_is_valid: bool,
    is_existing_session: bool,
    collected_points: Vec<ContactPoint>,
    edit_window: EditWindow,
    notes: String,
    confidence: Option<u8>,
    questionnaire: Questionnaire,
    marking_mode: MarkingMode,
    current_direction: Option<Direction>,
    display_filter: DisplayFilter,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("participant_id", &self.participant_id)
            .field("participant_name", &self.participant_name)
            .field("points", &self.collected_points.len())
            .field("marking_mode", &self.marking_mode)
            .field("display_filter", &self.display_filter)
            .field("edit_window", &self.edit_window.state())
            .finish()
    }
}

impl SessionState {
    /// Create an empty session using the given edit window and clock.
    pub fn new(edit_time_limit: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        let (display_filter, current_direction) = derive_filter_and_direction(MarkingMode::default());
        Self {
            participant_id: String::new(),
            participant_name: String::new(),
            id_is_valid: false,
            name_is_valid: false,
            is_existing_session: false,
            collected_points: Vec::new(),
            edit_window: EditWindow::new(edit_time_limit),
            notes: String::new(),
            confidence: None,
            questionnaire: Questionnaire::default(),
            marking_mode: MarkingMode::default(),
            current_direction,
            display_filter,
            clock,
        }
    }

    /// Create an empty session on the system clock.
    pub fn with_system_clock(edit_time_limit: TimeDelta) -> Self {
        Self::new(edit_time_limit, Arc::new(SystemClock))
    }

    /// Current instant according to the session clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // --- Identity ---

    /// Set the participant identity and recompute the validity flags.
    pub fn set_identity(&mut self, id: &str, name: &str) {
        self.participant_id = id.trim().to_string();
        self.participant_name = name.trim().to_string();
        self.id_is_valid = is_valid_numeric_id(&self.participant_id);
        self.name_is_valid = is_valid_name(&self.participant_name);
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn participant_name(&self) -> &str {
        &self.participant_name
    }

    pub fn id_is_valid(&self) -> bool {
        self.id_is_valid
    }

    pub fn name_is_valid(&self) -> bool {
        self.name_is_valid
    }

    pub fn is_existing_session(&self) -> bool {
        self.is_existing_session
    }

    // --- Points ---

    /// Append a point. The first point ever added anchors the edit window.
    ///
    /// Returns the index of the new point.
    pub fn add_point(&mut self, point: ContactPoint) -> usize {
        if self.edit_window.first_entry().is_none() {
            let now = self.now();
            self.edit_window.anchor(point.timestamp(), now);
        }
        self.collected_points.push(point);
        self.collected_points.len() - 1
    }

    /// Remove the point at `index`, keeping the order of the rest.
    pub fn remove_point(&mut self, index: usize) -> SessionResult<ContactPoint> {
        let len = self.collected_points.len();
        if index >= len {
            return Err(SessionError::IndexOutOfRange { index, len });
        }
        Ok(self.collected_points.remove(index))
    }

    /// Remove every point. The edit window stays anchored to the first entry.
    pub fn clear_all_points(&mut self) {
        self.collected_points.clear();
    }

    pub fn has_points_in_direction(&self, direction: Direction) -> bool {
        self.collected_points.iter().any(|p| p.direction() == direction)
    }

    pub fn points_count(&self) -> usize {
        self.collected_points.len()
    }

    /// All points in insertion order.
    pub fn points(&self) -> &[ContactPoint] {
        &self.collected_points
    }

    /// Points passing the display filter, in insertion order.
    pub fn filtered_points(&self) -> Vec<&ContactPoint> {
        self.collected_points
            .iter()
            .filter(|p| self.display_filter.matches(p.direction()))
            .collect()
    }

    /// Filtered points that belong to `figure`.
    pub fn filtered_points_for(&self, figure: Figure) -> impl Iterator<Item = &ContactPoint> {
        self.collected_points
            .iter()
            .filter(move |p| p.figure() == figure && self.display_filter.matches(p.direction()))
    }

    // --- Session data ---

    /// Store notes and confidence; confidence must be within 1..=5.
    pub fn set_session_data(&mut self, notes: &str, confidence: u8) -> SessionResult<()> {
        validate_confidence(confidence)?;
        self.notes = notes.to_string();
        self.confidence = Some(confidence);
        Ok(())
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn confidence(&self) -> Option<u8> {
        self.confidence
    }

    pub fn set_questionnaire_response(&mut self, key: QuestionKey, value: &str) {
        self.questionnaire.set(key, value.to_string());
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    /// Questionnaire keys still unanswered, in `q1..q4` order.
    pub fn unanswered_items(&self) -> Vec<QuestionKey> {
        self.questionnaire.unanswered()
    }

    // --- Modes ---

    /// Switch marking mode; the direction and display filter follow it.
    pub fn set_marking_mode(&mut self, mode: MarkingMode) {
        let (filter, direction) = derive_filter_and_direction(mode);
        self.marking_mode = mode;
        self.current_direction = direction;
        self.display_filter = filter;
        log::debug!("Marking mode set to {}", mode.as_str());
    }

    pub fn marking_mode(&self) -> MarkingMode {
        self.marking_mode
    }

    /// Direction tagged on new points; `None` in view-only mode.
    pub fn current_direction(&self) -> Option<Direction> {
        self.current_direction
    }

    /// Override the filter until the next mode change.
    pub fn set_display_filter(&mut self, filter: DisplayFilter) {
        self.display_filter = filter;
    }

    pub fn display_filter(&self) -> DisplayFilter {
        self.display_filter
    }

    // --- Edit window ---

    /// Whether edits are allowed now. Closes the window if it has expired.
    pub fn can_edit(&mut self) -> bool {
        let now = self.now();
        self.edit_window.can_edit(now)
    }

    /// Run the scheduled edit-window check. Returns true if it just closed.
    pub fn tick(&mut self) -> bool {
        let now = self.now();
        self.edit_window.tick(now)
    }

    pub fn edit_window_state(&self) -> EditWindowState {
        self.edit_window.state()
    }

    pub fn edit_window(&self) -> &EditWindow {
        &self.edit_window
    }

    pub fn first_entry_timestamp(&self) -> Option<DateTime<Utc>> {
        self.edit_window.first_entry()
    }

    /// When the edit window closes, if it has been anchored.
    pub fn edit_deadline(&self) -> Option<DateTime<Utc>> {
        self.edit_window.deadline()
    }

    /// Cancel the scheduled edit-window check without touching anything else.
    pub fn cancel_pending_check(&mut self) {
        self.edit_window.cancel_timer();
    }

    // --- Lifecycle ---

    /// Return to a fresh session. The pending edit-window check is cancelled first.
    pub fn reset(&mut self) {
        self.edit_window.reset();
        self.participant_id.clear();
        self.participant_name.clear();
        self.id_is_valid = false;
        self.name_is_valid = false;
        self.is_existing_session = false;
        self.collected_points.clear();
        self.notes.clear();
        self.confidence = None;
        self.questionnaire = Questionnaire::default();
        self.set_marking_mode(MarkingMode::default());
    }

    /// Populate from a stored session.
    ///
    /// Identity is left as set by [`Self::set_identity`]. The edit window is
    /// anchored to the stored earliest timestamp, falling back to the oldest
    /// point; an expired anchor closes the window immediately.
    pub fn hydrate(&mut self, loaded: LoadedSession) -> SessionResult<()> {
        for point in &loaded.points {
            point.validate()?;
        }
        if let Some(data) = &loaded.session_data {
            validate_confidence(data.confidence)?;
        }

        self.edit_window.reset();
        self.is_existing_session = loaded.exists;
        self.collected_points = loaded.points;
        match loaded.session_data {
            Some(data) => {
                self.notes = data.notes;
                self.confidence = Some(data.confidence);
                self.questionnaire = data.questionnaire;
            }
            None => {
                self.notes.clear();
                self.confidence = None;
                self.questionnaire = Questionnaire::default();
            }
        }

        let anchor = loaded
            .earliest_timestamp
            .or_else(|| self.collected_points.iter().map(|p| p.timestamp()).min());
        if let Some(anchor) = anchor {
            let now = self.now();
            self.edit_window.anchor(anchor, now);
        }
        log::info!(
            "Hydrated session for participant {} ({} points, existing: {})",
            self.participant_id,
            self.collected_points.len(),
            self.is_existing_session
        );
        Ok(())
    }

    /// Build the payload a store needs to persist this session.
    pub fn save_request(&self) -> SessionResult<SaveRequest> {
        let confidence = self
            .confidence
            .ok_or_else(|| SessionError::Validation("confidence has not been set".to_string()))?;
        Ok(SaveRequest {
            notes: self.notes.clone(),
            confidence,
            questionnaire: self.questionnaire.clone(),
            points: self.collected_points.clone(),
            earliest_timestamp: self.edit_window.first_entry(),
        })
    }

    /// The record a store would write right now.
    pub fn snapshot(&self) -> SessionResult<SessionRecord> {
        let request = self.save_request()?;
        SessionRecord::from_request(&self.participant_id, &self.participant_name, request, self.now())
            .map_err(|e| SessionError::Validation(e.to_string()))
    }
}
