//! Contact points and the questionnaire that accompanies a session.

use crate::error::{SessionError, SessionResult};
use crate::validation::{validate_identity, validate_normalized};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four body-silhouette views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Figure {
    Front,
    Back,
    Left,
    Right,
}

impl Figure {
    /// All figures in display order.
    pub const ALL: [Figure; 4] = [Figure::Front, Figure::Back, Figure::Left, Figure::Right];

    /// Wire name, also used as the asset file stem.
    pub fn as_str(self) -> &'static str {
        match self {
            Figure::Front => "front",
            Figure::Back => "back",
            Figure::Left => "left",
            Figure::Right => "right",
        }
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Figure {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Figure::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| SessionError::Validation(format!("unknown figure: {s:?}")))
    }
}

/// Who initiated the contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// "I touched".
    Touched,
    /// "I was touched".
    TouchedBy,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Touched, Direction::TouchedBy];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Touched => "touched",
            Direction::TouchedBy => "touched_by",
        }
    }

    /// Participant-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Touched => "I touched",
            Direction::TouchedBy => "I was touched",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| SessionError::Validation(format!("unknown direction: {s:?}")))
    }
}

/// A single recorded contact. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPoint {
    participant_id: String,
    participant_name: String,
    figure: Figure,
    direction: Direction,
    x_norm: f64,
    y_norm: f64,
    timestamp: DateTime<Utc>,
}

impl ContactPoint {
    /// Build a point, rejecting bad identity fields or coordinates outside `[0, 1]`.
    pub fn new(
        participant_id: &str,
        participant_name: &str,
        figure: Figure,
        direction: Direction,
        x_norm: f64,
        y_norm: f64,
        timestamp: DateTime<Utc>,
    ) -> SessionResult<Self> {
        validate_identity(participant_id, participant_name)?;
        validate_normalized(x_norm, y_norm)?;
        Ok(Self {
            participant_id: participant_id.to_string(),
            participant_name: participant_name.to_string(),
            figure,
            direction,
            x_norm,
            y_norm,
            timestamp,
        })
    }

    /// Re-check a point that arrived through deserialization.
    pub fn validate(&self) -> SessionResult<()> {
        validate_identity(&self.participant_id, &self.participant_name)?;
        validate_normalized(self.x_norm, self.y_norm)
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn participant_name(&self) -> &str {
        &self.participant_name
    }

    pub fn figure(&self) -> Figure {
        self.figure
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn x_norm(&self) -> f64 {
        self.x_norm
    }

    pub fn y_norm(&self) -> f64 {
        self.y_norm
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Questionnaire item keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKey {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl QuestionKey {
    pub const ALL: [QuestionKey; 4] = [QuestionKey::Q1, QuestionKey::Q2, QuestionKey::Q3, QuestionKey::Q4];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKey::Q1 => "q1",
            QuestionKey::Q2 => "q2",
            QuestionKey::Q3 => "q3",
            QuestionKey::Q4 => "q4",
        }
    }
}

impl FromStr for QuestionKey {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SessionError::Validation(format!("unknown questionnaire key: {s:?}")))
    }
}

/// Answers to the four questionnaire items; `None` until answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questionnaire {
    #[serde(default)]
    pub q1: Option<String>,
    #[serde(default)]
    pub q2: Option<String>,
    #[serde(default)]
    pub q3: Option<String>,
    #[serde(default)]
    pub q4: Option<String>,
}

impl Questionnaire {
    fn slot_mut(&mut self, key: QuestionKey) -> &mut Option<String> {
        match key {
            QuestionKey::Q1 => &mut self.q1,
            QuestionKey::Q2 => &mut self.q2,
            QuestionKey::Q3 => &mut self.q3,
            QuestionKey::Q4 => &mut self.q4,
        }
    }

    pub fn get(&self, key: QuestionKey) -> Option<&str> {
        match key {
            QuestionKey::Q1 => self.q1.as_deref(),
            QuestionKey::Q2 => self.q2.as_deref(),
            QuestionKey::Q3 => self.q3.as_deref(),
            QuestionKey::Q4 => self.q4.as_deref(),
        }
    }

    pub fn set(&mut self, key: QuestionKey, value: String) {
        *self.slot_mut(key) = Some(value);
    }

    /// Keys without an answer, in `q1..q4` order.
    pub fn unanswered(&self) -> Vec<QuestionKey> {
        QuestionKey::ALL
            .into_iter()
            .filter(|k| self.get(*k).is_none())
            .collect()
    }
}

/// Session-level answers persisted next to the points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub notes: String,
    pub confidence: u8,
    pub questionnaire: Questionnaire,
    pub last_edited: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_point_rejects_out_of_range() {
        let result = ContactPoint::new("1", "Ada", Figure::Front, Direction::Touched, 1.5, 0.2, ts());
        assert!(matches!(result, Err(SessionError::Validation(_))));
        let result = ContactPoint::new("1", "", Figure::Front, Direction::Touched, 0.5, 0.2, ts());
        assert!(result.is_err());
    }

    #[test]
    fn test_point_wire_names() {
        let p = ContactPoint::new("12", "Ada", Figure::Left, Direction::TouchedBy, 0.25, 0.75, ts()).unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["participantId"], "12");
        assert_eq!(json["participantName"], "Ada");
        assert_eq!(json["figure"], "left");
        assert_eq!(json["direction"], "touched_by");
        assert_eq!(json["xNorm"], 0.25);
        assert_eq!(json["yNorm"], 0.75);
        assert_eq!(json["timestamp"], "2025-03-01T09:30:00Z");
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("back".parse::<Figure>().unwrap(), Figure::Back);
        assert!("top".parse::<Figure>().is_err());
        assert_eq!("touched_by".parse::<Direction>().unwrap(), Direction::TouchedBy);
        assert!("q5".parse::<QuestionKey>().is_err());
    }

    #[test]
    fn test_questionnaire_unanswered_order() {
        let mut q = Questionnaire::default();
        q.set(QuestionKey::Q3, "sometimes".into());
        assert_eq!(q.unanswered(), vec![QuestionKey::Q1, QuestionKey::Q2, QuestionKey::Q4]);
        assert_eq!(q.get(QuestionKey::Q3), Some("sometimes"));
    }

    #[test]
    fn test_session_data_wire_names() {
        let data = SessionData {
            notes: "ok".into(),
            confidence: 3,
            questionnaire: Questionnaire::default(),
            last_edited: ts(),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["lastEdited"], "2025-03-01T09:30:00Z");
        assert!(json["questionnaire"]["q1"].is_null());
    }
}
