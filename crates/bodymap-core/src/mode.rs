//! Marking modes and the display filter they drive.

use crate::error::SessionError;
use crate::point::Direction;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a click on a figure currently means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkingMode {
    /// Record "I was touched" points.
    MarkTouchedBy,
    /// Record "I touched" points.
    MarkTouched,
    /// Look only; nothing is recorded.
    #[default]
    ViewAll,
}

impl MarkingMode {
    pub const ALL: [MarkingMode; 3] = [
        MarkingMode::MarkTouchedBy,
        MarkingMode::MarkTouched,
        MarkingMode::ViewAll,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MarkingMode::MarkTouchedBy => "mark_touched_by",
            MarkingMode::MarkTouched => "mark_touched",
            MarkingMode::ViewAll => "view_all",
        }
    }

    /// Whether clicks in this mode produce points.
    pub fn is_recording(self) -> bool {
        !matches!(self, MarkingMode::ViewAll)
    }
}

impl FromStr for MarkingMode {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarkingMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| SessionError::Validation(format!("unknown marking mode: {s:?}")))
    }
}

/// Which points are drawn on the figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFilter {
    #[default]
    All,
    Touched,
    TouchedBy,
}

impl DisplayFilter {
    pub const ALL: [DisplayFilter; 3] = [DisplayFilter::All, DisplayFilter::Touched, DisplayFilter::TouchedBy];

    pub fn as_str(self) -> &'static str {
        match self {
            DisplayFilter::All => "all",
            DisplayFilter::Touched => "touched",
            DisplayFilter::TouchedBy => "touched_by",
        }
    }

    /// Whether a point with `direction` passes this filter.
    pub fn matches(self, direction: Direction) -> bool {
        match self {
            DisplayFilter::All => true,
            DisplayFilter::Touched => direction == Direction::Touched,
            DisplayFilter::TouchedBy => direction == Direction::TouchedBy,
        }
    }
}

impl FromStr for DisplayFilter {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisplayFilter::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| SessionError::Validation(format!("unknown display filter: {s:?}")))
    }
}

/// The filter and recording direction implied by a marking mode.
///
/// `ViewAll` records nothing, so it has no direction.
pub fn derive_filter_and_direction(mode: MarkingMode) -> (DisplayFilter, Option<Direction>) {
    match mode {
        MarkingMode::MarkTouchedBy => (DisplayFilter::TouchedBy, Some(Direction::TouchedBy)),
        MarkingMode::MarkTouched => (DisplayFilter::Touched, Some(Direction::Touched)),
        MarkingMode::ViewAll => (DisplayFilter::All, None),
    }
}
