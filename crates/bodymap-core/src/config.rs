//! Engine configuration.

use crate::error::{SessionError, SessionResult};
use crate::point::Direction;
use chrono::TimeDelta;
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Touch movement (surface pixels) at or above which a touch is a scroll.
pub const DEFAULT_TOUCH_MOVE_THRESHOLD: f64 = 10.0;
/// Default edit window: one hour.
pub const DEFAULT_EDIT_TIME_LIMIT_SECS: i64 = 60 * 60;
/// Marker radius in on-screen pixels.
pub const DEFAULT_MARKER_RADIUS: f64 = 6.0;
/// Bins per axis for contact heatmaps.
pub const DEFAULT_HEATMAP_BINS: usize = 15;
/// Upper bound on heatmap bins per axis.
pub const MAX_HEATMAP_BINS: usize = 256;

/// RGBA color stored as plain bytes so it survives JSON config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub fn to_color(self) -> Color {
        Color::from_rgba8(self.0, self.1, self.2, self.3)
    }
}

/// Tunables for the interaction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Touches moving this far or more are scrolls, not taps.
    pub touch_move_threshold: f64,
    /// Seconds after the first entry during which editing is allowed.
    pub edit_time_limit_secs: i64,
    /// Marker radius in on-screen pixels.
    pub marker_radius: f64,
    /// Marker color for "I touched" points.
    pub touched_color: Rgba,
    /// Marker color for "I was touched" points.
    pub touched_by_color: Rgba,
    /// Bins per axis when summarizing points.
    pub heatmap_bins: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            touch_move_threshold: DEFAULT_TOUCH_MOVE_THRESHOLD,
            edit_time_limit_secs: DEFAULT_EDIT_TIME_LIMIT_SECS,
            marker_radius: DEFAULT_MARKER_RADIUS,
            touched_color: Rgba(220, 38, 38, 255),    // Red
            touched_by_color: Rgba(37, 99, 235, 255), // Blue
            heatmap_bins: DEFAULT_HEATMAP_BINS,
        }
    }
}

impl EngineConfig {
    /// The edit window length. Saturates for values [`Self::validate`] rejects.
    pub fn edit_time_limit(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.edit_time_limit_secs).unwrap_or(TimeDelta::MAX)
    }

    /// Marker color for a direction.
    pub fn marker_color(&self, direction: Direction) -> Color {
        match direction {
            Direction::Touched => self.touched_color.to_color(),
            Direction::TouchedBy => self.touched_by_color.to_color(),
        }
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> SessionResult<()> {
        if self.edit_time_limit_secs <= 0 || TimeDelta::try_seconds(self.edit_time_limit_secs).is_none() {
            return Err(SessionError::Validation(format!(
                "edit_time_limit_secs out of range: {}",
                self.edit_time_limit_secs
            )));
        }
        if !self.touch_move_threshold.is_finite() || self.touch_move_threshold < 0.0 {
            return Err(SessionError::Validation(format!(
                "touch_move_threshold out of range: {}",
                self.touch_move_threshold
            )));
        }
        if !self.marker_radius.is_finite() || self.marker_radius < 0.0 {
            return Err(SessionError::Validation(format!("marker_radius out of range: {}", self.marker_radius)));
        }
        if !(1..=MAX_HEATMAP_BINS).contains(&self.heatmap_bins) {
            return Err(SessionError::Validation(format!(
                "heatmap_bins must be between 1 and {}: {}",
                MAX_HEATMAP_BINS, self.heatmap_bins
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> SessionResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SessionError::Validation(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.touch_move_threshold, 10.0);
        assert_eq!(config.edit_time_limit(), TimeDelta::hours(1));
        assert_ne!(config.touched_color, config.touched_by_color);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "edit_time_limit_secs": 120 }"#).unwrap();
        assert_eq!(config.edit_time_limit(), TimeDelta::minutes(2));
        assert_eq!(config.marker_radius, DEFAULT_MARKER_RADIUS);
    }

    #[test]
    fn test_rejects_unusable_time_limit() {
        for json in [
            r#"{ "edit_time_limit_secs": 9000000000000 }"#,
            r#"{ "edit_time_limit_secs": 0 }"#,
            r#"{ "edit_time_limit_secs": -5 }"#,
        ] {
            assert!(matches!(EngineConfig::from_json(json), Err(SessionError::Validation(_))), "{json}");
        }
        let config = EngineConfig { edit_time_limit_secs: i64::MAX, ..Default::default() };
        assert_eq!(config.edit_time_limit(), TimeDelta::MAX);
    }

    #[test]
    fn test_rejects_bad_bins_and_radius() {
        assert!(EngineConfig::from_json(r#"{ "heatmap_bins": 0 }"#).is_err());
        assert!(EngineConfig::from_json(r#"{ "heatmap_bins": 100000 }"#).is_err());
        assert!(EngineConfig::from_json(r#"{ "marker_radius": -1.0 }"#).is_err());
        assert!(EngineConfig::from_json("not json").is_err());
    }
}
