//! Replay scripts: a participant session expressed as JSON.

use crate::{AppError, AppResult};
use bodymap_core::{DisplayFilter, Figure, MarkingMode, PointerEvent, Questionnaire};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Default figure canvas size in pixels.
pub const DEFAULT_SURFACE_WIDTH: u32 = 300;
pub const DEFAULT_SURFACE_HEIGHT: u32 = 600;

/// Pixel size of each figure surface, and the size it is shown at.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceSpec {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub display_width: Option<f64>,
    #[serde(default)]
    pub display_height: Option<f64>,
}

impl Default for SurfaceSpec {
    fn default() -> Self {
        Self {
            width: DEFAULT_SURFACE_WIDTH,
            height: DEFAULT_SURFACE_HEIGHT,
            display_width: None,
            display_height: None,
        }
    }
}

impl SurfaceSpec {
    /// On-screen size, defaulting to the pixel size.
    pub fn display_size(&self) -> (f64, f64) {
        (
            self.display_width.unwrap_or(self.width as f64),
            self.display_height.unwrap_or(self.height as f64),
        )
    }
}

/// One thing the participant did.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    Mode { mode: MarkingMode },
    Filter { filter: DisplayFilter },
    /// A raw pointer event in display coordinates.
    Pointer { figure: Figure, event: PointerEvent },
    /// Mouse click at display coordinates.
    Tap { figure: Figure, x: f64, y: f64 },
    RemovePoint { index: usize },
    ClearAll,
    /// Let time pass.
    Wait { seconds: i64 },
}

/// A whole participant session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayScript {
    pub participant_id: String,
    pub participant_name: String,
    /// Wall-clock time of the first step; defaults to now.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub surface: SurfaceSpec,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub confidence: Option<u8>,
    #[serde(default)]
    pub questionnaire: Questionnaire,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl ReplayScript {
    pub fn from_json(json: &str) -> AppResult<Self> {
        let script: Self = serde_json::from_str(json).map_err(|e| AppError::Script(e.to_string()))?;
        if script.surface.width == 0 || script.surface.height == 0 {
            return Err(AppError::Script("surface must have a non-zero size".to_string()));
        }
        Ok(script)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| AppError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }
}
