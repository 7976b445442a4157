//! Bodymap Application
//!
//! Headless coordinator that ties the interaction engine to a session store,
//! plus the replay and summary tooling used by the `bodymap` binary.

mod coordinator;
mod replay;
mod script;
mod summary;

pub use coordinator::Coordinator;
pub use replay::{ReplayReport, run_replay};
pub use script::{ReplayScript, ScriptStep, SurfaceSpec};
pub use summary::{SummaryReport, summarize};

use bodymap_core::GestureRejected;
use bodymap_render::RenderError;
use std::path::PathBuf;
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] bodymap_core::Error),
    /// A gated operation was refused; nothing changed.
    #[error("Not allowed: {0}")]
    Rejected(GestureRejected),
    #[error("Failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
    #[error("Invalid script: {0}")]
    Script(String),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl AppError {
    /// Whether retrying the same call might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Core(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;
