//! Bodymap Core Library
//!
//! Platform-agnostic session state, gesture handling and annotation engine
//! for marking points of physical contact on body silhouettes.

pub mod analysis;
pub mod clock;
pub mod config;
pub mod edit_window;
pub mod engine;
pub mod error;
pub mod image_cache;
pub mod input;
pub mod mode;
pub mod point;
pub mod session;
pub mod storage;
pub mod surface;
pub mod validation;

pub use analysis::{ContactSummary, Heatmap};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use edit_window::{EditWindow, EditWindowState, ScheduledCheck};
pub use engine::{GestureRejected, InteractionEngine, PointerOutcome, RecordOutcome, RedrawOutcome, draw_marker};
pub use error::{Error, SessionError, SessionResult};
pub use image_cache::{ImageCache, ImageLoadError, ImageLoadResult, ImageSlot, ImageSource};
pub use input::{Gesture, GestureTracker, PointerEvent, PointerKind};
pub use mode::{DisplayFilter, MarkingMode, derive_filter_and_direction};
pub use point::{ContactPoint, Direction, Figure, QuestionKey, Questionnaire, SessionData};
pub use session::SessionState;
pub use storage::{LoadedSession, SaveRequest, SessionRecord, SessionStore, StorageError, StorageResult};
pub use surface::{FigureImage, FigureSurface, RecordingSurface};
