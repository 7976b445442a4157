//! Interaction engine: pointer input in, contact points and redraws out.
//!
//! The engine owns one surface and one gesture tracker per figure, the
//! figure image cache, and the active [`SessionState`]. Everything runs on
//! the caller's thread; the only suspension points are image loads.

use crate::config::EngineConfig;
use crate::error::SessionResult;
use crate::image_cache::{ImageCache, ImageLoadError, ImageLoadResult, ImageSlot, ImageSource};
use crate::input::{Gesture, GestureTracker, PointerEvent};
use crate::mode::{DisplayFilter, MarkingMode};
use crate::point::{ContactPoint, Direction, Figure};
use crate::session::SessionState;
use crate::storage::LoadedSession;
use crate::surface::{FigureSurface, denormalize, display_to_surface, normalize, surface_scale};
use futures_util::future::join_all;
use kurbo::Point;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Why a gesture did not produce a point. Not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureRejected {
    /// Participant id or name is not valid yet.
    InvalidIdentity,
    /// The edit window has closed.
    EditWindowClosed,
    /// View-only mode records nothing.
    ViewOnly,
    /// The figure has no usable surface.
    SurfaceUnavailable,
    /// The pointer position is not a finite coordinate.
    InvalidPosition,
}

impl fmt::Display for GestureRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            GestureRejected::InvalidIdentity => "enter a valid participant id and name first",
            GestureRejected::EditWindowClosed => "editing window closed",
            GestureRejected::ViewOnly => "select a marking mode to record contacts",
            GestureRejected::SurfaceUnavailable => "figure is not ready",
            GestureRejected::InvalidPosition => "pointer position could not be read",
        };
        f.write_str(msg)
    }
}

/// Outcome of [`InteractionEngine::record_point`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded { index: usize },
    Rejected(GestureRejected),
}

/// Outcome of one pointer event on a figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Part of a gesture still in progress.
    Idle,
    /// Wheel input; the host must suppress default scrolling.
    Suppressed,
    /// A touch that moved too far: treated as a scroll, no point.
    Scrolled,
    Recorded { index: usize },
    Rejected(GestureRejected),
}

/// Outcome of a redraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawOutcome {
    Drawn { markers: usize },
    /// The figure image is still loading; the redraw runs once it settles.
    Deferred,
    NotSetUp,
}

struct FigureSlot<S> {
    surface: S,
    gesture: GestureTracker,
}

/// Draw one marker at normalized coordinates.
///
/// The radius is scaled by the surface's intrinsic/display ratio on every
/// call so markers keep the same on-screen size when the surface is resized.
pub fn draw_marker<S: FigureSurface>(
    config: &EngineConfig,
    surface: &mut S,
    x_norm: f64,
    y_norm: f64,
    direction: Direction,
) {
    let center = denormalize(surface.size(), x_norm, y_norm);
    let (scale, _) = surface_scale(surface);
    surface.fill_circle(center, config.marker_radius * scale, config.marker_color(direction));
}

/// Drives annotation on the four figures for one session.
pub struct InteractionEngine<S: FigureSurface> {
    config: EngineConfig,
    session: SessionState,
    figures: BTreeMap<Figure, FigureSlot<S>>,
    images: ImageCache,
    deferred: BTreeSet<Figure>,
}

impl<S: FigureSurface> InteractionEngine<S> {
    pub fn new(session: SessionState, config: EngineConfig) -> Self {
        Self {
            config,
            session,
            figures: BTreeMap::new(),
            images: ImageCache::new(),
            deferred: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    /// Swap in a new session, cancelling the old one's pending check first.
    pub fn replace_session(&mut self, session: SessionState) -> SessionState {
        self.session.cancel_pending_check();
        let old = std::mem::replace(&mut self.session, session);
        self.redraw_all_figures();
        old
    }

    // --- Figures ---

    /// Attach a surface to a figure, replacing any previous one.
    pub fn setup_figure(&mut self, figure: Figure, surface: S) {
        let gesture = GestureTracker::new(self.config.touch_move_threshold);
        self.figures.insert(figure, FigureSlot { surface, gesture });
    }

    pub fn surface(&self, figure: Figure) -> Option<&S> {
        self.figures.get(&figure).map(|slot| &slot.surface)
    }

    pub fn surface_mut(&mut self, figure: Figure) -> Option<&mut S> {
        self.figures.get_mut(&figure).map(|slot| &mut slot.surface)
    }

    // --- Images ---

    /// Mark figures as loading. Returns those that actually need a load.
    pub fn begin_preload(&mut self, figures: &[Figure]) -> Vec<Figure> {
        figures
            .iter()
            .copied()
            .filter(|figure| self.images.mark_pending(*figure))
            .collect()
    }

    /// Record a finished load and run any redraw that was waiting on it.
    pub fn settle_image(&mut self, figure: Figure, result: ImageLoadResult) {
        self.images.settle(figure, result);
        if self.deferred.remove(&figure) {
            self.redraw_figure(figure);
        }
    }

    /// Load every figure image not already loaded or loading.
    ///
    /// Loads run concurrently; one failure does not stop the others.
    /// Returns the failures so the caller can offer a retry.
    pub async fn preload_images<I: ImageSource + ?Sized>(&mut self, source: &I) -> Vec<(Figure, ImageLoadError)> {
        let figures = self.begin_preload(&Figure::ALL);
        let loads = figures
            .into_iter()
            .map(|figure| async move { (figure, source.load(figure).await) });
        let results = join_all(loads).await;

        let mut failures = Vec::new();
        for (figure, result) in results {
            if let Err(e) = &result {
                failures.push((figure, e.clone()));
            }
            self.settle_image(figure, result);
        }
        failures
    }

    // --- Input ---

    /// Feed a pointer event in display coordinates for `figure`.
    pub fn handle_pointer_event(&mut self, figure: Figure, event: PointerEvent) -> PointerOutcome {
        let Some(slot) = self.figures.get_mut(&figure) else {
            return PointerOutcome::Rejected(GestureRejected::SurfaceUnavailable);
        };
        let surface = &slot.surface;
        let event = event.map_position(|p| display_to_surface(surface, p));
        let gesture = slot.gesture.handle(event);

        match gesture {
            Gesture::Pending => PointerOutcome::Idle,
            Gesture::WheelSuppressed => PointerOutcome::Suppressed,
            Gesture::Scroll { distance } => {
                log::debug!("Touch on {} moved {:.1}px, treating as scroll", figure, distance);
                PointerOutcome::Scrolled
            }
            Gesture::Tap(position) => match self.record_point(figure, position.x, position.y) {
                RecordOutcome::Recorded { index } => PointerOutcome::Recorded { index },
                RecordOutcome::Rejected(reason) => PointerOutcome::Rejected(reason),
            },
        }
    }

    fn gate(&mut self) -> Option<GestureRejected> {
        if !self.session.id_is_valid() || !self.session.name_is_valid() {
            return Some(GestureRejected::InvalidIdentity);
        }
        if !self.session.can_edit() {
            return Some(GestureRejected::EditWindowClosed);
        }
        if !self.session.marking_mode().is_recording() {
            return Some(GestureRejected::ViewOnly);
        }
        None
    }

    /// Turn an accepted tap at surface pixel `(raw_x, raw_y)` into a point.
    pub fn record_point(&mut self, figure: Figure, raw_x: f64, raw_y: f64) -> RecordOutcome {
        if let Some(reason) = self.gate() {
            log::debug!("Gesture on {} rejected: {}", figure, reason);
            return RecordOutcome::Rejected(reason);
        }
        let Some(direction) = self.session.current_direction() else {
            return RecordOutcome::Rejected(GestureRejected::ViewOnly);
        };
        if !raw_x.is_finite() || !raw_y.is_finite() {
            log::warn!("Gesture on {} rejected: non-finite position ({}, {})", figure, raw_x, raw_y);
            return RecordOutcome::Rejected(GestureRejected::InvalidPosition);
        }
        let normalized = self
            .figures
            .get(&figure)
            .and_then(|slot| normalize(slot.surface.size(), Point::new(raw_x, raw_y)));
        let Some((x_norm, y_norm)) = normalized else {
            log::debug!("Gesture on {} rejected: no usable surface", figure);
            return RecordOutcome::Rejected(GestureRejected::SurfaceUnavailable);
        };

        let point = ContactPoint::new(
            self.session.participant_id(),
            self.session.participant_name(),
            figure,
            direction,
            x_norm,
            y_norm,
            self.session.now(),
        );
        let point = match point {
            Ok(point) => point,
            Err(e) => {
                log::warn!("Discarding malformed point on {}: {}", figure, e);
                return RecordOutcome::Rejected(GestureRejected::InvalidPosition);
            }
        };

        let index = self.session.add_point(point);
        log::debug!("Recorded {} point #{} on {} at ({:.3}, {:.3})", direction, index, figure, x_norm, y_norm);
        self.redraw_figure(figure);
        RecordOutcome::Recorded { index }
    }

    /// Run the scheduled edit-window check. Returns true if the window just closed.
    pub fn tick(&mut self) -> bool {
        self.session.tick()
    }

    // --- State changes that need a redraw ---

    /// Remove a point and redraw its figure.
    pub fn remove_point(&mut self, index: usize) -> SessionResult<ContactPoint> {
        let removed = self.session.remove_point(index)?;
        self.redraw_figure(removed.figure());
        Ok(removed)
    }

    pub fn clear_all_points(&mut self) {
        self.session.clear_all_points();
        self.redraw_all_figures();
    }

    pub fn set_marking_mode(&mut self, mode: MarkingMode) {
        self.session.set_marking_mode(mode);
        self.redraw_all_figures();
    }

    pub fn set_display_filter(&mut self, filter: DisplayFilter) {
        self.session.set_display_filter(filter);
        self.redraw_all_figures();
    }

    /// Hydrate the session from a stored one and redraw everything.
    pub fn load_session(&mut self, loaded: LoadedSession) -> SessionResult<()> {
        self.session.hydrate(loaded)?;
        self.redraw_all_figures();
        Ok(())
    }

    // --- Drawing ---

    /// Points passing the display filter, in insertion order.
    pub fn get_filtered_points(&self) -> Vec<&ContactPoint> {
        self.session.filtered_points()
    }

    /// Clear the figure, draw its background, then its filtered markers.
    ///
    /// While the figure image is loading the redraw is queued instead.
    pub fn redraw_figure(&mut self, figure: Figure) -> RedrawOutcome {
        if self.images.is_pending(figure) {
            self.deferred.insert(figure);
            return RedrawOutcome::Deferred;
        }
        let Some(slot) = self.figures.get_mut(&figure) else {
            return RedrawOutcome::NotSetUp;
        };
        let surface = &mut slot.surface;

        surface.clear();
        match self.images.slot(figure) {
            Some(ImageSlot::Ready(image)) => surface.draw_image(image),
            Some(ImageSlot::Failed(_)) => log::debug!("Drawing {} without background", figure),
            Some(ImageSlot::Pending) | None => {}
        }

        let mut markers = 0;
        for point in self.session.filtered_points_for(figure) {
            draw_marker(&self.config, surface, point.x_norm(), point.y_norm(), point.direction());
            markers += 1;
        }
        RedrawOutcome::Drawn { markers }
    }

    pub fn redraw_all_figures(&mut self) {
        for figure in Figure::ALL {
            self.redraw_figure(figure);
        }
    }
}
