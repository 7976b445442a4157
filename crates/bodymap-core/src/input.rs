//! Pointer input and tap-versus-scroll disambiguation.
//!
//! Positions handed to [`GestureTracker`] are in surface pixels. A mouse
//! release is always a click. A touch is a tap only if it ends less than the
//! threshold away from where it started; otherwise it was a scroll or pan.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Which device produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PointerEvent {
    Down { position: Point, kind: PointerKind },
    Move { position: Point, kind: PointerKind },
    Up { position: Point, kind: PointerKind },
    /// The platform abandoned the touch (e.g. it became a native scroll).
    Cancel,
    Wheel { position: Point, delta: Vec2 },
}

impl PointerEvent {
    /// The same event with its position mapped through `f`.
    pub fn map_position(self, f: impl Fn(Point) -> Point) -> Self {
        match self {
            PointerEvent::Down { position, kind } => PointerEvent::Down { position: f(position), kind },
            PointerEvent::Move { position, kind } => PointerEvent::Move { position: f(position), kind },
            PointerEvent::Up { position, kind } => PointerEvent::Up { position: f(position), kind },
            PointerEvent::Cancel => PointerEvent::Cancel,
            PointerEvent::Wheel { position, delta } => PointerEvent::Wheel { position: f(position), delta },
        }
    }
}

/// What a pointer event amounted to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Nothing to act on yet.
    Pending,
    /// A click or short tap at this surface position.
    Tap(Point),
    /// A touch that moved too far to count as a tap.
    Scroll { distance: f64 },
    /// Wheel input, swallowed on figure surfaces.
    WheelSuppressed,
}

/// Per-surface touch/click state.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    threshold: f64,
    touch_start: Option<Point>,
    touch_current: Option<Point>,
}

impl GestureTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            touch_start: None,
            touch_current: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether a touch is in progress.
    pub fn is_touching(&self) -> bool {
        self.touch_start.is_some()
    }

    /// Displacement of the current touch from its start, if any.
    pub fn touch_delta(&self) -> Option<Vec2> {
        match (self.touch_start, self.touch_current) {
            (Some(start), Some(current)) => Some(current - start),
            _ => None,
        }
    }

    /// Feed one event and classify it.
    pub fn handle(&mut self, event: PointerEvent) -> Gesture {
        match event {
            PointerEvent::Down { position, kind: PointerKind::Touch } => {
                self.touch_start = Some(position);
                self.touch_current = Some(position);
                Gesture::Pending
            }
            PointerEvent::Move { position, kind: PointerKind::Touch } => {
                if self.touch_start.is_some() {
                    self.touch_current = Some(position);
                }
                Gesture::Pending
            }
            PointerEvent::Up { position, kind: PointerKind::Touch } => {
                let Some(start) = self.touch_start.take() else {
                    return Gesture::Pending;
                };
                self.touch_current = None;
                let distance = (position - start).hypot();
                if distance < self.threshold {
                    Gesture::Tap(position)
                } else {
                    Gesture::Scroll { distance }
                }
            }
            PointerEvent::Up { position, kind: PointerKind::Mouse } => Gesture::Tap(position),
            PointerEvent::Down { kind: PointerKind::Mouse, .. }
            | PointerEvent::Move { kind: PointerKind::Mouse, .. } => Gesture::Pending,
            PointerEvent::Cancel => {
                self.touch_start = None;
                self.touch_current = None;
                Gesture::Pending
            }
            PointerEvent::Wheel { .. } => Gesture::WheelSuppressed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(tracker: &mut GestureTracker, from: Point, to: Point) -> Gesture {
        tracker.handle(PointerEvent::Down { position: from, kind: PointerKind::Touch });
        tracker.handle(PointerEvent::Move { position: to, kind: PointerKind::Touch });
        tracker.handle(PointerEvent::Up { position: to, kind: PointerKind::Touch })
    }

    #[test]
    fn test_stationary_touch_is_tap() {
        let mut tracker = GestureTracker::new(10.0);
        let p = Point::new(40.0, 40.0);
        assert_eq!(touch(&mut tracker, p, p), Gesture::Tap(p));
        assert!(!tracker.is_touching());
    }

    #[test]
    fn test_touch_just_under_threshold_is_tap() {
        let mut tracker = GestureTracker::new(10.0);
        let end = Point::new(9.9, 0.0);
        assert_eq!(touch(&mut tracker, Point::ZERO, end), Gesture::Tap(end));
    }

    #[test]
    fn test_touch_at_threshold_is_scroll() {
        let mut tracker = GestureTracker::new(10.0);
        let gesture = touch(&mut tracker, Point::ZERO, Point::new(6.0, 8.0));
        assert_eq!(gesture, Gesture::Scroll { distance: 10.0 });
    }

    #[test]
    fn test_mouse_click_has_no_threshold() {
        let mut tracker = GestureTracker::new(10.0);
        tracker.handle(PointerEvent::Down { position: Point::ZERO, kind: PointerKind::Mouse });
        let end = Point::new(200.0, 0.0);
        let gesture = tracker.handle(PointerEvent::Up { position: end, kind: PointerKind::Mouse });
        assert_eq!(gesture, Gesture::Tap(end));
    }

    #[test]
    fn test_cancel_discards_touch() {
        let mut tracker = GestureTracker::new(10.0);
        tracker.handle(PointerEvent::Down { position: Point::ZERO, kind: PointerKind::Touch });
        tracker.handle(PointerEvent::Cancel);
        let gesture = tracker.handle(PointerEvent::Up { position: Point::ZERO, kind: PointerKind::Touch });
        assert_eq!(gesture, Gesture::Pending);
    }

    #[test]
    fn test_wheel_is_suppressed() {
        let mut tracker = GestureTracker::new(10.0);
        let gesture = tracker.handle(PointerEvent::Wheel { position: Point::ZERO, delta: Vec2::new(0.0, 3.0) });
        assert_eq!(gesture, Gesture::WheelSuppressed);
    }

    #[test]
    fn test_touch_delta_tracks_moves() {
        let mut tracker = GestureTracker::new(10.0);
        tracker.handle(PointerEvent::Down { position: Point::new(1.0, 1.0), kind: PointerKind::Touch });
        tracker.handle(PointerEvent::Move { position: Point::new(4.0, 5.0), kind: PointerKind::Touch });
        let delta = tracker.touch_delta().unwrap();
        assert!((delta.x - 3.0).abs() < f64::EPSILON);
        assert!((delta.y - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_event_json_shape() {
        let event: PointerEvent = serde_json::from_str(
            r#"{ "type": "up", "position": { "x": 12.0, "y": 30.0 }, "kind": "touch" }"#,
        )
        .unwrap();
        assert!(matches!(event, PointerEvent::Up { kind: PointerKind::Touch, .. }));
    }
}
