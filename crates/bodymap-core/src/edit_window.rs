//! The time-boxed edit window and its scheduled recheck.
//!
//! A window opens with the session and closes once, at
//! `first_entry + limit`. Closing is triggered either by the scheduled
//! check firing in [`EditWindow::tick`] or eagerly when [`EditWindow::can_edit`]
//! is asked after the deadline. There is no way back to open; a new
//! session gets a new window.

use chrono::{DateTime, TimeDelta, Utc};

/// Whether edits are still allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditWindowState {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckStatus {
    Pending,
    Fired,
    Cancelled,
}

/// Handle to the single pending deadline check of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCheck {
    id: u64,
    deadline: DateTime<Utc>,
    status: CheckStatus,
}

impl ScheduledCheck {
    fn new(id: u64, deadline: DateTime<Utc>) -> Self {
        Self { id, deadline, status: CheckStatus::Pending }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.status == CheckStatus::Pending
    }

    /// Cancel the check. Returns false if it had already fired or been cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.is_pending() {
            self.status = CheckStatus::Cancelled;
            true
        } else {
            false
        }
    }

    /// Fire if pending and due.
    fn fire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_pending() && now >= self.deadline {
            self.status = CheckStatus::Fired;
            true
        } else {
            false
        }
    }
}

/// Edit-window state machine for one session.
#[derive(Debug, Clone)]
pub struct EditWindow {
    limit: TimeDelta,
    first_entry: Option<DateTime<Utc>>,
    state: EditWindowState,
    timer: Option<ScheduledCheck>,
    next_check_id: u64,
}

impl EditWindow {
    pub fn new(limit: TimeDelta) -> Self {
        Self {
            limit,
            first_entry: None,
            state: EditWindowState::Open,
            timer: None,
            next_check_id: 1,
        }
    }

    pub fn limit(&self) -> TimeDelta {
        self.limit
    }

    pub fn state(&self) -> EditWindowState {
        self.state
    }

    pub fn first_entry(&self) -> Option<DateTime<Utc>> {
        self.first_entry
    }

    /// Instant at which the window closes, once anchored.
    ///
    /// `None` while unanchored, or when `first_entry + limit` is past the
    /// last representable instant; such a window never closes.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.first_entry.and_then(|t| t.checked_add_signed(self.limit))
    }

    /// The currently armed check, if any.
    pub fn timer(&self) -> Option<&ScheduledCheck> {
        self.timer.as_ref()
    }

    /// Anchor the window to its first entry. Later calls are ignored.
    ///
    /// Arms the deadline check, or closes immediately when the anchor is
    /// already older than the limit (e.g. a hydrated session).
    pub fn anchor(&mut self, first_entry: DateTime<Utc>, now: DateTime<Utc>) {
        if self.first_entry.is_some() {
            return;
        }
        self.first_entry = Some(first_entry);
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.close();
            }
            Some(deadline) => self.arm(deadline),
            None => log::debug!("Edit window deadline out of range; window stays open"),
        }
    }

    /// Replace any pending check with one due at `deadline`.
    fn arm(&mut self, deadline: DateTime<Utc>) {
        self.cancel_timer();
        let id = self.next_check_id;
        self.next_check_id += 1;
        log::debug!("Edit window check #{} armed for {}", id, deadline.to_rfc3339());
        self.timer = Some(ScheduledCheck::new(id, deadline));
    }

    /// Best-effort, idempotent cancellation of the pending check.
    pub fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            if timer.cancel() {
                log::debug!("Edit window check #{} cancelled", timer.id());
            }
        }
    }

    /// Run the scheduled check. Returns true if this call closed the window.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let fired = self.timer.as_mut().is_some_and(|t| t.fire_if_due(now));
        fired && self.close()
    }

    /// Whether edits are allowed at `now`, closing the window if it has expired.
    pub fn can_edit(&mut self, now: DateTime<Utc>) -> bool {
        if self.state == EditWindowState::Closed {
            return false;
        }
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.close();
                false
            }
            _ => true,
        }
    }

    /// Move to `Closed`. Returns false if already closed.
    fn close(&mut self) -> bool {
        if self.state == EditWindowState::Closed {
            return false;
        }
        self.state = EditWindowState::Closed;
        self.cancel_timer();
        log::info!("Edit window closed");
        true
    }

    /// Back to a fresh, unanchored window. Cancels the pending check first.
    pub fn reset(&mut self) {
        self.cancel_timer();
        self.timer = None;
        self.first_entry = None;
        self.state = EditWindowState::Open;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_unanchored_window_is_open() {
        let mut window = EditWindow::new(TimeDelta::hours(1));
        assert!(window.can_edit(t0() + TimeDelta::days(30)));
        assert!(window.timer().is_none());
    }

    #[test]
    fn test_boundary() {
        let mut window = EditWindow::new(TimeDelta::hours(1));
        window.anchor(t0(), t0());
        assert!(window.can_edit(t0() + TimeDelta::hours(1) - TimeDelta::milliseconds(1)));
        assert!(!window.can_edit(t0() + TimeDelta::hours(1)));
        assert_eq!(window.state(), EditWindowState::Closed);
    }

    #[test]
    fn test_tick_fires_once() {
        let mut window = EditWindow::new(TimeDelta::hours(1));
        window.anchor(t0(), t0());
        assert!(!window.tick(t0() + TimeDelta::minutes(59)));
        assert!(window.tick(t0() + TimeDelta::hours(1)));
        assert!(!window.tick(t0() + TimeDelta::hours(2)));
        assert!(!window.can_edit(t0() + TimeDelta::hours(2)));
    }

    #[test]
    fn test_eager_close_disarms_timer() {
        let mut window = EditWindow::new(TimeDelta::hours(1));
        window.anchor(t0(), t0());
        assert!(!window.can_edit(t0() + TimeDelta::hours(3)));
        assert!(!window.timer().unwrap().is_pending());
        assert!(!window.tick(t0() + TimeDelta::hours(3)));
    }

    #[test]
    fn test_anchor_in_past_closes_immediately() {
        let mut window = EditWindow::new(TimeDelta::hours(1));
        window.anchor(t0(), t0() + TimeDelta::hours(5));
        assert_eq!(window.state(), EditWindowState::Closed);
        assert!(window.timer().is_none());
    }

    #[test]
    fn test_anchor_is_sticky() {
        let mut window = EditWindow::new(TimeDelta::hours(1));
        window.anchor(t0(), t0());
        window.anchor(t0() + TimeDelta::minutes(30), t0() + TimeDelta::minutes(30));
        assert_eq!(window.first_entry(), Some(t0()));
        assert_eq!(window.timer().unwrap().id(), 1);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut check = ScheduledCheck::new(1, t0());
        assert!(check.cancel());
        assert!(!check.cancel());
        assert!(!check.fire_if_due(t0()));
    }

    #[test]
    fn test_unrepresentable_deadline_never_closes() {
        let mut window = EditWindow::new(TimeDelta::MAX);
        window.anchor(t0(), t0());
        assert!(window.deadline().is_none());
        assert!(window.timer().is_none());
        assert!(window.can_edit(t0() + TimeDelta::days(365 * 100)));
        assert!(!window.tick(t0() + TimeDelta::days(365 * 100)));
        assert_eq!(window.state(), EditWindowState::Open);
    }

    #[test]
    fn test_reset_reopens_new_instance() {
        let mut window = EditWindow::new(TimeDelta::hours(1));
        window.anchor(t0(), t0() + TimeDelta::hours(2));
        assert_eq!(window.state(), EditWindowState::Closed);
        window.reset();
        assert_eq!(window.state(), EditWindowState::Open);
        assert!(window.first_entry().is_none());
        assert!(window.timer().is_none());
    }
}
