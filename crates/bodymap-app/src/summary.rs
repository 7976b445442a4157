//! Aggregate report over every stored session.

use crate::AppResult;
use bodymap_core::storage::{SessionRecord, SessionStore};
use bodymap_core::{ContactPoint, ContactSummary, Direction, Error, Figure, Heatmap};
use std::fmt::Write;

/// Summary counts plus one heatmap per figure and direction.
#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub sessions: usize,
    /// Mean session confidence; `None` with no sessions.
    pub mean_confidence: Option<f64>,
    pub summary: ContactSummary,
    pub heatmaps: Vec<(Figure, Direction, Heatmap)>,
}

impl SummaryReport {
    /// Summarize stored sessions.
    pub fn from_records(records: &[SessionRecord], bins: usize) -> Self {
        let points: Vec<ContactPoint> = records.iter().flat_map(|r| r.points.iter().cloned()).collect();
        let mut report = Self::from_points(records.len(), &points, bins);
        if !records.is_empty() {
            let total: u32 = records.iter().map(|r| u32::from(r.session_data.confidence)).sum();
            report.mean_confidence = Some(f64::from(total) / records.len() as f64);
        }
        report
    }

    pub fn from_points(sessions: usize, points: &[ContactPoint], bins: usize) -> Self {
        let mut heatmaps = Vec::new();
        for figure in Figure::ALL {
            for direction in Direction::ALL {
                let map = Heatmap::for_figure(points, figure, Some(direction), bins);
                if map.total() > 0 {
                    heatmaps.push((figure, direction, map));
                }
            }
        }
        Self {
            sessions,
            mean_confidence: None,
            summary: ContactSummary::from_points(points),
            heatmaps,
        }
    }

    /// Plain-text rendering for the terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let s = &self.summary;
        let _ = writeln!(out, "Sessions: {}", self.sessions);
        match self.mean_confidence {
            Some(mean) => {
                let _ = writeln!(out, "Mean confidence: {:.2}", mean);
            }
            None => {
                let _ = writeln!(out, "Mean confidence: n/a");
            }
        }
        let _ = writeln!(out, "Total points: {}", s.total);
        let _ = writeln!(out, "Participants: {}", s.participants.join(", "));
        for (figure, count) in &s.by_figure {
            let _ = writeln!(out, "  {}: {}", figure, count);
        }
        for line in s.direction_lines() {
            let _ = writeln!(out, "  {}", line);
        }
        for (figure, direction, map) in &self.heatmaps {
            let _ = writeln!(out, "Heatmap {} / {} (max {}):", figure, direction.label(), map.max());
            for (x, y, count) in map.cells() {
                let _ = writeln!(out, "  [{:>2},{:>2}] {}", x, y, count);
            }
        }
        out
    }
}

/// Load every stored session and summarize its points.
pub async fn summarize<St: SessionStore + ?Sized>(store: &St, bins: usize) -> AppResult<SummaryReport> {
    let records = store
        .list_records()
        .await
        .map_err(|e| Error::LoadFailure(e.to_string()))?;
    log::debug!("Summarizing {} sessions", records.len());
    Ok(SummaryReport::from_records(&records, bins))
}
