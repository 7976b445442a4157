//! Aggregate statistics over recorded contact points.

use crate::config::MAX_HEATMAP_BINS;
use crate::point::{ContactPoint, Direction, Figure};
use std::collections::BTreeMap;

/// Counts across a set of points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactSummary {
    pub total: usize,
    /// Distinct participant ids in first-seen order.
    pub participants: Vec<String>,
    pub by_figure: BTreeMap<Figure, usize>,
    pub touched: usize,
    pub touched_by: usize,
}

impl ContactSummary {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a ContactPoint>) -> Self {
        let mut summary = Self::default();
        for point in points {
            summary.total += 1;
            if !summary.participants.iter().any(|p| p == point.participant_id()) {
                summary.participants.push(point.participant_id().to_string());
            }
            *summary.by_figure.entry(point.figure()).or_default() += 1;
            match point.direction() {
                Direction::Touched => summary.touched += 1,
                Direction::TouchedBy => summary.touched_by += 1,
            }
        }
        summary
    }

    pub fn count_for(&self, direction: Direction) -> usize {
        match direction {
            Direction::Touched => self.touched,
            Direction::TouchedBy => self.touched_by,
        }
    }

    /// Direction counts with participant-facing labels.
    pub fn direction_lines(&self) -> Vec<String> {
        Direction::ALL
            .into_iter()
            .map(|d| format!("{}: {}", d.label(), self.count_for(d)))
            .collect()
    }
}

/// A square 2D histogram over normalized coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    bins: usize,
    /// Row-major, `counts[y * bins + x]`.
    counts: Vec<u32>,
}

impl Heatmap {
    /// Bin `points`. A coordinate of exactly 1.0 falls in the last bin.
    ///
    /// `bins` is clamped to `1..=MAX_HEATMAP_BINS`.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a ContactPoint>, bins: usize) -> Self {
        let bins = bins.clamp(1, MAX_HEATMAP_BINS);
        let mut counts = vec![0; bins * bins];
        let bin_of = |v: f64| ((v * bins as f64) as usize).min(bins - 1);
        for point in points {
            let x = bin_of(point.x_norm());
            let y = bin_of(point.y_norm());
            counts[y * bins + x] += 1;
        }
        Self { bins, counts }
    }

    /// Bin only points on `figure`, optionally restricted to one direction.
    pub fn for_figure<'a>(
        points: impl IntoIterator<Item = &'a ContactPoint>,
        figure: Figure,
        direction: Option<Direction>,
        bins: usize,
    ) -> Self {
        let filtered = points
            .into_iter()
            .filter(|p| p.figure() == figure && direction.is_none_or(|d| p.direction() == d));
        Self::from_points(filtered, bins)
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Count in column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> u32 {
        if x < self.bins && y < self.bins {
            self.counts[y * self.bins + x]
        } else {
            0
        }
    }

    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Non-empty cells as `(x, y, count)`, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .map(|(i, c)| (i % self.bins, i / self.bins, *c))
    }
}
