//! Ranges: open-ended numeric intervals and time windows.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// An inclusive numeric interval; a missing bound is unbounded on that side.
///
/// Used for tau, seeing, cloud, and elevation limits. Matching is always by
/// intersection: an MSB valid "up to tau 0.12" overlaps a query at tau 0.10.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Range {
    /// A range with no bounds at all.
    pub const UNBOUNDED: Self = Self {
        min: None,
        max: None,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// A degenerate range holding a single value.
    pub fn exactly(value: f64) -> Self {
        Self::new(value, value)
    }

    /// Whether neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Whether the bounds are finite numbers in order.
    pub fn is_valid(&self) -> bool {
        let finite = |b: Option<f64>| b.is_none_or(f64::is_finite);
        if !finite(self.min) || !finite(self.max) {
            return false;
        }
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => lo <= hi,
            _ => true,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|lo| value >= lo) && self.max.is_none_or(|hi| value <= hi)
    }

    /// The overlap of two ranges, or `None` when they are disjoint.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        if let (Some(lo), Some(hi)) = (min, max)
            && lo > hi
        {
            return None;
        }
        Some(Self { min, max })
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.intersection(other).is_some()
    }
}

/// A half-open span of time `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        at >= self.start && at < self.end
    }

    /// Whether an optionally bounded span `[earliest, latest]` touches this window.
    pub fn overlaps_bounds(&self, earliest: Option<Timestamp>, latest: Option<Timestamp>) -> bool {
        earliest.is_none_or(|e| e < self.end) && latest.is_none_or(|l| l >= self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_bound_overlaps_lower_query() {
        let msb = Range::at_most(0.12);
        let query = Range::exactly(0.10);
        assert!(msb.overlaps(&query));
        assert_eq!(msb.intersection(&query), Some(Range::exactly(0.10)));
    }

    #[test]
    fn disjoint_ranges_do_not_overlap() {
        let msb = Range::new(0.05, 0.08);
        let query = Range::new(0.10, 0.20);
        assert!(!msb.overlaps(&query));
    }

    #[test]
    fn touching_bounds_overlap() {
        assert!(Range::new(0.0, 1.0).overlaps(&Range::new(1.0, 2.0)));
    }

    #[test]
    fn unbounded_overlaps_everything() {
        assert!(Range::UNBOUNDED.overlaps(&Range::new(5.0, 6.0)));
        assert!(Range::UNBOUNDED.is_unbounded());
    }

    #[test]
    fn validity() {
        assert!(Range::new(1.0, 2.0).is_valid());
        assert!(!Range::new(2.0, 1.0).is_valid());
        assert!(!Range::at_least(f64::NAN).is_valid());
        assert!(Range::UNBOUNDED.is_valid());
    }

    #[test]
    fn window_overlaps_bounds() {
        let start = Timestamp::new(1_000, 0).unwrap();
        let end = Timestamp::new(2_000, 0).unwrap();
        let window = TimeWindow::new(start, end);

        assert!(window.overlaps_bounds(None, None));
        assert!(window.overlaps_bounds(Some(Timestamp::new(1_500, 0).unwrap()), None));
        assert!(!window.overlaps_bounds(Some(end), None));
        assert!(!window.overlaps_bounds(None, Some(Timestamp::new(999, 0).unwrap())));
    }
}
