//! Time Ranges
//!
//! Half-open `[start, end)` intervals over naive timestamps. Graph items,
//! parent key maps and the visible window all use this one type.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    /// Create a range. Reversed bounds are swapped.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    /// Inclusive start.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Exclusive end.
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// `end - start`.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True when the two ranges share at least one instant.
    ///
    /// Touching ranges (`a.end == b.start`) do not intersect.
    pub fn intersects(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `instant` falls inside the range.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Smallest range covering both `self` and `other`.
    pub fn union(&self, other: &TimeRange) -> TimeRange {
        TimeRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
