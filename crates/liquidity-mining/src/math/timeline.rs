//! # Week Timeline
//!
//! Splits a time interval into pieces that never straddle a week boundary.
//! Each piece is credited to the bucket of the week it falls in.

use crate::constants::{next_week, week_start};
use crate::types::Timestamp;

/// Slice of an interval lying inside a single week
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekSpan {
    /// Start of the week this span belongs to
    pub week: Timestamp,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl WeekSpan {
    pub fn duration(&self) -> Timestamp {
        self.end - self.start
    }
}

/// Iterator over the week-aligned pieces of `[from, to)`.
///
/// Yields nothing when `from >= to`.
#[derive(Debug, Clone)]
pub struct WeekSpans {
    cursor: Timestamp,
    end: Timestamp,
}

impl WeekSpans {
    pub fn new(from: Timestamp, to: Timestamp) -> Self {
        Self { cursor: from, end: to }
    }
}

impl Iterator for WeekSpans {
    type Item = WeekSpan;

    fn next(&mut self) -> Option<WeekSpan> {
        if self.cursor >= self.end {
            return None;
        }
        let span = WeekSpan {
            week: week_start(self.cursor),
            start: self.cursor,
            end: next_week(self.cursor).min(self.end),
        };
        self.cursor = span.end;
        Some(span)
    }
}
