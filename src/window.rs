#![forbid(unsafe_code)]

//! Splits a date range into windows narrow enough to stay under the search
//! endpoint's per-query result cap.
//!
//! Windows are produced most recent first. Adjacent windows share one
//! boundary instant: the `end` of a window is the `start` of the next one.

use crate::error::FinderError;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// A closed date range where `start` is the more recent bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, FinderError> {
        if start < end {
            return Err(FinderError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn width(&self) -> TimeDelta {
        self.start - self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}

/// Lazily yields the windows of a [`walk`]. Single pass.
#[derive(Debug, Clone)]
pub struct Windows {
    cursor: DateTime<Utc>,
    lower_bound: DateTime<Utc>,
    max_width: TimeDelta,
    done: bool,
}

impl Iterator for Windows {
    type Item = DateRange;

    fn next(&mut self) -> Option<DateRange> {
        if self.done {
            return None;
        }

        let next = match self.cursor.checked_sub_signed(self.max_width) {
            Some(next) if next > self.lower_bound => next,
            _ => {
                tracing::debug!("remaining span fits in one window, clipping to the lower bound");
                self.done = true;
                self.lower_bound
            }
        };

        let window = DateRange {
            start: self.cursor,
            end: next,
        };
        tracing::debug!(%window, width = %window.width(), "next time interval");
        self.cursor = next;
        Some(window)
    }
}

/// Walks `[end, start]` backwards in steps of at most `max_width`.
///
/// Both preconditions are checked here, so a bad range fails before the
/// first window exists and before any request is sent.
pub fn walk(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    max_width: TimeDelta,
) -> Result<Windows, FinderError> {
    let range = DateRange::new(start, end)?;
    if max_width <= TimeDelta::zero() {
        return Err(FinderError::InvalidInterval(max_width));
    }
    Ok(Windows {
        cursor: range.start,
        lower_bound: range.end,
        max_width,
        done: false,
    })
}
