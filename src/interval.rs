//! Inclusive epoch ranges and the arithmetic used to plan API requests.
//!
//! An [`EpochInterval`] covers `[start, end]` in whole epoch seconds, both ends
//! included. None of the operations here perform I/O.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive range of epoch seconds.
///
/// `start <= end` holds for every interval the collector produces, but it is
/// not checked on construction. Use [`EpochInterval::is_empty`] to detect
/// inverted ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpochInterval {
    pub start: i64,
    pub end: i64,
}

/// How [`EpochInterval::divide_with`] treats the seconds left over when the
/// length is not a multiple of the number of parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Every part has length `floor(length / n)`; the trailing remainder is
    /// left uncovered and shows up as a gap on the next run.
    #[default]
    Drop,

    /// Parts keep the same start points but the last one ends at the
    /// original end, so the parts cover the interval exactly.
    ExtendLast,
}

/// Values that can be tested for containment in an [`EpochInterval`].
pub trait Contained {
    /// Returns true if `self` lies entirely within `interval`.
    fn is_within(&self, interval: &EpochInterval) -> bool;
}

impl Contained for EpochInterval {
    fn is_within(&self, interval: &EpochInterval) -> bool {
        interval.start <= self.start && self.end <= interval.end
    }
}

impl Contained for i64 {
    fn is_within(&self, interval: &EpochInterval) -> bool {
        interval.start <= *self && *self <= interval.end
    }
}

impl EpochInterval {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// True if `other` (an interval or a single epoch) lies within `[start, end]`.
    pub fn contains<C: Contained>(&self, other: C) -> bool {
        other.is_within(self)
    }

    /// Number of epoch seconds covered, `end - start + 1`, saturating at `i64::MAX`.
    pub fn length(&self) -> i64 {
        self.end.saturating_sub(self.start).saturating_add(1)
    }

    /// True for inverted ranges (`start > end`), which cover nothing.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Split into exactly `parts` contiguous sub-intervals of `floor(length / parts)`
    /// seconds each.
    ///
    /// `parts == 0` is treated as 1, and a single part returns the interval itself.
    /// When the length is not divisible by `parts` the remainder is dropped, so
    /// the result can cover less than `self`. See [`RemainderPolicy`].
    pub fn divide_into(&self, parts: usize) -> Vec<EpochInterval> {
        self.divide_with(parts, RemainderPolicy::Drop)
    }

    /// Same as [`divide_into`](Self::divide_into) with an explicit remainder policy.
    pub fn divide_with(&self, parts: usize, policy: RemainderPolicy) -> Vec<EpochInterval> {
        let parts = parts.max(1);
        if parts == 1 {
            return vec![*self];
        }

        let per_part = self.length() / parts as i64;
        let mut intervals: Vec<EpochInterval> = (0..parts as i64)
            .map(|i| {
                EpochInterval::new(self.start + i * per_part, self.start + (i + 1) * per_part - 1)
            })
            .collect();

        if policy == RemainderPolicy::ExtendLast {
            if let Some(last) = intervals.last_mut() {
                last.end = self.end;
            }
        }

        intervals
    }

    /// `floor(length / maximum_length)`.
    ///
    /// Returns 0 when the interval is shorter than `maximum_length`; callers
    /// treat 0 as "divide into 1". A non-positive `maximum_length` also yields 0.
    pub fn minimum_divisions(&self, maximum_length: i64) -> usize {
        if maximum_length <= 0 || self.length() <= 0 {
            return 0;
        }
        (self.length() / maximum_length) as usize
    }
}

impl fmt::Display for EpochInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
