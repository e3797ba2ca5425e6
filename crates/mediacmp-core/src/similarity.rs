//! Decides whether two same-named files are the same asset.

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::authority::Authority;
use crate::media::{MediaFile, MediaKind};

pub const DEFAULT_SIZE_MARGIN: f64 = 0.01;
pub const DEFAULT_TIME_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    /// Relative size tolerance, 0.01 = 1%
    pub size: f64,
    pub time: TimeDelta,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE_MARGIN,
            time: TimeDelta::seconds(DEFAULT_TIME_MARGIN_SECS),
        }
    }
}

/// Ladder step that judged a pair to be the same asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Both mtimes agree with the filename date.
    BothTimesMatch,
    /// Target mtime agrees, byte sizes identical.
    EqualSize,
    /// Target mtime agrees, sizes within the size margin.
    SizeWithinMargin,
    /// Nothing contradicted sameness.
    Fallback,
}

impl Rule {
    pub fn authority(self) -> Authority {
        match self {
            Rule::BothTimesMatch | Rule::Fallback => Authority::FlagLarger,
            Rule::EqualSize | Rule::SizeWithinMargin => Authority::FlagTarget,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Both photos carry capture dates and they disagree.
    CaptureDateMismatch,
    Same(Rule),
}

/// True iff `t1 - t2 <= margin`.
///
/// One-sided: `t1` may trail `t2` by any amount and still count as within
/// margin. The ladder below relies on exactly this comparison.
pub fn times_within_margin(t1: NaiveDateTime, t2: NaiveDateTime, margin: TimeDelta) -> bool {
    t1 - t2 <= margin
}

/// True iff `max / min - 1 <= margin`. Zero sizes never qualify.
pub fn sizes_within_margin(a: u64, b: u64, margin: f64) -> bool {
    let (a, b) = (a as f64, b as f64);
    a.max(b) / a.min(b) - 1.0 <= margin
}

pub fn files_size_within_margin(left: &MediaFile, right: &MediaFile, margin: f64) -> bool {
    sizes_within_margin(left.size, right.size, margin)
}

/// Run the decision ladder over a source (`left`) / target (`right`) pair.
pub fn evaluate(
    kind: MediaKind,
    left: &MediaFile,
    right: &MediaFile,
    filename_date: NaiveDateTime,
    margins: &Margins,
) -> Verdict {
    if kind == MediaKind::Photo {
        if let (Some(l), Some(r)) = (left.capture_date, right.capture_date) {
            if l != r {
                return Verdict::CaptureDateMismatch;
            }
        }
    }

    let target_on_time = times_within_margin(right.modified, filename_date, margins.time);
    let source_on_time = times_within_margin(left.modified, filename_date, margins.time);

    let rule = if target_on_time && source_on_time {
        Rule::BothTimesMatch
    } else if target_on_time && left.size == right.size {
        Rule::EqualSize
    } else if target_on_time && files_size_within_margin(left, right, margins.size) {
        Rule::SizeWithinMargin
    } else {
        Rule::Fallback
    };
    Verdict::Same(rule)
}
