pub mod exif;
pub mod filename;
pub mod mp4;

use chrono::{DateTime, Local, NaiveDateTime};

/// Stand-in for a missing filename date. Nothing is ever "ahead of" it by
/// less than a sane margin, so the time rules never match against it.
pub const UNKNOWN_DATE: NaiveDateTime = NaiveDateTime::MIN;

/// Convert a UTC epoch to the local naive wall-clock time.
/// Filesystem times are compared against EXIF and filename dates, which carry
/// no timezone and are local time as-is.
pub fn local_from_unix(secs: i64, nanos: u32) -> Option<NaiveDateTime> {
    let utc = DateTime::from_timestamp(secs, nanos)?;
    Some(utc.with_timezone(&Local).naive_local())
}
