//! Timestamp formats used by the segment filename grammar and the
//! segmenter's `#EXT-X-PROGRAM-DATE-TIME` playlist tag.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};

use crate::errors::{CoreError, CoreResult};

/// `segment_<ISO-local>_<duration>s.ts` uses this exact, timezone-less,
/// local-time format for its begin timestamp.
pub const SEGMENT_LOCAL_FORMAT: &str = "%Y-%m-%dT%Hh%Mm%S";

/// Format a local-time timestamp the way the segment filename grammar
/// requires it: no timezone suffix, second precision.
pub fn format_local(dt: NaiveDateTime) -> String {
    dt.format(SEGMENT_LOCAL_FORMAT).to_string()
}

/// Parse a segment filename's embedded timestamp. The value carries no
/// timezone and is interpreted in the host local zone by the caller.
pub fn parse_local(s: &str) -> CoreResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, SEGMENT_LOCAL_FORMAT).map_err(CoreError::from)
}

/// Parse an `#EXT-X-PROGRAM-DATE-TIME:<value>` tag body, e.g.
/// `2025-12-26T14:11:48.000+01:00`.
pub fn parse_program_date_time(s: &str) -> CoreResult<DateTime<FixedOffset>> {
    DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .map_err(CoreError::from)
}

/// Convert a [`DateTime<FixedOffset>`] into the host local-time
/// [`NaiveDateTime`] used for segment filenames.
pub fn to_local_naive(dt: DateTime<FixedOffset>) -> NaiveDateTime {
    dt.with_timezone(&Local).naive_local()
}
