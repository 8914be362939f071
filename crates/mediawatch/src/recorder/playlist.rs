//! Stateless parser for the segmenter's rolling single-entry HLS playlist.

use chrono::{DateTime, FixedOffset};

use crate::utils::datetime::parse_program_date_time;

/// One fully-parsed playlist rewrite cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEvent {
    pub duration: f64,
    pub begin: DateTime<FixedOffset>,
    pub segment_uri: String,
}

/// How many of the three required fields a playlist body yielded, and
/// their values where present. Kept separate from [`PlaylistEvent`] so
/// callers can distinguish "fully parsed" from "partially parsed" without
/// re-scanning.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlaylistFields {
    pub duration: Option<f64>,
    pub begin: Option<DateTime<FixedOffset>>,
    pub segment_uri: Option<String>,
}

impl PlaylistFields {
    pub fn found_count(&self) -> usize {
        [self.duration.is_some(), self.begin.is_some(), self.segment_uri.is_some()]
            .into_iter()
            .filter(|b| *b)
            .count()
    }

    pub fn into_event(self) -> Option<PlaylistEvent> {
        match (self.duration, self.begin, self.segment_uri) {
            (Some(duration), Some(begin), Some(segment_uri)) => Some(PlaylistEvent {
                duration,
                begin,
                segment_uri,
            }),
            _ => None,
        }
    }
}

/// Scan a playlist body for the one `#EXTINF:`, one
/// `#EXT-X-PROGRAM-DATE-TIME:`, and one `segment_`-prefixed URI line. Only
/// the first occurrence of each is kept, matching "one duration, one
/// timestamp, one URI" per cycle.
pub fn scan_playlist(contents: &str) -> PlaylistFields {
    let mut fields = PlaylistFields::default();

    for line in contents.lines() {
        let line = line.trim();

        if fields.duration.is_none() {
            if let Some(rest) = line.strip_prefix("#EXTINF:") {
                let number = rest.split(',').next().unwrap_or(rest);
                fields.duration = number.trim().parse::<f64>().ok();
            }
        }

        if fields.begin.is_none() {
            if let Some(rest) = line.strip_prefix("#EXT-X-PROGRAM-DATE-TIME:") {
                fields.begin = parse_program_date_time(rest.trim()).ok();
            }
        }

        if fields.segment_uri.is_none() && line.len() >= 8 && &line[..8] == "segment_" {
            fields.segment_uri = Some(line.to_string());
        }
    }

    fields
}
