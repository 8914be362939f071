//! Line decoder: classifies one line of the supervised pipeline's merged
//! stdout/stderr, separating the noise the original log stream is full of
//! from the handful of lines that drive the archiver.

use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

use crate::utils::datetime::parse_program_date_time;

#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    /// Progress chatter (`frame=...`) or an "Opening ... for reading"
    /// line, dropped without logging.
    Ignored,
    /// The segmenter logged the program-date-time tag it is about to
    /// write, ahead of the playlist rewrite completing.
    ProgramDateTime(DateTime<FixedOffset>),
    /// `Opening '<path>' for writing`.
    OpeningForWriting(PathBuf),
    /// Anything else, surfaced so the caller can log it at the run's
    /// current level.
    Other(String),
}

fn opening_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Opening '([^']+)' for (reading|writing)").expect("static opening-line regex"))
}

fn program_date_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"#EXT-X-PROGRAM-DATE-TIME:(\S+?)[)'\s]*$").expect("static program-date-time regex")
    })
}

pub fn classify_line(line: &str) -> LineEvent {
    let line = line.trim_end();

    if line.starts_with("frame=") {
        return LineEvent::Ignored;
    }

    if let Some(caps) = program_date_time_regex().captures(line) {
        if let Ok(dt) = parse_program_date_time(&caps[1]) {
            return LineEvent::ProgramDateTime(dt);
        }
    }

    if let Some(caps) = opening_regex().captures(line) {
        let path = PathBuf::from(&caps[1]);
        return match &caps[2] {
            "writing" => LineEvent::OpeningForWriting(path),
            _ => LineEvent::Ignored,
        };
    }

    LineEvent::Other(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_frame_progress_lines() {
        assert_eq!(classify_line("frame=  123 fps=25 q=-1.0"), LineEvent::Ignored);
    }

    #[test]
    fn drops_https_opening_for_reading() {
        assert_eq!(classify_line("Opening 'https://example.com/stream' for reading"), LineEvent::Ignored);
    }

    #[test]
    fn captures_opening_for_writing() {
        match classify_line("Opening 'tmp/segment_1700000000.ts' for writing") {
            LineEvent::OpeningForWriting(path) => assert_eq!(path, PathBuf::from("tmp/segment_1700000000.ts")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn captures_program_date_time_inside_skip_wrapper() {
        match classify_line("Skip ('#EXT-X-PROGRAM-DATE-TIME:2025-12-26T14:11:48.000+01:00')") {
            LineEvent::ProgramDateTime(dt) => assert_eq!(dt.offset().local_minus_utc(), 3600),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn other_lines_pass_through() {
        match classify_line("some unrelated diagnostic") {
            LineEvent::Other(s) => assert_eq!(s, "some unrelated diagnostic"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
