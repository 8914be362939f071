//! Segment value object and its on-disk archive.

pub mod archive;

pub use archive::SegmentArchive;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::errors::{CoreError, CoreResult};
use crate::utils::datetime::{format_local, parse_local};

fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^segment_(?P<begin>\d{4}-\d{2}-\d{2}T\d{2}h\d{2}m\d{2})_(?P<dur>\d+(?:\.\d+)?)s\.ts(?P<hole>\.hole)?$")
            .expect("static segment filename regex")
    })
}

/// One captured `.ts` file of nominal fixed duration, named by its
/// absolute begin time.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub filename: PathBuf,
    pub basename: String,
    pub begin: NaiveDateTime,
    pub duration: f64,
    pub inpoint: Option<f64>,
    pub outpoint: Option<f64>,
    pub hole: bool,
}

impl Segment {
    pub fn new(dir: &Path, begin: NaiveDateTime, duration: f64, hole: bool) -> Self {
        let basename = Self::format_basename(begin, duration, hole);
        let filename = dir.join(&basename);
        Self {
            filename,
            basename,
            begin,
            duration,
            inpoint: None,
            outpoint: None,
            hole,
        }
    }

    /// Parse a segment filename (absolute or relative) per the authoritative
    /// grammar `segment_<ISO-local>_<duration>s.ts(.hole)?`.
    pub fn parse(filename: &Path) -> CoreResult<Self> {
        let basename = filename
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| CoreError::malformed_name(filename.display().to_string(), "not a valid filename"))?
            .to_string();

        let caps = segment_regex().captures(&basename).ok_or_else(|| {
            CoreError::malformed_name(basename.clone(), "does not match segment filename grammar")
        })?;

        let begin = parse_local(&caps["begin"])?;
        let duration: f64 = caps["dur"].parse().map_err(|_| {
            CoreError::malformed_name(basename.clone(), "duration is not a valid float")
        })?;
        let hole = caps.name("hole").is_some();

        Ok(Self {
            filename: filename.to_path_buf(),
            basename,
            begin,
            duration,
            inpoint: None,
            outpoint: None,
            hole,
        })
    }

    fn format_basename(begin: NaiveDateTime, duration: f64, hole: bool) -> String {
        let mut s = format!("segment_{}_{:.2}s.ts", format_local(begin), duration);
        if hole {
            s.push_str(".hole");
        }
        s
    }

    /// Re-derive the canonical basename from this segment's own fields.
    /// Used by the round-trip test and by `rename`-style operations.
    pub fn format(&self) -> String {
        Self::format_basename(self.begin, self.duration, self.hole)
    }

    pub fn end(&self) -> NaiveDateTime {
        self.begin + chrono::Duration::milliseconds((self.duration * 1000.0).round() as i64)
    }

    pub fn effective_duration(&self) -> f64 {
        let out = self.outpoint.unwrap_or(self.duration);
        let inp = self.inpoint.unwrap_or(0.0);
        out - inp
    }

    /// Validate the `inpoint`/`outpoint` invariants from the data model.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(inp) = self.inpoint {
            if !(0.0..=self.duration).contains(&inp) {
                return Err(CoreError::Internal(format!(
                    "segment {}: inpoint {inp} out of range [0, {}]",
                    self.basename, self.duration
                )));
            }
        }
        if let Some(out) = self.outpoint {
            let lower = self.inpoint.unwrap_or(0.0);
            if !(lower..=self.duration).contains(&out) {
                return Err(CoreError::Internal(format!(
                    "segment {}: outpoint {out} out of range [{lower}, {}]",
                    self.basename, self.duration
                )));
            }
        }
        Ok(())
    }
}
