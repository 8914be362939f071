//! Timeline: a named, persisted `[begin, begin+duration)` window over the
//! segment archive.

pub mod slice;

pub use slice::Slice;

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, CoreResult};
use crate::segment::{Segment, SegmentArchive};

/// The reserved name denoting the identity view over the whole archive.
/// Never persisted, never mutated, never removed.
pub const GLOB_NAME: &str = "glob";

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static timeline name regex"))
}

/// ISO-ish local timestamp format used inside persisted timeline JSON,
/// distinct from the segment filename's format since this one does carry
/// the usual `:` separators (it is never embedded in a path).
const PERSISTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn seconds_to_duration(secs: f64) -> Duration {
    Duration::milliseconds((secs * 1000.0).round() as i64)
}

#[derive(Debug, Serialize, Deserialize)]
struct TimelineFile {
    begin: String,
    duration: f64,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    pub name: String,
    pub begin: NaiveDateTime,
    pub duration: f64,
    segments: Vec<Segment>,
    archive: SegmentArchive,
}

impl Timeline {
    pub fn validate_name(name: &str) -> CoreResult<()> {
        if name == GLOB_NAME {
            return Ok(());
        }
        if !name_regex().is_match(name) {
            return Err(CoreError::malformed_name(name, "timeline names must match ^[A-Za-z0-9_-]+$"));
        }
        Ok(())
    }

    fn json_path(archive: &SegmentArchive, name: &str) -> PathBuf {
        archive.timelines_dir().join(format!("{name}.json"))
    }

    fn read_persisted(archive: &SegmentArchive, name: &str) -> CoreResult<Option<(NaiveDateTime, f64)>> {
        let path = Self::json_path(archive, name);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        let file: TimelineFile = serde_json::from_str(&contents)?;
        let begin = NaiveDateTime::parse_from_str(&file.begin, PERSISTED_FORMAT)?;
        Ok(Some((begin, file.duration)))
    }

    fn default_window(all: &[Segment]) -> (NaiveDateTime, f64) {
        match (all.first(), all.last()) {
            (Some(first), Some(last)) => {
                let end = last.begin + seconds_to_duration(last.duration);
                let span = (end - first.begin).num_milliseconds() as f64 / 1000.0;
                (first.begin, span.max(0.0))
            }
            _ => {
                let today = chrono::Local::now().date_naive().and_hms_opt(0, 0, 0).expect("midnight is always valid");
                (today, 0.0)
            }
        }
    }

    fn windowed_segments(all: &[Segment], begin: NaiveDateTime, duration: f64) -> Vec<Segment> {
        let end = begin + seconds_to_duration(duration);
        let mut retained: Vec<Segment> = all
            .iter()
            .filter(|s| s.begin + seconds_to_duration(s.duration) > begin && s.begin < end)
            .cloned()
            .collect();

        if let Some(first) = retained.first_mut() {
            let inpoint = (begin - first.begin).num_milliseconds() as f64 / 1000.0;
            if inpoint > 0.0 {
                first.inpoint = Some(inpoint);
            }
        }
        if let Some(last) = retained.last_mut() {
            let seg_end = last.begin + seconds_to_duration(last.duration);
            let excess = (seg_end - end).num_milliseconds() as f64 / 1000.0;
            if excess > 0.0 {
                last.outpoint = Some((last.duration - excess).max(0.0));
            }
        }
        retained
    }

    /// Open (or create in memory) a timeline.
    ///
    /// If `load` is true, a non-`glob` name whose JSON file exists loads
    /// `(begin, duration)` from disk and `begin`/`duration` arguments are
    /// ignored. Otherwise the explicit arguments are used, falling back to
    /// the archive-derived defaults described in the data model.
    pub fn open(
        archive: &SegmentArchive,
        name: &str,
        begin: Option<NaiveDateTime>,
        duration: Option<f64>,
        load: bool,
    ) -> CoreResult<Self> {
        Self::validate_name(name)?;
        let all = archive.list()?;

        let (resolved_begin, resolved_duration) = if load && name != GLOB_NAME {
            match Self::read_persisted(archive, name)? {
                Some(persisted) => persisted,
                None => {
                    let (default_begin, default_duration) = Self::default_window(&all);
                    (begin.unwrap_or(default_begin), duration.unwrap_or(default_duration))
                }
            }
        } else {
            let (default_begin, default_duration) = Self::default_window(&all);
            (begin.unwrap_or(default_begin), duration.unwrap_or(default_duration))
        };

        let segments = Self::windowed_segments(&all, resolved_begin, resolved_duration);

        Ok(Self {
            name: name.to_string(),
            begin: resolved_begin,
            duration: resolved_duration,
            segments,
            archive: archive.clone(),
        })
    }

    pub fn end(&self) -> NaiveDateTime {
        self.begin + seconds_to_duration(self.duration)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn hole_count(&self) -> usize {
        self.segments.iter().filter(|s| s.hole).count()
    }

    /// Maximal contiguous runs of Segments, breaking after every
    /// hole-marked Segment.
    pub fn slices(&self) -> Vec<Slice> {
        let mut slices = Vec::new();
        let mut current: Vec<Segment> = Vec::new();

        for segment in &self.segments {
            let is_hole = segment.hole;
            current.push(segment.clone());
            if is_hole {
                slices.push(Slice::new(std::mem::take(&mut current), false));
            }
        }
        if !current.is_empty() {
            slices.push(Slice::new(current, false));
        }

        if let Some(last) = slices.last_mut() {
            last.last = true;
        }
        slices
    }

    /// Slide the window forward by `duration - truncate`, preserving
    /// `duration`.
    pub fn advance(&self, truncate: f64) -> CoreResult<Self> {
        let new_begin = self.begin + seconds_to_duration(self.duration) - seconds_to_duration(truncate);
        Self::open(&self.archive, &self.name, Some(new_begin), Some(self.duration), false)
    }

    /// Recompute the window from the current archive bounds.
    pub fn reset(&self) -> CoreResult<Self> {
        Self::open(&self.archive, &self.name, None, None, false)
    }

    pub fn rename(&self, new_name: &str) -> CoreResult<Self> {
        if self.name == GLOB_NAME || new_name == GLOB_NAME {
            return Err(CoreError::InvalidArgument(format!("cannot rename {}", GLOB_NAME)));
        }
        Self::validate_name(new_name)?;
        let renamed = Self {
            name: new_name.to_string(),
            begin: self.begin,
            duration: self.duration,
            segments: self.segments.clone(),
            archive: self.archive.clone(),
        };
        renamed.save()?;
        self.remove()?;
        Ok(renamed)
    }

    pub fn copy(&self, dst_name: &str) -> CoreResult<Self> {
        Self::validate_name(dst_name)?;
        if dst_name == GLOB_NAME {
            return Err(CoreError::InvalidArgument("cannot copy onto glob".to_string()));
        }
        let copied = Self {
            name: dst_name.to_string(),
            begin: self.begin,
            duration: self.duration,
            segments: self.segments.clone(),
            archive: self.archive.clone(),
        };
        copied.save()?;
        Ok(copied)
    }

    pub fn save(&self) -> CoreResult<()> {
        if self.name == GLOB_NAME {
            return Err(CoreError::InvalidArgument(format!("{} is never persisted", GLOB_NAME)));
        }
        let dir = self.archive.timelines_dir();
        fs::create_dir_all(&dir)?;
        let file = TimelineFile {
            begin: self.begin.format(PERSISTED_FORMAT).to_string(),
            duration: self.duration,
        };
        let contents = serde_json::to_string_pretty(&file)?;
        fs::write(Self::json_path(&self.archive, &self.name), contents)?;
        Ok(())
    }

    pub fn remove(&self) -> CoreResult<()> {
        if self.name == GLOB_NAME {
            return Err(CoreError::InvalidArgument(format!("{} cannot be removed", GLOB_NAME)));
        }
        let path = Self::json_path(&self.archive, &self.name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn lookup_segment_from_timestamp(&self, t: NaiveDateTime) -> CoreResult<&Segment> {
        self.segments
            .iter()
            .find(|s| t >= s.begin && t <= s.end())
            .ok_or_else(|| CoreError::not_found(format!("no segment contains timestamp {t}")))
    }
}
