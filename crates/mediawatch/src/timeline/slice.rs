//! Slice: a maximal contiguous run of Segments within a Timeline.

use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::errors::CoreResult;
use crate::segment::Segment;

#[derive(Debug, Clone)]
pub struct Slice {
    segments: Vec<Segment>,
    pub last: bool,
}

impl Slice {
    pub fn new(segments: Vec<Segment>, last: bool) -> Self {
        Self { segments, last }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn effective_duration(&self) -> f64 {
        self.segments.iter().map(Segment::effective_duration).sum()
    }

    pub fn first_inpoint(&self) -> Option<f64> {
        self.segments.first().and_then(|s| s.inpoint)
    }

    pub fn last_outpoint(&self) -> Option<f64> {
        self.segments.last().and_then(|s| s.outpoint)
    }

    /// Build an ffmpeg concat demuxer manifest listing this slice's
    /// segments in order. When `with_trims` is false the `inpoint`/
    /// `outpoint` directives are still emitted, but commented out, so the
    /// manifest documents the trim without applying it.
    ///
    /// The manifest is written to a temp file under `tmp_dir` (expected to
    /// be the archive's `tmp/` subdirectory) with an auto-deleted handle;
    /// the caller passes the returned path to an external tool before the
    /// handle is dropped.
    pub fn concat_manifest(&self, tmp_dir: &Path, name_hint: &str, with_trims: bool) -> CoreResult<NamedTempFile> {
        let mut body = String::new();
        let last_index = self.segments.len().saturating_sub(1);

        for (i, segment) in self.segments.iter().enumerate() {
            body.push_str(&format!("file '{}'\n", segment.filename.display()));
            if i == 0 {
                if let Some(inpoint) = segment.inpoint {
                    body.push_str(&trim_line("inpoint", inpoint, with_trims));
                }
            }
            if i == last_index {
                if let Some(outpoint) = segment.outpoint {
                    body.push_str(&trim_line("outpoint", outpoint, with_trims));
                }
            }
        }

        std::fs::create_dir_all(tmp_dir)?;
        let mut file = Builder::new()
            .prefix(&format!("{name_hint}_"))
            .suffix(".concat")
            .tempfile_in(tmp_dir)?;
        use std::io::Write;
        file.write_all(body.as_bytes())?;
        Ok(file)
    }
}

fn trim_line(directive: &str, value: f64, active: bool) -> String {
    if active {
        format!("{directive} {value}\n")
    } else {
        format!("#{directive} {value}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::datetime::parse_local;
    use tempfile::tempdir;

    fn seg(dir: &Path, begin: &str, duration: f64) -> Segment {
        Segment::new(dir, parse_local(begin).unwrap(), duration, false)
    }

    #[test]
    fn effective_duration_sums_trims() {
        let dir = tempdir().unwrap();
        let mut first = seg(dir.path(), "2025-12-26T14h00m00", 30.0);
        first.inpoint = Some(5.0);
        let middle = seg(dir.path(), "2025-12-26T14h00m30", 30.0);
        let mut last = seg(dir.path(), "2025-12-26T14h01m00", 30.0);
        last.outpoint = Some(25.0);

        let slice = Slice::new(vec![first, middle, last], true);
        assert_eq!(slice.effective_duration(), 80.0);
        assert_eq!(slice.first_inpoint(), Some(5.0));
        assert_eq!(slice.last_outpoint(), Some(25.0));
    }

    #[test]
    fn manifest_comments_trims_when_disabled() {
        let dir = tempdir().unwrap();
        let mut first = seg(dir.path(), "2025-12-26T14h00m00", 30.0);
        first.inpoint = Some(5.0);
        let mut last = first.clone();
        last.outpoint = Some(25.0);

        let slice = Slice::new(vec![first, last], true);
        let tmp = tempdir().unwrap();
        let manifest = slice.concat_manifest(tmp.path(), "daily", false).unwrap();
        let contents = std::fs::read_to_string(manifest.path()).unwrap();
        assert!(contents.contains("#inpoint 5"));
        assert!(contents.contains("#outpoint 25"));
    }

    #[test]
    fn manifest_emits_active_trims() {
        let dir = tempdir().unwrap();
        let mut first = seg(dir.path(), "2025-12-26T14h00m00", 30.0);
        first.inpoint = Some(5.0);
        let slice = Slice::new(vec![first], true);
        let tmp = tempdir().unwrap();
        let manifest = slice.concat_manifest(tmp.path(), "daily", true).unwrap();
        let contents = std::fs::read_to_string(manifest.path()).unwrap();
        assert!(contents.contains("inpoint 5"));
        assert!(!contents.contains("#inpoint"));
    }
}
