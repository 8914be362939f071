//! The flat directory of Segments under `INGEST_DATADIR`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::CoreResult;

use super::Segment;

/// Append-only from the Recorder's point of view, read-only from every
/// consumer. No locking is performed here.
#[derive(Debug, Clone)]
pub struct SegmentArchive {
    root: PathBuf,
}

impl SegmentArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn timelines_dir(&self) -> PathBuf {
        self.root.join("timelines")
    }

    /// Enumerate Segments ordered by `begin` (equivalent, given the fixed
    /// filename format, to lexicographic sort on basename).
    pub fn list(&self) -> CoreResult<Vec<Segment>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut basenames = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            // `.hole` sibling markers are folded into their segment below,
            // not listed as entries themselves.
            if name.ends_with(".hole") {
                continue;
            }
            if Segment::parse(Path::new(&name)).is_ok() {
                basenames.push(name);
            }
        }
        basenames.sort();

        let mut segments = Vec::with_capacity(basenames.len());
        for name in basenames {
            let path = self.root.join(&name);
            let mut segment = Segment::parse(&path)?;
            let hole_marker = self.root.join(format!("{name}.hole"));
            segment.hole = hole_marker.exists();
            segments.push(segment);
        }
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn lists_segments_sorted_and_applies_hole_markers() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "segment_2025-12-26T14h12m18_30.00s.ts");
        touch(dir.path(), "segment_2025-12-26T14h11m48_30.00s.ts");
        touch(dir.path(), "segment_2025-12-26T14h11m48_30.00s.ts.hole");

        let archive = SegmentArchive::new(dir.path());
        let segments = archive.list().unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].basename, "segment_2025-12-26T14h11m48_30.00s.ts");
        assert!(segments[0].hole);
        assert!(!segments[1].hole);
    }

    #[test]
    fn empty_archive_lists_nothing() {
        let dir = tempdir().unwrap();
        let archive = SegmentArchive::new(dir.path());
        assert!(archive.list().unwrap().is_empty());
    }
}
