//! Black-box end-to-end scenarios exercised through the public Timeline/
//! Slice surface, independent of the Recorder's internal state machine.

use std::fs;
use std::path::Path;

use mediawatch::segment::Segment;
use mediawatch::timeline::{Timeline, GLOB_NAME};
use mediawatch::{SegmentArchive, Slice};

fn touch_segment(dir: &Path, begin: &str, duration: f64) {
    let name = format!("segment_{begin}_{duration:.2}s.ts");
    fs::write(dir.join(name), b"").unwrap();
}

fn local(s: &str) -> chrono::NaiveDateTime {
    mediawatch::utils::datetime::parse_local(s).unwrap()
}

// S5: advancing a timeline by its own duration slides the window forward
// by exactly that span while preserving the window's length.
#[test]
fn s5_advance_preserves_duration_across_an_empty_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archive = SegmentArchive::new(dir.path());
    let begin = local("2025-12-26T06h00m00");
    let timeline = Timeline::open(&archive, "daily", Some(begin), Some(86400.0), false).unwrap();
    timeline.save().unwrap();

    let advanced = timeline.advance(0.0).unwrap();
    advanced.save().unwrap();

    assert_eq!(advanced.duration, 86400.0);
    assert_eq!(advanced.begin, begin + chrono::Duration::seconds(86400));

    let reloaded = Timeline::open(&archive, "daily", None, None, true).unwrap();
    assert_eq!(reloaded.begin, advanced.begin);
    assert_eq!(reloaded.duration, advanced.duration);
}

// S5b: a non-zero truncate shortens the distance to the next window's
// begin without changing the window's own duration.
#[test]
fn s5_advance_with_truncate_still_covers_archived_segments() {
    let dir = tempfile::tempdir().unwrap();
    touch_segment(dir.path(), "2025-12-26T06h00m00", 30.0);
    touch_segment(dir.path(), "2025-12-26T06h00m30", 30.0);

    let archive = SegmentArchive::new(dir.path());
    let begin = local("2025-12-26T06h00m00");
    let timeline = Timeline::open(&archive, "daily", Some(begin), Some(60.0), false).unwrap();
    let advanced = timeline.advance(10.0).unwrap();

    assert_eq!(advanced.duration, 60.0);
    assert_eq!(advanced.begin, begin + chrono::Duration::seconds(50));
}

// S6: a three-segment slice with a trimmed first and last segment reports
// the trimmed effective duration and emits `inpoint`/`outpoint` directives
// immediately after their respective `file` lines.
#[test]
fn s6_slice_concat_manifest_places_trim_directives_around_their_segments() {
    let dir = tempfile::tempdir().unwrap();
    touch_segment(dir.path(), "2025-12-26T06h00m00", 30.0);
    touch_segment(dir.path(), "2025-12-26T06h00m30", 30.0);
    touch_segment(dir.path(), "2025-12-26T06h01m00", 30.0);

    let archive = SegmentArchive::new(dir.path());
    // A 5s inpoint into the first segment and a 25s outpoint into the
    // last, derived the same way `Timeline::open` derives them for any
    // window that doesn't align exactly with segment boundaries.
    let begin = local("2025-12-26T06h00m05");
    let timeline = Timeline::open(&archive, GLOB_NAME, Some(begin), Some(80.0), false).unwrap();

    let slices = timeline.slices();
    assert_eq!(slices.len(), 1);
    let slice: &Slice = &slices[0];
    assert_eq!(slice.segments().len(), 3);
    assert_eq!(slice.effective_duration(), 80.0);
    assert_eq!(slice.first_inpoint(), Some(5.0));
    assert_eq!(slice.last_outpoint(), Some(25.0));

    let manifest = slice.concat_manifest(&archive.tmp_dir(), "daily", true).unwrap();
    let body = fs::read_to_string(manifest.path()).unwrap();
    let lines: Vec<&str> = body.lines().collect();

    let first_file_idx = lines.iter().position(|l| l.starts_with("file")).unwrap();
    assert_eq!(lines[first_file_idx + 1], "inpoint 5");

    let last_file_idx = lines.iter().rposition(|l| l.starts_with("file")).unwrap();
    assert_eq!(lines[last_file_idx + 1], "outpoint 25");
}

// S6b: a single hole marker splits an otherwise contiguous run into two
// slices, with the hole boundary closing the first.
#[test]
fn s6_hole_marker_splits_slice_and_only_last_slice_is_marked_last() {
    let dir = tempfile::tempdir().unwrap();
    touch_segment(dir.path(), "2025-12-26T06h00m00", 30.0);
    fs::write(dir.path().join("segment_2025-12-26T06h00m00_30.00s.ts.hole"), b"").unwrap();
    touch_segment(dir.path(), "2025-12-26T06h00m30", 30.0);

    let archive = SegmentArchive::new(dir.path());
    let timeline = Timeline::open(&archive, GLOB_NAME, None, None, true).unwrap();
    let slices = timeline.slices();

    assert_eq!(slices.len(), 2);
    assert!(!slices[0].last);
    assert!(slices[1].last);
    assert_eq!(slices[0].segments().len(), 1);
    assert!(slices[0].segments()[0].hole);
}

#[test]
fn segment_list_and_timeline_open_agree_on_ordering() {
    let dir = tempfile::tempdir().unwrap();
    touch_segment(dir.path(), "2025-12-26T06h01m00", 30.0);
    touch_segment(dir.path(), "2025-12-26T06h00m00", 30.0);

    let archive = SegmentArchive::new(dir.path());
    let listed: Vec<Segment> = archive.list().unwrap();
    assert_eq!(listed[0].begin, local("2025-12-26T06h00m00"));

    let timeline = Timeline::open(&archive, GLOB_NAME, None, None, true).unwrap();
    assert_eq!(timeline.segments()[0].begin, listed[0].begin);
}
