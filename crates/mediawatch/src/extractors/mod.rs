//! Extraction interfaces: the seam external banner-OCR and speech-
//! extraction tools bind against. Only the interface and a thin, testable
//! ffmpeg-invocation helper live here. No OCR, diarization, or cloud
//! upload logic.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tempfile::NamedTempFile;
use tokio::process::Command;

use crate::errors::{ExtractError, ExtractResult};
use crate::segment::Segment;
use crate::timeline::Slice;

/// Extract a single frame from a segment at a given offset.
pub trait FrameExtractor {
    fn extract_frame(
        &self,
        segment: &Segment,
        offset_secs: f64,
        crop_filter: &str,
        out_path: &Path,
    ) -> impl std::future::Future<Output = ExtractResult<()>> + Send;
}

/// Enumerate a timeline's slices and build concat manifests for them,
/// the two operations banner OCR and speech extraction actually consume.
pub trait SliceSource {
    fn slices(&self) -> Vec<Slice>;
    fn concat_manifest(&self, slice: &Slice, with_trims: bool) -> ExtractResult<NamedTempFile>;
}

/// Reference [`FrameExtractor`] wrapping a single ffmpeg invocation: one
/// `Command`, inherited stdin, piped stderr for diagnostics on failure.
pub struct FfmpegFrameExtractor {
    pub ffmpeg_path: PathBuf,
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
        }
    }
}

impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frame(
        &self,
        segment: &Segment,
        offset_secs: f64,
        crop_filter: &str,
        out_path: &Path,
    ) -> ExtractResult<()> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-ss")
            .arg(format!("{offset_secs}"))
            .arg("-i")
            .arg(&segment.filename)
            .arg("-vf")
            .arg(crop_filter)
            .arg("-frames:v")
            .arg("1")
            .arg("-y")
            .arg(out_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(ExtractError::FfmpegFailed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        Ok(())
    }
}
