//! Recorder (Ingest): supervises the capture pipeline, recovers per-segment
//! wall-clock timing from its log stream, and archives finished segments.

pub mod io;
pub mod line;
pub mod playlist;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Local, NaiveDateTime};
use sandboxed_file_manager::{CleanupPolicy, SandboxedManager, TimeMatch};
use serde::Serialize;
use tokio::process::Command;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::errors::{CoreError, CoreResult};
use crate::segment::SegmentArchive;
use crate::utils::datetime::format_local;
use crate::utils::process_tree::terminate_process_tree;
use crate::utils::DriftRing;

use io::forward_lines;
use line::{classify_line, LineEvent};
use playlist::scan_playlist;

const STATUS_TIME_FORMAT: &str = "%Y-%m-%d %Hh%M";

/// Snapshot of recorder state, broadcast to every control-plane subscriber
/// on every observable mutation.
#[derive(Debug, Clone, Serialize)]
pub struct RecorderStatus {
    pub recording_requested: bool,
    pub segment_filename: Option<String>,
    pub pid: Option<u32>,
    pub service_start_time: Option<String>,
    pub record_start_time: Option<String>,
    pub halt_start_time: Option<String>,
    pub number_of_launched_records: u32,
    pub number_of_failed_records: u32,
}

fn fmt_time(t: Option<NaiveDateTime>) -> Option<String> {
    t.map(|t| t.format(STATUS_TIME_FORMAT).to_string())
}

struct InnerState {
    recording_requested: bool,
    pid: Option<u32>,
    service_start_time: Option<NaiveDateTime>,
    record_start_time: Option<NaiveDateTime>,
    halt_start_time: Option<NaiveDateTime>,
    number_of_launched_records: u32,
    number_of_failed_records: u32,
    drift: DriftRing,
    current_segment_filename: Option<PathBuf>,
    hole_marker_pending: Option<PathBuf>,
    escalated: bool,
}

impl InnerState {
    fn new(drift_capacity: usize) -> Self {
        Self {
            recording_requested: false,
            pid: None,
            service_start_time: None,
            record_start_time: None,
            halt_start_time: None,
            number_of_launched_records: 0,
            number_of_failed_records: 0,
            drift: DriftRing::new(drift_capacity),
            current_segment_filename: None,
            hole_marker_pending: None,
            escalated: false,
        }
    }

    fn snapshot(&self) -> RecorderStatus {
        RecorderStatus {
            recording_requested: self.recording_requested,
            segment_filename: self
                .current_segment_filename
                .as_ref()
                .map(|p| p.display().to_string()),
            pid: self.pid,
            service_start_time: fmt_time(self.service_start_time),
            record_start_time: fmt_time(self.record_start_time),
            halt_start_time: fmt_time(self.halt_start_time),
            number_of_launched_records: self.number_of_launched_records,
            number_of_failed_records: self.number_of_failed_records,
        }
    }
}

/// Invoked when `checkFatalAtStartup` trips, the only unrecoverable
/// failure the core exposes. If none is injected, the process exits.
pub type AbortSink = Arc<dyn Fn() + Send + Sync>;

pub struct Recorder {
    config: Config,
    archive: SegmentArchive,
    state: Mutex<InnerState>,
    status_tx: broadcast::Sender<RecorderStatus>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    abort_sink: Option<AbortSink>,
}

impl Recorder {
    pub fn new(config: Config, archive: SegmentArchive, abort_sink: Option<AbortSink>) -> CoreResult<Arc<Self>> {
        let drift_capacity = config.get_u32("DRIFT_RING_CAPACITY")? as usize;
        let (status_tx, _rx) = broadcast::channel(64);
        Ok(Arc::new(Self {
            config,
            archive,
            state: Mutex::new(InnerState::new(drift_capacity)),
            status_tx,
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
            abort_sink,
        }))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecorderStatus> {
        self.status_tx.subscribe()
    }

    /// A handle to the recorder's shutdown signal. Connection handlers
    /// select on this independently of holding an `Arc<Recorder>`, since
    /// the recorder (and its `status_tx`) stays alive for as long as any
    /// subscriber holds that `Arc` and so never drops on its own.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn status(&self) -> RecorderStatus {
        self.state.lock().await.snapshot()
    }

    async fn broadcast_status(&self) {
        let snapshot = self.state.lock().await.snapshot();
        let _ = self.status_tx.send(snapshot);
    }

    /// Start the supervision loop. Idempotent: calling twice on an
    /// already-started recorder is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return;
        }
        {
            let mut st = self.state.lock().await;
            st.service_start_time = Some(Local::now().naive_local());
        }
        let this = Arc::clone(self);
        *task = Some(tokio::spawn(async move { this.supervise().await }));
    }

    async fn supervise(self: Arc<Self>) {
        loop {
            if self.cancel.is_cancelled() {
                return;
            }
            let recording_requested = self.state.lock().await.recording_requested;
            if recording_requested {
                if let Err(err) = self.run_command().await {
                    error!(error = %err, "capture pipeline run failed");
                }
            } else {
                self.halt_wait().await;
            }
        }
    }

    async fn halt_wait(&self) {
        let poll_ms = self.config.get_u64("HALT_POLL_INTERVAL_MS").unwrap_or(300);
        let log_every = self.config.get_u64("HALT_LOG_INTERVAL_SECS").unwrap_or(30);
        let mut waited_ms: u64 = 0;
        loop {
            if self.cancel.is_cancelled() {
                return;
            }
            if self.state.lock().await.recording_requested {
                return;
            }
            tokio::select! {
                _ = tokio::time::sleep(StdDuration::from_millis(poll_ms)) => {}
                _ = self.cancel.cancelled() => return,
            }
            waited_ms += poll_ms;
            if waited_ms >= log_every * 1000 {
                debug!("recorder idle, waiting for recording request");
                waited_ms = 0;
            }
        }
    }

    /// Flip the recording flag on. Safe to call repeatedly: only the
    /// transition from not-requested to requested broadcasts a status
    /// change and returns `true`.
    pub async fn request_recording(&self) -> bool {
        let mut st = self.state.lock().await;
        if st.recording_requested {
            return false;
        }
        st.recording_requested = true;
        st.record_start_time = Some(Local::now().naive_local());
        drop(st);
        self.broadcast_status().await;
        true
    }

    /// Flip the recording flag off, terminate the supervised process tree,
    /// and forget the handle. Safe to call repeatedly: only the transition
    /// from requested to not-requested does any of this and returns `true`.
    pub async fn request_halt(&self) -> bool {
        let mut st = self.state.lock().await;
        if !st.recording_requested {
            return false;
        }
        st.recording_requested = false;
        st.halt_start_time = Some(Local::now().naive_local());
        let pid = st.pid.take();
        // Compensates the subsequent `runCommand` exit-path increment so a
        // user-initiated halt does not inflate the failure counter.
        if st.number_of_failed_records > 0 {
            st.number_of_failed_records -= 1;
        }
        st.escalated = false;
        drop(st);
        if let Some(pid) = pid {
            terminate_process_tree(pid);
        }
        self.broadcast_status().await;
        true
    }

    /// Halt, close out every status subscriber, and stop the supervision
    /// loop.
    pub async fn stop(self: &Arc<Self>) {
        self.request_halt().await;
        tokio::time::sleep(StdDuration::from_millis(200)).await;
        // Cancelling the shared token is what actually reaches every
        // connected websocket handler: each one selects on its own clone
        // of this token (see `shutdown_token`) and sends its own
        // GOING_AWAY close frame in response. The `status_tx` itself
        // never drops here, since every handler still holds an
        // `Arc<Recorder>` for the rest of the connection's lifetime.
        self.cancel.cancel();
        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    fn build_pipeline_command(&self) -> CoreResult<String> {
        let stream_url = self.config.get("INGEST_YOUTUBE_STREAM_URL")?;
        let extra_args = self.config.get("YT_DLP_EXTRA_ARGS")?;
        let segment_secs = self.config.get("SEGMENT_DURATION_SECS")?;
        Ok(format!(
            "yt-dlp -o - {extra_args} '{stream_url}' | ffmpeg -i - -f hls -hls_time {segment_secs} \
             -hls_list_size 1 -use_localtime 1 -hls_flags program_date_time+second_level_segment_duration \
             -hls_segment_filename tmp/segment_%s.ts tmp/output.m3u8.tmp"
        ))
    }

    async fn run_command(&self) -> CoreResult<()> {
        {
            let mut st = self.state.lock().await;
            st.current_segment_filename = None;
            st.hole_marker_pending = None;
        }

        let datadir = PathBuf::from(self.config.get("INGEST_DATADIR")?);
        std::fs::create_dir_all(datadir.join("tmp"))?;

        let pipeline = self.build_pipeline_command()?;
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&pipeline)
            .current_dir(&datadir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let pid = child.id();
        {
            let mut st = self.state.lock().await;
            st.pid = pid;
            st.number_of_launched_records += 1;
        }
        self.broadcast_status().await;

        let stdout = child.stdout.take().expect("stdout is piped");
        let stderr = child.stderr.take().expect("stderr is piped");
        let (tx, mut rx) = mpsc::channel::<String>(256);
        let out_task = tokio::spawn(forward_lines(stdout, tx.clone()));
        let err_task = tokio::spawn(forward_lines(stderr, tx));

        let mut processed: u64 = 0;
        loop {
            tokio::select! {
                line = rx.recv() => {
                    match line {
                        Some(line) => {
                            self.process_line(&line).await?;
                            processed += 1;
                            if processed % 100 == 0 {
                                self.cleanup_temp_folder().await?;
                            }
                        }
                        None => break,
                    }
                }
                _ = self.cancel.cancelled() => break,
            }
        }

        let _ = out_task.await;
        let _ = err_task.await;
        let _ = child.wait().await;

        let marker = {
            let mut st = self.state.lock().await;
            st.number_of_failed_records += 1;
            st.pid = None;
            st.hole_marker_pending.take()
        };
        if let Some(marker) = marker {
            std::fs::write(&marker, b"")?;
            warn!(marker = %marker.display(), "recorded hole marker after abnormal exit");
        }
        self.broadcast_status().await;
        self.check_fatal_at_startup().await
    }

    async fn process_line(&self, line: &str) -> CoreResult<()> {
        match classify_line(line) {
            LineEvent::Ignored => {}
            LineEvent::ProgramDateTime(dt) => {
                let now = Local::now().with_timezone(dt.offset());
                let drift_secs = (now - dt).num_milliseconds() as f64 / 1000.0;
                let mut st = self.state.lock().await;
                st.drift.push(drift_secs);
                debug!(drift_s = st.drift.mean(), "rolling drift average");
            }
            LineEvent::OpeningForWriting(path) => {
                let name = path.to_string_lossy();
                if name.ends_with(".ts") {
                    self.state.lock().await.current_segment_filename = Some(path);
                } else if name.ends_with(".m3u8.tmp") {
                    self.process_playlist(&path).await?;
                }
            }
            LineEvent::Other(text) => {
                let escalated = self.state.lock().await.escalated;
                if escalated {
                    error!(line = %text, "subprocess output");
                } else {
                    debug!(line = %text, "subprocess output");
                }
            }
        }
        Ok(())
    }

    async fn process_playlist(&self, tmp_path: &Path) -> CoreResult<()> {
        // `tmp_path` (and `current_segment_filename`, set when the matching
        // `.ts` was opened) are paths as the child process sees them, relative
        // to its own `current_dir` (the archive's data directory), not the
        // Recorder's own working directory.
        let datadir = PathBuf::from(self.config.get("INGEST_DATADIR")?);
        let final_path = datadir.join(tmp_path.to_string_lossy().trim_end_matches(".tmp"));
        let contents = match std::fs::read_to_string(&final_path) {
            Ok(c) => c,
            Err(_) => return Ok(()), // torn read before the rewrite lands; tolerated below anyway
        };
        let fields = scan_playlist(&contents);

        let recording_requested = self.state.lock().await.recording_requested;
        let event = match fields.clone().into_event() {
            Some(event) => event,
            None => {
                if recording_requested {
                    return Err(CoreError::malformed_playlist(
                        final_path,
                        format!("only {} of 3 required fields present", fields.found_count()),
                    ));
                }
                // Best-effort tolerance of torn reads at shutdown: the
                // source only raises while still recording.
                return Ok(());
            }
        };

        let mut st = self.state.lock().await;
        let drift_avg = st.drift.mean();
        let corrected = event.begin.naive_local() - chrono::Duration::milliseconds((drift_avg * 1000.0).round() as i64);
        let new_basename = format!("segment_{}_{:.2}s.ts", format_local(corrected), event.duration);

        let current_temp = st.current_segment_filename.take().ok_or_else(|| {
            CoreError::malformed_playlist(final_path.clone(), "no temp segment was opened for this cycle".to_string())
        })?;
        let current_temp = datadir.join(&current_temp);
        let archive_path = datadir.join(&new_basename);
        std::fs::rename(&current_temp, &archive_path)?;

        st.hole_marker_pending = Some(datadir.join(format!("{new_basename}.hole")));
        st.escalated = true;
        drop(st);

        self.broadcast_status().await;
        info!(segment = %new_basename, "archived segment");
        Ok(())
    }

    async fn cleanup_temp_folder(&self) -> CoreResult<()> {
        let datadir = self.config.get("INGEST_DATADIR")?;
        let max_age = self.config.get_u64("TEMP_FILE_MAX_AGE_SECS")?;
        let tmp_dir = PathBuf::from(&datadir).join("tmp");
        if !tmp_dir.exists() {
            return Ok(());
        }
        let manager = SandboxedManager::builder()
            .base_directory(&tmp_dir)
            .cleanup_policy(
                CleanupPolicy::new()
                    .remove_after(StdDuration::from_secs(max_age))
                    .time_match(TimeMatch::Modified),
            )
            .build()
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        let removed = manager
            .cleanup_expired_files()
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        if removed > 0 {
            debug!(removed, "cleaned up expired temp files");
        }
        Ok(())
    }

    async fn check_fatal_at_startup(&self) -> CoreResult<()> {
        let (elapsed, failed) = {
            let st = self.state.lock().await;
            let Some(start) = st.service_start_time else {
                return Ok(());
            };
            let elapsed = (Local::now().naive_local() - start).num_milliseconds() as f64 / 1000.0;
            (elapsed, st.number_of_failed_records)
        };

        let min_window = self.config.get_f64("STARTUP_FLAP_WINDOW_MIN_SECS")?;
        let max_window = self.config.get_f64("STARTUP_FLAP_WINDOW_MAX_SECS")?;
        let ratio_threshold = self.config.get_f64("STARTUP_FLAP_RATIO")?;

        if elapsed < min_window || elapsed > max_window {
            return Ok(());
        }
        let ratio = failed as f64 / elapsed;
        if ratio < ratio_threshold {
            return Ok(());
        }

        self.cancel.cancel();
        if let Some(sink) = &self.abort_sink {
            sink();
        } else {
            std::process::exit(-1);
        }
        Err(CoreError::StartupFlap {
            failed,
            elapsed_secs: elapsed,
            ratio: ratio_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;
    use tracing_test::traced_test;

    fn test_config(datadir: &Path, overrides: &[(&str, &str)]) -> Config {
        let mut raw = HashMap::new();
        raw.insert("INGEST_DATADIR".to_string(), datadir.display().to_string());
        raw.insert("INGEST_YOUTUBE_STREAM_URL".to_string(), "".to_string());
        raw.insert("YT_DLP_EXTRA_ARGS".to_string(), "".to_string());
        raw.insert("SEGMENT_DURATION_SECS".to_string(), "30".to_string());
        raw.insert("DRIFT_RING_CAPACITY".to_string(), "4".to_string());
        raw.insert("TEMP_FILE_MAX_AGE_SECS".to_string(), "600".to_string());
        raw.insert("STARTUP_FLAP_WINDOW_MIN_SECS".to_string(), "5".to_string());
        raw.insert("STARTUP_FLAP_WINDOW_MAX_SECS".to_string(), "10".to_string());
        raw.insert("STARTUP_FLAP_RATIO".to_string(), "0.6".to_string());
        for (k, v) in overrides {
            raw.insert(k.to_string(), v.to_string());
        }
        Config::from_map(raw)
    }

    fn test_recorder(datadir: &Path) -> Arc<Recorder> {
        let config = test_config(datadir, &[]);
        let archive = SegmentArchive::new(datadir.to_path_buf());
        Recorder::new(config, archive, None).unwrap()
    }

    // S1: a clean capture cycle archives the opened temp segment under its
    // corrected begin-time name.
    #[tokio::test]
    #[traced_test]
    async fn s1_happy_capture_archives_segment_and_logs_it() {
        let dir = tempdir().unwrap();
        let datadir = dir.path();
        std::fs::create_dir_all(datadir.join("tmp")).unwrap();
        std::fs::write(datadir.join("tmp/segment_1.ts"), b"video bytes").unwrap();

        let recorder = test_recorder(datadir);
        recorder
            .process_line("Opening 'tmp/segment_1.ts' for writing")
            .await
            .unwrap();

        let playlist = "#EXTM3U\n#EXTINF:30.00,\n#EXT-X-PROGRAM-DATE-TIME:2025-12-26T14:11:48.000+00:00\nsegment_1.ts\n";
        std::fs::write(datadir.join("tmp/output.m3u8"), playlist).unwrap();
        recorder
            .process_line("Opening 'tmp/output.m3u8.tmp' for writing")
            .await
            .unwrap();

        let archived = datadir.join("segment_2025-12-26T14h11m48_30.00s.ts");
        assert!(archived.exists());
        assert!(!datadir.join("tmp/segment_1.ts").exists());
        assert!(tracing_test::logs_contain("archived segment"));
    }

    // S2: a cycle that never gets a follow-up rewrite leaves its hole
    // marker path armed; writing it (what `run_command` does on an
    // abnormal child exit) marks the archived segment as a hole on replay.
    #[tokio::test]
    async fn s2_hole_marker_recorded_and_detected_after_abnormal_exit() {
        let dir = tempdir().unwrap();
        let datadir = dir.path();
        std::fs::create_dir_all(datadir.join("tmp")).unwrap();
        std::fs::write(datadir.join("tmp/segment_1.ts"), b"video bytes").unwrap();

        let recorder = test_recorder(datadir);
        recorder
            .process_line("Opening 'tmp/segment_1.ts' for writing")
            .await
            .unwrap();
        let playlist = "#EXTM3U\n#EXTINF:30.00,\n#EXT-X-PROGRAM-DATE-TIME:2025-12-26T14:11:48.000+00:00\nsegment_1.ts\n";
        std::fs::write(datadir.join("tmp/output.m3u8"), playlist).unwrap();
        recorder
            .process_line("Opening 'tmp/output.m3u8.tmp' for writing")
            .await
            .unwrap();

        let marker = recorder.state.lock().await.hole_marker_pending.take();
        let marker = marker.expect("process_playlist always arms the next hole marker");
        std::fs::write(&marker, b"").unwrap();

        let archive = SegmentArchive::new(datadir.to_path_buf());
        let segments = archive.list().unwrap();
        assert_eq!(segments.len(), 1);
        assert!(segments[0].hole);
    }

    // S3: the rolling drift average is subtracted from the playlist's
    // embedded begin time before it becomes the archived filename.
    #[tokio::test]
    async fn s3_drift_average_shifts_archived_begin_time() {
        let dir = tempdir().unwrap();
        let datadir = dir.path();
        std::fs::create_dir_all(datadir.join("tmp")).unwrap();
        std::fs::write(datadir.join("tmp/segment_1.ts"), b"video bytes").unwrap();

        let recorder = test_recorder(datadir);
        recorder
            .process_line("Opening 'tmp/segment_1.ts' for writing")
            .await
            .unwrap();
        {
            let mut st = recorder.state.lock().await;
            for _ in 0..4 {
                st.drift.push(2.0);
            }
        }

        let playlist = "#EXTM3U\n#EXTINF:30.00,\n#EXT-X-PROGRAM-DATE-TIME:2025-12-26T14:11:50.000+00:00\nsegment_1.ts\n";
        std::fs::write(datadir.join("tmp/output.m3u8"), playlist).unwrap();
        recorder
            .process_line("Opening 'tmp/output.m3u8.tmp' for writing")
            .await
            .unwrap();

        // 2s mean drift subtracted from the embedded 14:11:50 timestamp.
        let archived = datadir.join("segment_2025-12-26T14h11m48_30.00s.ts");
        assert!(archived.exists());
    }

    // S4: too many failed records too soon after startup trips the fatal
    // guard exactly once and cancels the supervision loop.
    #[tokio::test]
    async fn s4_startup_flap_cancels_and_invokes_abort_sink_once() {
        let dir = tempdir().unwrap();
        let datadir = dir.path();
        let config = test_config(datadir, &[]);
        let archive = SegmentArchive::new(datadir.to_path_buf());
        let calls = Arc::new(AtomicUsize::new(0));
        let sink_calls = Arc::clone(&calls);
        let recorder = Recorder::new(
            config,
            archive,
            Some(Arc::new(move || {
                sink_calls.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .unwrap();

        {
            let mut st = recorder.state.lock().await;
            st.service_start_time = Some(Local::now().naive_local() - chrono::Duration::seconds(7));
            st.number_of_failed_records = 5;
        }

        let result = recorder.check_fatal_at_startup().await;
        assert!(matches!(result, Err(CoreError::StartupFlap { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(recorder.cancel.is_cancelled());
    }

    #[tokio::test]
    async fn request_recording_then_halt_round_trips_flags() {
        let dir = tempdir().unwrap();
        let recorder = test_recorder(dir.path());
        assert!(recorder.request_recording().await);
        assert!(!recorder.request_recording().await);
        assert!(recorder.request_halt().await);
        assert!(!recorder.request_halt().await);
    }
}
