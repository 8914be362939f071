//! Built-in default values for every recognized configuration option.
//!
//! Kept as one TOML blob so it layers into the same [`figment::Figment`]
//! stack as the user's file and environment overrides, rather than as a
//! struct with `Default` impls. The config store treats every value as an
//! unresolved string until `{KEY}` interpolation runs, so defaults must stay
//! string-shaped too.

pub const DEFAULTS_TOML: &str = r#"
WEB_LISTENADDR = "0.0.0.0"
WEB_PORT = "8080"
WEB_ROOTDIR = "{PROJECT_DIR}/web"
LOGS_DIR = "{PROJECT_DIR}/logs"
INGEST_DATADIR = "{PROJECT_DIR}/data"
INGEST_YOUTUBE_STREAM_URL = ""
PROJECT_DIR = "."
YT_DLP_EXTRA_ARGS = ""
TIMEZONE = "UTC"
DATABASE_PATH = "{PROJECT_DIR}/mediawatch.db"
GCP_PROJECT_ID = ""
GCP_BUCKET_NAME = ""
GCP_SERVICE_ACCOUNT = ""
ROADMAP_HACKMD_URL = ""

# Externalized magic numbers from checkFatalAtStartup (see design notes).
STARTUP_FLAP_WINDOW_MIN_SECS = "5"
STARTUP_FLAP_WINDOW_MAX_SECS = "10"
STARTUP_FLAP_RATIO = "0.6"

# Segment cadence and cleanup thresholds.
SEGMENT_DURATION_SECS = "30"
TEMP_FILE_MAX_AGE_SECS = "600"
DRIFT_RING_CAPACITY = "4"
HALT_POLL_INTERVAL_MS = "300"
HALT_LOG_INTERVAL_SECS = "30"

# Scheduler defaults (daily triggers, local TIMEZONE).
SCHEDULE_RECORD_CRON = "0 25 6 * * *"
SCHEDULE_HALT_CRON = "0 5 0 * * *"
"#;

/// Recognized config key names, used to validate lookups and reject typos
/// early rather than silently returning an empty string.
pub const RECOGNIZED_KEYS: &[&str] = &[
    "WEB_LISTENADDR",
    "WEB_PORT",
    "WEB_ROOTDIR",
    "LOGS_DIR",
    "INGEST_DATADIR",
    "INGEST_YOUTUBE_STREAM_URL",
    "PROJECT_DIR",
    "YT_DLP_EXTRA_ARGS",
    "TIMEZONE",
    "DATABASE_PATH",
    "GCP_PROJECT_ID",
    "GCP_BUCKET_NAME",
    "GCP_SERVICE_ACCOUNT",
    "ROADMAP_HACKMD_URL",
    "STARTUP_FLAP_WINDOW_MIN_SECS",
    "STARTUP_FLAP_WINDOW_MAX_SECS",
    "STARTUP_FLAP_RATIO",
    "SEGMENT_DURATION_SECS",
    "TEMP_FILE_MAX_AGE_SECS",
    "DRIFT_RING_CAPACITY",
    "HALT_POLL_INTERVAL_MS",
    "HALT_LOG_INTERVAL_SECS",
    "SCHEDULE_RECORD_CRON",
    "SCHEDULE_HALT_CRON",
];

/// Maximum `{KEY}` interpolation recursion depth before `ConfigCyclic`.
pub const MAX_INTERPOLATION_DEPTH: u32 = 8;
