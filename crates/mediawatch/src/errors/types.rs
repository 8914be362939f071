//! Error type definitions for the capture/timeline/slice subsystem
//!
//! This module defines the error types used throughout the application,
//! giving each layer a `thiserror`-derived enum and chaining them into a
//! single top-level type so callers can propagate with `?` regardless of
//! which layer raised.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration interpolation exceeded the recursion depth guard.
    #[error("config key '{key}' could not be resolved: cyclic or too deep (max depth {max_depth})")]
    ConfigCyclic { key: String, max_depth: u32 },

    /// A config key was referenced but is not a recognized option.
    #[error("unknown config key: {0}")]
    ConfigUnknown(String),

    /// A segment or timeline filename failed its grammar.
    #[error("malformed name '{name}': {reason}")]
    MalformedName { name: String, reason: String },

    /// The rolling playlist did not yield the three expected fields while
    /// recording was still requested.
    #[error("malformed playlist at {path}: {reason}")]
    MalformedPlaylist { path: PathBuf, reason: String },

    /// A timeline name does not exist, or a timestamp lookup fell outside
    /// the archive.
    #[error("not found: {0}")]
    NotFound(String),

    /// A control-plane command arrived in the wrong recorder state.
    #[error("state error: {0}")]
    StateError(String),

    /// Too many record/halt cycles completed too quickly after startup.
    #[error("startup flap: {failed}/{elapsed_secs}s exceeded ratio {ratio}")]
    StartupFlap {
        failed: u32,
        elapsed_secs: f64,
        ratio: f64,
    },

    /// Timeline or CLI argument validation failures.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("config load error: {0}")]
    Figment(#[from] figment::Error),

    #[error("timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn malformed_name<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::MalformedName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed_playlist<R: Into<String>>(path: PathBuf, reason: R) -> Self {
        Self::MalformedPlaylist {
            path,
            reason: reason.into(),
        }
    }

    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }

    pub fn state_error<S: Into<String>>(message: S) -> Self {
        Self::StateError(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Exit code the CLI should use for this error (spec: 2 on argument /
    /// user error, otherwise also 2 since the CLI has no other surface).
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::NotFound(_) | CoreError::InvalidArgument(_) | CoreError::MalformedName { .. } => 2,
            _ => 2,
        }
    }
}

/// Errors from the `extractors` seam (frame extraction, concat manifests).
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("ffmpeg invocation failed with status {status:?}: {stderr}")]
    FfmpegFailed {
        status: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
