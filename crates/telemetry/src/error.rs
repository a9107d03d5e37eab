//! Error types for telemetry ingestion

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while tailing a capture log.
#[derive(Error, Debug)]
pub enum TailError {
    /// The header does not contain the frame-time column; this log cannot
    /// produce samples.
    #[error("Couldn't find '{column}' in capture log header of {path}: {header}")]
    MissingColumn {
        /// Log being tailed
        path: PathBuf,
        /// Column that was looked for
        column: String,
        /// The raw header line
        header: String,
    },

    /// IO error other than the log being absent
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Log being tailed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl TailError {
    /// Whether the log file itself is unusable, as opposed to a transient read
    /// failure.
    pub fn is_fatal_for_log(&self) -> bool {
        matches!(self, Self::MissingColumn { .. })
    }
}

/// Errors raised while resolving or launching the capture tool.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// None of the resolution candidates points at an existing file
    #[error(
        "Capture tool executable not found (tried: {tried}).\n\
         Provide it via --capture-tool, set env {env_var}, keep capture.tool_path \
         in the config correct, or put the tool on PATH."
    )]
    NotFound {
        /// Human-readable list of the candidates that were checked
        tried: String,
        /// Environment variable consulted
        env_var: String,
    },

    /// The executable exists but could not be started
    #[error("Failed to launch capture tool {path}: {source}")]
    Spawn {
        /// Executable path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The stale capture log could not be removed before launch
    #[error("Failed to remove stale capture log {path}: {source}")]
    StaleLog {
        /// Log path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}
