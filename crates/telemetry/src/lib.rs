//! Frame-time telemetry ingestion for the fire-rate bridge.
//!
//! The capture tool (PresentMon, FrameView, ...) appends one CSV row per
//! presented frame. This crate turns that log into FPS samples:
//!
//! - [`tailer`]: incremental, rotation-tolerant reader producing samples
//! - [`locator`]: finds the newest log matching the capture naming pattern
//! - [`capture`]: resolves and launches the capture tool executable
//! - [`error`]: error types

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod capture;
pub mod error;
pub mod locator;
pub mod tailer;

pub use capture::{CaptureProcess, expand_args, resolve_capture_tool, strip_quotes};
pub use error::{CaptureError, TailError};
pub use locator::LogLocator;
pub use tailer::{ColumnSpec, LogCursor, LogTailer, TailPoll};
