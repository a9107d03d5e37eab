//! Single-value publication with atomic replace.
//!
//! The consumer polls the file and must never observe a half-written number,
//! so each value goes to a sibling temp file that is then renamed over the
//! target. On Windows the rename fails while the consumer has the file open;
//! that is retried with a fixed backoff and finally degraded to a direct
//! overwrite so the value is not lost.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::error::{BridgeError, is_sharing_violation};
use crate::feature::RetryPolicy;

/// How a value reached the target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Temp file renamed over the target
    Replaced,
    /// Rename kept failing; target written directly
    Overwritten,
}

/// Sink for the controller's output value.
pub trait ValuePublisher {
    /// Publish `value`, replacing whatever was published before.
    ///
    /// # Errors
    ///
    /// Returns an error when the value could not be written at all.
    fn publish(&mut self, value: f64) -> Result<PublishOutcome, BridgeError>;
}

/// Format `value` with `decimals` digits; `0` yields a rounded integer.
pub fn format_value(value: f64, decimals: u8) -> String {
    if decimals == 0 {
        format!("{:.0}", value.round())
    } else {
        format!("{value:.prec$}", prec = usize::from(decimals))
    }
}

/// Read a single published value. `None` when missing or not a finite number.
pub fn read_value(path: &Path) -> Option<f64> {
    let text = fs::read_to_string(path).ok()?;
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Bridge file holding exactly one number.
#[derive(Debug, Clone)]
pub struct AtomicValueFile {
    path: PathBuf,
    temp: PathBuf,
    decimals: u8,
    retry: RetryPolicy,
}

impl AtomicValueFile {
    /// Publisher for `path` writing `decimals` digits.
    pub fn new(path: impl Into<PathBuf>, decimals: u8) -> Self {
        let path = path.into();
        let temp = temp_path_for(&path);
        Self {
            path,
            temp,
            decimals,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the rename retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Target file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file values are staged in before the rename.
    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    fn overwrite(&self, text: &str) -> Result<PublishOutcome, BridgeError> {
        fs::write(&self.path, text).map_err(|e| BridgeError::io(&self.path, e))?;
        if let Err(e) = fs::remove_file(&self.temp) {
            debug!(path = ?self.temp, error = %e, "Could not remove staging file");
        }
        Ok(PublishOutcome::Overwritten)
    }
}

impl ValuePublisher for AtomicValueFile {
    fn publish(&mut self, value: f64) -> Result<PublishOutcome, BridgeError> {
        let text = format_value(value, self.decimals);
        fs::write(&self.temp, &text).map_err(|e| BridgeError::io(&self.temp, e))?;

        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match fs::rename(&self.temp, &self.path) {
                Ok(()) => {
                    trace!(path = ?self.path, value = %text, "Published value");
                    return Ok(PublishOutcome::Replaced);
                }
                Err(e) if is_sharing_violation(&e) && attempt < attempts => {
                    trace!(path = ?self.path, attempt, "Bridge file busy, retrying rename");
                    attempt += 1;
                    std::thread::sleep(self.retry.backoff);
                }
                Err(e) => {
                    warn!(
                        path = ?self.path,
                        error = %e,
                        attempts = attempt,
                        "Atomic replace failed, overwriting bridge file directly"
                    );
                    return self.overwrite(&text);
                }
            }
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let temp = path.with_extension("tmp");
    if temp != path {
        return temp;
    }
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
