//! Multi-record bridge file edited in place.
//!
//! The file holds one `name = value` line per known feature. The consumer
//! keeps it open between polls, so the store rewrites the existing file from
//! offset zero and truncates instead of replacing it, and retries with a
//! fixed backoff while the consumer holds a conflicting lock.

use parking_lot::Mutex;
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

use crate::error::{BridgeError, is_sharing_violation};
use crate::feature::{BridgeValues, FeatureSpec, RetryPolicy};
use crate::publisher::format_value;

const NUMBER_PATTERN: &str = r"[-+]?\d+(?:\.\d+)?|[-+]?\.\d+";
const COMMENT_PREFIXES: [&str; 3] = ["#", ";", "--"];

/// Key/value bridge file shared with the consumer.
///
/// All writers in this process go through one mutex; every read-modify-write
/// runs entirely under it. Across processes the last writer wins.
#[derive(Debug)]
pub struct BridgeStore {
    path: PathBuf,
    features: Vec<FeatureSpec>,
    retry: RetryPolicy,
    lock: Mutex<()>,
    number: Regex,
}

impl BridgeStore {
    /// Create a store for `path` with the given feature table.
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidFeature`] for an empty table, a duplicate name or
    /// a feature failing [`FeatureSpec::validate`].
    pub fn new(
        path: impl Into<PathBuf>,
        features: Vec<FeatureSpec>,
        retry: RetryPolicy,
    ) -> Result<Self, BridgeError> {
        if features.is_empty() {
            return Err(BridgeError::InvalidFeature(
                "at least one feature is required".to_string(),
            ));
        }
        for (i, spec) in features.iter().enumerate() {
            spec.validate()?;
            if features.iter().take(i).any(|other| other.name == spec.name) {
                return Err(BridgeError::InvalidFeature(format!(
                    "duplicate feature {:?}",
                    spec.name
                )));
            }
        }

        Ok(Self {
            path: path.into(),
            features,
            retry,
            lock: Mutex::new(()),
            number: Regex::new(NUMBER_PATTERN)?,
        })
    }

    /// Bridge file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Features in canonical order.
    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    /// Look up a feature by exact name.
    pub fn feature(&self, name: &str) -> Option<&FeatureSpec> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Every feature at its default.
    pub fn defaults(&self) -> BridgeValues {
        self.features
            .iter()
            .map(|f| (f.name.clone(), f.default))
            .collect()
    }

    /// Current values; defaults for a missing or unreadable file.
    pub fn read(&self) -> BridgeValues {
        match fs::read(&self.path) {
            Ok(bytes) => self.parse(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(path = ?self.path, error = %e, "Bridge file unreadable, using defaults");
                }
                self.defaults()
            }
        }
    }

    /// Parse bridge file text. Unknown keys are dropped and missing ones take
    /// their default.
    pub fn parse(&self, text: &str) -> BridgeValues {
        let mut values = BridgeValues::with_capacity(self.features.len());

        for line in text.lines() {
            let trimmed = line.trim_start();
            if COMMENT_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
                continue;
            }
            let Some((key, raw)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let Some(spec) = self.feature(key) else {
                if !key.is_empty() {
                    trace!(key, "Ignoring unknown bridge key");
                }
                continue;
            };
            let Some(token) = self.number.find(raw.trim()) else {
                continue;
            };
            if let Ok(value) = token.as_str().parse::<f64>()
                && value.is_finite()
            {
                values.insert(spec.name.clone(), value);
            }
        }

        for spec in &self.features {
            values.entry(spec.name.clone()).or_insert(spec.default);
        }
        values
    }

    /// Canonical text: one line per known feature in table order.
    pub fn serialize(&self, values: &BridgeValues) -> String {
        self.features
            .iter()
            .map(|spec| {
                let value = values.get(&spec.name).copied().unwrap_or(spec.default);
                format!("{} = {}\n", spec.name, format_value(value, spec.decimals))
            })
            .collect()
    }

    /// Format `value` with the precision of feature `name`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnknownFeature`] if `name` is not in the table.
    pub fn format_value(&self, name: &str, value: f64) -> Result<String, BridgeError> {
        let spec = self.spec(name)?;
        Ok(format_value(value, spec.decimals))
    }

    /// Rewrite the file with `values`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Busy`] when the file stayed locked for every attempt,
    /// [`BridgeError::Io`] for other failures.
    pub fn write(&self, values: &BridgeValues) -> Result<(), BridgeError> {
        let content = self.serialize(values);
        self.locked_with_retry(|| self.rewrite(&content))
    }

    /// Set feature `name` to `value` clamped into its bounds.
    ///
    /// Returns the value that was stored.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnknownFeature`] or any [`BridgeStore::write`] error.
    pub fn set(&self, name: &str, value: f64) -> Result<f64, BridgeError> {
        let spec = self.spec(name)?;
        self.locked_with_retry(|| {
            let mut values = self.read();
            let stored = spec.clamp(value);
            values.insert(spec.name.clone(), stored);
            self.rewrite(&self.serialize(&values))?;
            Ok(stored)
        })
    }

    /// Add `delta` to feature `name`, clamping the result.
    ///
    /// Returns the value that was stored.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnknownFeature`] or any [`BridgeStore::write`] error.
    pub fn adjust(&self, name: &str, delta: f64) -> Result<f64, BridgeError> {
        let spec = self.spec(name)?;
        self.locked_with_retry(|| {
            let mut values = self.read();
            let current = values.get(&spec.name).copied().unwrap_or(spec.default);
            let stored = spec.clamp(current + delta);
            values.insert(spec.name.clone(), stored);
            self.rewrite(&self.serialize(&values))?;
            Ok(stored)
        })
    }

    /// Merge `changes` (each clamped) into the file in one round trip.
    ///
    /// Returns the full set of values written.
    ///
    /// # Errors
    ///
    /// [`BridgeError::UnknownFeature`] if any key is unknown, before anything
    /// is written; otherwise any [`BridgeStore::write`] error.
    pub fn update(&self, changes: &BridgeValues) -> Result<BridgeValues, BridgeError> {
        for name in changes.keys() {
            self.spec(name)?;
        }
        self.locked_with_retry(|| {
            let mut values = self.read();
            for spec in &self.features {
                if let Some(value) = changes.get(&spec.name) {
                    values.insert(spec.name.clone(), spec.clamp(*value));
                }
            }
            self.rewrite(&self.serialize(&values))?;
            Ok(values)
        })
    }

    /// Create the file with defaults if it does not exist.
    ///
    /// Returns whether the file was created.
    ///
    /// # Errors
    ///
    /// Any [`BridgeStore::write`] error.
    pub fn ensure_exists(&self) -> Result<bool, BridgeError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.write(&self.defaults())?;
        info!(path = ?self.path, "Created bridge file with defaults");
        Ok(true)
    }

    fn spec(&self, name: &str) -> Result<&FeatureSpec, BridgeError> {
        self.feature(name)
            .ok_or_else(|| BridgeError::UnknownFeature(name.to_string()))
    }

    /// Run `op` under the process lock, retrying sharing violations with the
    /// lock released during each backoff.
    fn locked_with_retry<T>(
        &self,
        mut op: impl FnMut() -> io::Result<T>,
    ) -> Result<T, BridgeError> {
        let attempts = self.retry.attempts.max(1);
        for attempt in 1..=attempts {
            let result = {
                let _guard = self.lock.lock();
                op()
            };
            match result {
                Ok(value) => return Ok(value),
                Err(e) if is_sharing_violation(&e) => {
                    trace!(path = ?self.path, attempt, "Bridge file busy");
                    if attempt < attempts {
                        std::thread::sleep(self.retry.backoff);
                    }
                }
                Err(e) => return Err(BridgeError::io(&self.path, e)),
            }
        }
        Err(BridgeError::Busy {
            path: self.path.clone(),
            attempts,
        })
    }

    /// Overwrite the existing file in place, or create it.
    fn rewrite(&self, content: &str) -> io::Result<()> {
        match OpenOptions::new().read(true).write(true).open(&self.path) {
            Ok(mut file) => {
                file.seek(SeekFrom::Start(0))?;
                file.write_all(content.as_bytes())?;
                let end = file.stream_position()?;
                file.set_len(end)?;
                file.flush()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => fs::write(&self.path, content),
            Err(e) => Err(e),
        }
    }
}
