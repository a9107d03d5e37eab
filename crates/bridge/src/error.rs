//! Error types for bridge file access

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while publishing to or editing the bridge file.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// IO failure other than a transient sharing violation
    #[error("IO error on bridge file {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The consumer kept the file locked for every retry
    #[error("Could not write {path} (file in use after {attempts} attempts)")]
    Busy {
        /// Bridge file
        path: PathBuf,
        /// Attempts made
        attempts: u32,
    },

    /// Name not present in the configured feature table
    #[error("Unknown bridge feature: {0}")]
    UnknownFeature(String),

    /// Feature table rejected at construction
    #[error("Invalid feature specification: {0}")]
    InvalidFeature(String),

    /// Numeric token pattern failed to compile
    #[error("Value pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl BridgeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Windows `ERROR_SHARING_VIOLATION`.
const ERROR_SHARING_VIOLATION: i32 = 32;
/// Windows `ERROR_LOCK_VIOLATION`.
const ERROR_LOCK_VIOLATION: i32 = 33;

/// Whether `err` means another process currently holds the file.
///
/// Windows reports an open handle on the target as either a sharing or lock
/// violation, or as a plain permission error depending on the API used.
pub fn is_sharing_violation(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
        || (cfg!(windows)
            && matches!(
                err.raw_os_error(),
                Some(ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION)
            ))
}
