//! Error types for firectl CLI

use firerate_bridge::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Unknown feature: {0} (expected one of: {1})")]
    UnknownFeature(String, String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bridge file busy: {0}")]
    Busy(String),

    #[error("Bridge error: {0}")]
    BridgeError(BridgeError),
}

impl From<BridgeError> for CliError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Busy { .. } => Self::Busy(error.to_string()),
            other => Self::BridgeError(other),
        }
    }
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::UnknownFeature(..) | Self::ValidationError(_) => 4,
            Self::Busy(_) => 5,
            Self::BridgeError(_) => 1,
        }
    }
}
