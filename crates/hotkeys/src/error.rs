//! Error types for the override layer

use firerate_bridge::BridgeError;
use thiserror::Error;

/// Errors raised while binding or dispatching hotkeys.
#[derive(Error, Debug)]
pub enum HotkeyError {
    /// Combination string could not be parsed
    #[error("Invalid hotkey combination {combo:?}: {reason}")]
    InvalidCombo {
        /// Combination as written
        combo: String,
        /// What was wrong with it
        reason: String,
    },

    /// Binding targets a feature the bridge does not know
    #[error("Binding {combo} targets unknown feature {feature:?}")]
    UnknownFeature {
        /// Offending combination
        combo: String,
        /// Feature name as configured
        feature: String,
    },

    /// Two bindings share a combination
    #[error("Hotkey {0} is bound more than once")]
    DuplicateBinding(String),

    /// Binding carries a value that cannot be applied
    #[error("Binding {combo} has invalid amount {amount}")]
    InvalidAmount {
        /// Offending combination
        combo: String,
        /// Configured value or delta
        amount: f64,
    },

    /// Bridge file access failed
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Hotkey source failed
    #[error("Hotkey source error: {0}")]
    Source(#[from] std::io::Error),

    /// Background task panicked or was cancelled
    #[error("Hotkey task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl HotkeyError {
    pub(crate) fn invalid_combo(combo: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCombo {
            combo: combo.to_string(),
            reason: reason.into(),
        }
    }
}
