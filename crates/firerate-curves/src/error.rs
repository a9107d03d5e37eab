//! Error types for curve construction.

use thiserror::Error;

/// Error type for response curve configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    /// A curve parameter is NaN or infinite.
    #[error("Curve parameter `{name}` must be finite, got {value}")]
    NonFinite {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Invalid curve configuration.
    ///
    /// This covers errors like:
    /// - Target FPS <= 0
    /// - Gamma <= 0
    /// - Lower clamp bound above the upper bound
    #[error("Invalid curve configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_non_finite() {
        let err = CurveError::NonFinite {
            name: "gamma",
            value: f64::NAN,
        };
        let msg = err.to_string();
        assert!(msg.contains("gamma"));
        assert!(msg.contains("NaN"));
    }

    #[test]
    fn test_error_display_invalid_config() {
        let err = CurveError::InvalidConfiguration("target_fps must be > 0".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Invalid curve configuration"));
        assert!(msg.contains("target_fps must be > 0"));
    }
}
