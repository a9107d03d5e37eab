//! Feature table and retry policy shared by the bridge writers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::BridgeError;

/// Fire-rate record name understood by the consumer.
pub const FIRERATE: &str = "Enter Firerate For Force Apply";
/// Enemy speed multiplier record name understood by the consumer.
pub const ENEMY_MULTIPLIER: &str = "Enemy Multiplier";

/// Values keyed by feature name.
pub type BridgeValues = HashMap<String, f64>;

/// Bounds, default and output precision for one bridge record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Record name as it appears left of `=`
    pub name: String,
    /// Lowest value ever written
    pub min: f64,
    /// Highest value ever written
    pub max: f64,
    /// Value used when the record is missing or unparseable
    pub default: f64,
    /// Digits after the decimal point; `0` writes a rounded integer
    pub decimals: u8,
}

impl FeatureSpec {
    /// Create a feature specification.
    pub fn new(name: impl Into<String>, min: f64, max: f64, default: f64, decimals: u8) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            default,
            decimals,
        }
    }

    /// Clamp `value` into `[min, max]`. NaN collapses to the default.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.default;
        }
        value.max(self.min).min(self.max)
    }

    /// Check bounds are finite, ordered, and contain the default.
    ///
    /// # Errors
    ///
    /// [`BridgeError::InvalidFeature`] describing the first problem found.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.name.trim().is_empty() || self.name.contains('=') {
            return Err(BridgeError::InvalidFeature(format!(
                "feature name {:?} must be non-empty and must not contain '='",
                self.name
            )));
        }
        if !(self.min.is_finite() && self.max.is_finite() && self.default.is_finite()) {
            return Err(BridgeError::InvalidFeature(format!(
                "{}: bounds and default must be finite",
                self.name
            )));
        }
        if self.min > self.max {
            return Err(BridgeError::InvalidFeature(format!(
                "{}: min {} exceeds max {}",
                self.name, self.min, self.max
            )));
        }
        if self.default < self.min || self.default > self.max {
            return Err(BridgeError::InvalidFeature(format!(
                "{}: default {} outside [{}, {}]",
                self.name, self.default, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// The two records the consumer script reads.
pub fn default_features() -> Vec<FeatureSpec> {
    vec![
        FeatureSpec::new(FIRERATE, 1000.0, 8000.0, 3000.0, 3),
        FeatureSpec::new(ENEMY_MULTIPLIER, 1.8, 1000.0, 2.0, 2),
    ]
}

/// Fixed-backoff retry for sharing violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts before giving up
    pub attempts: u32,
    /// Sleep between attempts
    #[serde(rename = "backoff_ms", with = "millis")]
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 20,
            backoff: Duration::from_millis(20),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_features_are_valid() -> Result<(), BridgeError> {
        for spec in default_features() {
            spec.validate()?;
        }
        Ok(())
    }

    #[test]
    fn clamp_respects_bounds() {
        let spec = FeatureSpec::new("x", 1.8, 1000.0, 2.0, 2);
        assert!((spec.clamp(0.5) - 1.8).abs() < f64::EPSILON);
        assert!((spec.clamp(5000.0) - 1000.0).abs() < f64::EPSILON);
        assert!((spec.clamp(3.3) - 3.3).abs() < f64::EPSILON);
        assert!((spec.clamp(f64::NAN) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_bad_specs() {
        let cases = [
            FeatureSpec::new("", 0.0, 1.0, 0.5, 0),
            FeatureSpec::new("a=b", 0.0, 1.0, 0.5, 0),
            FeatureSpec::new("x", 2.0, 1.0, 1.5, 0),
            FeatureSpec::new("x", 0.0, 1.0, 2.0, 0),
            FeatureSpec::new("x", f64::NEG_INFINITY, 1.0, 0.0, 0),
        ];
        for spec in cases {
            assert!(
                matches!(spec.validate(), Err(BridgeError::InvalidFeature(_))),
                "{spec:?}"
            );
        }
    }
}
