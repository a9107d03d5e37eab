//! Target/base/gamma response curve.

use serde::{Deserialize, Serialize};

use crate::error::CurveError;

/// Clamped mapping from smoothed FPS to an output rate.
///
/// `rate = clamp(base_rate * f(fps / target_fps), min_rate, max_rate)` where
/// `f(x) = x` for `x >= 1` and `f(x) = x^gamma` below the target.
///
/// The curve is a plain value type: evaluating it has no side effects and
/// never fails.
///
/// # Example
///
/// ```
/// use firerate_curves::ResponseCurve;
///
/// // Gentler falloff below 100 FPS
/// let curve = ResponseCurve::new(100.0, 2000.0, 400.0, 4000.0, 2.0)?;
///
/// // 50 FPS: 2000 * 0.5^2 = 500
/// assert!((curve.map(50.0) - 500.0).abs() < 1e-9);
///
/// // 150 FPS: linear above target, 2000 * 1.5 = 3000
/// assert!((curve.map(150.0) - 3000.0).abs() < 1e-9);
/// # Ok::<(), firerate_curves::CurveError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseCurve {
    /// FPS considered "ideal"; the curve yields `base_rate` here.
    pub target_fps: f64,
    /// Output rate at `target_fps`.
    pub base_rate: f64,
    /// Lower clamp bound.
    pub min_rate: f64,
    /// Upper clamp bound.
    pub max_rate: f64,
    /// Exponent applied to the FPS ratio below target.
    pub gamma: f64,
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            base_rate: 3000.0,
            min_rate: 1000.0,
            max_rate: 8500.0,
            gamma: 1.0,
        }
    }
}

impl ResponseCurve {
    /// Create a validated response curve.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError`] if any parameter is non-finite, if
    /// `target_fps <= 0`, if `gamma <= 0`, or if `min_rate > max_rate`.
    pub fn new(
        target_fps: f64,
        base_rate: f64,
        min_rate: f64,
        max_rate: f64,
        gamma: f64,
    ) -> Result<Self, CurveError> {
        let curve = Self {
            target_fps,
            base_rate,
            min_rate,
            max_rate,
            gamma,
        };
        curve.validate()?;
        Ok(curve)
    }

    /// Validate the curve parameters.
    ///
    /// Deserialized curves bypass [`ResponseCurve::new`], so configuration
    /// loaders call this explicitly.
    pub fn validate(&self) -> Result<(), CurveError> {
        for (name, value) in [
            ("target_fps", self.target_fps),
            ("base_rate", self.base_rate),
            ("min_rate", self.min_rate),
            ("max_rate", self.max_rate),
            ("gamma", self.gamma),
        ] {
            if !value.is_finite() {
                return Err(CurveError::NonFinite { name, value });
            }
        }
        if self.target_fps <= 0.0 {
            return Err(CurveError::InvalidConfiguration(format!(
                "target_fps must be > 0, got {}",
                self.target_fps
            )));
        }
        if self.gamma <= 0.0 {
            return Err(CurveError::InvalidConfiguration(format!(
                "gamma must be > 0, got {}",
                self.gamma
            )));
        }
        if self.min_rate > self.max_rate {
            return Err(CurveError::InvalidConfiguration(format!(
                "min_rate {} exceeds max_rate {}",
                self.min_rate, self.max_rate
            )));
        }
        Ok(())
    }

    /// Map a smoothed FPS value to a clamped output rate.
    ///
    /// Zero, negative, and non-finite inputs map to `min_rate`.
    pub fn map(&self, fps: f64) -> f64 {
        if !fps.is_finite() || fps <= 0.0 {
            return self.min_rate;
        }

        let mut ratio = fps / self.target_fps;
        if ratio < 1.0 {
            ratio = ratio.powf(self.gamma);
        }

        self.clamp(self.base_rate * ratio)
    }

    /// Rate published before any sample arrives: `base_rate` clamped into range.
    pub fn bootstrap_rate(&self) -> f64 {
        self.clamp(self.base_rate)
    }

    #[inline]
    fn clamp(&self, rate: f64) -> f64 {
        if rate.is_nan() {
            return self.min_rate;
        }
        rate.clamp(self.min_rate, self.max_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), CurveError>;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_new_rejects_non_positive_target() {
        let result = ResponseCurve::new(0.0, 3000.0, 1000.0, 8500.0, 1.0);
        assert!(matches!(result, Err(CurveError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_new_rejects_inverted_bounds() {
        let result = ResponseCurve::new(60.0, 3000.0, 9000.0, 8500.0, 1.0);
        assert!(matches!(result, Err(CurveError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_new_rejects_non_finite_gamma() {
        let result = ResponseCurve::new(60.0, 3000.0, 1000.0, 8500.0, f64::INFINITY);
        assert!(matches!(
            result,
            Err(CurveError::NonFinite { name: "gamma", .. })
        ));
    }

    #[test]
    fn test_map_linear_below_target() -> TestResult {
        let curve = ResponseCurve::new(60.0, 3000.0, 1000.0, 8500.0, 1.0)?;
        assert!((curve.map(30.0) - 1500.0).abs() < EPS);
        assert!((curve.map(45.0) - 2250.0).abs() < EPS);
        Ok(())
    }

    #[test]
    fn test_map_gamma_only_below_target() -> TestResult {
        let curve = ResponseCurve::new(100.0, 2000.0, 0.0, 10_000.0, 2.0)?;
        assert!((curve.map(50.0) - 500.0).abs() < EPS);
        assert!((curve.map(200.0) - 4000.0).abs() < EPS);
        Ok(())
    }

    #[test]
    fn test_map_clamps_to_bounds() -> TestResult {
        let curve = ResponseCurve::new(60.0, 3000.0, 1000.0, 8500.0, 1.0)?;
        assert!((curve.map(1.0) - 1000.0).abs() < EPS);
        assert!((curve.map(600.0) - 8500.0).abs() < EPS);
        Ok(())
    }

    #[test]
    fn test_map_guards_degenerate_input() {
        let curve = ResponseCurve::default();
        assert!((curve.map(0.0) - curve.min_rate).abs() < EPS);
        assert!((curve.map(-15.0) - curve.min_rate).abs() < EPS);
        assert!((curve.map(f64::NAN) - curve.min_rate).abs() < EPS);
        assert!((curve.map(f64::INFINITY) - curve.min_rate).abs() < EPS);
    }

    #[test]
    fn test_bootstrap_rate_is_clamped() -> TestResult {
        let inside = ResponseCurve::new(60.0, 3000.0, 1000.0, 8500.0, 1.0)?;
        assert!((inside.bootstrap_rate() - 3000.0).abs() < EPS);

        let above = ResponseCurve::new(60.0, 11_000.0, 1000.0, 8500.0, 1.0)?;
        assert!((above.bootstrap_rate() - 8500.0).abs() < EPS);
        Ok(())
    }

    #[test]
    fn test_serde_round_trip_preserves_fields() -> Result<(), Box<dyn std::error::Error>> {
        let curve = ResponseCurve::new(100.0, 2000.0, 400.0, 4000.0, 1.5)?;
        let json = serde_json::to_string(&curve)?;
        let back: ResponseCurve = serde_json::from_str(&json)?;
        assert_eq!(curve, back);
        Ok(())
    }
}
