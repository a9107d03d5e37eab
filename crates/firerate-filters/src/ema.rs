//! Exponential Moving Average
//!
//! Single-value smoothing state owned by the controller loop.

use crate::FilterError;

/// Exponential moving average over a stream of samples.
///
/// `value = alpha * x + (1 - alpha) * value`, with the first sample taken
/// verbatim so there is no warm-up bias toward zero.
///
/// - Higher alpha = snappier response, more noise
/// - Lower alpha = smoother, slower to follow changes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    /// Create an unset EMA with the given smoothing coefficient.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidAlpha`] unless `alpha` is finite and in
    /// `(0, 1]`.
    pub fn new(alpha: f64) -> Result<Self, FilterError> {
        if !alpha.is_finite() || alpha <= 0.0 || alpha > 1.0 {
            return Err(FilterError::InvalidAlpha(alpha));
        }
        Ok(Self { alpha, value: None })
    }

    /// Feed one sample and return the updated state.
    pub fn update(&mut self, x: f64) -> f64 {
        let next = match self.value {
            None => x,
            Some(prev) => self.alpha * x + (1.0 - self.alpha) * prev,
        };
        self.value = Some(next);
        next
    }

    /// Current smoothed value, `None` before the first sample.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Smoothing coefficient.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}
