//! Sample smoothing filters for the fire-rate bridge pipeline
//!
//! The controller feeds every FPS sample derived from the capture log through
//! an exponential moving average before mapping it onto a rate.
//!
//! # Example
//!
//! ```
//! use firerate_filters::Ema;
//!
//! let mut ema = Ema::new(0.2)?;
//! assert!(ema.value().is_none());
//!
//! // First sample is taken as-is
//! assert!((ema.update(30.0) - 30.0).abs() < 1e-12);
//!
//! // Later samples are blended: 0.2 * 60 + 0.8 * 30 = 36
//! assert!((ema.update(60.0) - 36.0).abs() < 1e-9);
//! # Ok::<(), firerate_filters::FilterError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod ema;

pub use ema::Ema;

use thiserror::Error;

/// Error type for filter construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// Smoothing coefficient outside `(0, 1]` or not finite.
    #[error("EMA alpha must be finite and in (0, 1], got {0}")]
    InvalidAlpha(f64),
}
