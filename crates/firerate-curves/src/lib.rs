//! FPS-to-rate response curve for the fire-rate bridge
//!
//! This crate maps a smoothed frames-per-second measurement onto a bounded
//! output rate using a target/base/gamma model.
//!
//! # Overview
//!
//! - At or above the target FPS the rate scales linearly with `fps / target`.
//! - Below the target the ratio is raised to `gamma` before scaling, so
//!   `gamma > 1` softens the penalty for missing the target and `gamma = 1`
//!   keeps the mapping linear.
//! - Every result is clamped to `[min_rate, max_rate]`.
//! - Non-positive or non-finite FPS maps straight to `min_rate`.
//!
//! # Example
//!
//! ```
//! use firerate_curves::ResponseCurve;
//!
//! let curve = ResponseCurve::new(60.0, 3000.0, 1000.0, 8500.0, 1.0)?;
//!
//! assert!((curve.map(30.0) - 1500.0).abs() < 1e-9);
//! assert!((curve.map(60.0) - 3000.0).abs() < 1e-9);
//! assert!((curve.map(0.0) - 1000.0).abs() < 1e-9);
//! # Ok::<(), firerate_curves::CurveError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod response;

pub use error::CurveError;
pub use response::ResponseCurve;
