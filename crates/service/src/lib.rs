//! Fire-rate controller service
//!
//! Tails the capture tool's frame-time log, smooths FPS, maps it onto a
//! bounded fire rate and publishes it to the bridge file.
//!
//! - [`config`]: JSON configuration with defaults and validation
//! - [`gate`]: publish gating policies
//! - [`controller`]: the control loop state machine

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod controller;
pub mod gate;

pub use config::{CaptureConfig, ControllerConfig, LoggingConfig, PublishConfig};
pub use controller::{Controller, ControllerError, ControllerState, TickOutcome};
pub use gate::{PublishGate, PublishPolicy};
