//! Manual override layer for the key/value bridge file.
//!
//! Hotkey combinations set or nudge individual bridge records, and a random
//! mode periodically rewrites them with random values. All writes go through
//! one [`firerate_bridge::BridgeStore`], so the layer never races itself;
//! against the external consumer the last writer wins.
//!
//! - [`combo`]: parsing of `"num 0+num 5"` style combinations
//! - [`bindings`]: combination to [`Action`] table, validated up front
//! - [`source`]: [`HotkeySource`] boundary and the line-based console source
//! - [`randomizer`]: random mode state machine
//! - [`layer`]: dispatch loop
//! - [`config`]: JSON configuration

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod bindings;
pub mod combo;
pub mod config;
pub mod error;
pub mod layer;
pub mod randomizer;
pub mod source;

pub use bindings::{Action, BindingConfig, Bindings};
pub use combo::{Combo, Key};
pub use config::{OverrideConfig, default_bindings};
pub use error::HotkeyError;
pub use layer::{Dispatch, OverrideLayer};
pub use randomizer::{
    OutlierConfig, RandomDraw, RandomRange, Randomizer, RandomizerConfig, RandomizerState,
};
pub use source::{ConsoleSource, HotkeySource, spawn_source};
