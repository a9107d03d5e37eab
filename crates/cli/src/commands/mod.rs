//! Command implementations for firectl CLI

pub mod bridge;
pub mod step;

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Write an increasing value to a single-value bridge file
    Step(StepArgs),

    /// Show every record of the key/value bridge file
    Show {
        /// Key/value bridge file
        #[arg(long, env = "FIRERATE_BRIDGE_FILE")]
        file: Option<PathBuf>,
    },

    /// Set one record of the key/value bridge file
    Set {
        /// Feature name or alias (firerate, multiplier)
        feature: String,
        /// New value, clamped to the feature bounds
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// Key/value bridge file
        #[arg(long, env = "FIRERATE_BRIDGE_FILE")]
        file: Option<PathBuf>,
    },

    /// Add a delta to one record of the key/value bridge file
    Adjust {
        /// Feature name or alias (firerate, multiplier)
        feature: String,
        /// Signed change, result clamped to the feature bounds
        #[arg(allow_negative_numbers = true)]
        delta: f64,
        /// Key/value bridge file
        #[arg(long, env = "FIRERATE_BRIDGE_FILE")]
        file: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct StepArgs {
    /// Single-value bridge file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Starting value if the file is missing or unreadable
    #[arg(long, default_value_t = 1000.0, allow_negative_numbers = true)]
    pub start: f64,

    /// Increment per tick
    #[arg(long, default_value_t = 1000.0, allow_negative_numbers = true)]
    pub step: f64,

    /// Seconds between writes
    #[arg(long, default_value_t = 1.0)]
    pub interval: f64,

    /// Number of steps, 0 for no limit
    #[arg(long, default_value_t = 10)]
    pub count: u64,

    /// Digits written after the decimal point
    #[arg(long, default_value_t = 3)]
    pub decimals: u8,
}
