//! Logging setup shared by the fire-rate bridge binaries
//!
//! Each binary names the crates whose events it wants and a base level; every
//! `-v` raises that level by one step. `RUST_LOG` replaces the whole filter.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, missing_debug_implementations)]

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LEVELS: [Level; 5] = [
    Level::ERROR,
    Level::WARN,
    Level::INFO,
    Level::DEBUG,
    Level::TRACE,
];

/// `base` raised by `verbose` steps, saturating at `TRACE`.
pub fn level_for_verbosity(base: Level, verbose: u8) -> Level {
    let start = LEVELS.iter().position(|l| *l == base).unwrap_or(2);
    let index = start.saturating_add(usize::from(verbose));
    LEVELS.get(index).copied().unwrap_or(Level::TRACE)
}

/// Filter directive enabling `level` for each of `targets`.
pub fn default_directive(targets: &[&str], level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    targets
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init_logging(targets: &[&str], base: Level, verbose: u8) {
    let level = level_for_verbosity(base, verbose);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(targets, level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_from_base() {
        assert_eq!(level_for_verbosity(Level::INFO, 0), Level::INFO);
        assert_eq!(level_for_verbosity(Level::INFO, 1), Level::DEBUG);
        assert_eq!(level_for_verbosity(Level::INFO, 7), Level::TRACE);
        assert_eq!(level_for_verbosity(Level::WARN, 1), Level::INFO);
        assert_eq!(level_for_verbosity(Level::WARN, u8::MAX), Level::TRACE);
    }

    #[test]
    fn directive_covers_every_target() {
        let directive = default_directive(&["firerated", "firerate_bridge"], Level::DEBUG);
        assert_eq!(directive, "firerated=debug,firerate_bridge=debug");
        assert!(directive.parse::<EnvFilter>().is_ok());
    }
}
