//! Hotkey override layer (firerate-hotkeys)
//!
//! Reads combinations typed on stdin, one per line, and applies the bound
//! actions to the bridge file.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result};
use clap::Parser;
use firerate_hotkeys::{ConsoleSource, OverrideConfig, OverrideLayer, Randomizer, spawn_source};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{Level, info, warn};

/// Crates whose events the default filter lets through.
const LOG_TARGETS: &[&str] = &["firerate_hotkeys", "firerate_bridge"];

#[derive(Parser, Debug)]
#[command(name = "firerate-hotkeys")]
#[command(about = "Set, nudge and randomize bridge values from hotkeys")]
#[command(version)]
struct Cli {
    /// Configuration file (created with defaults if missing)
    #[arg(long, env = "FIRERATE_HOTKEYS_CONFIG")]
    config: Option<PathBuf>,

    /// Bridge file, overrides the configured one
    #[arg(long, value_name = "PATH")]
    bridge_file: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    firerate_observability::init_logging(LOG_TARGETS, Level::INFO, cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("  Caused by: {err}");
                source = err.source();
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => OverrideConfig::default_config_path()?,
    };
    let mut config = OverrideConfig::load_from_path(&config_path).await?;
    if let Some(bridge_file) = cli.bridge_file {
        config.bridge_file = bridge_file;
    }

    let store = Arc::new(config.store()?);
    let bindings = config
        .bindings()
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    let ensure = Arc::clone(&store);
    tokio::task::spawn_blocking(move || ensure.ensure_exists())
        .await?
        .context("Failed to create bridge file")?;

    let random = &config.random;
    info!(
        interval = %format!("{}-{}s", random.interval_min_secs, random.interval_max_secs),
        ranges = random.ranges.len(),
        outlier = ?random.outlier.as_ref().map(|o| format!("{} @ {:.1}%", o.value, o.chance * 100.0)),
        "Random mode settings"
    );
    info!(path = ?store.path(), "Editing bridge file");
    for (combo, action) in bindings.iter() {
        info!(%combo, ?action, "Bound");
    }
    info!(quit = %config.quit, "Type a combination per line; the quit combination or Ctrl-C exits");

    let randomizer = Randomizer::new(Arc::clone(&store), config.random.clone(), config.join_timeout());
    let layer = OverrideLayer::new(store, bindings, randomizer);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received, shutting down"),
            Err(e) => warn!(error = %e, "Failed to listen for interrupt"),
        }
        if shutdown_tx.send(true).is_err() {
            warn!("Override layer already stopped");
        }
    });

    let events = spawn_source(ConsoleSource::stdin(), 16);
    layer.run(events, shutdown_rx).await;
    info!("Exiting hotkeys");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_args() -> TestResult {
        let cli = Cli::try_parse_from([
            "firerate-hotkeys",
            "--config",
            "keys.json",
            "--bridge-file",
            "bridge.txt",
            "-v",
        ])?;
        assert_eq!(cli.config, Some(PathBuf::from("keys.json")));
        assert_eq!(cli.bridge_file, Some(PathBuf::from("bridge.txt")));
        assert_eq!(cli.verbose, 1);
        Ok(())
    }
}
