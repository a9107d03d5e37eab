//! Fire-rate controller daemon (firerated)

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result};
use clap::Parser;
use firerate_bridge::AtomicValueFile;
use firerate_service::{Controller, ControllerConfig};
use firerate_telemetry::{CaptureError, CaptureProcess, expand_args, resolve_capture_tool};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{Level, info, warn};

/// Crates whose events the default filter lets through.
const LOG_TARGETS: &[&str] = &[
    "firerated",
    "firerate_service",
    "firerate_telemetry",
    "firerate_bridge",
];

#[derive(Parser, Debug)]
#[command(name = "firerated")]
#[command(about = "Map live frame times onto a fire rate and publish it to the bridge file")]
#[command(version)]
struct Cli {
    /// Configuration file (created with defaults if missing)
    #[arg(long, env = "FIRERATE_CONFIG")]
    config: Option<PathBuf>,

    /// Capture tool executable, overrides every other source
    #[arg(long, value_name = "PATH")]
    capture_tool: Option<PathBuf>,

    /// Do not start the capture tool; only tail existing logs
    #[arg(long)]
    no_launch: bool,

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

    info!("Starting firerated v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("  Caused by: {err}");
                source = err.source();
            }
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<CaptureError>() {
        Some(CaptureError::NotFound { .. }) => 2,
        Some(_) => 3,
        None => 1,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => ControllerConfig::default_config_path()?,
    };
    let mut config = ControllerConfig::load_from_path(&config_path).await?;
    if let Some(bridge_file) = cli.bridge_file {
        config.publish.bridge_file = bridge_file;
    }
    if cli.no_launch {
        config.capture.launch = false;
    }
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;
    info!(path = ?config_path, "Configuration loaded");

    let bridge_file = config.publish.bridge_file.clone();
    if let Some(parent) = bridge_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create bridge directory {}", parent.display()))?;
    }
    let publisher =
        AtomicValueFile::new(&bridge_file, config.publish.decimals).with_retry(config.publish.retry);

    let mut controller = Controller::new(&config, config.capture.locator(), publisher)?;
    controller.bootstrap(Instant::now())?;
    info!(path = ?bridge_file, "Publishing to bridge file");

    let capture = if config.capture.launch {
        Some(launch_capture(&config, cli.capture_tool)?)
    } else {
        info!("Capture tool launch disabled, tailing existing logs");
        None
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received, shutting down"),
            Err(e) => warn!(error = %e, "Failed to listen for interrupt"),
        }
        if shutdown_tx.send(true).is_err() {
            warn!("Controller already stopped");
        }
    });

    let result = controller.run(shutdown_rx).await;

    if let Some(capture) = capture {
        capture.terminate().await;
    }
    result?;
    info!("firerated stopped");
    Ok(())
}

fn launch_capture(config: &ControllerConfig, cli_override: Option<PathBuf>) -> Result<CaptureProcess> {
    let capture = &config.capture;
    let env_value = std::env::var_os(&capture.tool_env_var);
    let search_path = std::env::var_os("PATH");

    let executable = resolve_capture_tool(
        cli_override.as_deref().map(Path::as_os_str),
        env_value.as_deref(),
        &capture.tool_env_var,
        capture.tool_path.as_deref(),
        search_path.as_deref(),
        &capture.tool_candidates,
    )?;

    let output = capture.output_file();
    let args = expand_args(&capture.launch_args, &capture.exe_name, &output);
    info!(tool = ?executable, log = ?output, target = %capture.exe_name, "Starting capture tool");
    Ok(CaptureProcess::launch(&executable, args, Some(&output))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["firerated"])?;
        assert!(!cli.no_launch);
        assert_eq!(cli.verbose, 0);
        assert!(cli.capture_tool.is_none());
        Ok(())
    }

    #[test]
    fn parse_overrides() -> TestResult {
        let cli = Cli::try_parse_from([
            "firerated",
            "--config",
            "ctl.json",
            "--capture-tool",
            "C:/tools/PresentMon.exe",
            "--no-launch",
            "--bridge-file",
            "out.txt",
            "-vv",
        ])?;
        assert_eq!(cli.config, Some(PathBuf::from("ctl.json")));
        assert_eq!(cli.capture_tool, Some(PathBuf::from("C:/tools/PresentMon.exe")));
        assert!(cli.no_launch);
        assert_eq!(cli.bridge_file, Some(PathBuf::from("out.txt")));
        assert_eq!(cli.verbose, 2);
        Ok(())
    }

    #[test]
    fn missing_tool_maps_to_dedicated_exit_code() {
        let err = anyhow::Error::new(CaptureError::NotFound {
            tried: String::new(),
            env_var: "PRESENTMON".to_string(),
        });
        assert_eq!(exit_code(&err), 2);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}
