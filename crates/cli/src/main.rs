//! firectl - Fire-rate bridge control CLI
//!
//! Inspect and edit the key/value bridge file, and exercise the single-value
//! bridge file with a stepping smoke test.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::Level;

use crate::commands::Commands;
use crate::error::CliError;

/// Crates whose events the default filter lets through.
const LOG_TARGETS: &[&str] = &["firectl", "firerate_bridge"];

#[derive(Parser)]
#[command(name = "firectl")]
#[command(about = "Fire-rate bridge control CLI - inspect, edit and smoke-test the bridge files")]
#[command(version)]
#[command(long_about = "
firectl works directly on the bridge files shared with the consumer script.
`show`, `set` and `adjust` edit the key/value bridge file the hotkey layer
uses; `step` writes an increasing value to the single-value file the
controller publishes to, so the consumer can be checked end to end.

Use --json for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    firerate_observability::init_logging(LOG_TARGETS, Level::WARN, cli.verbose);

    match execute_command(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(error: &anyhow::Error) -> u8 {
    error.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}

async fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Step(args) => commands::step::execute(args, cli.json).await,
        Commands::Show { file } => commands::bridge::show(file.as_deref(), cli.json),
        Commands::Set {
            feature,
            value,
            file,
        } => commands::bridge::set(file.as_deref(), feature, *value, cli.json),
        Commands::Adjust {
            feature,
            delta,
            file,
        } => commands::bridge::adjust(file.as_deref(), feature, *delta, cli.json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::StepArgs;
    use std::path::PathBuf;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_step_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["firectl", "step"])?;
        assert!(!cli.json);
        match cli.command {
            Commands::Step(args) => assert_eq!(
                args,
                StepArgs {
                    file: None,
                    start: 1000.0,
                    step: 1000.0,
                    interval: 1.0,
                    count: 10,
                    decimals: 3,
                }
            ),
            _ => return Err("expected step".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_step_overrides() -> TestResult {
        let cli = Cli::try_parse_from([
            "firectl", "step", "--file", "out.txt", "--start", "-5", "--step", "-250.5",
            "--interval", "0.25", "--count", "0", "--json",
        ])?;
        assert!(cli.json);
        let Commands::Step(args) = cli.command else {
            return Err("expected step".into());
        };
        assert_eq!(args.file, Some(PathBuf::from("out.txt")));
        assert!((args.start + 5.0).abs() < f64::EPSILON);
        assert!((args.step + 250.5).abs() < f64::EPSILON);
        assert!((args.interval - 0.25).abs() < f64::EPSILON);
        assert_eq!(args.count, 0);
        Ok(())
    }

    #[test]
    fn parse_adjust_with_negative_delta() -> TestResult {
        let cli = Cli::try_parse_from(["firectl", "adjust", "firerate", "-500", "-vv"])?;
        assert_eq!(cli.verbose, 2);
        let Commands::Adjust { feature, delta, .. } = cli.command else {
            return Err("expected adjust".into());
        };
        assert_eq!(feature, "firerate");
        assert!((delta + 500.0).abs() < f64::EPSILON);
        Ok(())
    }

    #[test]
    fn parse_set_requires_value() {
        assert!(Cli::try_parse_from(["firectl", "set", "firerate"]).is_err());
        assert!(Cli::try_parse_from(["firectl", "set", "firerate", "fast"]).is_err());
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let unknown = anyhow::Error::new(CliError::UnknownFeature("x".into(), String::new()));
        assert_eq!(exit_code(&unknown), 4);
        let busy = anyhow::Error::new(CliError::Busy("locked".into()));
        assert_eq!(exit_code(&busy), 5);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}
