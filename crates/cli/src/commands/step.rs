//! Single-value bridge smoke test
//!
//! Starts from the value already in the file (or `--start`) and writes
//! `current + step` every interval, so the consumer visibly picks up each
//! new value.

use anyhow::Result;
use firerate_bridge::{AtomicValueFile, ValuePublisher, default_value_file, read_value};
use std::time::Duration;
use tracing::debug;

use crate::commands::StepArgs;
use crate::error::CliError;
use crate::output;

/// Validate and run the step loop until the count is reached or Ctrl-C.
pub async fn execute(args: &StepArgs, json: bool) -> Result<()> {
    let interval = validate(args)?;
    let path = args.file.clone().unwrap_or_else(default_value_file);
    let mut publisher = AtomicValueFile::new(&path, args.decimals);

    let mut current = match read_value(&path) {
        Some(value) => {
            output::print_step_start(&path, value, false, json);
            value
        }
        None => {
            publish(&mut publisher, args.start)?;
            output::print_step_start(&path, args.start, true, json);
            args.start
        }
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut steps: u64 = 0;
    loop {
        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            signal = &mut ctrl_c => {
                if let Err(e) = signal {
                    debug!(error = %e, "Interrupt listener failed");
                }
                output::print_step_end(steps, false, json);
                return Ok(());
            }
        }

        let next = current + args.step;
        publish(&mut publisher, next)?;
        output::print_step(current, next, json);

        current = next;
        steps = steps.saturating_add(1);
        if args.count > 0 && steps >= args.count {
            output::print_step_end(steps, true, json);
            return Ok(());
        }
    }
}

fn validate(args: &StepArgs) -> Result<Duration, CliError> {
    if !args.start.is_finite() || !args.step.is_finite() {
        return Err(CliError::ValidationError(
            "--start and --step must be finite".to_string(),
        ));
    }
    if args.decimals > 12 {
        return Err(CliError::ValidationError(format!(
            "--decimals {} exceeds 12",
            args.decimals
        )));
    }
    Duration::try_from_secs_f64(args.interval).map_err(|e| {
        CliError::ValidationError(format!("--interval {}: {e}", args.interval))
    })
}

fn publish(publisher: &mut AtomicValueFile, value: f64) -> Result<(), CliError> {
    let outcome = publisher.publish(value)?;
    debug!(path = ?publisher.path(), value, ?outcome, "Published");
    Ok(())
}
