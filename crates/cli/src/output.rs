//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use firerate_bridge::{BridgeStore, BridgeValues};
use serde_json::json;
use std::path::Path;

use crate::error::CliError;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error)
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

fn error_type_name(error: &Error) -> &'static str {
    match error.downcast_ref::<CliError>() {
        Some(CliError::UnknownFeature(..)) => "unknown_feature",
        Some(CliError::ValidationError(_)) => "validation",
        Some(CliError::Busy(_)) => "busy",
        Some(CliError::BridgeError(_)) => "bridge",
        None => "error",
    }
}

fn print_json(value: &serde_json::Value, what: &str) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format {what} as JSON: {e}"),
    }
}

fn display(store: &BridgeStore, name: &str, value: f64) -> String {
    store
        .format_value(name, value)
        .unwrap_or_else(|_| value.to_string())
}

/// Print every bridge record in canonical order
pub fn print_values(store: &BridgeStore, values: &BridgeValues, exists: bool, json: bool) {
    if json {
        let records: serde_json::Map<String, serde_json::Value> = store
            .features()
            .iter()
            .filter_map(|spec| {
                let value = values.get(&spec.name)?;
                Some((spec.name.clone(), json!(value)))
            })
            .collect();
        print_json(
            &json!({
                "success": true,
                "file": store.path().display().to_string(),
                "exists": exists,
                "values": records
            }),
            "bridge values",
        );
        return;
    }

    println!("{} {}", "Bridge file:".bold(), store.path().display());
    if !exists {
        println!("  {}", "(missing, showing defaults)".yellow());
    }
    for spec in store.features() {
        let value = values.get(&spec.name).copied().unwrap_or(spec.default);
        println!(
            "  {} = {}  {}",
            spec.name,
            display(store, &spec.name, value).green(),
            format!("[{} .. {}]", spec.min, spec.max).dimmed()
        );
    }
}

/// Print the outcome of a set or adjust
pub fn print_applied(store: &BridgeStore, name: &str, value: f64, delta: Option<f64>, json: bool) {
    if json {
        print_json(
            &json!({
                "success": true,
                "feature": name,
                "value": value,
                "delta": delta
            }),
            "update",
        );
        return;
    }

    let text = display(store, name, value);
    match delta {
        Some(delta) => println!("{} {} = {} ({delta:+})", "ADJ".cyan().bold(), name, text.green()),
        None => println!("{} {} = {}", "SET".cyan().bold(), name, text.green()),
    }
}

/// Print the step test baseline
pub fn print_step_start(path: &Path, value: f64, initialized: bool, json: bool) {
    if json {
        print_json(
            &json!({
                "event": "start",
                "file": path.display().to_string(),
                "value": value,
                "initialized": initialized
            }),
            "step start",
        );
    } else if initialized {
        println!("{} Initialized bridge to {value:.1} ({})", "[TEST]".bold(), path.display());
    } else {
        println!(
            "{} Starting from existing bridge value {value:.1} ({})",
            "[TEST]".bold(),
            path.display()
        );
    }
}

/// Print one step
pub fn print_step(from: f64, to: f64, json: bool) {
    if json {
        print_json(&json!({ "event": "step", "from": from, "to": to }), "step");
    } else {
        let direction = if to >= from { "RAISE".green() } else { "LOWER".red() };
        println!("{} {direction}: {from:7.1} -> {to:7.1}", "[TEST]".bold());
    }
}

/// Print the end of the step test
pub fn print_step_end(steps: u64, completed: bool, json: bool) {
    if json {
        print_json(
            &json!({ "event": "end", "steps": steps, "completed": completed }),
            "step end",
        );
    } else if completed {
        println!("{} Done.", "[TEST]".bold());
    } else {
        println!("{} Stopped after {steps} steps.", "[TEST]".bold());
    }
}
