//! Key/value bridge inspection and editing

use anyhow::Result;
use firerate_bridge::{
    BridgeStore, ENEMY_MULTIPLIER, FIRERATE, RetryPolicy, default_features, default_store_file,
};
use std::path::Path;

use crate::error::CliError;
use crate::output;

const ALIASES: &[(&str, &str)] = &[
    ("firerate", FIRERATE),
    ("fire-rate", FIRERATE),
    ("rate", FIRERATE),
    ("multiplier", ENEMY_MULTIPLIER),
    ("enemy-multiplier", ENEMY_MULTIPLIER),
    ("speed", ENEMY_MULTIPLIER),
];

fn open_store(file: Option<&Path>) -> Result<BridgeStore, CliError> {
    let path = file.map_or_else(default_store_file, Path::to_path_buf);
    Ok(BridgeStore::new(path, default_features(), RetryPolicy::default())?)
}

/// Map a user-supplied name to a feature: exact name, case-insensitive name,
/// then alias.
pub fn resolve_feature(store: &BridgeStore, name: &str) -> Result<String, CliError> {
    let trimmed = name.trim();
    let by_name = store
        .features()
        .iter()
        .find(|f| f.name == trimmed)
        .or_else(|| {
            store
                .features()
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(trimmed))
        });
    if let Some(spec) = by_name {
        return Ok(spec.name.clone());
    }

    ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        .map(|(_, feature)| (*feature).to_string())
        .ok_or_else(|| {
            let known = store
                .features()
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            CliError::UnknownFeature(name.to_string(), known)
        })
}

/// Print every record.
pub fn show(file: Option<&Path>, json: bool) -> Result<()> {
    let store = open_store(file)?;
    let values = store.read();
    output::print_values(&store, &values, store.path().exists(), json);
    Ok(())
}

/// Set one record, clamped.
pub fn set(file: Option<&Path>, feature: &str, value: f64, json: bool) -> Result<()> {
    if !value.is_finite() {
        return Err(CliError::ValidationError(format!("value {value} is not finite")).into());
    }
    let store = open_store(file)?;
    let name = resolve_feature(&store, feature)?;
    let stored = store.set(&name, value).map_err(CliError::from)?;
    output::print_applied(&store, &name, stored, None, json);
    Ok(())
}

/// Add `delta` to one record, clamped.
pub fn adjust(file: Option<&Path>, feature: &str, delta: f64, json: bool) -> Result<()> {
    if !delta.is_finite() {
        return Err(CliError::ValidationError(format!("delta {delta} is not finite")).into());
    }
    let store = open_store(file)?;
    let name = resolve_feature(&store, feature)?;
    let stored = store.adjust(&name, delta).map_err(CliError::from)?;
    output::print_applied(&store, &name, stored, Some(delta), json);
    Ok(())
}
