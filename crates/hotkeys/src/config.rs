//! Override layer configuration
//!
//! JSON, every field defaulted. The defaults reproduce the stock layout:
//! `num 0` chords drive the fire rate, numpad `add` chords drive the enemy
//! multiplier, `subtract+num 7` toggles random mode and `ctrl+alt+q` quits.

use anyhow::{Context, Result};
use firerate_bridge::{
    BridgeStore, ENEMY_MULTIPLIER, FIRERATE, FeatureSpec, RetryPolicy, default_features,
    default_store_file,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::bindings::{Action, BindingConfig, Bindings};
use crate::randomizer::RandomizerConfig;

/// Complete override layer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideConfig {
    /// Key/value bridge file
    pub bridge_file: PathBuf,
    /// Records in the bridge file, in output order
    pub features: Vec<FeatureSpec>,
    /// Retry while the consumer holds the file
    pub retry: RetryPolicy,
    /// Hotkey bindings
    pub bindings: Vec<BindingConfig>,
    /// Combination that shuts the layer down
    pub quit: String,
    /// Random mode tuning
    pub random: RandomizerConfig,
    /// How long to wait for random mode to stop, in milliseconds
    pub join_timeout_ms: u64,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            bridge_file: default_store_file(),
            features: default_features(),
            retry: RetryPolicy::default(),
            bindings: default_bindings(),
            quit: "ctrl+alt+q".to_string(),
            random: RandomizerConfig::default(),
            join_timeout_ms: 1000,
        }
    }
}

fn set(combo: &str, feature: &str, value: f64) -> BindingConfig {
    BindingConfig::new(
        combo,
        Action::Set {
            feature: feature.to_string(),
            value,
        },
    )
}

fn adjust(combo: &str, feature: &str, delta: f64) -> BindingConfig {
    BindingConfig::new(
        combo,
        Action::Adjust {
            feature: feature.to_string(),
            delta,
        },
    )
}

/// Stock bindings.
pub fn default_bindings() -> Vec<BindingConfig> {
    vec![
        set("num 0+num 5", FIRERATE, 3000.0),
        set("num 0+num 9", FIRERATE, 8000.0),
        set("num 0+num 1", FIRERATE, 1000.0),
        adjust("num 0+num 8", FIRERATE, 1000.0),
        adjust("num 0+num 2", FIRERATE, -1000.0),
        adjust("num 0+num 6", FIRERATE, 500.0),
        adjust("num 0+num 4", FIRERATE, -500.0),
        set("add+num 5", ENEMY_MULTIPLIER, 2.0),
        set("add+num 9", ENEMY_MULTIPLIER, 1000.0),
        set("add+num 1", ENEMY_MULTIPLIER, 1.8),
        adjust("add+num 8", ENEMY_MULTIPLIER, 1.0),
        adjust("add+num 2", ENEMY_MULTIPLIER, -1.0),
        adjust("add+num 6", ENEMY_MULTIPLIER, 0.5),
        adjust("add+num 4", ENEMY_MULTIPLIER, -0.5),
        BindingConfig::new("subtract+num 7", Action::ToggleRandom),
    ]
}

impl OverrideConfig {
    /// Load configuration from a specific path, creating it with defaults
    /// if it does not exist
    pub async fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = ?path, "Config file not found, creating default");
            let config = Self::default();
            config.save_to_path(path).await?;
            return Ok(config);
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: OverrideConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = ?path, "Loaded config");
        Ok(config)
    }

    /// Save configuration to a specific path
    pub async fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        debug!(path = ?path, "Saved config");
        Ok(())
    }

    /// Default configuration file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("No user configuration directory")?;
        Ok(config_dir.join("firerate").join("hotkeys.json"))
    }

    /// Build the bridge store described by this configuration.
    pub fn store(&self) -> Result<BridgeStore> {
        BridgeStore::new(&self.bridge_file, self.features.clone(), self.retry)
            .context("Invalid bridge feature table")
    }

    /// Validate bindings, random mode tuning and the feature table.
    pub fn bindings(&self) -> Result<Bindings> {
        self.random.validate(&self.features)?;
        Bindings::from_config(&self.bindings, &self.quit, &self.features)
            .context("Invalid hotkey bindings")
    }

    /// Random mode join timeout
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}
