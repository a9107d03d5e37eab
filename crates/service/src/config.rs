//! Controller configuration management and validation
//!
//! Stored as JSON. Every field has a default, so a partial file only
//! overrides what it names, and a missing file is created with the defaults
//! on first start.

use anyhow::{Context, Result};
use firerate_bridge::{RetryPolicy, default_exchange_dir, default_value_file};
use firerate_curves::ResponseCurve;
use firerate_telemetry::{ColumnSpec, LogLocator};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::gate::PublishPolicy;

/// Complete controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// FPS to rate mapping
    pub curve: ResponseCurve,
    /// EMA coefficient in `(0, 1]`; higher follows FPS changes faster
    pub ema_alpha: f64,
    /// Controller tick period in milliseconds
    pub poll_interval_ms: u64,
    /// How often the log directory is rescanned, and how long without data
    /// before the current log is considered stale, in milliseconds
    pub rescan_interval_ms: u64,
    /// Bridge output
    pub publish: PublishConfig,
    /// Capture tool and log discovery
    pub capture: CaptureConfig,
    /// Operator-facing log lines
    pub logging: LoggingConfig,
}

/// Bridge output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// File the consumer polls
    pub bridge_file: PathBuf,
    /// Digits written after the decimal point
    pub decimals: u8,
    /// When a newly computed rate is written
    pub policy: PublishPolicy,
    /// Rename retry while the consumer holds the file
    pub retry: RetryPolicy,
}

/// Capture tool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Target game executable, substituted for `{exe}`
    pub exe_name: String,
    /// Directory holding the capture logs
    pub log_dir: PathBuf,
    /// Log file name pattern; `*` and `?` wildcards, `{exe}` placeholder
    pub log_pattern: String,
    /// Header columns to read
    pub columns: ColumnSpec,
    /// Start the capture tool ourselves
    pub launch: bool,
    /// Configured tool location, tried after the flag and environment
    pub tool_path: Option<PathBuf>,
    /// Environment variable naming the tool
    pub tool_env_var: String,
    /// Executable names searched on `PATH` as a last resort
    pub tool_candidates: Vec<String>,
    /// Launch arguments; `{exe}` and `{log}` are substituted
    pub launch_args: Vec<String>,
}

/// Operator log configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Period of the smoothed FPS line in milliseconds; `0` disables it
    pub fps_log_interval_ms: u64,
    /// Smallest rate change worth a raise/lower line
    pub change_eps: f64,
    /// Log every computed rate instead
    pub verbose_updates: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            curve: ResponseCurve::default(),
            ema_alpha: 0.2,
            poll_interval_ms: 200,
            rescan_interval_ms: 3000,
            publish: PublishConfig::default(),
            capture: CaptureConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            bridge_file: default_value_file(),
            decimals: 3,
            policy: PublishPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            exe_name: "helldivers2.exe".to_string(),
            log_dir: default_exchange_dir(),
            log_pattern: "presentmon_hd2.csv".to_string(),
            columns: ColumnSpec::default(),
            launch: true,
            tool_path: Some(PathBuf::from(
                r"C:\Program Files\NVIDIA Corporation\FrameViewSDK\bin\PresentMon_x64.exe",
            )),
            tool_env_var: "PRESENTMON".to_string(),
            tool_candidates: vec![
                "PresentMon_x64.exe".to_string(),
                "PresentMon.exe".to_string(),
                "presentmon.exe".to_string(),
            ],
            launch_args: vec![
                "-process_name".to_string(),
                "{exe}".to_string(),
                "-output_file".to_string(),
                "{log}".to_string(),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            fps_log_interval_ms: 10_000,
            change_eps: 10.0,
            verbose_updates: false,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path).await
    }

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

        let config: ControllerConfig = serde_json::from_str(&content)
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
        Ok(config_dir.join("firerate").join("controller.json"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.curve.validate().context("Invalid response curve")?;

        if !self.ema_alpha.is_finite() || self.ema_alpha <= 0.0 || self.ema_alpha > 1.0 {
            anyhow::bail!("Invalid EMA alpha: {} (must be in (0, 1])", self.ema_alpha);
        }
        if self.poll_interval_ms == 0 {
            anyhow::bail!("Invalid poll interval: 0 ms");
        }
        if self.rescan_interval_ms == 0 {
            anyhow::bail!("Invalid rescan interval: 0 ms");
        }
        if self.publish.decimals > 12 {
            anyhow::bail!("Invalid output precision: {} decimals", self.publish.decimals);
        }
        self.publish.policy.validate()?;

        if self.capture.exe_name.trim().is_empty() {
            anyhow::bail!("Capture target executable name is empty");
        }
        if self.capture.log_pattern.trim().is_empty() {
            anyhow::bail!("Capture log pattern is empty");
        }
        if self.capture.launch && self.capture.log_pattern.contains(['*', '?']) {
            anyhow::bail!(
                "Capture log pattern {:?} must name a single file when launch is enabled",
                self.capture.log_pattern
            );
        }
        if !self.logging.change_eps.is_finite() || self.logging.change_eps < 0.0 {
            anyhow::bail!("Invalid change epsilon: {}", self.logging.change_eps);
        }

        Ok(())
    }

    /// Controller tick period
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Rescan period and staleness threshold
    pub fn rescan_interval(&self) -> Duration {
        Duration::from_millis(self.rescan_interval_ms)
    }

    /// Smoothed FPS log period, `None` when disabled
    pub fn fps_log_interval(&self) -> Option<Duration> {
        (self.logging.fps_log_interval_ms > 0)
            .then(|| Duration::from_millis(self.logging.fps_log_interval_ms))
    }
}

impl CaptureConfig {
    /// Locator for the configured log naming scheme.
    pub fn locator(&self) -> LogLocator {
        LogLocator::new(&self.log_dir, &self.log_pattern, &self.exe_name)
    }

    /// File the launched capture tool writes to.
    pub fn output_file(&self) -> PathBuf {
        self.log_dir.join(self.locator().pattern())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn defaults_validate() -> Result<()> {
        ControllerConfig::default().validate()
    }

    #[test]
    fn partial_json_keeps_defaults() -> TestResult {
        let config: ControllerConfig = serde_json::from_str(
            r#"{
                "ema_alpha": 0.5,
                "curve": { "target_fps": 100.0, "base_rate": 2000.0,
                           "min_rate": 400.0, "max_rate": 4000.0, "gamma": 1.0 },
                "capture": { "log_pattern": "FrameView_{exe}_*_Log.csv", "launch": false }
            }"#,
        )?;
        assert!((config.ema_alpha - 0.5).abs() < f64::EPSILON);
        assert!((config.curve.target_fps - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.poll_interval_ms, 200);
        assert_eq!(config.capture.exe_name, "helldivers2.exe");
        assert_eq!(
            config.capture.locator().pattern(),
            "FrameView_helldivers2.exe_*_Log.csv"
        );
        config.validate()?;
        Ok(())
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = ControllerConfig::default();
        config.ema_alpha = 0.0;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.curve.min_rate = 9000.0;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.capture.log_pattern = "FrameView_*_Log.csv".to_string();
        assert!(config.validate().is_err());
        config.capture.launch = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn output_file_substitutes_exe() {
        let mut capture = CaptureConfig::default();
        capture.log_dir = PathBuf::from("/pub");
        capture.log_pattern = "presentmon_{exe}.csv".to_string();
        assert_eq!(
            capture.output_file(),
            PathBuf::from("/pub/presentmon_helldivers2.exe.csv")
        );
    }

    #[tokio::test]
    async fn load_creates_default_file() -> TestResult {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("controller.json");

        let created = ControllerConfig::load_from_path(&path).await?;
        assert!(path.exists());
        let reloaded = ControllerConfig::load_from_path(&path).await?;
        assert_eq!(created, reloaded);
        Ok(())
    }

    #[tokio::test]
    async fn load_reports_parse_errors() -> TestResult {
        let dir = TempDir::new()?;
        let path = dir.path().join("controller.json");
        tokio::fs::write(&path, "{ not json").await?;

        let err = ControllerConfig::load_from_path(&path).await.err();
        let message = err.map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("Failed to parse config file"));
        Ok(())
    }
}
