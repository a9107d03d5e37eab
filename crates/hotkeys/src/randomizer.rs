//! Random mode.
//!
//! While running, a background task repeatedly draws new values for the
//! configured features, writes them in one round trip and sleeps a random
//! delay. The task is owned by [`Randomizer`], which moves between
//! [`RandomizerState::Stopped`] and [`RandomizerState::Running`] and joins
//! the task with a bounded timeout when stopping.

use firerate_bridge::{BridgeStore, BridgeValues, ENEMY_MULTIPLIER, FIRERATE, FeatureSpec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Shortest sleep between rounds, in seconds.
pub const MIN_INTERVAL_SECS: f64 = 0.05;

/// Draw range for one feature, independent of its absolute bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomRange {
    /// Bridge feature name
    pub feature: String,
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

/// Occasional spike for one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierConfig {
    /// Bridge feature name
    pub feature: String,
    /// Value written instead of a ranged draw
    pub value: f64,
    /// Probability per round in `[0, 1]`
    pub chance: f64,
}

/// Random mode tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizerConfig {
    /// Shortest delay between rounds in seconds
    pub interval_min_secs: f64,
    /// Longest delay between rounds in seconds
    pub interval_max_secs: f64,
    /// Per-feature draw ranges
    pub ranges: Vec<RandomRange>,
    /// Optional spike
    pub outlier: Option<OutlierConfig>,
}

impl Default for RandomizerConfig {
    fn default() -> Self {
        Self {
            interval_min_secs: 15.0,
            interval_max_secs: 60.0,
            ranges: vec![
                RandomRange {
                    feature: FIRERATE.to_string(),
                    min: 1000.0,
                    max: 7000.0,
                },
                RandomRange {
                    feature: ENEMY_MULTIPLIER.to_string(),
                    min: 1.6,
                    max: 4.0,
                },
            ],
            outlier: Some(OutlierConfig {
                feature: ENEMY_MULTIPLIER.to_string(),
                value: 250.0,
                chance: 0.25,
            }),
        }
    }
}

/// Values drawn for one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomDraw {
    /// New value per feature, already clamped
    pub values: BridgeValues,
    /// Whether the outlier replaced a ranged draw
    pub outlier_hit: bool,
}

impl RandomizerConfig {
    /// Check every number is finite, the chance is a probability, and every
    /// named feature exists.
    pub fn validate(&self, features: &[FeatureSpec]) -> anyhow::Result<()> {
        if !(self.interval_min_secs.is_finite() && self.interval_max_secs.is_finite()) {
            anyhow::bail!("Random interval bounds must be finite");
        }
        let known = |name: &str| features.iter().any(|f| f.name == name);
        for range in &self.ranges {
            if !known(&range.feature) {
                anyhow::bail!("Random range for unknown feature {:?}", range.feature);
            }
            if !(range.min.is_finite() && range.max.is_finite()) {
                anyhow::bail!("Random range for {:?} must be finite", range.feature);
            }
        }
        if let Some(outlier) = &self.outlier {
            if !known(&outlier.feature) {
                anyhow::bail!("Outlier for unknown feature {:?}", outlier.feature);
            }
            if !outlier.value.is_finite() || !(0.0..=1.0).contains(&outlier.chance) {
                anyhow::bail!(
                    "Invalid outlier {} @ {} for {:?}",
                    outlier.value,
                    outlier.chance,
                    outlier.feature
                );
            }
        }
        Ok(())
    }

    /// Draw one round of values.
    ///
    /// Each feature with a range gets a uniform draw from it, bounds swapped
    /// if inverted. For the outlier feature the fixed outlier value is used
    /// instead with the configured probability. Every value is clamped into
    /// the feature's absolute bounds.
    pub fn draw<R: Rng>(&self, rng: &mut R, features: &[FeatureSpec]) -> RandomDraw {
        let mut values = BridgeValues::with_capacity(features.len());
        let mut outlier_hit = false;

        for spec in features {
            let outlier = self
                .outlier
                .as_ref()
                .filter(|o| o.feature == spec.name)
                .filter(|o| rng.random::<f64>() < o.chance);
            let drawn = match outlier {
                Some(outlier) => {
                    outlier_hit = true;
                    Some(outlier.value)
                }
                None => self
                    .ranges
                    .iter()
                    .find(|r| r.feature == spec.name)
                    .and_then(|r| uniform(rng, r.min, r.max)),
            };
            if let Some(value) = drawn {
                values.insert(spec.name.clone(), spec.clamp(value));
            }
        }

        RandomDraw {
            values,
            outlier_hit,
        }
    }

    /// Delay before the next round: uniform in the configured interval,
    /// bounds swapped if inverted, never below [`MIN_INTERVAL_SECS`].
    pub fn draw_interval<R: Rng>(&self, rng: &mut R) -> Duration {
        let lo = self.interval_min_secs.min(self.interval_max_secs);
        let hi = self.interval_min_secs.max(self.interval_max_secs);
        let lo = lo.max(MIN_INTERVAL_SECS);
        let hi = hi.max(lo);
        let secs = uniform(rng, lo, hi).unwrap_or(MIN_INTERVAL_SECS);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::from_millis(50))
    }
}

fn uniform<R: Rng>(rng: &mut R, a: f64, b: f64) -> Option<f64> {
    if !(a.is_finite() && b.is_finite()) {
        return None;
    }
    let (lo, hi) = if b < a { (b, a) } else { (a, b) };
    Some(rng.random_range(lo..=hi))
}

/// Lifecycle of the random mode task.
#[derive(Debug, Default)]
pub enum RandomizerState {
    /// No task
    #[default]
    Stopped,
    /// Task running until `stop` is signalled
    Running {
        /// Stop signal
        stop: watch::Sender<bool>,
        /// Worker task
        handle: JoinHandle<()>,
    },
}

/// Owns the random mode task.
#[derive(Debug)]
pub struct Randomizer {
    store: Arc<BridgeStore>,
    config: RandomizerConfig,
    join_timeout: Duration,
    state: RandomizerState,
}

impl Randomizer {
    /// Stopped randomizer writing through `store`.
    pub fn new(store: Arc<BridgeStore>, config: RandomizerConfig, join_timeout: Duration) -> Self {
        Self {
            store,
            config,
            join_timeout,
            state: RandomizerState::Stopped,
        }
    }

    /// Whether the worker task is alive.
    pub fn is_running(&self) -> bool {
        match &self.state {
            RandomizerState::Stopped => false,
            RandomizerState::Running { handle, .. } => !handle.is_finished(),
        }
    }

    /// Tuning in use.
    pub fn config(&self) -> &RandomizerConfig {
        &self.config
    }

    /// Start the worker unless it is already running. Must be called from
    /// within a tokio runtime.
    ///
    /// Returns whether a new task was started.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(worker(
            Arc::clone(&self.store),
            self.config.clone(),
            stop_rx,
        ));
        self.state = RandomizerState::Running { stop, handle };
        true
    }

    /// Signal the worker and wait up to the join timeout, aborting it if it
    /// does not finish in time.
    ///
    /// Returns whether a task was running.
    pub async fn stop(&mut self) -> bool {
        let RandomizerState::Running { stop, handle } = std::mem::take(&mut self.state) else {
            return false;
        };
        if stop.send(true).is_err() {
            debug!("Random mode worker already gone");
        }

        let abort = handle.abort_handle();
        match tokio::time::timeout(self.join_timeout, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_cancelled() => {}
            Ok(Err(e)) => error!(error = %e, "Random mode worker failed"),
            Err(_) => {
                warn!(
                    timeout_ms = self.join_timeout.as_millis(),
                    "Random mode worker did not stop in time, aborting"
                );
                abort.abort();
            }
        }
        true
    }

    /// Start when stopped, stop when running.
    ///
    /// Returns whether random mode is running afterwards.
    pub async fn toggle(&mut self) -> bool {
        if self.is_running() {
            self.stop().await;
            false
        } else {
            // A worker that ended on its own still needs joining.
            self.stop().await;
            self.start()
        }
    }
}

async fn worker(store: Arc<BridgeStore>, config: RandomizerConfig, mut stop: watch::Receiver<bool>) {
    info!("Random mode enabled");
    let mut rng = StdRng::from_os_rng();

    while !*stop.borrow() {
        let draw = config.draw(&mut rng, store.features());
        let delay = config.draw_interval(&mut rng);

        let writer = Arc::clone(&store);
        let values = draw.values;
        match tokio::task::spawn_blocking(move || writer.update(&values)).await {
            Ok(Ok(written)) => log_round(&store, &written, draw.outlier_hit),
            Ok(Err(e)) => warn!(error = %e, "Random mode write failed"),
            Err(e) => {
                error!(error = %e, "Random mode write task failed");
                break;
            }
        }

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    info!("Random mode disabled");
}

fn log_round(store: &BridgeStore, written: &BridgeValues, outlier_hit: bool) {
    let summary = store
        .features()
        .iter()
        .filter_map(|spec| {
            let value = written.get(&spec.name)?;
            let text = store.format_value(&spec.name, *value).ok()?;
            Some(format!("{}={text}", spec.name))
        })
        .collect::<Vec<_>>()
        .join(" | ");
    info!(outlier = outlier_hit, values = %summary, "Random values written");
}

#[cfg(test)]
mod tests {
    use super::*;
    use firerate_bridge::default_features;

    #[test]
    fn draws_stay_inside_ranges() {
        let config = RandomizerConfig {
            outlier: None,
            ..RandomizerConfig::default()
        };
        let features = default_features();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let draw = config.draw(&mut rng, &features);
            let rate = draw.values.get(FIRERATE).copied().unwrap_or(f64::NAN);
            let mult = draw.values.get(ENEMY_MULTIPLIER).copied().unwrap_or(f64::NAN);
            assert!((1000.0..=7000.0).contains(&rate), "{rate}");
            // 1.6 lies below the absolute minimum and is clamped up.
            assert!((1.8..=4.0).contains(&mult), "{mult}");
            assert!(!draw.outlier_hit);
        }
    }

    #[test]
    fn inverted_bounds_are_swapped() {
        let config = RandomizerConfig {
            interval_min_secs: 2.0,
            interval_max_secs: 1.0,
            ranges: vec![RandomRange {
                feature: FIRERATE.to_string(),
                min: 5000.0,
                max: 2000.0,
            }],
            outlier: None,
        };
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let draw = config.draw(&mut rng, &default_features());
            let rate = draw.values.get(FIRERATE).copied().unwrap_or(f64::NAN);
            assert!((2000.0..=5000.0).contains(&rate), "{rate}");
            assert!(!draw.values.contains_key(ENEMY_MULTIPLIER));

            let delay = config.draw_interval(&mut rng);
            assert!(delay >= Duration::from_secs(1) && delay <= Duration::from_secs(2));
        }
    }

    #[test]
    fn interval_has_a_floor() {
        let config = RandomizerConfig {
            interval_min_secs: -5.0,
            interval_max_secs: 0.0,
            ..RandomizerConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let delay = config.draw_interval(&mut rng).as_secs_f64();
            assert!((delay - MIN_INTERVAL_SECS).abs() < 1e-6, "{delay}");
        }
    }

    #[test]
    fn validate_rejects_bad_tuning() {
        let features = default_features();
        assert!(RandomizerConfig::default().validate(&features).is_ok());

        let mut bad_chance = RandomizerConfig::default();
        if let Some(outlier) = bad_chance.outlier.as_mut() {
            outlier.chance = 1.5;
        }
        assert!(bad_chance.validate(&features).is_err());

        let mut unknown = RandomizerConfig::default();
        unknown.ranges.push(RandomRange {
            feature: "Enemy Speed".to_string(),
            min: 1.0,
            max: 2.0,
        });
        assert!(unknown.validate(&features).is_err());
    }
}
