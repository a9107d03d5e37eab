//! Override layer behaviour against a real bridge file.

use firerate_bridge::{BridgeStore, ENEMY_MULTIPLIER, FIRERATE, RetryPolicy, default_features};
use firerate_hotkeys::{
    Combo, Dispatch, OutlierConfig, OverrideConfig, OverrideLayer, Randomizer, RandomizerConfig,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{mpsc, watch};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn store(dir: &TempDir) -> Result<Arc<BridgeStore>, Box<dyn std::error::Error>> {
    let store = BridgeStore::new(
        dir.path().join("hd2_bridge.txt"),
        default_features(),
        RetryPolicy::default(),
    )?;
    Ok(Arc::new(store))
}

fn layer(store: &Arc<BridgeStore>, random: RandomizerConfig) -> Result<OverrideLayer, Box<dyn std::error::Error>> {
    let bindings = OverrideConfig::default().bindings()?;
    let randomizer = Randomizer::new(Arc::clone(store), random, Duration::from_secs(1));
    Ok(OverrideLayer::new(Arc::clone(store), bindings, randomizer))
}

fn fast_random() -> RandomizerConfig {
    RandomizerConfig {
        interval_min_secs: 0.05,
        interval_max_secs: 0.05,
        ..RandomizerConfig::default()
    }
}

fn outlier_config(chance: f64) -> RandomizerConfig {
    RandomizerConfig {
        outlier: Some(OutlierConfig {
            feature: ENEMY_MULTIPLIER.to_string(),
            value: 250.0,
            chance,
        }),
        ..RandomizerConfig::default()
    }
}

#[test]
fn outlier_never_fires_at_zero_chance() {
    let config = outlier_config(0.0);
    let features = default_features();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..1000 {
        let draw = config.draw(&mut rng, &features);
        assert!(!draw.outlier_hit);
        let mult = draw.values.get(ENEMY_MULTIPLIER).copied().unwrap_or(f64::NAN);
        assert!((1.8..=4.0).contains(&mult), "{mult}");
    }
}

#[test]
fn outlier_always_fires_at_full_chance() {
    let config = outlier_config(1.0);
    let features = default_features();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..1000 {
        let draw = config.draw(&mut rng, &features);
        assert!(draw.outlier_hit);
        let mult = draw.values.get(ENEMY_MULTIPLIER).copied().unwrap_or(f64::NAN);
        assert!((mult - 250.0).abs() < f64::EPSILON);
        let rate = draw.values.get(FIRERATE).copied().unwrap_or(f64::NAN);
        assert!((1000.0..=7000.0).contains(&rate), "{rate}");
    }
}

#[test]
fn outlier_is_clamped_to_absolute_bounds() {
    let mut config = outlier_config(1.0);
    if let Some(outlier) = config.outlier.as_mut() {
        outlier.value = 5000.0;
    }
    let draw = config.draw(&mut StdRng::seed_from_u64(1), &default_features());
    let mult = draw.values.get(ENEMY_MULTIPLIER).copied().unwrap_or(f64::NAN);
    assert!((mult - 1000.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn set_and_adjust_hotkeys_edit_the_bridge() -> TestResult {
    let dir = TempDir::new()?;
    let store = store(&dir)?;
    let mut layer = layer(&store, RandomizerConfig::default())?;

    let dispatch = layer.handle(&Combo::parse("num 0+num 9")?).await?;
    assert_eq!(
        dispatch,
        Dispatch::Applied {
            feature: FIRERATE.to_string(),
            value: 8000.0
        }
    );

    // Already at the maximum.
    layer.handle(&Combo::parse("num 0+num 8")?).await?;
    layer.handle(&Combo::parse("num 0+num 4")?).await?;
    layer.handle(&Combo::parse("add+num 2")?).await?;

    let text = std::fs::read_to_string(store.path())?;
    assert_eq!(
        text,
        "Enter Firerate For Force Apply = 7500.000\nEnemy Multiplier = 1.80\n"
    );
    Ok(())
}

#[tokio::test]
async fn unbound_and_quit_combos() -> TestResult {
    let dir = TempDir::new()?;
    let store = store(&dir)?;
    let mut layer = layer(&store, RandomizerConfig::default())?;

    assert_eq!(layer.handle(&Combo::parse("f12")?).await?, Dispatch::Unbound);
    assert_eq!(layer.handle(&Combo::parse("ctrl+alt+q")?).await?, Dispatch::Quit);
    assert!(!store.path().exists());
    Ok(())
}

#[tokio::test]
async fn random_mode_toggles_and_writes() -> TestResult {
    let dir = TempDir::new()?;
    let store = store(&dir)?;
    let mut layer = layer(&store, fast_random())?;
    let toggle = Combo::parse("subtract+num 7")?;

    assert_eq!(layer.handle(&toggle).await?, Dispatch::RandomMode(true));
    assert!(layer.randomizer().is_running());

    let mut written = false;
    for _ in 0..100 {
        if store.path().exists() {
            written = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(written, "random mode never wrote the bridge file");

    assert_eq!(layer.handle(&toggle).await?, Dispatch::RandomMode(false));
    assert!(!layer.randomizer().is_running());

    let values = store.read();
    let rate = values.get(FIRERATE).copied().unwrap_or(f64::NAN);
    assert!((1000.0..=7000.0).contains(&rate), "{rate}");
    Ok(())
}

#[tokio::test]
async fn run_stops_random_mode_on_quit() -> TestResult {
    let dir = TempDir::new()?;
    let store = store(&dir)?;
    let layer = layer(&store, fast_random())?;

    let (tx, rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(layer.run(rx, shutdown_rx));

    tx.send(Combo::parse("subtract+num 7")?).await?;
    tx.send(Combo::parse("num 0+num 1")?).await?;
    tx.send(Combo::parse("ctrl+alt+q")?).await?;

    let layer = tokio::time::timeout(Duration::from_secs(5), task).await??;
    assert!(!layer.randomizer().is_running());
    Ok(())
}

#[tokio::test]
async fn run_exits_on_shutdown_signal() -> TestResult {
    let dir = TempDir::new()?;
    let store = store(&dir)?;
    let layer = layer(&store, RandomizerConfig::default())?;

    let (_tx, rx) = mpsc::channel::<Combo>(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(layer.run(rx, shutdown_rx));

    shutdown_tx.send(true)?;
    tokio::time::timeout(Duration::from_secs(5), task).await??;
    Ok(())
}
