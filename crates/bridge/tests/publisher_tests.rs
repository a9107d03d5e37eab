//! Single-value publisher against real files.

use firerate_bridge::{AtomicValueFile, PublishOutcome, ValuePublisher, read_value};
use std::fs;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn publish_replaces_value_without_leftovers() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("hd2_fire_rate.txt");
    let mut publisher = AtomicValueFile::new(&path, 3);

    assert_eq!(publisher.publish(3000.0)?, PublishOutcome::Replaced);
    assert_eq!(fs::read_to_string(&path)?, "3000.000");

    assert_eq!(publisher.publish(1500.25)?, PublishOutcome::Replaced);
    assert_eq!(fs::read_to_string(&path)?, "1500.250");
    assert_eq!(read_value(&path), Some(1500.25));
    assert!(!publisher.temp_path().exists());
    Ok(())
}

#[test]
fn integer_precision_rounds() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("value.txt");
    let mut publisher = AtomicValueFile::new(&path, 0);
    publisher.publish(2999.7)?;
    assert_eq!(fs::read_to_string(&path)?, "3000");
    Ok(())
}

#[test]
fn read_value_handles_missing_and_garbage() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("value.txt");
    assert_eq!(read_value(&path), None);

    fs::write(&path, "not a number")?;
    assert_eq!(read_value(&path), None);

    fs::write(&path, "  4200.5\r\n")?;
    assert_eq!(read_value(&path), Some(4200.5));
    Ok(())
}

#[test]
fn unwritable_target_is_an_error() -> TestResult {
    let dir = TempDir::new()?;
    let target = dir.path().join("occupied");
    fs::create_dir(&target)?;
    fs::write(target.join("keep"), "x")?;

    let mut publisher = AtomicValueFile::new(&target, 3);
    assert!(publisher.publish(1000.0).is_err());
    assert!(target.is_dir());
    Ok(())
}
