//! Property tests: appended log text yields the same samples however the
//! writes are chunked.

use firerate_telemetry::{ColumnSpec, LogTailer, TailPoll};
use proptest::prelude::*;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str = "Application,ProcessID,Dropped,MsBetweenPresents\n";

fn append(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(bytes)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_chunked_appends_yield_every_row_once(
        frame_times in prop::collection::vec(1.0f64..200.0, 1..20),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let rows: Vec<String> = frame_times
            .iter()
            .map(|ms| format!("game.exe,42,0,{ms:.3}\n"))
            .collect();
        let expected: Vec<f64> = frame_times
            .iter()
            .map(|ms| format!("{ms:.3}").parse::<f64>().map(|ms| 1000.0 / ms))
            .collect::<Result<_, _>>()?;

        let text = format!("{HEADER}{}", rows.concat());
        let bytes = text.as_bytes();
        let mut offsets: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len())).collect();
        offsets.push(bytes.len());
        offsets.sort_unstable();
        offsets.dedup();

        let dir = TempDir::new()?;
        let path = dir.path().join("log.csv");
        let mut tailer = LogTailer::new(&path, ColumnSpec::default());

        let mut seen = Vec::new();
        let mut start = 0;
        for end in offsets {
            append(&path, bytes.get(start..end).unwrap_or_default())?;
            start = end;
            if let TailPoll::Samples(samples) = tailer.poll()? {
                seen.extend(samples);
            }
        }

        prop_assert_eq!(seen.len(), expected.len());
        for (got, want) in seen.iter().zip(&expected) {
            prop_assert!((got - want).abs() < 1e-9, "{} vs {}", got, want);
        }
        prop_assert_eq!(tailer.cursor().offset, bytes.len() as u64);
    }
}
