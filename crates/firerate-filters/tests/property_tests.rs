//! Property-Based Tests for the EMA
//!
//! Verifies determinism, convergence, and boundedness across a wide range of
//! inputs.

use firerate_filters::{Ema, FilterError};
use proptest::prelude::*;

proptest! {
    #[test]
    fn first_sample_is_exact(alpha in 0.001f64..=1.0, x in -1e6f64..1e6) {
        let mut ema = Ema::new(alpha).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(ema.update(x).to_bits(), x.to_bits());
    }

    #[test]
    fn constant_stream_converges(alpha in 0.05f64..=1.0, start in 0.0f64..500.0, v in 0.0f64..500.0) {
        let mut ema = Ema::new(alpha).map_err(|e| TestCaseError::fail(e.to_string()))?;
        ema.update(start);
        let mut last = start;
        for _ in 0..2_000 {
            last = ema.update(v);
        }
        prop_assert!((last - v).abs() < 1e-6);
    }

    #[test]
    fn state_stays_between_extremes(
        alpha in 0.01f64..=1.0,
        samples in proptest::collection::vec(1.0f64..300.0, 1..64),
    ) {
        let mut ema = Ema::new(alpha).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let lo = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for s in &samples {
            let v = ema.update(*s);
            prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
        }
    }

    #[test]
    fn deterministic_for_same_sequence(
        alpha in 0.01f64..=1.0,
        samples in proptest::collection::vec(-100.0f64..300.0, 0..32),
    ) {
        let mut a = Ema::new(alpha).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let mut b = a;
        for s in &samples {
            a.update(*s);
            b.update(*s);
        }
        prop_assert_eq!(a.value().map(f64::to_bits), b.value().map(f64::to_bits));
    }
}

#[test]
fn constant_thirty_fps_stays_thirty() -> Result<(), FilterError> {
    let mut ema = Ema::new(0.2)?;
    let smoothed: Vec<f64> = [30.0, 30.0, 30.0].iter().map(|x| ema.update(*x)).collect();
    for v in smoothed {
        assert!((v - 30.0).abs() < 1e-12);
    }
    Ok(())
}
