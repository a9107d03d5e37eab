//! Fixed-input scenarios for the two stock tunings.

use firerate_curves::{CurveError, ResponseCurve};

#[test]
fn capture_log_tuning_halves_rate_at_half_target() -> Result<(), CurveError> {
    let curve = ResponseCurve::new(60.0, 3000.0, 1000.0, 8500.0, 1.0)?;
    for fps in [30.0, 30.0, 30.0] {
        assert!((curve.map(fps) - 1500.0).abs() < 1e-9);
    }
    Ok(())
}

#[test]
fn frameview_tuning_table() -> Result<(), CurveError> {
    let curve = ResponseCurve::new(100.0, 2000.0, 400.0, 4000.0, 1.0)?;
    let expected = [
        (0.0, 400.0),
        (10.0, 400.0),
        (50.0, 1000.0),
        (100.0, 2000.0),
        (150.0, 3000.0),
        (250.0, 4000.0),
    ];
    for (fps, rate) in expected {
        let got = curve.map(fps);
        assert!((got - rate).abs() < 1e-9, "fps {fps}: expected {rate}, got {got}");
    }
    Ok(())
}
