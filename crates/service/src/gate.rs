//! Publish gating.
//!
//! Bounds how often the bridge file is rewritten independently of how many
//! samples arrive: either only when the value moved, or at most once per
//! period.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// When a newly computed rate is written to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PublishPolicy {
    /// Write when the rate differs from the last written one by more than
    /// `min_delta`.
    OnChange {
        /// Smallest change that triggers a write
        min_delta: f64,
    },
    /// Write at most once per `period_ms`.
    Interval {
        /// Minimum time between writes in milliseconds
        period_ms: u64,
    },
}

impl Default for PublishPolicy {
    fn default() -> Self {
        Self::OnChange { min_delta: 0.0 }
    }
}

impl PublishPolicy {
    /// Reject negative deltas and zero periods.
    pub fn validate(&self) -> anyhow::Result<()> {
        match *self {
            Self::OnChange { min_delta } if !min_delta.is_finite() || min_delta < 0.0 => {
                anyhow::bail!("Invalid publish min_delta: {min_delta}")
            }
            Self::Interval { period_ms: 0 } => anyhow::bail!("Invalid publish period: 0 ms"),
            _ => Ok(()),
        }
    }
}

/// Tracks the last publication and applies a [`PublishPolicy`].
#[derive(Debug, Clone)]
pub struct PublishGate {
    policy: PublishPolicy,
    last_value: Option<f64>,
    last_at: Option<Instant>,
    published_count: u64,
    suppressed_count: u64,
}

impl PublishGate {
    /// Create a gate that has not published anything yet.
    pub fn new(policy: PublishPolicy) -> Self {
        Self {
            policy,
            last_value: None,
            last_at: None,
            published_count: 0,
            suppressed_count: 0,
        }
    }

    /// Whether `value` should be written at `now`. A `false` answer is
    /// counted as suppressed.
    pub fn should_publish(&mut self, value: f64, now: Instant) -> bool {
        let open = match (self.policy, self.last_value, self.last_at) {
            (_, None, _) | (_, _, None) => true,
            (PublishPolicy::OnChange { min_delta }, Some(last), _) => {
                (value - last).abs() > min_delta
            }
            (PublishPolicy::Interval { period_ms }, _, Some(at)) => {
                now.saturating_duration_since(at) >= Duration::from_millis(period_ms)
            }
        };
        if !open {
            self.suppressed_count += 1;
        }
        open
    }

    /// Record a completed write.
    pub fn record(&mut self, value: f64, now: Instant) {
        self.last_value = Some(value);
        self.last_at = Some(now);
        self.published_count += 1;
    }

    /// Last value written, if any.
    pub fn last_value(&self) -> Option<f64> {
        self.last_value
    }

    /// Writes recorded.
    pub fn published_count(&self) -> u64 {
        self.published_count
    }

    /// Candidates held back by the policy.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed_count
    }

    /// Configured policy.
    pub fn policy(&self) -> PublishPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_change_skips_equal_values() {
        let mut gate = PublishGate::new(PublishPolicy::OnChange { min_delta: 0.0 });
        let t0 = Instant::now();
        assert!(gate.should_publish(1500.0, t0));
        gate.record(1500.0, t0);
        assert!(!gate.should_publish(1500.0, t0));
        assert!(gate.should_publish(1500.5, t0));
        assert_eq!(gate.suppressed_count(), 1);
        assert_eq!(gate.published_count(), 1);
    }

    #[test]
    fn on_change_honours_min_delta() {
        let mut gate = PublishGate::new(PublishPolicy::OnChange { min_delta: 10.0 });
        let t0 = Instant::now();
        gate.record(3000.0, t0);
        assert!(!gate.should_publish(3009.0, t0));
        assert!(!gate.should_publish(2990.0, t0));
        assert!(gate.should_publish(3010.5, t0));
    }

    #[test]
    fn interval_gates_on_time_only() {
        let mut gate = PublishGate::new(PublishPolicy::Interval { period_ms: 250 });
        let t0 = Instant::now();
        assert!(gate.should_publish(1000.0, t0));
        gate.record(1000.0, t0);
        assert!(!gate.should_publish(5000.0, t0 + Duration::from_millis(100)));
        assert!(gate.should_publish(1000.0, t0 + Duration::from_millis(250)));
    }

    #[test]
    fn policy_serde_is_tagged() -> Result<(), serde_json::Error> {
        let policy: PublishPolicy =
            serde_json::from_str(r#"{ "mode": "interval", "period_ms": 250 }"#)?;
        assert_eq!(policy, PublishPolicy::Interval { period_ms: 250 });
        let json = serde_json::to_string(&PublishPolicy::default())?;
        assert_eq!(json, r#"{"mode":"on_change","min_delta":0.0}"#);
        Ok(())
    }

    #[test]
    fn validate_rejects_degenerate_policies() {
        assert!(PublishPolicy::OnChange { min_delta: -1.0 }.validate().is_err());
        assert!(PublishPolicy::Interval { period_ms: 0 }.validate().is_err());
        assert!(PublishPolicy::default().validate().is_ok());
    }
}
