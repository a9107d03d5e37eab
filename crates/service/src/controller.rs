//! Frame-time to fire-rate control loop.
//!
//! ```text
//!   AcquiringLog ──log found──▶ Streaming ──no data for rescan interval──▶ Stale
//!        ▲                          ▲                                       │
//!        └──────nothing newer───────┼───────────────────────────────────────┘
//!                                   └──────────── newer log ────────────────┘
//! ```
//!
//! Every tick optionally rescans for the newest capture log, runs one tailer
//! pass, feeds the samples through the EMA and the response curve, and hands
//! the rate to the publisher through the [`PublishGate`]. The loop stops only
//! on the shutdown signal; a missing or broken log is never fatal.

use firerate_bridge::{BridgeError, ValuePublisher};
use firerate_curves::{CurveError, ResponseCurve};
use firerate_filters::{Ema, FilterError};
use firerate_telemetry::{ColumnSpec, LogLocator, LogTailer, TailPoll};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::ControllerConfig;
use crate::gate::PublishGate;

/// Controller failures.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Writing the bridge file failed
    #[error("Failed to publish rate: {0}")]
    Publish(#[from] BridgeError),

    /// Response curve parameters rejected
    #[error("Invalid response curve: {0}")]
    Curve(#[from] CurveError),

    /// Smoothing coefficient rejected
    #[error("Invalid smoothing filter: {0}")]
    Filter(#[from] FilterError),

    /// The blocking tick task panicked or was cancelled
    #[error("Controller task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Controller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No usable log selected, or the selected one went quiet and nothing
    /// newer exists
    AcquiringLog,
    /// Samples are arriving from the selected log
    Streaming,
    /// No data for a full rescan interval; a rescan is forced next tick
    Stale,
    /// Shut down
    Stopped,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No log to read
    Waiting,
    /// Log selected, nothing new this pass
    Idle,
    /// Log quiet for the rescan interval
    Stale,
    /// Samples consumed and a rate computed
    Updated {
        /// Smoothed FPS after the batch
        fps: f64,
        /// Rate derived from it
        rate: f64,
        /// Whether the gate let it through to the bridge
        published: bool,
    },
    /// Log cannot produce samples and will be skipped
    Rejected {
        /// The rejected log
        path: PathBuf,
    },
}

/// Drives log tailing, smoothing, mapping and publication.
#[derive(Debug)]
pub struct Controller<P> {
    curve: ResponseCurve,
    ema: Ema,
    gate: PublishGate,
    publisher: P,
    locator: LogLocator,
    columns: ColumnSpec,
    poll_interval: Duration,
    rescan_interval: Duration,
    fps_log_interval: Option<Duration>,
    change_eps: f64,
    verbose_updates: bool,

    state: ControllerState,
    tailer: Option<LogTailer>,
    rejected: Option<PathBuf>,
    force_rescan: bool,
    last_rescan: Option<Instant>,
    last_data: Option<Instant>,
    last_fps_log: Option<Instant>,
    last_rate: Option<f64>,
}

impl<P: ValuePublisher> Controller<P> {
    /// Build a controller from validated configuration.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Curve`] or [`ControllerError::Filter`] for invalid
    /// tuning.
    pub fn new(
        config: &ControllerConfig,
        locator: LogLocator,
        publisher: P,
    ) -> Result<Self, ControllerError> {
        config.curve.validate()?;
        Ok(Self {
            curve: config.curve,
            ema: Ema::new(config.ema_alpha)?,
            gate: PublishGate::new(config.publish.policy),
            publisher,
            locator,
            columns: config.capture.columns.clone(),
            poll_interval: config.poll_interval(),
            rescan_interval: config.rescan_interval(),
            fps_log_interval: config.fps_log_interval(),
            change_eps: config.logging.change_eps,
            verbose_updates: config.logging.verbose_updates,
            state: ControllerState::AcquiringLog,
            tailer: None,
            rejected: None,
            force_rescan: false,
            last_rescan: None,
            last_data: None,
            last_fps_log: None,
            last_rate: None,
        })
    }

    /// Current state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Log currently tailed.
    pub fn current_log(&self) -> Option<&Path> {
        self.tailer.as_ref().map(LogTailer::path)
    }

    /// Smoothed FPS, once any sample arrived.
    pub fn smoothed_fps(&self) -> Option<f64> {
        self.ema.value()
    }

    /// Publication bookkeeping.
    pub fn gate(&self) -> &PublishGate {
        &self.gate
    }

    /// The publisher.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Write the clamped base rate before any sample is seen, replacing
    /// whatever stale value a previous session left behind.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Publish`] when the bridge cannot be written.
    pub fn bootstrap(&mut self, now: Instant) -> Result<f64, ControllerError> {
        let rate = self.curve.bootstrap_rate();
        self.publisher.publish(rate)?;
        self.gate.record(rate, now);
        info!(rate = %format!("{rate:.1}"), "Bootstrap rate published");
        Ok(rate)
    }

    /// Run one controller step at `now`.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Publish`] when a gated write fails. Log problems
    /// are handled internally.
    pub fn tick(&mut self, now: Instant) -> Result<TickOutcome, ControllerError> {
        let rescan_due = self.tailer.is_none()
            || self.force_rescan
            || self
                .last_rescan
                .is_none_or(|at| now.saturating_duration_since(at) >= self.rescan_interval);
        if rescan_due {
            self.rescan(now);
        }

        let Some(tailer) = self.tailer.as_mut() else {
            if self.state != ControllerState::AcquiringLog {
                info!("Waiting for a capture log");
            }
            self.state = ControllerState::AcquiringLog;
            return Ok(TickOutcome::Waiting);
        };

        match tailer.poll() {
            Ok(TailPoll::Samples(samples)) => self.consume(&samples, now),
            Ok(TailPoll::NoData) => Ok(self.check_stale(now)),
            Err(e) if e.is_fatal_for_log() => {
                error!(error = %e, "Capture log unusable, skipping it");
                let path = self
                    .tailer
                    .take()
                    .map(|t| t.path().to_path_buf())
                    .unwrap_or_default();
                self.rejected = Some(path.clone());
                self.state = ControllerState::AcquiringLog;
                Ok(TickOutcome::Rejected { path })
            }
            Err(e) => {
                warn!(error = %e, "Failed to read capture log");
                Ok(TickOutcome::Idle)
            }
        }
    }

    /// Tick on a fixed cadence until `shutdown` flips to `true` or its sender
    /// is dropped.
    ///
    /// File access runs on the blocking pool; the controller moves there and
    /// back for every tick and is returned in the [`ControllerState::Stopped`]
    /// state.
    ///
    /// # Errors
    ///
    /// [`ControllerError::Task`] if a tick panicked.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<Self, ControllerError>
    where
        P: Send + 'static,
    {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            poll_ms = self.poll_interval.as_millis(),
            rescan_ms = self.rescan_interval.as_millis(),
            pattern = self.locator.pattern(),
            "Controller running"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let now = Instant::now();
            let (controller, result) = tokio::task::spawn_blocking(move || {
                let result = self.tick(now);
                (self, result)
            })
            .await?;
            self = controller;

            if let Err(e) = result {
                error!(error = %e, "Controller tick failed");
            }
        }

        self.state = ControllerState::Stopped;
        info!("Controller stopped");
        Ok(self)
    }

    fn rescan(&mut self, now: Instant) {
        let forced = std::mem::take(&mut self.force_rescan);
        self.last_rescan = Some(now);

        let switched = match self.locator.latest() {
            Some(path) if self.rejected.as_deref() == Some(path.as_path()) => {
                debug!(path = ?path, "Newest capture log was rejected earlier");
                false
            }
            Some(path) if self.current_log() != Some(path.as_path()) => {
                info!(path = ?path, "Using capture log");
                self.tailer = Some(LogTailer::new(path, self.columns.clone()));
                self.rejected = None;
                self.last_data = Some(now);
                self.state = ControllerState::Streaming;
                true
            }
            _ => false,
        };

        if forced && !switched {
            debug!("No newer capture log after going stale");
            if self.current_log().is_some_and(|p| !p.exists()) {
                self.tailer = None;
            }
            self.state = ControllerState::AcquiringLog;
            self.last_data = Some(now);
        }
    }

    fn consume(&mut self, samples: &[f64], now: Instant) -> Result<TickOutcome, ControllerError> {
        let mut fps = self.ema.value().unwrap_or(0.0);
        for &sample in samples {
            fps = self.ema.update(sample);
        }
        self.last_data = Some(now);
        self.state = ControllerState::Streaming;

        let rate = self.curve.map(fps);
        let published = if self.gate.should_publish(rate, now) {
            self.publisher.publish(rate)?;
            self.gate.record(rate, now);
            true
        } else {
            false
        };

        self.log_update(fps, rate, now);
        Ok(TickOutcome::Updated {
            fps,
            rate,
            published,
        })
    }

    fn check_stale(&mut self, now: Instant) -> TickOutcome {
        let quiet_for = self
            .last_data
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or(Duration::MAX);
        if quiet_for < self.rescan_interval {
            return TickOutcome::Idle;
        }
        if self.state != ControllerState::Stale {
            debug!(quiet_ms = quiet_for.as_millis(), "Capture log went quiet, rescanning");
        }
        self.state = ControllerState::Stale;
        self.force_rescan = true;
        TickOutcome::Stale
    }

    fn log_update(&mut self, fps: f64, rate: f64, now: Instant) {
        if let Some(period) = self.fps_log_interval
            && self
                .last_fps_log
                .is_none_or(|at| now.saturating_duration_since(at) >= period)
        {
            info!(fps = %format!("{fps:.1}"), "Smoothed FPS");
            self.last_fps_log = Some(now);
        }

        let fps = format!("{fps:.1}");
        match self.last_rate {
            None => info!(rate = %format!("{rate:.1}"), %fps, "Initial rate"),
            Some(prev) => {
                let delta = rate - prev;
                if self.verbose_updates || delta.abs() >= self.change_eps {
                    let from = format!("{prev:.1}");
                    let to = format!("{rate:.1}");
                    if delta > 0.0 {
                        info!(%from, %to, %fps, "Raising rate");
                    } else if delta < 0.0 {
                        info!(%from, %to, %fps, "Lowering rate");
                    } else {
                        info!(rate = %to, %fps, "Holding rate");
                    }
                }
            }
        }
        self.last_rate = Some(rate);
    }
}
