use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use crate::{
    actuation::{ActuationController, VirtualInput},
    config::AutowalkConfig,
    metrics::{MetricsCollector, MetricsSnapshot, TickMetrics},
    pixel::{classify, ColorSample, FrameGrabber, PixelState, Sampler, Thresholds},
    session::{LoopMode, SessionHandle, SessionSnapshot},
    status::{StatusEvent, StatusHub, StatusIndicator},
};

use super::debounce::{DebounceFilter, Transition};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_debug, log_error, log_info, log_warn};

/// Wait between ticks while disabled; no frames are grabbed.
pub const DISABLED_IDLE: Duration = Duration::from_millis(50);
/// Cadence of raw readings while calibrating, independent of the poll rate.
pub const CALIBRATION_INTERVAL: Duration = Duration::from_millis(100);
const SHUTDOWN_RELEASE_ATTEMPTS: u32 = 3;

/// Final state handed back when the loop exits.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopReport {
    pub session: SessionSnapshot,
    pub metrics: MetricsSnapshot,
}

/// Sampler -> classifier -> debounce -> actuation, once per tick.
///
/// Owns the debounce filter and the key controller; the session lock is only taken to copy
/// the mode at the start of a tick and to publish the result at the end.
pub struct ControlLoop {
    session: SessionHandle,
    sampler: Sampler,
    thresholds: Thresholds,
    debounce: DebounceFilter,
    actuation: ActuationController,
    status: StatusHub,
    metrics: MetricsCollector,
    poll_interval: Duration,
    last_mode: LoopMode,
    capture_failing: bool,
}

impl ControlLoop {
    pub fn new(
        config: &AutowalkConfig,
        session: SessionHandle,
        grabber: Arc<dyn FrameGrabber>,
        input: Arc<dyn VirtualInput>,
        status: StatusHub,
    ) -> Self {
        let poll_interval = config.poll_interval();
        Self {
            last_mode: session.snapshot().mode,
            session,
            sampler: Sampler::new(grabber, config.region()),
            thresholds: config.thresholds(),
            debounce: DebounceFilter::new(config.debounce_frames),
            actuation: ActuationController::new(input, config.move_key()),
            status,
            metrics: MetricsCollector::new(poll_interval),
            poll_interval,
            capture_failing: false,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn metrics(&self) -> MetricsCollector {
        self.metrics.clone()
    }

    pub fn debounce(&self) -> &DebounceFilter {
        &self.debounce
    }

    pub fn is_key_held(&self) -> bool {
        self.actuation.is_held()
    }

    /// Ticks until the session stops, then releases the key.
    pub async fn run(mut self) -> LoopReport {
        let shutdown = self.session.shutdown_token();
        log_info!(
            "control loop started: region {}, poll every {:?}",
            self.sampler.region(),
            self.poll_interval
        );

        while let Some(wait) = self.tick().await {
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.cancelled() => {}
            }
        }

        self.shutdown().await
    }

    /// Runs one iteration and returns how long to wait before the next one,
    /// or `None` once the session has stopped.
    pub async fn tick(&mut self) -> Option<Duration> {
        // Flags are read once; changes made mid-tick apply from the next tick.
        let snapshot = self.session.snapshot();
        if !snapshot.running {
            return None;
        }

        let mode = snapshot.mode;
        let started = Instant::now();
        let mode_edge = self.enter_mode(mode).await;

        let mut tick = TickMetrics {
            timestamp: Utc::now(),
            mode,
            capture_ms: None,
            capture_failed: false,
            transition: None,
            total_ms: 0,
        };

        let (wait, transition) = match mode {
            LoopMode::Disabled => {
                self.release_key("automation disabled").await;
                (DISABLED_IDLE, None)
            }
            LoopMode::Active => (self.poll_interval, self.active_tick(&mut tick).await),
            LoopMode::Calibrating { .. } => {
                self.calibration_tick(&mut tick).await;
                (CALIBRATION_INTERVAL, None)
            }
        };

        let published = self
            .session
            .publish(self.debounce.confirmed(), self.actuation.is_held());

        if let Some(from) = mode_edge {
            self.status.notify(&StatusEvent::ModeChanged {
                at: Utc::now(),
                from,
                to: mode,
                indicator: StatusIndicator::for_snapshot(&published),
            });
        }
        if let Some(Transition { from, to }) = transition {
            tick.transition = Some(to);
            self.status.notify(&StatusEvent::Transition {
                at: Utc::now(),
                from,
                to,
                key_held: published.key_held,
                indicator: StatusIndicator::for_snapshot(&published),
            });
        }

        let elapsed = started.elapsed();
        tick.total_ms = elapsed.as_millis() as u64;
        self.metrics.record_tick(tick).await;

        Some(wait.saturating_sub(elapsed))
    }

    /// Handles a mode change since the previous tick. Returns the mode that was left.
    async fn enter_mode(&mut self, mode: LoopMode) -> Option<LoopMode> {
        let previous = self.last_mode;
        self.last_mode = mode;
        // Flipping the resume target while calibrating is not an edge.
        if previous.label() == mode.label() {
            return None;
        }

        if previous.is_active() {
            self.release_key("left active mode").await;
        }
        if mode.is_active() {
            // Re-enabling starts from scratch so a single sample cannot confirm anything.
            self.debounce.reset();
        }
        self.capture_failing = false;

        log_info!("mode {} -> {}", previous, mode);
        Some(previous)
    }

    async fn active_tick(&mut self, tick: &mut TickMetrics) -> Option<Transition> {
        let sample = self.capture(tick).await?;
        let raw = classify(sample, &self.thresholds);
        let transition = self.debounce.observe(raw);

        if let Some(Transition { from, to }) = transition {
            log_info!("confirmed {} -> {} from {}", from, to, sample);
        }

        // Idempotent: only acts on a new confirmation or to retry an edge that failed.
        self.drive(self.debounce.confirmed()).await;
        transition
    }

    async fn calibration_tick(&mut self, tick: &mut TickMetrics) {
        let Some(sample) = self.capture(tick).await else {
            return;
        };
        let state = classify(sample, &self.thresholds);
        log_debug!("calibration reading {} => {}", sample, state);

        self.status.notify(&StatusEvent::CalibrationReading {
            at: Utc::now(),
            sample,
            state,
        });
    }

    async fn capture(&mut self, tick: &mut TickMetrics) -> Option<ColorSample> {
        let capture_start = Instant::now();
        let result = self.sampler.sample().await;
        tick.capture_ms = Some(capture_start.elapsed().as_millis() as u64);

        match result {
            Ok(sample) => {
                if self.capture_failing {
                    log_info!("capture of {} recovered", self.sampler.region());
                    self.capture_failing = false;
                }
                Some(sample)
            }
            Err(err) => {
                tick.capture_failed = true;
                if self.capture_failing {
                    log_debug!("capture still failing: {err}");
                } else {
                    log_warn!("capture of {} failed: {err}", self.sampler.region());
                    self.capture_failing = true;
                }
                None
            }
        }
    }

    async fn drive(&mut self, state: PixelState) {
        match self.actuation.apply(state) {
            Ok(Some(edge)) => {
                log_debug!("{:?} `{}` for {}", edge, self.actuation.key(), state);
                self.metrics.record_key_edge(edge).await;
            }
            Ok(None) => {}
            Err(err) => {
                log_error!("actuation for {} failed: {err}", state);
                self.metrics.record_actuation_failure().await;
            }
        }
    }

    async fn release_key(&mut self, reason: &str) -> bool {
        match self.actuation.force_release() {
            Ok(Some(edge)) => {
                log_info!("released `{}`: {}", self.actuation.key(), reason);
                self.metrics.record_key_edge(edge).await;
                true
            }
            Ok(None) => true,
            Err(err) => {
                log_error!("could not release `{}` ({reason}): {err}", self.actuation.key());
                self.metrics.record_actuation_failure().await;
                false
            }
        }
    }

    async fn shutdown(mut self) -> LoopReport {
        for attempt in 1..=SHUTDOWN_RELEASE_ATTEMPTS {
            if self.release_key("shutting down").await {
                break;
            }
            log_warn!("key release attempt {attempt}/{SHUTDOWN_RELEASE_ATTEMPTS} failed");
        }

        let session = self
            .session
            .publish(self.debounce.confirmed(), self.actuation.is_held());
        self.status.notify(&StatusEvent::Stopped {
            at: Utc::now(),
            key_held: session.key_held,
        });
        log_info!("control loop stopped");

        LoopReport {
            session,
            metrics: self.metrics.get_snapshot().await,
        }
    }
}
