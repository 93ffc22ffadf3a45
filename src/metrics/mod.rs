mod types;

pub use types::{MetricsSnapshot, TickMetrics};

use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

use crate::actuation::KeyEdge;

const MAX_RECENT_TICKS: usize = 20;

/// Counters for one run of the control loop. Cheap to clone; clones share the same counters.
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
    poll_interval: Duration,
}

#[derive(Default)]
struct MetricsState {
    snapshot: MetricsSnapshot,
}

impl MetricsCollector {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState::default())),
            poll_interval,
        }
    }

    pub async fn record_tick(&self, tick: TickMetrics) {
        let mut state = self.inner.lock().await;
        let totals = &mut state.snapshot;

        totals.tick_count += 1;
        if tick.capture_ms.is_some() {
            totals.capture_count += 1;
        }
        if tick.capture_failed {
            totals.capture_failures += 1;
        }
        if tick.transition.is_some() {
            totals.transition_count += 1;
        }
        if tick.mode.is_active() && tick.total_ms > self.poll_interval.as_millis() as u64 {
            totals.overruns += 1;
        }
        totals.worst_tick_ms = totals.worst_tick_ms.max(tick.total_ms);

        totals.recent_ticks.push(tick);
        if totals.recent_ticks.len() > MAX_RECENT_TICKS {
            totals.recent_ticks.remove(0);
        }
    }

    pub async fn record_key_edge(&self, edge: KeyEdge) {
        let mut state = self.inner.lock().await;
        match edge {
            KeyEdge::Pressed => state.snapshot.key_presses += 1,
            KeyEdge::Released => state.snapshot.key_releases += 1,
        }
    }

    pub async fn record_actuation_failure(&self) {
        self.inner.lock().await.snapshot.actuation_failures += 1;
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().await.snapshot.clone()
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            poll_interval: self.poll_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pixel::PixelState, session::LoopMode};
    use chrono::Utc;

    fn tick(mode: LoopMode, total_ms: u64) -> TickMetrics {
        TickMetrics {
            timestamp: Utc::now(),
            mode,
            capture_ms: Some(1),
            capture_failed: false,
            transition: None,
            total_ms,
        }
    }

    #[tokio::test]
    async fn counts_and_keeps_recent_window() {
        let metrics = MetricsCollector::new(Duration::from_millis(16));
        for _ in 0..25 {
            metrics.record_tick(tick(LoopMode::Active, 3)).await;
        }
        metrics
            .record_tick(TickMetrics {
                transition: Some(PixelState::Green),
                ..tick(LoopMode::Active, 40)
            })
            .await;
        metrics.record_key_edge(KeyEdge::Pressed).await;

        let snapshot = metrics.get_snapshot().await;
        assert_eq!(snapshot.tick_count, 26);
        assert_eq!(snapshot.capture_count, 26);
        assert_eq!(snapshot.transition_count, 1);
        assert_eq!(snapshot.overruns, 1);
        assert_eq!(snapshot.worst_tick_ms, 40);
        assert_eq!(snapshot.key_presses, 1);
        assert_eq!(snapshot.recent_ticks.len(), MAX_RECENT_TICKS);
    }

    #[tokio::test]
    async fn slow_calibration_ticks_are_not_overruns() {
        let metrics = MetricsCollector::new(Duration::from_millis(16));
        let calibrating = LoopMode::Calibrating {
            resume: crate::session::Resume::Disabled,
        };
        metrics.record_tick(tick(calibrating, 90)).await;
        assert_eq!(metrics.get_snapshot().await.overruns, 0);

        let clone = metrics.clone();
        clone.record_tick(tick(LoopMode::Active, 2)).await;
        assert_eq!(metrics.get_snapshot().await.tick_count, 2);
    }
}
