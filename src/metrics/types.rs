use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{pixel::PixelState, session::LoopMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickMetrics {
    pub timestamp: DateTime<Utc>,
    pub mode: LoopMode,
    /// Time spent in the frame grab, when one was made.
    pub capture_ms: Option<u64>,
    pub capture_failed: bool,
    pub transition: Option<PixelState>,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub recent_ticks: Vec<TickMetrics>,
    pub tick_count: u64,
    pub capture_count: u64,
    pub capture_failures: u64,
    pub transition_count: u64,
    pub key_presses: u64,
    pub key_releases: u64,
    pub actuation_failures: u64,
    /// Active ticks whose work took longer than the poll interval.
    pub overruns: u64,
    pub worst_tick_ms: u64,
}
