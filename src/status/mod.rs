mod channel;
mod console;

pub use channel::ChannelObserver;
pub use console::ConsoleObserver;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::ObserverError,
    pixel::{ColorSample, PixelState},
    session::{LoopMode, SessionSnapshot},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_debug;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum StatusEvent {
    /// A debounced state change, after the key was driven for it.
    #[serde(rename_all = "camelCase")]
    Transition {
        at: DateTime<Utc>,
        from: PixelState,
        to: PixelState,
        key_held: bool,
        indicator: StatusIndicator,
    },
    /// Enable/disable and calibration edges as seen by the control loop.
    #[serde(rename_all = "camelCase")]
    ModeChanged {
        at: DateTime<Utc>,
        from: LoopMode,
        to: LoopMode,
        indicator: StatusIndicator,
    },
    /// Raw reading streamed while calibrating.
    CalibrationReading {
        at: DateTime<Utc>,
        sample: ColorSample,
        state: PixelState,
    },
    #[serde(rename_all = "camelCase")]
    Stopped { at: DateTime<Utc>, key_held: bool },
}

/// Receives status notifications. Failures are logged and dropped by the loop.
pub trait StatusObserver: Send + Sync {
    fn notify(&self, event: &StatusEvent) -> Result<(), ObserverError>;
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum IndicatorColor {
    Gray,
    Green,
    Red,
    Yellow,
}

/// What a tray icon would show for a session: a color swatch and a tooltip.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StatusIndicator {
    pub color: IndicatorColor,
    pub tooltip: &'static str,
}

impl StatusIndicator {
    pub fn for_snapshot(snapshot: &SessionSnapshot) -> Self {
        let (color, tooltip) = match (snapshot.mode, snapshot.confirmed) {
            (LoopMode::Calibrating { .. }, _) => (IndicatorColor::Gray, "AutoWalk: CALIBRATING"),
            (LoopMode::Disabled, _) => (IndicatorColor::Gray, "AutoWalk: OFF"),
            (LoopMode::Active, PixelState::Green) => (IndicatorColor::Green, "AutoWalk: MOVING"),
            (LoopMode::Active, PixelState::Red) => (IndicatorColor::Red, "AutoWalk: STOPPED"),
            (LoopMode::Active, _) => (IndicatorColor::Yellow, "AutoWalk: UNKNOWN"),
        };
        Self { color, tooltip }
    }
}

/// Fans events out to every registered observer.
#[derive(Default)]
pub struct StatusHub {
    observers: Vec<Box<dyn StatusObserver>>,
}

impl StatusHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl StatusObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn notify(&self, event: &StatusEvent) {
        for observer in &self.observers {
            if let Err(err) = observer.notify(event) {
                log_debug!("dropping status notification: {err}");
            }
        }
    }
}
