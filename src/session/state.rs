use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pixel::PixelState;

/// Mode to go back to once calibration is switched off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Resume {
    Disabled,
    Active,
}

/// What the control loop does on its next tick.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum LoopMode {
    /// No sampling; the key is kept released.
    #[default]
    Disabled,
    /// Sample, debounce and drive the key.
    Active,
    /// Stream raw readings only.
    Calibrating { resume: Resume },
}

impl LoopMode {
    pub fn is_active(&self) -> bool {
        matches!(self, LoopMode::Active)
    }

    pub fn is_calibrating(&self) -> bool {
        matches!(self, LoopMode::Calibrating { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoopMode::Disabled => "DISABLED",
            LoopMode::Active => "ACTIVE",
            LoopMode::Calibrating { .. } => "CALIBRATING",
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Shared automation state. Lives behind the session lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub mode: LoopMode,
    pub running: bool,
    /// Last confirmed state, published by the control loop after each tick.
    pub confirmed: PixelState,
    /// Whether the move key is down, published by the control loop after each tick.
    pub key_held: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            mode: LoopMode::Disabled,
            running: true,
            confirmed: PixelState::Unknown,
            key_held: false,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.mode.is_active()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            running: self.running,
            enabled: self.is_enabled(),
            confirmed: self.confirmed,
            key_held: self.key_held,
        }
    }
}

/// Point-in-time copy of [`SessionState`] handed out of the lock.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub mode: LoopMode,
    pub running: bool,
    pub enabled: bool,
    pub confirmed: PixelState,
    pub key_held: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disabled_and_released() {
        let state = SessionState::new();
        assert_eq!(state.mode, LoopMode::Disabled);
        assert_eq!(LoopMode::default(), LoopMode::Disabled);
        assert!(state.running);
        assert!(!state.is_enabled());
        assert!(!state.key_held);
        assert_eq!(state.confirmed, PixelState::Unknown);
    }

    #[test]
    fn calibrating_is_never_enabled() {
        let state = SessionState {
            mode: LoopMode::Calibrating {
                resume: Resume::Active,
            },
            ..SessionState::default()
        };
        assert!(!state.snapshot().enabled);
    }

    #[test]
    fn mode_serializes_with_tag() {
        let json = serde_json::to_value(LoopMode::Calibrating {
            resume: Resume::Active,
        })
        .unwrap();
        assert_eq!(json["mode"], "calibrating");
        assert_eq!(json["resume"], "active");
    }
}
