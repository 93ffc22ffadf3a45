use log::info;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

use crate::pixel::PixelState;

use super::state::{LoopMode, Resume, SessionSnapshot, SessionState};

/// Manual override delivered by hotkeys, the tray menu or Ctrl-C.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    ToggleEnable,
    ToggleCalibrate,
    Quit,
}

impl SessionState {
    /// Applies one command. Returns whether anything changed.
    pub fn apply(&mut self, command: Command) -> bool {
        if !self.running {
            return false;
        }

        let next = match (command, self.mode) {
            (Command::Quit, _) => {
                self.running = false;
                return true;
            }
            (Command::ToggleEnable, LoopMode::Disabled) => LoopMode::Active,
            (Command::ToggleEnable, LoopMode::Active) => LoopMode::Disabled,
            // Enabling while calibrating only changes where calibration returns to.
            (Command::ToggleEnable, LoopMode::Calibrating { resume }) => LoopMode::Calibrating {
                resume: match resume {
                    Resume::Disabled => Resume::Active,
                    Resume::Active => Resume::Disabled,
                },
            },
            (Command::ToggleCalibrate, LoopMode::Disabled) => LoopMode::Calibrating {
                resume: Resume::Disabled,
            },
            (Command::ToggleCalibrate, LoopMode::Active) => LoopMode::Calibrating {
                resume: Resume::Active,
            },
            (Command::ToggleCalibrate, LoopMode::Calibrating { resume }) => match resume {
                Resume::Disabled => LoopMode::Disabled,
                Resume::Active => LoopMode::Active,
            },
        };

        self.mode = next;
        true
    }
}

/// Cloneable handle to the session lock, shared by the control loop and every command source.
///
/// The lock is only held to copy or flip fields; nothing blocking happens under it.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<Mutex<SessionState>>,
    shutdown: CancellationToken,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn apply(&self, command: Command) -> SessionSnapshot {
        let (changed, snapshot) = {
            let mut guard = self.lock();
            let changed = guard.apply(command);
            (changed, guard.snapshot())
        };

        if changed {
            info!("{command:?} -> {} (running={})", snapshot.mode, snapshot.running);
        }
        if !snapshot.running {
            self.shutdown.cancel();
        }
        snapshot
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Stores what the control loop observed this tick.
    pub fn publish(&self, confirmed: PixelState, key_held: bool) -> SessionSnapshot {
        let mut guard = self.lock();
        guard.confirmed = confirmed;
        guard.key_held = key_held;
        guard.snapshot()
    }

    /// Cancelled once the session stops running; lets the loop cut its wait short.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    // A panicked command source must not keep the loop from releasing the key.
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
