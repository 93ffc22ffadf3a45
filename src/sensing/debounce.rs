use serde::Serialize;

use crate::pixel::PixelState;

/// A confirmed change of the debounced state.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Transition {
    pub from: PixelState,
    pub to: PixelState,
}

/// Requires `frames` consecutive identical raw readings before a new state is confirmed.
///
/// The match count is not cleared on confirmation, so a state held past the threshold stays
/// quiet; only a different raw reading restarts the cycle.
#[derive(Debug, Clone)]
pub struct DebounceFilter {
    frames: u32,
    pending: PixelState,
    count: u32,
    confirmed: PixelState,
}

impl DebounceFilter {
    /// `frames` of zero behaves like one.
    pub fn new(frames: u32) -> Self {
        Self {
            frames: frames.max(1),
            pending: PixelState::Unknown,
            count: 0,
            confirmed: PixelState::Unknown,
        }
    }

    pub fn observe(&mut self, raw: PixelState) -> Option<Transition> {
        if raw == self.pending {
            self.count = self.count.saturating_add(1);
        } else {
            self.pending = raw;
            self.count = 1;
        }

        if self.count >= self.frames && raw != self.confirmed {
            let transition = Transition {
                from: self.confirmed,
                to: raw,
            };
            self.confirmed = raw;
            return Some(transition);
        }

        None
    }

    /// Forget everything, including the confirmed state.
    pub fn reset(&mut self) {
        self.pending = PixelState::Unknown;
        self.count = 0;
        self.confirmed = PixelState::Unknown;
    }

    pub fn confirmed(&self) -> PixelState {
        self.confirmed
    }

    pub fn pending(&self) -> (PixelState, u32) {
        (self.pending, self.count)
    }
}
