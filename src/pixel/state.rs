use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete reading of the indicator square.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PixelState {
    /// Safe to act: the key should be held.
    Green,
    /// Must not act.
    Red,
    /// Indicator inactive.
    Black,
    #[default]
    Unknown,
}

impl PixelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PixelState::Green => "GREEN",
            PixelState::Red => "RED",
            PixelState::Black => "BLACK",
            PixelState::Unknown => "UNKNOWN",
        }
    }

    /// Whether this state asks for the key to be held down.
    pub fn wants_key_held(&self) -> bool {
        matches!(self, PixelState::Green)
    }
}

impl fmt::Display for PixelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` so callers can align with `{:8}`
        f.pad(self.as_str())
    }
}

/// Per-channel average over the sampled square.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColorSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorSample {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for ColorSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:3}, {:3}, {:3})", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_default() {
        assert_eq!(PixelState::default(), PixelState::Unknown);
    }

    #[test]
    fn display_pads_for_alignment() {
        assert_eq!(format!("{:8}|", PixelState::Red), "RED     |");
        assert_eq!(ColorSample::new(5, 200, 10).to_string(), "(  5, 200,  10)");
    }

    #[test]
    fn serializes_uppercase() {
        let json = serde_json::to_string(&PixelState::Black).unwrap();
        assert_eq!(json, "\"BLACK\"");
    }

    #[test]
    fn only_green_holds_the_key() {
        assert!(PixelState::Green.wants_key_held());
        assert!(!PixelState::Red.wants_key_held());
        assert!(!PixelState::Black.wants_key_held());
        assert!(!PixelState::Unknown.wants_key_held());
    }
}
