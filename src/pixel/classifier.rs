use serde::{Deserialize, Serialize};

use super::state::{ColorSample, PixelState};

/// Every channel must be below this for the square to read as black.
pub const BLACK_CHANNEL_MAX: u8 = 50;

/// Color thresholds (0-255) for the indicator square.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thresholds {
    /// Green channel must be above this to read GREEN.
    pub green_threshold: u8,
    /// Red channel must be above this to read RED.
    pub red_threshold: u8,
    /// The competing channel must be below this for GREEN or RED.
    pub off_channel_max: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            green_threshold: 150,
            red_threshold: 150,
            off_channel_max: 100,
        }
    }
}

/// Maps an averaged sample onto a [`PixelState`]. Rules are tried in order and the first
/// match wins, so overlapping thresholds resolve GREEN, then RED, then BLACK.
pub fn classify(sample: ColorSample, thresholds: &Thresholds) -> PixelState {
    let ColorSample { r, g, b } = sample;

    if g > thresholds.green_threshold && r < thresholds.off_channel_max {
        PixelState::Green
    } else if r > thresholds.red_threshold && g < thresholds.off_channel_max {
        PixelState::Red
    } else if r < BLACK_CHANNEL_MAX && g < BLACK_CHANNEL_MAX && b < BLACK_CHANNEL_MAX {
        PixelState::Black
    } else {
        PixelState::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(r: u8, g: u8, b: u8) -> PixelState {
        classify(ColorSample::new(r, g, b), &Thresholds::default())
    }

    #[test]
    fn reference_samples() {
        assert_eq!(state(10, 200, 10), PixelState::Green);
        assert_eq!(state(200, 10, 10), PixelState::Red);
        assert_eq!(state(5, 5, 5), PixelState::Black);
        assert_eq!(state(120, 120, 120), PixelState::Unknown);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(state(10, 150, 10), PixelState::Unknown);
        assert_eq!(state(100, 200, 10), PixelState::Unknown);
        assert_eq!(state(150, 10, 10), PixelState::Unknown);
        assert_eq!(state(49, 49, 50), PixelState::Unknown);
        assert_eq!(state(49, 49, 49), PixelState::Black);
    }

    #[test]
    fn blue_does_not_matter_for_green_or_red() {
        assert_eq!(state(10, 200, 255), PixelState::Green);
        assert_eq!(state(200, 10, 255), PixelState::Red);
    }

    #[test]
    fn rule_order_breaks_ties() {
        // Lowered cutoffs make a dark sample satisfy GREEN, RED and BLACK at once.
        let loose = Thresholds {
            green_threshold: 0,
            red_threshold: 0,
            off_channel_max: 255,
        };
        assert_eq!(classify(ColorSample::new(20, 30, 10), &loose), PixelState::Green);

        let no_green = Thresholds {
            green_threshold: 255,
            ..loose
        };
        assert_eq!(classify(ColorSample::new(20, 30, 10), &no_green), PixelState::Red);
    }

    #[test]
    fn total_over_the_whole_cube() {
        let thresholds = Thresholds::default();
        for r in (0..=255u8).step_by(3) {
            for g in (0..=255u8).step_by(3) {
                for b in (0..=255u8).step_by(15) {
                    let sample = ColorSample::new(r, g, b);
                    let expected = if g > 150 && r < 100 {
                        PixelState::Green
                    } else if r > 150 && g < 100 {
                        PixelState::Red
                    } else if r < 50 && g < 50 && b < 50 {
                        PixelState::Black
                    } else {
                        PixelState::Unknown
                    };
                    assert_eq!(classify(sample, &thresholds), expected, "{sample}");
                }
            }
        }
    }
}
