use anyhow::{ensure, Result};
use clap::{ArgAction, Parser};
use std::{fmt, time::Duration};

use crate::{
    actuation::KeyName,
    pixel::{Region, Thresholds},
};

/// Largest sample square accepted on the command line.
pub const MAX_SAMPLE_SIZE: u32 = 64;

/// Immutable settings for one run. Every field is a command-line flag; nothing is persisted.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "autowalk",
    version,
    about = "Holds the move key while an on-screen indicator square reads green"
)]
pub struct AutowalkConfig {
    /// Left edge of the sampled square, in screen pixels.
    #[arg(long, default_value_t = 960)]
    pub pixel_x: u32,
    /// Top edge of the sampled square, in screen pixels.
    #[arg(long, default_value_t = 540)]
    pub pixel_y: u32,
    /// Edge length of the sampled square (NxN pixels are averaged).
    #[arg(long, default_value_t = 3)]
    pub sample_size: u32,

    /// Green channel must be above this to read GREEN.
    #[arg(long, default_value_t = 150)]
    pub green_threshold: u8,
    /// Red channel must be above this to read RED.
    #[arg(long, default_value_t = 150)]
    pub red_threshold: u8,
    /// The other channel must be below this for GREEN or RED.
    #[arg(long, default_value_t = 100)]
    pub off_channel_max: u8,

    /// Delay between active polls, in milliseconds.
    #[arg(long = "poll-rate-ms", default_value_t = 16)]
    pub poll_rate_ms: u64,
    /// Consistent reads required before the state changes.
    #[arg(long, default_value_t = 2)]
    pub debounce_frames: u32,

    /// Key held while the square is green.
    #[arg(long, default_value = "w")]
    pub move_key: String,
    #[arg(long, default_value = "f6")]
    pub toggle_hotkey: String,
    #[arg(long, default_value = "f7")]
    pub quit_hotkey: String,
    #[arg(long, default_value = "f8")]
    pub calibrate_hotkey: String,

    /// Print status events as JSON lines instead of console text.
    #[arg(long)]
    pub json: bool,
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Default for AutowalkConfig {
    fn default() -> Self {
        Self::parse_from(["autowalk"])
    }
}

impl AutowalkConfig {
    pub fn region(&self) -> Region {
        Region {
            left: self.pixel_x,
            top: self.pixel_y,
            size: self.sample_size,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            green_threshold: self.green_threshold,
            red_threshold: self.red_threshold,
            off_channel_max: self.off_channel_max,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_rate_ms)
    }

    pub fn move_key(&self) -> KeyName {
        KeyName::new(self.move_key.clone())
    }

    /// Rejects settings the control loop cannot run with. Key names, and hotkeys bound
    /// twice, are checked by the platform layer once the names are resolved.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.sample_size > 0, "sample size must be at least 1 pixel");
        ensure!(
            self.sample_size <= MAX_SAMPLE_SIZE,
            "sample size must be at most {MAX_SAMPLE_SIZE} pixels"
        );
        ensure!(self.poll_rate_ms > 0, "poll rate must be greater than zero");
        ensure!(self.debounce_frames > 0, "debounce frames must be at least 1");
        ensure!(!self.move_key.trim().is_empty(), "move key must not be empty");
        Ok(())
    }
}

/// Startup banner.
impl fmt::Display for AutowalkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "  AutoWalk (pixel reader)")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "  Pixel position : ({}, {})", self.pixel_x, self.pixel_y)?;
        writeln!(f, "  Sample size    : {0}x{0}", self.sample_size)?;
        writeln!(
            f,
            "  Poll rate      : {}ms (~{}fps)",
            self.poll_rate_ms,
            1000 / self.poll_rate_ms.max(1)
        )?;
        writeln!(f, "  Debounce       : {} frames", self.debounce_frames)?;
        writeln!(f, "  Move key       : {}", self.move_key)?;
        writeln!(f, "  Toggle hotkey  : {}", self.toggle_hotkey)?;
        writeln!(f, "  Calibrate      : {}", self.calibrate_hotkey)?;
        writeln!(f, "  Quit hotkey    : {}", self.quit_hotkey)?;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "  Press {} to start, {} to calibrate, {} to quit",
            self.toggle_hotkey.to_uppercase(),
            self.calibrate_hotkey.to_uppercase(),
            self.quit_hotkey.to_uppercase()
        )?;
        write!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AutowalkConfig {
        let mut argv = vec!["autowalk"];
        argv.extend_from_slice(args);
        AutowalkConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let config = AutowalkConfig::default();
        assert_eq!(
            config.region(),
            Region {
                left: 960,
                top: 540,
                size: 3
            }
        );
        assert_eq!(config.thresholds(), Thresholds::default());
        assert_eq!(config.poll_interval(), Duration::from_millis(16));
        assert_eq!(config.debounce_frames, 2);
        assert_eq!(config.move_key().as_str(), "w");
        assert_eq!(config.toggle_hotkey, "f6");
        assert_eq!(config.quit_hotkey, "f7");
        assert_eq!(config.calibrate_hotkey, "f8");
        config.validate().unwrap();
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--pixel-x",
            "10",
            "--sample-size",
            "5",
            "--off-channel-max",
            "90",
            "--poll-rate-ms",
            "33",
            "--move-key",
            "space",
            "-vv",
        ]);
        assert_eq!(config.region().left, 10);
        assert_eq!(config.region().size, 5);
        assert_eq!(config.thresholds().off_channel_max, 90);
        assert_eq!(config.poll_interval(), Duration::from_millis(33));
        assert_eq!(config.move_key().as_str(), "space");
        assert_eq!(config.verbose, 2);
    }

    #[test]
    fn thresholds_must_fit_a_channel() {
        let argv = ["autowalk", "--green-threshold", "300"];
        assert!(AutowalkConfig::try_parse_from(argv).is_err());
    }

    #[test]
    fn validation_rejects_degenerate_values() {
        assert!(parse(&["--sample-size", "0"]).validate().is_err());
        assert!(parse(&["--sample-size", "65"]).validate().is_err());
        assert!(parse(&["--sample-size", "4294967295"]).validate().is_err());
        parse(&["--sample-size", "64"]).validate().unwrap();
        assert!(parse(&["--poll-rate-ms", "0"]).validate().is_err());
        assert!(parse(&["--debounce-frames", "0"]).validate().is_err());
    }

    #[test]
    fn banner_mentions_hotkeys() {
        let banner = AutowalkConfig::default().to_string();
        assert!(banner.contains("Press F6 to start, F8 to calibrate, F7 to quit"));
        assert!(banner.contains("16ms (~62fps)"));
    }
}
