use thiserror::Error;

use crate::pixel::Region;

/// The frame grabber could not produce pixels for the configured region.
/// Transient: the tick is dropped and the next one tries again.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("region {region} is not on any monitor")]
    OffScreen { region: Region },
    #[error("frame is {width}x{height}, region {region} needs at least {needed}x{needed}")]
    FrameTooSmall {
        region: Region,
        width: u32,
        height: u32,
        needed: u32,
    },
    #[error("frame grab failed: {0}")]
    Backend(String),
    #[error("capture worker failed: {0}")]
    Worker(String),
}

/// The virtual input device rejected a press or release.
#[derive(Debug, Error)]
pub enum ActuationError {
    #[error("failed to press `{key}`: {reason}")]
    Press { key: String, reason: String },
    #[error("failed to release `{key}`: {reason}")]
    Release { key: String, reason: String },
    #[error("virtual input device is gone")]
    Disconnected,
}

/// A status observer failed to render a notification. Never propagated past the loop.
#[derive(Debug, Error)]
#[error("status observer failed: {0}")]
pub struct ObserverError(pub String);
