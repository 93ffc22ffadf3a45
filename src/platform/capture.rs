use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use std::{
    sync::mpsc::{self, Sender},
    thread,
};
use xcap::Monitor;

use crate::{
    error::CaptureError,
    pixel::{Frame, FrameGrabber, Region},
};

/// Position and size of a monitor in global screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl MonitorBounds {
    /// Monitor-local top-left corner of `region`, or `None` when the square does not fit
    /// entirely on this monitor.
    pub fn locate(&self, region: Region) -> Option<(u32, u32)> {
        let x = u32::try_from(i64::from(region.left) - i64::from(self.x)).ok()?;
        let y = u32::try_from(i64::from(region.top) - i64::from(self.y)).ok()?;
        let fits = |start: u32, extent: u32| {
            start
                .checked_add(region.size)
                .is_some_and(|end| end <= extent)
        };
        (fits(x, self.width) && fits(y, self.height)).then_some((x, y))
    }
}

struct CaptureRequest {
    x: u32,
    y: u32,
    size: u32,
    reply: Sender<Result<RgbaImage, String>>,
}

/// Handle to a thread that owns the monitor under the sampled square and grabs just that
/// square from it.
///
/// The monitor is resolved once at startup. Moving the square to another display needs a
/// restart.
pub struct XcapGrabber {
    bounds: MonitorBounds,
    tx: Sender<CaptureRequest>,
}

impl XcapGrabber {
    pub fn spawn(region: Region) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<CaptureRequest>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<MonitorBounds, String>>();

        thread::Builder::new()
            .name("screen-capture".to_string())
            .spawn(move || {
                let monitor = match open_monitor(region) {
                    Ok((monitor, bounds)) => {
                        let _ = ready_tx.send(Ok(bounds));
                        monitor
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err.to_string()));
                        return;
                    }
                };

                while let Ok(request) = rx.recv() {
                    let result = monitor
                        .capture_region(request.x, request.y, request.size, request.size)
                        .map_err(|err| err.to_string());
                    let _ = request.reply.send(result);
                }
                log::debug!("screen capture thread exiting");
            })
            .context("failed to spawn screen capture thread")?;

        let bounds = ready_rx
            .recv()
            .context("screen capture thread exited during setup")?
            .map_err(|err| anyhow!("failed to open monitor at {region}: {err}"))?;
        log::info!(
            "Capturing from monitor at ({}, {}) {}x{}",
            bounds.x,
            bounds.y,
            bounds.width,
            bounds.height
        );

        Ok(Self { bounds, tx })
    }
}

fn open_monitor(region: Region) -> Result<(Monitor, MonitorBounds)> {
    let left = i32::try_from(region.left).context("left edge out of range")?;
    let top = i32::try_from(region.top).context("top edge out of range")?;
    let monitor = Monitor::from_point(left, top)?;
    let bounds = MonitorBounds {
        x: monitor.x()?,
        y: monitor.y()?,
        width: monitor.width()?,
        height: monitor.height()?,
    };
    if bounds.locate(region).is_none() {
        return Err(anyhow!("sample square does not fit on the monitor"));
    }
    Ok((monitor, bounds))
}

impl FrameGrabber for XcapGrabber {
    fn grab(&self, region: Region) -> Result<Frame, CaptureError> {
        let (x, y) = self
            .bounds
            .locate(region)
            .ok_or(CaptureError::OffScreen { region })?;

        let (reply, reply_rx) = mpsc::channel();
        self.tx
            .send(CaptureRequest {
                x,
                y,
                size: region.size,
                reply,
            })
            .map_err(|_| CaptureError::Worker("screen capture thread is gone".into()))?;
        let square = reply_rx
            .recv()
            .map_err(|_| CaptureError::Worker("screen capture thread is gone".into()))?
            .map_err(CaptureError::Backend)?;

        Ok(Frame::rgba(square))
    }
}
