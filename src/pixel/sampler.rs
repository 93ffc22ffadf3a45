use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

use crate::error::CaptureError;

use super::state::ColorSample;

/// Square screen area sampled every tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    /// Edge length; the square holds `size * size` pixels.
    pub size: u32,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{0}x{0} at ({1}, {2})", self.size, self.left, self.top)
    }
}

/// Byte order of the four channels in each pixel of a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Rgba,
    Bgra,
}

/// Grabbed pixels. The buffer always holds four bytes per pixel, ordered as `layout` says.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pixels: RgbaImage,
    pub layout: ChannelLayout,
}

impl Frame {
    pub fn rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            layout: ChannelLayout::Rgba,
        }
    }

    pub fn bgra(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            layout: ChannelLayout::Bgra,
        }
    }

    fn channels_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let [c0, c1, c2, _] = self.pixels.get_pixel(x, y).0;
        match self.layout {
            ChannelLayout::Rgba => (c0, c1, c2),
            ChannelLayout::Bgra => (c2, c1, c0),
        }
    }
}

/// Captures a rectangle of the screen. Implementations are called from tokio's blocking pool.
pub trait FrameGrabber: Send + Sync {
    fn grab(&self, region: Region) -> Result<Frame, CaptureError>;
}

/// Turns one grab of the configured region into one averaged [`ColorSample`].
#[derive(Clone)]
pub struct Sampler {
    grabber: Arc<dyn FrameGrabber>,
    region: Region,
}

impl Sampler {
    pub fn new(grabber: Arc<dyn FrameGrabber>, region: Region) -> Self {
        Self { grabber, region }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub async fn sample(&self) -> Result<ColorSample, CaptureError> {
        let region = self.region;
        let frame = tokio::task::spawn_blocking({
            let grabber = Arc::clone(&self.grabber);
            move || grabber.grab(region)
        })
        .await
        .map_err(|err| CaptureError::Worker(err.to_string()))??;

        average_square(&frame, region)
    }
}

/// Integer-truncated mean of each channel over the top-left `size x size` pixels of `frame`.
pub fn average_square(frame: &Frame, region: Region) -> Result<ColorSample, CaptureError> {
    let size = region.size;
    let (width, height) = frame.pixels.dimensions();
    if size == 0 || width < size || height < size {
        return Err(CaptureError::FrameTooSmall {
            region,
            width,
            height,
            needed: size,
        });
    }

    let (mut total_r, mut total_g, mut total_b) = (0u64, 0u64, 0u64);
    for y in 0..size {
        for x in 0..size {
            let (r, g, b) = frame.channels_at(x, y);
            total_r += u64::from(r);
            total_g += u64::from(g);
            total_b += u64::from(b);
        }
    }

    let count = u64::from(size) * u64::from(size);
    Ok(ColorSample {
        r: (total_r / count) as u8,
        g: (total_g / count) as u8,
        b: (total_b / count) as u8,
    })
}
