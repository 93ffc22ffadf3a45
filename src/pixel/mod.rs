pub mod classifier;
pub mod sampler;
pub mod state;

pub use classifier::{classify, Thresholds};
pub use sampler::{average_square, ChannelLayout, Frame, FrameGrabber, Region, Sampler};
pub use state::{ColorSample, PixelState};
