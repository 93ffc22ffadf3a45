pub mod commands;
pub mod state;

pub use commands::{Command, SessionHandle};
pub use state::{LoopMode, Resume, SessionSnapshot, SessionState};
