pub mod controller;
pub mod debounce;
pub mod loop_worker;

pub use controller::SensingController;
pub use debounce::{DebounceFilter, Transition};
pub use loop_worker::{ControlLoop, LoopReport, CALIBRATION_INTERVAL, DISABLED_IDLE};
