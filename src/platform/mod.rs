//! Desktop collaborators: screen capture, key injection and the global hotkey listener.

pub mod capture;
pub mod hotkeys;
pub mod input;

pub use capture::XcapGrabber;
pub use hotkeys::{spawn_hotkey_listener, HotkeyBindings, HotkeyDispatcher};
pub use input::EnigoInput;
