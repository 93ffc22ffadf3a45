use anyhow::{bail, ensure, Context, Result};
use rdev::{EventType, Key};
use std::thread::{self, JoinHandle};

use crate::{
    config::AutowalkConfig,
    session::{Command, SessionHandle},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Global keys bound to the three session commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotkeyBindings {
    pub toggle: Key,
    pub quit: Key,
    pub calibrate: Key,
}

impl HotkeyBindings {
    /// Resolves the configured names. Two names for the same key (`esc` and `escape`)
    /// count as a clash.
    pub fn from_config(config: &AutowalkConfig) -> Result<Self> {
        let bindings = Self {
            toggle: parse_hotkey(&config.toggle_hotkey).context("toggle hotkey")?,
            quit: parse_hotkey(&config.quit_hotkey).context("quit hotkey")?,
            calibrate: parse_hotkey(&config.calibrate_hotkey).context("calibrate hotkey")?,
        };
        let named = [
            (bindings.toggle, &config.toggle_hotkey),
            (bindings.quit, &config.quit_hotkey),
            (bindings.calibrate, &config.calibrate_hotkey),
        ];
        for (i, (key, name)) in named.iter().enumerate() {
            for (other, other_name) in &named[i + 1..] {
                ensure!(
                    key != other,
                    "hotkeys `{name}` and `{other_name}` are the same key"
                );
            }
        }
        Ok(bindings)
    }

    pub fn command_for(&self, key: Key) -> Option<Command> {
        if key == self.toggle {
            Some(Command::ToggleEnable)
        } else if key == self.quit {
            Some(Command::Quit)
        } else if key == self.calibrate {
            Some(Command::ToggleCalibrate)
        } else {
            None
        }
    }
}

/// Turns raw key events into commands, one per physical press. Auto-repeat presses of a key
/// that is already down are ignored until it is released.
#[derive(Debug)]
pub struct HotkeyDispatcher {
    bindings: HotkeyBindings,
    down: Vec<Key>,
}

impl HotkeyDispatcher {
    pub fn new(bindings: HotkeyBindings) -> Self {
        Self {
            bindings,
            down: Vec::new(),
        }
    }

    pub fn on_event(&mut self, event: &EventType) -> Option<Command> {
        match *event {
            EventType::KeyPress(key) => {
                let command = self.bindings.command_for(key)?;
                if self.down.contains(&key) {
                    return None;
                }
                self.down.push(key);
                Some(command)
            }
            EventType::KeyRelease(key) => {
                self.down.retain(|held| *held != key);
                None
            }
            _ => None,
        }
    }
}

/// Listens for global hotkeys on a dedicated thread and applies them to the session.
///
/// rdev offers no way to stop a listener, so the thread lives until the process exits.
pub fn spawn_hotkey_listener(
    bindings: HotkeyBindings,
    session: SessionHandle,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("hotkey-listener".to_string())
        .spawn(move || {
            let mut dispatcher = HotkeyDispatcher::new(bindings);
            let result = rdev::listen(move |event| {
                if let Some(command) = dispatcher.on_event(&event.event_type) {
                    log_info!("[HOTKEY] {command:?}");
                    session.apply(command);
                }
            });
            if let Err(err) = result {
                log_error!("hotkey listener stopped: {err:?}");
            }
        })
        .context("failed to spawn hotkey listener thread")
}

/// Resolves a hotkey name (`f6`, `F8`, `q`, `5`, `escape`, ...).
pub fn parse_hotkey(name: &str) -> Result<Key> {
    let lower = name.trim().to_ascii_lowercase();

    let mut chars = lower.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(key) = char_key(c) {
            return Ok(key);
        }
        bail!("unsupported hotkey `{name}`");
    }

    let key = match lower.as_str() {
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        "escape" | "esc" => Key::Escape,
        "space" => Key::Space,
        "tab" => Key::Tab,
        "home" => Key::Home,
        "end" => Key::End,
        "insert" => Key::Insert,
        "delete" => Key::Delete,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "pause" => Key::Pause,
        "scrolllock" => Key::ScrollLock,
        _ => bail!("unsupported hotkey `{name}`"),
    };
    Ok(key)
}

fn char_key(c: char) -> Option<Key> {
    Some(match c {
        'a' => Key::KeyA,
        'b' => Key::KeyB,
        'c' => Key::KeyC,
        'd' => Key::KeyD,
        'e' => Key::KeyE,
        'f' => Key::KeyF,
        'g' => Key::KeyG,
        'h' => Key::KeyH,
        'i' => Key::KeyI,
        'j' => Key::KeyJ,
        'k' => Key::KeyK,
        'l' => Key::KeyL,
        'm' => Key::KeyM,
        'n' => Key::KeyN,
        'o' => Key::KeyO,
        'p' => Key::KeyP,
        'q' => Key::KeyQ,
        'r' => Key::KeyR,
        's' => Key::KeyS,
        't' => Key::KeyT,
        'u' => Key::KeyU,
        'v' => Key::KeyV,
        'w' => Key::KeyW,
        'x' => Key::KeyX,
        'y' => Key::KeyY,
        'z' => Key::KeyZ,
        '0' => Key::Num0,
        '1' => Key::Num1,
        '2' => Key::Num2,
        '3' => Key::Num3,
        '4' => Key::Num4,
        '5' => Key::Num5,
        '6' => Key::Num6,
        '7' => Key::Num7,
        '8' => Key::Num8,
        '9' => Key::Num9,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings() -> HotkeyBindings {
        HotkeyBindings::from_config(&AutowalkConfig::default()).unwrap()
    }

    #[test]
    fn default_bindings() {
        let bindings = bindings();
        assert_eq!(bindings.toggle, Key::F6);
        assert_eq!(bindings.quit, Key::F7);
        assert_eq!(bindings.calibrate, Key::F8);
        assert_eq!(bindings.command_for(Key::F8), Some(Command::ToggleCalibrate));
        assert_eq!(bindings.command_for(Key::KeyW), None);
    }

    #[test]
    fn one_key_cannot_serve_two_commands() {
        let config = |args: &[&str]| {
            let mut argv = vec!["autowalk"];
            argv.extend_from_slice(args);
            <AutowalkConfig as clap::Parser>::parse_from(argv)
        };
        let spelled_twice = config(&["--quit-hotkey", "esc", "--toggle-hotkey", "escape"]);
        assert!(HotkeyBindings::from_config(&spelled_twice).is_err());
        let case_only = config(&["--quit-hotkey", "F6"]);
        assert!(HotkeyBindings::from_config(&case_only).is_err());
        let distinct = config(&["--quit-hotkey", "esc"]);
        assert_eq!(HotkeyBindings::from_config(&distinct).unwrap().quit, Key::Escape);
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(parse_hotkey("F6").unwrap(), Key::F6);
        assert_eq!(parse_hotkey("Esc").unwrap(), Key::Escape);
        assert_eq!(parse_hotkey("Q").unwrap(), Key::KeyQ);
        assert_eq!(parse_hotkey("7").unwrap(), Key::Num7);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(parse_hotkey("f13").is_err());
        assert!(parse_hotkey("?").is_err());
        assert!(parse_hotkey("hyper").is_err());
    }

    #[test]
    fn auto_repeat_fires_once() {
        let mut dispatcher = HotkeyDispatcher::new(bindings());
        let press = EventType::KeyPress(Key::F6);
        assert_eq!(dispatcher.on_event(&press), Some(Command::ToggleEnable));
        assert_eq!(dispatcher.on_event(&press), None);
        assert_eq!(dispatcher.on_event(&press), None);
        assert_eq!(dispatcher.on_event(&EventType::KeyRelease(Key::F6)), None);
        assert_eq!(dispatcher.on_event(&press), Some(Command::ToggleEnable));
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut dispatcher = HotkeyDispatcher::new(bindings());
        assert_eq!(dispatcher.on_event(&EventType::KeyPress(Key::KeyW)), None);
        assert_eq!(dispatcher.on_event(&EventType::KeyPress(Key::F7)), Some(Command::Quit));
    }
}
