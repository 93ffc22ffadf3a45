use anyhow::{anyhow, bail, Context, Result};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use std::{
    sync::mpsc::{self, Sender},
    thread,
};

use crate::{
    actuation::{KeyName, VirtualInput},
    error::ActuationError,
};

struct InputRequest {
    key: Key,
    direction: Direction,
    reply: Sender<Result<(), String>>,
}

/// Handle to a dedicated thread that owns the enigo connection.
///
/// Enigo handles are not `Send` on every platform, so they never leave that thread; callers
/// block on a reply for each press or release.
pub struct EnigoInput {
    tx: Sender<InputRequest>,
}

impl EnigoInput {
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = mpsc::channel::<InputRequest>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("virtual-input".to_string())
            .spawn(move || {
                let mut enigo = match Enigo::new(&Settings::default()) {
                    Ok(enigo) => {
                        let _ = ready_tx.send(Ok(()));
                        enigo
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err.to_string()));
                        return;
                    }
                };

                while let Ok(request) = rx.recv() {
                    let result = enigo
                        .key(request.key, request.direction)
                        .map_err(|err| err.to_string());
                    let _ = request.reply.send(result);
                }
                log::debug!("virtual input thread exiting");
            })
            .context("failed to spawn virtual input thread")?;

        ready_rx
            .recv()
            .context("virtual input thread exited during setup")?
            .map_err(|err| anyhow!("failed to open virtual input device: {err}"))?;

        Ok(Self { tx })
    }

    fn send(&self, key: Key, direction: Direction) -> Result<Result<(), String>, ActuationError> {
        let (reply, reply_rx) = mpsc::channel();
        self.tx
            .send(InputRequest {
                key,
                direction,
                reply,
            })
            .map_err(|_| ActuationError::Disconnected)?;
        reply_rx.recv().map_err(|_| ActuationError::Disconnected)
    }
}

impl VirtualInput for EnigoInput {
    fn key_down(&self, key: &KeyName) -> Result<(), ActuationError> {
        let press_error = |reason: String| ActuationError::Press {
            key: key.to_string(),
            reason,
        };
        let resolved = parse_key(key.as_str()).map_err(|err| press_error(err.to_string()))?;
        self.send(resolved, Direction::Press)?.map_err(press_error)
    }

    fn key_up(&self, key: &KeyName) -> Result<(), ActuationError> {
        let release_error = |reason: String| ActuationError::Release {
            key: key.to_string(),
            reason,
        };
        let resolved = parse_key(key.as_str()).map_err(|err| release_error(err.to_string()))?;
        self.send(resolved, Direction::Release)?.map_err(release_error)
    }
}

/// Resolves a move key name: a single character, or a named key such as `space` or `f3`.
pub fn parse_key(name: &str) -> Result<Key> {
    let name = name.trim();
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(Key::Unicode(c.to_ascii_lowercase()));
    }

    let lower = name.to_ascii_lowercase();
    let key = match lower.as_str() {
        "space" => Key::Space,
        "tab" => Key::Tab,
        "shift" => Key::Shift,
        "ctrl" | "control" => Key::Control,
        "alt" => Key::Alt,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        other => match other.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            Some(n) => function_key(n).with_context(|| format!("unknown key `{name}`"))?,
            None => bail!("unknown key `{name}`"),
        },
    };
    Ok(key)
}

fn function_key(n: u8) -> Option<Key> {
    Some(match n {
        1 => Key::F1,
        2 => Key::F2,
        3 => Key::F3,
        4 => Key::F4,
        5 => Key::F5,
        6 => Key::F6,
        7 => Key::F7,
        8 => Key::F8,
        9 => Key::F9,
        10 => Key::F10,
        11 => Key::F11,
        12 => Key::F12,
        _ => return None,
    })
}
