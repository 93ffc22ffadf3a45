use std::{
    io::{self, Stdout, Write},
    sync::Mutex,
};

use crate::error::ObserverError;

use super::{StatusEvent, StatusObserver};

/// Prints status lines for a human at a terminal, or JSON lines with `json`.
pub struct ConsoleObserver<W: Write + Send = Stdout> {
    out: Mutex<W>,
    json: bool,
}

impl ConsoleObserver<Stdout> {
    pub fn stdout(json: bool) -> Self {
        Self::new(io::stdout(), json)
    }
}

impl<W: Write + Send> ConsoleObserver<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self {
            out: Mutex::new(out),
            json,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> StatusObserver for ConsoleObserver<W> {
    fn notify(&self, event: &StatusEvent) -> Result<(), ObserverError> {
        let text = if self.json {
            let mut line =
                serde_json::to_string(event).map_err(|err| ObserverError(err.to_string()))?;
            line.push('\n');
            line
        } else {
            render(event)
        };

        let mut out = self
            .out
            .lock()
            .map_err(|_| ObserverError("console writer poisoned".into()))?;
        out.write_all(text.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|err| ObserverError(err.to_string()))
    }
}

fn render(event: &StatusEvent) -> String {
    match event {
        StatusEvent::Transition { to, key_held, .. } => {
            let moving = if *key_held { "WALKING" } else { "STOPPED" };
            format!("[STATE] {to:8} -> {moving}\n")
        }
        StatusEvent::ModeChanged { from, to, .. } => {
            if to.is_calibrating() {
                "\n=== CALIBRATION MODE ===\n".to_string()
            } else if from.is_calibrating() {
                format!("\n=== EXITED CALIBRATION ({}) ===\n", to.label())
            } else if to.is_active() {
                "[MODE] AutoWalk ENABLED\n".to_string()
            } else {
                "[MODE] AutoWalk DISABLED\n".to_string()
            }
        }
        // Rewrites the same terminal line for each reading.
        StatusEvent::CalibrationReading { sample, state, .. } => {
            format!("\r  RGB: {sample}  =>  {state:8}")
        }
        StatusEvent::Stopped { .. } => "\nCleaned up. Bye!\n".to_string(),
    }
}
