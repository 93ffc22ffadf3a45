use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;

use crate::session::{Command, SessionHandle};

use super::loop_worker::{ControlLoop, LoopReport};

/// Owns the spawned control loop task.
pub struct SensingController {
    handle: Option<JoinHandle<LoopReport>>,
    session: Option<SessionHandle>,
}

impl Default for SensingController {
    fn default() -> Self {
        Self::new()
    }
}

impl SensingController {
    pub fn new() -> Self {
        Self {
            handle: None,
            session: None,
        }
    }

    pub fn start(&mut self, control_loop: ControlLoop) -> Result<()> {
        if self.handle.is_some() {
            bail!("control loop already running");
        }

        self.session = Some(control_loop.session().clone());
        self.handle = Some(tokio::spawn(control_loop.run()));
        info!("control loop task spawned");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Waits for the loop to end on its own (quit hotkey, Ctrl-C).
    pub async fn wait(&mut self) -> Result<LoopReport> {
        let handle = self.handle.take().context("control loop not started")?;
        self.session = None;
        handle.await.context("control loop task failed to join")
    }

    /// Sends quit, then waits for the loop to finish its tick and release the key.
    pub async fn stop(&mut self) -> Result<LoopReport> {
        if let Some(session) = &self.session {
            session.apply(Command::Quit);
        }
        self.wait().await
    }
}
