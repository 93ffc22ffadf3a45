pub mod actuation;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pixel;
pub mod platform;
pub mod sensing;
pub mod session;
pub mod status;
pub mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use config::AutowalkConfig;
use platform::{spawn_hotkey_listener, EnigoInput, HotkeyBindings, XcapGrabber};
use sensing::{ControlLoop, LoopReport, SensingController};
use session::{Command, SessionHandle};
use status::{ConsoleObserver, StatusHub};

/// Binary entry point: parse flags, open the devices, run until quit.
pub fn run() -> Result<()> {
    let config = AutowalkConfig::parse();
    utils::logging::init(config.verbose);
    config.validate().context("invalid configuration")?;

    log::info!("AutoWalk starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("autowalk-worker")
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(run_session(config))
}

async fn run_session(config: AutowalkConfig) -> Result<()> {
    let bindings = HotkeyBindings::from_config(&config)?;
    platform::input::parse_key(&config.move_key).context("move key")?;
    let input = Arc::new(EnigoInput::spawn()?);
    let grabber = Arc::new(XcapGrabber::spawn(config.region()).context("screen capture")?);

    let session = SessionHandle::new();
    let status = StatusHub::new().with(ConsoleObserver::stdout(config.json));
    let control = ControlLoop::new(&config, session.clone(), grabber, input, status);

    if !config.json {
        println!("{config}");
    }

    let mut sensing = SensingController::new();
    sensing.start(control)?;
    spawn_hotkey_listener(bindings, session.clone())?;

    tokio::spawn({
        let session = session.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("interrupt received, quitting");
                session.apply(Command::Quit);
            }
        }
    });

    let report = sensing.wait().await?;
    summarize(&report, config.json)
}

fn summarize(report: &LoopReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    let metrics = &report.metrics;
    log::info!(
        "{} ticks, {} captures ({} failed), {} transitions, {} presses / {} releases, worst tick {}ms, {} overruns",
        metrics.tick_count,
        metrics.capture_count,
        metrics.capture_failures,
        metrics.transition_count,
        metrics.key_presses,
        metrics.key_releases,
        metrics.worst_tick_ms,
        metrics.overruns
    );
    Ok(())
}
