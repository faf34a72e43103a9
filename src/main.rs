//! ReplayKit - Main Entry Point
//!
//! Interactive console recorder: record screen and input, replay recordings
//! with verification capture.

use anyhow::Context;
use replaykit_rs::{
    config::{ensure_app_data_dir, AppConfig},
    default_devices,
    menu::Prompter,
    ReplayKitApp, StopSignal,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging();

    tracing::info!("Starting ReplayKit");

    let config = AppConfig::load().context("Failed to load configuration")?;
    tracing::debug!("Configuration: {:?}", config);

    let stop = StopSignal::new();
    ctrlc::set_handler({
        let stop = stop.clone();
        move || {
            if stop.is_set() {
                // Second Ctrl+C while nothing consumed the first one
                std::process::exit(130);
            }
            stop.trigger();
        }
    })
    .context("Failed to set Ctrl+C handler")?;

    let devices = default_devices(&config);
    let stdin = std::io::stdin();
    let prompter = Prompter::new(stdin.lock(), std::io::stdout());

    let mut app = ReplayKitApp::new(config, devices, stop, prompter);
    app.run().context("Menu loop failed")?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Console logging to stderr plus a daily log file in the app data directory
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,replaykit_rs=debug"));
    let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match ensure_app_data_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), "replaykit.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            Some(guard)
        }
        Err(e) => {
            tracing_subscriber::registry().with(filter).with(console).init();
            tracing::warn!("File logging disabled: {}", e);
            None
        }
    }
}
