//! # ReplayKit-RS: Screen and Input Recorder
//!
//! Records screen video together with keyboard and mouse input, stores the
//! input as a timestamped event log, and replays it later with the original
//! relative timing, optionally re-recording the screen for verification.
//!
//! ## Architecture
//!
//! - **Backend**: Traits for the OS collaborators (screen grabber, input
//!   listener, input injector, video sink) with native, ffmpeg and simulated
//!   implementations
//! - **Session**: Pause-aware session clock, ingestion queue, capture loop,
//!   recording orchestrator and replay engine
//! - **Menu**: Console prompts driving the interactive loop
//! - **Communication**: A crossbeam channel carries events from listener
//!   threads to the drain thread
//!
//! ## Artifacts
//!
//! Each recording writes, under the configured output directory:
//!
//! - `screen_YYYYMMDD_HHMMSS.<ext>` - screen video
//! - `events_YYYYMMDD_HHMMSS.json` - event log
//!
//! A verification replay writes `verification_YYYYMMDD_HHMMSS.<ext>` and a
//! `verification_YYYYMMDD_HHMMSS.json` manifest.
//!
//! ## Example
//!
//! ```ignore
//! use replaykit_rs::{
//!     backend::default_devices,
//!     config::AppConfig,
//!     session::{RecorderSettings, RecordingSession, StopSignal},
//! };
//!
//! let config = AppConfig::load_or_default();
//! let devices = default_devices(&config);
//! let stop = StopSignal::new();
//!
//! let settings = RecorderSettings::from_config(&config);
//! let mut session = RecordingSession::new(settings, stop.clone());
//! let outcome = session.run(
//!     devices.new_grabber(),
//!     devices.new_listeners(),
//!     devices.sinks.clone(),
//! )?;
//! println!("{} events in {:?}", outcome.event_log.len(), outcome.events_path);
//! ```

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod menu;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use app::ReplayKitApp;
pub use backend::{default_devices, DeviceSet};
pub use config::AppConfig;
pub use error::{ReplayKitError, Result};
pub use session::{EventLog, RecordingSession, ReplayEngine, StopSignal};
pub use types::{Event, KeyAction, MouseButton, Position, ScrollDelta};
