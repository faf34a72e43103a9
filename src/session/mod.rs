//! Session recording and replay module
//!
//! This module records screen video together with keyboard and mouse input,
//! and replays recorded input with its original relative timing.
//!
//! # Recording data flow
//!
//! ```text
//! listener threads --RawInput--> InputSink --Event--> EventQueue
//!                                   |                     |
//!                            PauseController        drain thread
//!                                   |                     v
//! capture thread <------------------+              SharedEventLog --> events_<stamp>.json
//!       |
//!       +--Frame--> VideoSink --> screen_<stamp>.<ext>
//! ```
//!
//! # Features
//!
//! - Timestamps measure active recording time; paused spans are excluded
//! - A pause hotkey toggles the session clock from inside the input stream
//! - Artifacts are always finalized, even when screen capture fails
//! - Replay keeps event order and relative timing, clamps positions and
//!   translates key names
//! - Verification replays re-record the screen and write a manifest

pub mod capture_loop;
pub mod clock;
pub mod context;
pub mod keymap;
pub mod player;
pub mod queue;
pub mod recorder;
pub mod types;
pub mod verify;

pub use capture_loop::{CaptureReport, CaptureSettings, ScreenCaptureLoop};
pub use clock::PauseController;
pub use context::{InputSink, SessionContext, StopSignal};
pub use keymap::{translate_button, translate_key, SpecialKey};
pub use player::{ReplayEngine, ReplayOptions, ReplayReport};
pub use queue::EventQueue;
pub use recorder::{RecorderSettings, RecordingOutcome, RecordingSession};
pub use types::{
    ensure_output_dir, list_recordings, ArtifactNames, EventLog, RecordingInfo, SessionState,
    SharedEventLog, VerificationManifest,
};
pub use verify::{verify_replay, VerificationOutcome};
