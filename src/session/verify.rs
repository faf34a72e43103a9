//! Verification replay: replay an event log while re-recording the screen
//!
//! A second capture loop writes `verification_<stamp>.<ext>` for the whole
//! replay. Afterwards a `verification_<stamp>.json` manifest records which
//! log was replayed, when, and how many events were dispatched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::{InputInjector, ScreenGrabber, VideoSinkFactory};
use crate::error::{ReplayKitError, Result};

use super::capture_loop::{CaptureReport, CaptureSettings, ScreenCaptureLoop};
use super::context::StopSignal;
use super::player::{ReplayEngine, ReplayReport};
use super::types::{ensure_output_dir, ArtifactNames, EventLog, VerificationManifest};

/// Artifacts and results of a verification replay
#[derive(Debug)]
pub struct VerificationOutcome {
    pub report: ReplayReport,
    pub video_path: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: VerificationManifest,
    pub capture: Result<CaptureReport>,
}

/// Replay `log` (loaded from `log_path`) while recording the screen into
/// `output_dir`
#[allow(clippy::too_many_arguments)]
pub fn verify_replay(
    engine: &mut ReplayEngine,
    injector: &mut dyn InputInjector,
    log: &EventLog,
    log_path: &Path,
    grabber: Box<dyn ScreenGrabber>,
    sinks: Arc<dyn VideoSinkFactory>,
    capture: CaptureSettings,
    output_dir: &Path,
) -> Result<VerificationOutcome> {
    ensure_output_dir(output_dir)?;
    let names = ArtifactNames::now(output_dir);
    let video_path = names.verification_video(sinks.extension());
    let manifest_path = names.verification_manifest();

    let stop = StopSignal::new();
    let capture_loop = ScreenCaptureLoop::new(grabber, sinks, capture, stop.clone());
    let capture_path = video_path.clone();
    let handle = std::thread::Builder::new()
        .name("verification-capture".to_string())
        .spawn(move || capture_loop.run(&capture_path))
        .map_err(|e| ReplayKitError::Capture(format!("Failed to spawn capture thread: {}", e)))?;

    tracing::info!("Starting replay with verification recording -> {:?}", video_path);
    let report = engine.replay(injector, log);

    stop.trigger();
    let capture = handle
        .join()
        .map_err(|_| ReplayKitError::Capture("Verification capture thread panicked".to_string()))
        .and_then(|r| r);
    if let Err(e) = &capture {
        tracing::error!("Verification capture failed: {}", e);
    }

    let manifest = VerificationManifest::new(log_path, report.dispatched);
    manifest.save(&manifest_path)?;
    tracing::info!("Verification manifest written to {:?}", manifest_path);

    Ok(VerificationOutcome {
        report,
        video_path,
        manifest_path,
        manifest,
        capture,
    })
}
