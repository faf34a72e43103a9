//! Recording orchestrator
//!
//! Ties the screen capture loop and the input listeners into one session:
//!
//! 1. Create the output directory (the only failure that aborts a session)
//! 2. Start the drain thread moving events from the ingestion queue into the
//!    event log
//! 3. Start the input listeners
//! 4. Start the screen capture thread
//! 5. Block until the stop signal fires
//! 6. Join the capture thread, stop the drain thread (bounded), stop the
//!    listeners, wait once more for a drain thread that timed out, sweep the
//!    queue and write the event log
//!
//! A capture failure is reported in the [`RecordingOutcome`] and does not
//! end input capture.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver};

use crate::backend::{InputListener, ScreenGrabber, VideoSinkFactory};
use crate::config::AppConfig;
use crate::error::{ReplayKitError, Result, ResultExt};

use super::capture_loop::{CaptureReport, CaptureSettings, ScreenCaptureLoop};
use super::context::{InputSink, SessionContext, StopSignal};
use super::queue::EventQueue;
use super::types::{ensure_output_dir, ArtifactNames, EventLog, SessionState, SharedEventLog};

/// Settings for one recording session
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    pub output_dir: PathBuf,
    pub capture: CaptureSettings,
    pub drain_join_timeout: Duration,
    pub pause_hotkey: String,
}

impl RecorderSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            output_dir: config.recording.output_dir.clone(),
            capture: CaptureSettings {
                target: config.capture.target(),
                fps: config.capture.fps,
                poll_interval: config.recording.poll_interval(),
            },
            drain_join_timeout: config.recording.drain_join_timeout(),
            pause_hotkey: config.recording.pause_hotkey.clone(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.capture.poll_interval
    }
}

/// Everything a finished session produced
#[derive(Debug)]
pub struct RecordingOutcome {
    pub names: ArtifactNames,
    pub video_path: PathBuf,
    pub events_path: PathBuf,
    pub event_log: EventLog,
    /// Result of the screen capture side; an error here did not stop input capture
    pub capture: Result<CaptureReport>,
}

impl RecordingOutcome {
    pub fn frames_captured(&self) -> u64 {
        self.capture
            .as_ref()
            .map(|r| r.frames_captured)
            .unwrap_or(0)
    }
}

/// One recording session
pub struct RecordingSession {
    settings: RecorderSettings,
    stop: StopSignal,
    state: SessionState,
}

impl RecordingSession {
    /// `stop` ends the session when triggered, typically from a Ctrl+C handler
    pub fn new(settings: RecorderSettings, stop: StopSignal) -> Self {
        Self {
            settings,
            stop,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Record until the stop signal fires
    pub fn run(
        &mut self,
        grabber: Box<dyn ScreenGrabber>,
        mut listeners: Vec<Box<dyn InputListener>>,
        sinks: Arc<dyn VideoSinkFactory>,
    ) -> Result<RecordingOutcome> {
        ensure_output_dir(&self.settings.output_dir)?;

        let names = ArtifactNames::now(&self.settings.output_dir);
        let video_path = names.screen_video(sinks.extension());
        let events_path = names.event_log();

        let ctx = SessionContext::new(self.stop.clone(), &self.settings.pause_hotkey);
        let log = SharedEventLog::new();
        self.state = SessionState::Recording;

        let mut drain = DrainTask::spawn(ctx.queue.clone(), log.clone(), self.poll_interval())?;

        let mut sinks_handed_out: Vec<InputSink> = Vec::with_capacity(listeners.len());
        for listener in listeners.iter_mut() {
            let sink = ctx.input_sink();
            sinks_handed_out.push(sink.clone());
            match listener.start(sink) {
                Ok(()) => tracing::info!("Started {} listener", listener.name()),
                Err(e) => tracing::error!("Failed to start {} listener: {}", listener.name(), e),
            }
        }

        let capture = ScreenCaptureLoop::new(
            grabber,
            sinks,
            self.settings.capture.clone(),
            self.stop.clone(),
        )
        .with_pause(ctx.clock.clone());
        let capture_path = video_path.clone();
        let capture_handle = std::thread::Builder::new()
            .name("screen-capture".to_string())
            .spawn(move || capture.run(&capture_path))
            .map_err(|e| ReplayKitError::Capture(format!("Failed to spawn capture thread: {}", e)));

        tracing::info!(
            "Recording to {:?}; pause with {}",
            names.dir(),
            self.settings.pause_hotkey
        );

        if let Err(e) = &capture_handle {
            tracing::error!("{}", e);
        }

        while !self.stop.is_set() {
            std::thread::sleep(self.poll_interval());
        }

        tracing::info!("Stopping recording...");
        self.state = SessionState::Stopped;

        let capture = capture_handle.and_then(|handle| {
            handle
                .join()
                .map_err(|_| ReplayKitError::Capture("Capture thread panicked".to_string()))?
        });
        if let Err(e) = &capture {
            tracing::error!("Screen capture failed: {}", e);
        }

        for sink in &sinks_handed_out {
            sink.deactivate();
        }
        let timeout = self.settings.drain_join_timeout;
        if let Err(e) = drain.stop(timeout) {
            tracing::warn!("{}; waiting again after stopping listeners", e);
        }

        for listener in listeners.iter_mut() {
            listener.stop();
        }

        if !drain.is_finished() {
            if let Err(e) = drain.wait(timeout) {
                // The detached thread may still append one event after the sweep
                tracing::warn!("{}; detaching and sweeping the queue", e);
            }
        }
        for event in ctx.queue.drain_pending() {
            log.append(event);
        }

        let event_log = log.snapshot();
        event_log
            .save_to_file(&events_path)
            .with_context(|| format!("Saving event log {:?}", events_path))?;
        tracing::info!("Recorded {} events to {:?}", event_log.len(), events_path);

        Ok(RecordingOutcome {
            names,
            video_path,
            events_path,
            event_log,
            capture,
        })
    }

    fn poll_interval(&self) -> Duration {
        self.settings.poll_interval()
    }
}

/// Background thread moving events from the queue into the log
struct DrainTask {
    stop: StopSignal,
    done: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl DrainTask {
    fn spawn(queue: EventQueue, log: SharedEventLog, poll: Duration) -> Result<Self> {
        let stop = StopSignal::new();
        let (done_tx, done) = bounded(1);
        let thread_stop = stop.clone();

        let handle = std::thread::Builder::new()
            .name("event-drain".to_string())
            .spawn(move || {
                while !thread_stop.is_set() {
                    if let Some(event) = queue.drain_with_timeout(poll) {
                        tracing::trace!(
                            "Logged {} at {:.3}s",
                            event.kind_label(),
                            event.timestamp()
                        );
                        log.append(event);
                    }
                }
                for event in queue.drain_pending() {
                    log.append(event);
                }
                let _ = done_tx.send(());
            })
            .map_err(|e| ReplayKitError::Channel(format!("Failed to spawn drain thread: {}", e)))?;

        Ok(Self {
            stop,
            done,
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait at most `timeout` for it to finish
    fn stop(&mut self, timeout: Duration) -> Result<()> {
        self.stop.trigger();
        self.wait(timeout)
    }

    /// Wait at most `timeout` for an already signalled thread
    fn wait(&mut self, timeout: Duration) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        match self.done.recv_timeout(timeout) {
            Ok(()) => {
                let _ = handle.join();
                Ok(())
            }
            Err(_) => {
                self.handle = Some(handle);
                Err(ReplayKitError::Timeout(format!(
                    "Event drain did not finish within {:?}",
                    timeout
                )))
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.handle.is_none()
    }
}
