//! Application module
//!
//! The interactive menu loop: record a session, replay an existing one with
//! verification, or exit. All console I/O goes through a [`Prompter`] and all
//! devices come from a [`DeviceSet`], so the loop runs unchanged against
//! stdin/stdout and real devices or against scripted input and simulated
//! devices.

use std::io::{BufRead, Write};

use crate::backend::{CaptureTarget, DeviceSet};
use crate::config::AppConfig;
use crate::error::Result;
use crate::menu::{build_recording_controls, MenuChoice, Prompter};
use crate::session::{
    list_recordings, verify_replay, CaptureSettings, EventLog, RecorderSettings,
    RecordingOutcome, RecordingSession, ReplayEngine, ReplayOptions, ReplayReport, StopSignal,
    VerificationOutcome,
};

/// The ReplayKit console application
pub struct ReplayKitApp<R, W> {
    config: AppConfig,
    devices: DeviceSet,
    stop: StopSignal,
    prompter: Prompter<R, W>,
    last_target: Option<CaptureTarget>,
}

impl<R: BufRead, W: Write> ReplayKitApp<R, W> {
    /// `stop` is the signal wired to Ctrl+C; it ends recordings and replays
    pub fn new(
        config: AppConfig,
        devices: DeviceSet,
        stop: StopSignal,
        prompter: Prompter<R, W>,
    ) -> Self {
        Self {
            config,
            devices,
            stop,
            prompter,
            last_target: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the menu loop until the user exits or input ends
    pub fn run(&mut self) -> Result<()> {
        if self.devices.simulated {
            self.prompter.say(
                "Note: running with simulated devices \
                 (build with --features native for real capture).",
            )?;
        }

        loop {
            let Some(choice) = self.prompter.main_menu()? else {
                break;
            };

            match choice {
                MenuChoice::Exit => break,
                MenuChoice::Record => {
                    self.record()?;
                }
                MenuChoice::Replay => {
                    self.replay_existing()?;
                }
            }

            if !self.prompter.yes_no("\nReturn to main menu?")? {
                break;
            }
        }

        self.prompter.say("Exiting program...")?;
        Ok(())
    }

    /// Pick a target, record until stopped, then offer an immediate replay
    pub fn record(&mut self) -> Result<Option<RecordingOutcome>> {
        let Some(target) = self.choose_target()? else {
            return Ok(None);
        };
        self.last_target = Some(target);

        let mut settings = RecorderSettings::from_config(&self.config);
        settings.capture.target = target;

        self.stop.reset();
        self.prompter
            .say(&build_recording_controls(&self.config.recording.pause_hotkey))?;

        let mut session = RecordingSession::new(settings, self.stop.clone());
        let outcome = match session.run(
            self.devices.new_grabber(),
            self.devices.new_listeners(),
            self.devices.sinks.clone(),
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Recording failed: {}", e);
                self.prompter.say(&format!("Recording failed: {}", e))?;
                return Ok(None);
            }
        };

        self.prompter.say(&format!(
            "\nRecorded {} events to {}",
            outcome.event_log.len(),
            outcome.events_path.display()
        ))?;
        match &outcome.capture {
            Ok(report) if report.is_ok() => self.prompter.say(&format!(
                "Recorded {} frames to {}",
                report.frames_captured,
                outcome.video_path.display()
            ))?,
            Ok(report) => self.prompter.say(&format!(
                "Screen capture stopped early after {} frames: {}",
                report.frames_captured,
                report
                    .error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_default()
            ))?,
            Err(e) => self.prompter.say(&format!("Screen capture failed: {}", e))?,
        }

        if self.prompter.yes_no("Would you like to replay the recording?")? {
            self.replay_log(&outcome.event_log);
        }

        Ok(Some(outcome))
    }

    /// Select a stored recording and replay it with verification
    pub fn replay_existing(&mut self) -> Result<Option<VerificationOutcome>> {
        let output_dir = self.config.recording.output_dir.clone();
        let recordings = list_recordings(&output_dir)?;
        if recordings.is_empty() {
            self.prompter
                .say(&format!("No recordings found in {}", output_dir.display()))?;
            return Ok(None);
        }

        let Some(selected) = self.prompter.select_recording(&recordings)? else {
            return Ok(None);
        };
        let log_path = selected.path.clone();

        let log = match EventLog::load_from_file(&log_path) {
            Ok(log) => log,
            Err(e) => {
                tracing::error!("Failed to load {:?}: {}", log_path, e);
                self.prompter
                    .say(&format!("Could not load {}: {}", log_path.display(), e))?;
                return Ok(None);
            }
        };

        self.prompter
            .say("\nStarting replay with verification recording...")?;
        self.stop.reset();

        let capture = CaptureSettings {
            target: self.last_target.unwrap_or_else(|| self.config.capture.target()),
            fps: self.config.capture.fps,
            poll_interval: self.config.recording.poll_interval(),
        };
        let mut engine = self.replay_engine();
        let grabber = self.devices.new_grabber();
        let sinks = self.devices.sinks.clone();
        let outcome = verify_replay(
            &mut engine,
            self.devices.injector.as_mut(),
            &log,
            &log_path,
            grabber,
            sinks,
            capture,
            &output_dir,
        )?;

        self.prompter.say("\nReplay and verification completed.")?;
        self.prompter.say(&format!(
            "Verification recording: {}",
            outcome.video_path.display()
        ))?;
        Ok(Some(outcome))
    }

    fn replay_log(&mut self, log: &EventLog) -> ReplayReport {
        self.stop.reset();
        let mut engine = self.replay_engine();
        engine.replay(self.devices.injector.as_mut(), log)
    }

    fn replay_engine(&self) -> ReplayEngine {
        ReplayEngine::new(ReplayOptions::from_config(&self.config)).with_stop(self.stop.clone())
    }

    /// A configured region wins; otherwise ask for a monitor
    fn choose_target(&mut self) -> Result<Option<CaptureTarget>> {
        if let Some(region) = self.config.capture.screen_region {
            return Ok(Some(CaptureTarget::Region(region)));
        }

        let monitors = match self.devices.new_grabber().monitors() {
            Ok(monitors) => monitors,
            Err(e) => {
                tracing::warn!("Could not enumerate monitors: {}", e);
                return Ok(Some(self.config.capture.target()));
            }
        };
        Ok(self
            .prompter
            .select_monitor(&monitors)?
            .map(CaptureTarget::Monitor))
    }
}
