//! Screen capture loop
//!
//! Samples the capture target at a fixed rate and streams frames into a
//! video sink. Runs on its own thread and shares only the stop signal and
//! (optionally) the session clock with the rest of the recorder.
//!
//! # Pacing
//!
//! A frame fires once `now - last_frame_time >= 1/fps`. Between checks the
//! loop sleeps for the remaining frame time capped at the poll interval, so
//! jitter stays below one frame interval and the stop signal is noticed
//! within one poll interval.
//!
//! # Failure semantics
//!
//! Any grab or sink error ends the loop. The sink is finished on every exit
//! path, so frames written before the failure stay in the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::{CaptureTarget, ScreenGrabber, VideoSink, VideoSinkFactory};
use crate::error::{ReplayKitError, Result, ResultExt};

use super::clock::PauseController;
use super::context::StopSignal;

/// Settings for one capture loop run
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub target: CaptureTarget,
    pub fps: u32,
    pub poll_interval: Duration,
}

impl CaptureSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

/// Outcome of a capture loop run
#[derive(Debug)]
pub struct CaptureReport {
    pub video_path: PathBuf,
    pub frames_captured: u64,
    /// Set when the loop ended because of a grab or sink error
    pub error: Option<ReplayKitError>,
}

impl CaptureReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// The frame-grabbing loop
pub struct ScreenCaptureLoop {
    grabber: Box<dyn ScreenGrabber>,
    sinks: Arc<dyn VideoSinkFactory>,
    settings: CaptureSettings,
    stop: StopSignal,
    pause: Option<Arc<PauseController>>,
}

impl ScreenCaptureLoop {
    pub fn new(
        grabber: Box<dyn ScreenGrabber>,
        sinks: Arc<dyn VideoSinkFactory>,
        settings: CaptureSettings,
        stop: StopSignal,
    ) -> Self {
        Self {
            grabber,
            sinks,
            settings,
            stop,
            pause: None,
        }
    }

    /// Skip frames while the session clock is paused
    pub fn with_pause(mut self, pause: Arc<PauseController>) -> Self {
        self.pause = Some(pause);
        self
    }

    /// Run until the stop signal fires or capture fails
    ///
    /// Only fails if the sink could not be opened; every later failure is
    /// carried in the report.
    pub fn run(mut self, video_path: &Path) -> Result<CaptureReport> {
        let (width, height) = self
            .grabber
            .target_size(&self.settings.target)
            .context("Resolving capture target")?;
        let mut sink = self
            .sinks
            .open(video_path, self.settings.fps, width, height)
            .with_context(|| format!("Opening video sink {:?}", video_path))?;

        tracing::info!(
            "Screen capture started: {} at {} fps ({}x{}) -> {:?}",
            self.settings.target,
            self.settings.fps,
            width,
            height,
            video_path
        );

        let mut frames_captured = 0u64;
        let mut error = self.capture_frames(sink.as_mut(), &mut frames_captured).err();

        if let Err(e) = sink.finish() {
            tracing::error!("Failed to finalize video {:?}: {}", video_path, e);
            error.get_or_insert(e);
        }

        match &error {
            Some(e) => tracing::error!(
                "Screen capture aborted after {} frames: {}",
                frames_captured,
                e
            ),
            None => tracing::info!(
                "Recorded {} frames to {:?}",
                frames_captured,
                video_path
            ),
        }

        Ok(CaptureReport {
            video_path: video_path.to_path_buf(),
            frames_captured,
            error,
        })
    }

    fn capture_frames(&mut self, sink: &mut dyn VideoSink, frames: &mut u64) -> Result<()> {
        let interval = self.settings.frame_interval();
        let poll = self.settings.poll_interval;
        let mut last_frame_time = Instant::now();

        while !self.stop.is_set() {
            if self.pause.as_ref().is_some_and(|p| p.is_paused()) {
                std::thread::sleep(poll);
                continue;
            }

            let now = Instant::now();
            let delta = now.duration_since(last_frame_time);
            if delta < interval {
                std::thread::sleep((interval - delta).min(poll));
                continue;
            }

            let frame = self.grabber.grab(&self.settings.target)?;
            sink.write_frame(&frame)
                .with_context(|| format!("Writing frame {}", *frames + 1))?;
            *frames += 1;
            last_frame_time = now;
            tracing::trace!("Captured frame {}", frames);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock_devices::{MemoryVideoSinkFactory, MockScreenGrabber};
    use crate::backend::MonitorInfo;

    fn settings(fps: u32) -> CaptureSettings {
        CaptureSettings {
            target: CaptureTarget::Monitor(1),
            fps,
            poll_interval: Duration::from_millis(5),
        }
    }

    fn stop_after(stop: &StopSignal, ms: u64) -> std::thread::JoinHandle<()> {
        let stop = stop.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(ms));
            stop.trigger();
        })
    }

    fn capture_loop(
        grabber: MockScreenGrabber,
        sinks: &MemoryVideoSinkFactory,
        settings: CaptureSettings,
        stop: &StopSignal,
    ) -> ScreenCaptureLoop {
        ScreenCaptureLoop::new(
            Box::new(grabber),
            Arc::new(sinks.clone()),
            settings,
            stop.clone(),
        )
    }

    #[test]
    fn test_captures_frames_until_stopped() {
        let sinks = MemoryVideoSinkFactory::new();
        let stop = StopSignal::new();
        let grabber = MockScreenGrabber::new(vec![MonitorInfo::new(0, 0, 8, 6)]);
        let capture = capture_loop(grabber, &sinks, settings(50), &stop);

        let stopper = stop_after(&stop, 200);
        let report = capture.run(Path::new("screen_test.avi")).unwrap();
        stopper.join().unwrap();

        assert!(report.is_ok());
        assert!(report.frames_captured >= 3, "got {}", report.frames_captured);
        // Never faster than the frame rate allows
        assert!(report.frames_captured <= 20, "got {}", report.frames_captured);

        let video = sinks.video(Path::new("screen_test.avi")).unwrap();
        assert!(video.finished);
        assert_eq!(video.frames, report.frames_captured);
        assert_eq!((video.width, video.height), (8, 6));
    }

    #[test]
    fn test_paused_clock_writes_no_frames() {
        let sinks = MemoryVideoSinkFactory::new();
        let stop = StopSignal::new();
        let pause = Arc::new(PauseController::new());
        pause.toggle();

        let grabber = MockScreenGrabber::new(vec![MonitorInfo::new(0, 0, 4, 4)]);
        let capture = capture_loop(grabber, &sinks, settings(100), &stop).with_pause(pause);

        let stopper = stop_after(&stop, 80);
        let report = capture.run(Path::new("paused.avi")).unwrap();
        stopper.join().unwrap();

        assert_eq!(report.frames_captured, 0);
        assert!(sinks.video(Path::new("paused.avi")).unwrap().finished);
    }

    #[test]
    fn test_sink_failure_keeps_written_frames() {
        let sinks = MemoryVideoSinkFactory::new().failing_after(3);
        let stop = StopSignal::new();
        let grabber = MockScreenGrabber::new(vec![MonitorInfo::new(0, 0, 4, 4)]);
        let capture = capture_loop(grabber, &sinks, settings(200), &stop);

        let stopper = stop_after(&stop, 2000);
        let report = capture.run(Path::new("broken.avi")).unwrap();
        stop.trigger();
        stopper.join().unwrap();

        assert!(!report.is_ok());
        assert_eq!(report.frames_captured, 3);
        let video = sinks.video(Path::new("broken.avi")).unwrap();
        assert_eq!(video.frames, 3);
        assert!(video.finished);
    }

    #[test]
    fn test_missing_monitor_fails_before_opening() {
        let sinks = MemoryVideoSinkFactory::new();
        let grabber = MockScreenGrabber::new(vec![MonitorInfo::new(0, 0, 4, 4)]);
        let mut s = settings(10);
        s.target = CaptureTarget::Monitor(3);
        let capture = capture_loop(grabber, &sinks, s, &StopSignal::new());

        assert!(capture.run(Path::new("none.avi")).is_err());
        assert!(sinks.video(Path::new("none.avi")).is_none());
    }
}
