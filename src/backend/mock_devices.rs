//! Simulated devices
//!
//! Stand-ins for the OS collaborators, used by the test suite and by the
//! binary when it is built without the `native` feature.
//!
//! # Devices
//!
//! - [`MockScreenGrabber`] - Fixed monitor layout, generates solid frames,
//!   can be told to fail after N grabs
//! - [`MemoryVideoSinkFactory`] - Keeps per-file frame counts in memory,
//!   can be told to fail writes after N frames
//! - [`ScriptedInputListener`] - Replays a list of timed [`RawInput`]s into
//!   the session sink from its own thread
//! - [`RecordingInjector`] - Records every injection call with its time
//!
//! # Example
//!
//! ```ignore
//! use replaykit_rs::backend::mock_devices::{RecordingInjector, InjectorCall};
//!
//! let mut injector = RecordingInjector::new(1920, 1080);
//! engine.replay(&mut injector, &log);
//! assert_eq!(injector.calls()[0].call, InjectorCall::MoveTo { x: 100, y: 100 });
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::{ReplayKitError, Result};
use crate::session::InputSink;

use super::device_trait::{
    CaptureTarget, Frame, InputInjector, InputListener, MonitorInfo, RawInput, ScreenGrabber,
    VideoSink, VideoSinkFactory,
};

// ==================== Screen Grabber ====================

/// Screen grabber with a fixed monitor layout
#[derive(Debug, Clone)]
pub struct MockScreenGrabber {
    monitors: Vec<MonitorInfo>,
    fail_after: Option<usize>,
    grabs: Arc<AtomicUsize>,
}

impl MockScreenGrabber {
    pub fn new(monitors: Vec<MonitorInfo>) -> Self {
        Self {
            monitors,
            fail_after: None,
            grabs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A single 1920x1080 display
    pub fn single_hd() -> Self {
        Self::new(vec![MonitorInfo::new(0, 0, 1920, 1080)])
    }

    /// Fail every grab after the first `n`
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Number of grabs performed so far (shared between clones)
    pub fn grab_count(&self) -> usize {
        self.grabs.load(Ordering::SeqCst)
    }
}

impl ScreenGrabber for MockScreenGrabber {
    fn monitors(&mut self) -> Result<Vec<MonitorInfo>> {
        Ok(self.monitors.clone())
    }

    fn grab(&mut self, target: &CaptureTarget) -> Result<Frame> {
        let n = self.grabs.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| n >= limit) {
            return Err(ReplayKitError::Capture(format!(
                "simulated grab failure on grab {}",
                n + 1
            )));
        }

        let (width, height) = self.target_size(target)?;
        let shade = (n % 256) as u8;
        Ok(Frame::filled(width, height, [shade, shade, shade, 255]))
    }
}

// ==================== Video Sink ====================

/// What a [`MemoryVideoSinkFactory`] knows about one opened file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryVideo {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub frames: u64,
    pub finished: bool,
}

/// Video sink factory that keeps frame counts in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryVideoSinkFactory {
    videos: Arc<Mutex<HashMap<PathBuf, MemoryVideo>>>,
    fail_after: Option<u64>,
    touch_files: bool,
    extension: Option<String>,
}

impl MemoryVideoSinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail writes after the first `n` frames
    pub fn failing_after(mut self, n: u64) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Also create an empty file at each opened path
    pub fn touching_files(mut self) -> Self {
        self.touch_files = true;
        self
    }

    /// File extension reported to sessions (default `avi`)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn video(&self, path: &Path) -> Option<MemoryVideo> {
        self.lock().get(path).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, MemoryVideo>> {
        self.videos.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl VideoSinkFactory for MemoryVideoSinkFactory {
    fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or("avi")
    }

    fn open(&self, path: &Path, fps: u32, width: u32, height: u32) -> Result<Box<dyn VideoSink>> {
        if self.touch_files {
            std::fs::write(path, b"")?;
        }
        self.lock().insert(
            path.to_path_buf(),
            MemoryVideo {
                fps,
                width,
                height,
                frames: 0,
                finished: false,
            },
        );
        Ok(Box::new(MemoryVideoSink {
            path: path.to_path_buf(),
            factory: self.clone(),
        }))
    }
}

struct MemoryVideoSink {
    path: PathBuf,
    factory: MemoryVideoSinkFactory,
}

impl VideoSink for MemoryVideoSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let mut videos = self.factory.lock();
        let video = videos
            .get_mut(&self.path)
            .ok_or_else(|| ReplayKitError::VideoSink("video not open".to_string()))?;
        if video.finished {
            return Err(ReplayKitError::VideoSink("video already finished".to_string()));
        }
        if self.factory.fail_after.is_some_and(|limit| video.frames >= limit) {
            return Err(ReplayKitError::VideoSink(format!(
                "simulated write failure after {} frames",
                video.frames
            )));
        }
        if frame.width != video.width || frame.height != video.height {
            return Err(ReplayKitError::VideoSink(format!(
                "frame {}x{} does not match video {}x{}",
                frame.width, frame.height, video.width, video.height
            )));
        }
        video.frames += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        if let Some(video) = self.factory.lock().get_mut(&self.path) {
            video.finished = true;
        }
        Ok(())
    }
}

// ==================== Input Listener ====================

/// Listener that plays a fixed script of inputs into the session
///
/// Each entry is delivered `delay` after the previous one, from the
/// listener's own thread, mimicking an OS hook callback context.
pub struct ScriptedInputListener {
    name: String,
    script: Vec<(Duration, RawInput)>,
    running: Arc<AtomicBool>,
    delivered: Arc<AtomicUsize>,
    handle: Option<JoinHandle<()>>,
}

impl ScriptedInputListener {
    pub fn new(name: impl Into<String>, script: Vec<(Duration, RawInput)>) -> Self {
        Self {
            name: name.into(),
            script,
            running: Arc::new(AtomicBool::new(false)),
            delivered: Arc::new(AtomicUsize::new(0)),
            handle: None,
        }
    }

    /// A listener that never produces input
    pub fn idle(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Counter of delivered inputs, readable after the listener is moved
    pub fn delivered_counter(&self) -> Arc<AtomicUsize> {
        self.delivered.clone()
    }
}

impl InputListener for ScriptedInputListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, sink: InputSink) -> Result<()> {
        if self.handle.is_some() {
            return Err(ReplayKitError::Listener(format!(
                "{} already started",
                self.name
            )));
        }

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let delivered = self.delivered.clone();
        let script = std::mem::take(&mut self.script);

        let handle = std::thread::Builder::new()
            .name(format!("listener-{}", self.name))
            .spawn(move || {
                for (delay, input) in script {
                    let deadline = Instant::now() + delay;
                    while Instant::now() < deadline {
                        if !running.load(Ordering::SeqCst) {
                            return;
                        }
                        std::thread::sleep(Duration::from_millis(1));
                    }
                    if !running.load(Ordering::SeqCst) {
                        return;
                    }
                    sink.emit(input);
                    delivered.fetch_add(1, Ordering::SeqCst);
                }
            })
            .map_err(|e| ReplayKitError::Listener(e.to_string()))?;

        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// ==================== Injector ====================

/// One call made on a [`RecordingInjector`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectorCall {
    MoveTo { x: i32, y: i32 },
    KeyDown(String),
    KeyUp(String),
    MouseDown { x: i32, y: i32, button: String },
    MouseUp { x: i32, y: i32, button: String },
    Scroll { dx: i32, dy: i32, x: i32, y: i32 },
}

/// An injector call and when it happened
#[derive(Debug, Clone)]
pub struct TimedCall {
    pub at: Instant,
    pub call: InjectorCall,
}

/// Injector that records calls instead of touching the OS
#[derive(Debug, Clone)]
pub struct RecordingInjector {
    screen: (u32, u32),
    calls: Arc<Mutex<Vec<TimedCall>>>,
    fail_on: Vec<usize>,
    attempts: usize,
}

impl RecordingInjector {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: (width, height),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: Vec::new(),
            attempts: 0,
        }
    }

    /// Fail the n-th (0-based) injection attempt
    pub fn failing_on(mut self, attempt: usize) -> Self {
        self.fail_on.push(attempt);
        self
    }

    pub fn calls(&self) -> Vec<TimedCall> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Calls without timing
    pub fn call_list(&self) -> Vec<InjectorCall> {
        self.calls().into_iter().map(|c| c.call).collect()
    }

    fn record(&mut self, call: InjectorCall) -> Result<()> {
        let attempt = self.attempts;
        self.attempts += 1;
        if self.fail_on.contains(&attempt) {
            return Err(ReplayKitError::Injection(format!(
                "simulated failure on {:?}",
                call
            )));
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(TimedCall {
                at: Instant::now(),
                call,
            });
        }
        Ok(())
    }
}

impl InputInjector for RecordingInjector {
    fn screen_size(&mut self) -> Result<(u32, u32)> {
        Ok(self.screen)
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.record(InjectorCall::MoveTo { x, y })
    }

    fn key_down(&mut self, key: &str) -> Result<()> {
        self.record(InjectorCall::KeyDown(key.to_string()))
    }

    fn key_up(&mut self, key: &str) -> Result<()> {
        self.record(InjectorCall::KeyUp(key.to_string()))
    }

    fn mouse_down(&mut self, x: i32, y: i32, button: &str) -> Result<()> {
        self.record(InjectorCall::MouseDown {
            x,
            y,
            button: button.to_string(),
        })
    }

    fn mouse_up(&mut self, x: i32, y: i32, button: &str) -> Result<()> {
        self.record(InjectorCall::MouseUp {
            x,
            y,
            button: button.to_string(),
        })
    }

    fn scroll(&mut self, dx: i32, dy: i32, x: i32, y: i32) -> Result<()> {
        self.record(InjectorCall::Scroll { dx, dy, x, y })
    }
}
