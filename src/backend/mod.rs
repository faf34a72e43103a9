//! Backend module: the OS-facing collaborators
//!
//! Everything that touches the display, the input devices or the video
//! encoder sits behind a trait in [`device_trait`], so the recording and
//! replay logic in [`crate::session`] can run against real devices or
//! simulated ones.
//!
//! # Components
//!
//! - [`ScreenGrabber`] - Monitor enumeration and frame grabbing
//! - [`InputListener`] - Global keyboard/mouse hooks delivering [`RawInput`]
//! - [`InputInjector`] - Synthesized input for replay
//! - [`VideoSinkFactory`] / [`VideoSink`] - Frame encoding to a file
//!
//! # Implementations
//!
//! - [`FfmpegVideoSinkFactory`] - Pipes frames into an `ffmpeg` process
//! - `native::{XcapGrabber, RdevListener, RdevInjector}` - Real devices
//!   (feature `native`)
//! - [`mock_devices`] - Simulated devices for tests and headless runs
//!
//! # Example
//!
//! ```ignore
//! use replaykit_rs::backend::default_devices;
//! use replaykit_rs::config::AppConfig;
//!
//! let config = AppConfig::default();
//! let mut devices = default_devices(&config);
//! let monitors = devices.new_grabber().monitors()?;
//! ```

pub mod device_trait;
pub mod ffmpeg_sink;
pub mod mock_devices;
#[cfg(feature = "native")]
pub mod native;

pub use device_trait::{
    CaptureRegion, CaptureTarget, Frame, InputInjector, InputListener, MonitorInfo, RawInput,
    ScreenGrabber, VideoSink, VideoSinkFactory,
};
pub use ffmpeg_sink::FfmpegVideoSinkFactory;
pub use mock_devices::{
    InjectorCall, MemoryVideoSinkFactory, MockScreenGrabber, RecordingInjector,
    ScriptedInputListener,
};

#[cfg(test)]
pub use device_trait::MockInputInjector;

use crate::config::AppConfig;
use std::sync::Arc;

/// Extension of the empty files simulated sessions leave in place of videos
pub const SIMULATED_VIDEO_EXTENSION: &str = "placeholder";

type GrabberFactory = Box<dyn Fn() -> Box<dyn ScreenGrabber> + Send + Sync>;
type ListenerFactory = Box<dyn Fn() -> Vec<Box<dyn InputListener>> + Send + Sync>;

/// The set of devices one run of the application works with
///
/// Grabbers and listeners are created fresh for each session since they are
/// moved into their threads.
pub struct DeviceSet {
    grabber: GrabberFactory,
    listeners: ListenerFactory,
    pub injector: Box<dyn InputInjector>,
    pub sinks: Arc<dyn VideoSinkFactory>,
    pub simulated: bool,
}

impl DeviceSet {
    pub fn new(
        grabber: impl Fn() -> Box<dyn ScreenGrabber> + Send + Sync + 'static,
        listeners: impl Fn() -> Vec<Box<dyn InputListener>> + Send + Sync + 'static,
        injector: Box<dyn InputInjector>,
        sinks: Arc<dyn VideoSinkFactory>,
    ) -> Self {
        Self {
            grabber: Box::new(grabber),
            listeners: Box::new(listeners),
            injector,
            sinks,
            simulated: false,
        }
    }

    /// Devices that never touch the OS: a single 1920x1080 monitor, idle
    /// listeners, a call-recording injector and in-memory videos that still
    /// create empty `.placeholder` files on disk, so nothing looks like a
    /// playable video.
    pub fn simulated() -> Self {
        let mut set = Self::new(
            || Box::new(MockScreenGrabber::single_hd()) as Box<dyn ScreenGrabber>,
            || {
                vec![
                    Box::new(ScriptedInputListener::idle("keyboard")) as Box<dyn InputListener>,
                    Box::new(ScriptedInputListener::idle("mouse")),
                ]
            },
            Box::new(RecordingInjector::new(1920, 1080)),
            Arc::new(
                MemoryVideoSinkFactory::new()
                    .touching_files()
                    .with_extension(SIMULATED_VIDEO_EXTENSION),
            ),
        );
        set.simulated = true;
        set
    }

    pub fn new_grabber(&self) -> Box<dyn ScreenGrabber> {
        (self.grabber)()
    }

    pub fn new_listeners(&self) -> Vec<Box<dyn InputListener>> {
        (self.listeners)()
    }
}

/// Real devices when built with `native`, simulated ones otherwise
#[cfg(feature = "native")]
pub fn default_devices(config: &AppConfig) -> DeviceSet {
    let fourcc = Some(config.capture.fourcc.clone());
    DeviceSet::new(
        || Box::new(native::XcapGrabber::new()) as Box<dyn ScreenGrabber>,
        || {
            vec![Box::new(native::RdevListener::new("keyboard+mouse")) as Box<dyn InputListener>]
        },
        Box::new(native::RdevInjector::new()),
        Arc::new(FfmpegVideoSinkFactory::new(
            config.capture.codec.clone(),
            fourcc,
            config.capture.extension.clone(),
        )),
    )
}

/// Real devices when built with `native`, simulated ones otherwise
#[cfg(not(feature = "native"))]
pub fn default_devices(_config: &AppConfig) -> DeviceSet {
    tracing::warn!("Built without the `native` feature; using simulated devices");
    DeviceSet::simulated()
}
