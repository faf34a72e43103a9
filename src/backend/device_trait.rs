//! Device traits for the OS-facing collaborators
//!
//! This module provides the common traits behind which the recorder talks to
//! the outside world: screen grabbing, input listening, input injection and
//! video encoding. Real implementations live behind the `native` feature,
//! simulated ones in [`super::mock_devices`].

use crate::error::Result;
use crate::session::InputSink;
use std::fmt;
use std::path::Path;

/// Geometry of a physical display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorInfo {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl MonitorInfo {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

impl fmt::Display for MonitorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.left, self.top
        )
    }
}

/// A rectangular capture region in virtual-desktop coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaptureRegion {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// What the screen capture loop samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    /// A whole monitor, 1-based as presented to the user
    Monitor(usize),
    /// A fixed region
    Region(CaptureRegion),
}

impl fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureTarget::Monitor(n) => write!(f, "monitor {}", n),
            CaptureTarget::Region(r) => {
                write!(f, "region {}x{} at ({}, {})", r.width, r.height, r.left, r.top)
            }
        }
    }
}

/// One captured frame, tightly packed BGRA
#[derive(Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    /// Solid-colour frame
    pub fn filled(width: u32, height: u32, bgra: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            data.extend_from_slice(&bgra);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Expected byte length for the frame geometry
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Screen-grab service
pub trait ScreenGrabber: Send {
    /// Enumerate physical monitors (excluding any "all displays" pseudo monitor)
    fn monitors(&mut self) -> Result<Vec<MonitorInfo>>;

    /// Grab one frame of the target
    fn grab(&mut self, target: &CaptureTarget) -> Result<Frame>;

    /// Output geometry for a target, used to open the video sink
    fn target_size(&mut self, target: &CaptureTarget) -> Result<(u32, u32)> {
        match target {
            CaptureTarget::Region(r) => Ok((r.width, r.height)),
            CaptureTarget::Monitor(n) => {
                let monitors = self.monitors()?;
                monitors
                    .get(n.saturating_sub(1))
                    .map(|m| (m.width, m.height))
                    .ok_or_else(|| {
                        crate::error::ReplayKitError::Capture(format!(
                            "Monitor {} not found ({} available)",
                            n,
                            monitors.len()
                        ))
                    })
            }
        }
    }
}

/// Raw input as delivered by a listener, before timestamping
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    KeyPress(String),
    KeyRelease(String),
    MouseMove {
        x: i32,
        y: i32,
    },
    MouseClick {
        x: i32,
        y: i32,
        button: String,
        pressed: bool,
    },
    MouseScroll {
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
    },
}

/// Input-listener service
///
/// Implementations deliver raw input into the provided [`InputSink`] from
/// their own dispatch context. The sink never blocks.
pub trait InputListener: Send {
    /// Human readable name for logs
    fn name(&self) -> &str;

    /// Begin delivering input to `sink`
    fn start(&mut self, sink: InputSink) -> Result<()>;

    /// Stop delivering input; must not block for longer than a poll interval
    fn stop(&mut self);
}

/// Input-injection service used by the replay engine
#[cfg_attr(test, mockall::automock)]
pub trait InputInjector {
    /// Current screen size in pixels
    fn screen_size(&mut self) -> Result<(u32, u32)>;

    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;

    fn key_down(&mut self, key: &str) -> Result<()>;

    fn key_up(&mut self, key: &str) -> Result<()>;

    fn mouse_down(&mut self, x: i32, y: i32, button: &str) -> Result<()>;

    fn mouse_up(&mut self, x: i32, y: i32, button: &str) -> Result<()>;

    /// Scroll by `dy` clicks (and `dx` where supported) at a position
    fn scroll(&mut self, dx: i32, dy: i32, x: i32, y: i32) -> Result<()>;
}

/// An open video file
pub trait VideoSink: Send {
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and close the file; frames already written stay playable
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Video-sink service
pub trait VideoSinkFactory: Send + Sync {
    /// File extension (without dot) of the produced container
    fn extension(&self) -> &str;

    fn open(&self, path: &Path, fps: u32, width: u32, height: u32) -> Result<Box<dyn VideoSink>>;
}
