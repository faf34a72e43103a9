//! Video sink that pipes raw frames into an `ffmpeg` child process
//!
//! Frames are written as packed BGRA to ffmpeg's stdin; ffmpeg encodes them
//! with the configured codec and container. Finishing closes stdin and waits
//! for the encoder to flush.

use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::error::{ReplayKitError, Result};

use super::device_trait::{Frame, VideoSink, VideoSinkFactory};

/// Opens one ffmpeg encoder per video file
#[derive(Debug, Clone)]
pub struct FfmpegVideoSinkFactory {
    program: String,
    codec: String,
    fourcc: Option<String>,
    extension: String,
}

impl FfmpegVideoSinkFactory {
    pub fn new(
        codec: impl Into<String>,
        fourcc: Option<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            program: "ffmpeg".to_string(),
            codec: codec.into(),
            fourcc: fourcc.filter(|f| !f.is_empty()),
            extension: extension.into(),
        }
    }

    /// Use a specific ffmpeg binary instead of the one on `PATH`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Command-line arguments for one encoder
    pub fn args(&self, path: &Path, fps: u32, width: u32, height: u32) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-f".into(),
            "rawvideo".into(),
            "-pix_fmt".into(),
            "bgra".into(),
            "-s".into(),
            format!("{}x{}", width, height),
            "-r".into(),
            fps.to_string(),
            "-i".into(),
            "-".into(),
            "-c:v".into(),
            self.codec.clone(),
        ];
        if let Some(fourcc) = &self.fourcc {
            args.push("-vtag".into());
            args.push(fourcc.clone());
        }
        args.push("-pix_fmt".into());
        args.push("yuv420p".into());
        args.push(path.to_string_lossy().into_owned());
        args
    }
}

impl VideoSinkFactory for FfmpegVideoSinkFactory {
    fn extension(&self) -> &str {
        &self.extension
    }

    fn open(&self, path: &Path, fps: u32, width: u32, height: u32) -> Result<Box<dyn VideoSink>> {
        let args = self.args(path, fps, width, height);
        tracing::debug!("Spawning {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                ReplayKitError::VideoSink(format!("Failed to spawn {}: {}", self.program, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReplayKitError::VideoSink("ffmpeg stdin unavailable".to_string()))?;

        Ok(Box::new(FfmpegVideoSink {
            child,
            stdin: Some(stdin),
            width,
            height,
        }))
    }
}

struct FfmpegVideoSink {
    child: Child,
    stdin: Option<ChildStdin>,
    width: u32,
    height: u32,
}

impl VideoSink for FfmpegVideoSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(ReplayKitError::VideoSink(format!(
                "frame {}x{} does not match encoder {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        if frame.data.len() != frame.expected_len() {
            return Err(ReplayKitError::VideoSink(format!(
                "frame has {} bytes, expected {}",
                frame.data.len(),
                frame.expected_len()
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ReplayKitError::VideoSink("encoder already closed".to_string()))?;
        stdin
            .write_all(&frame.data)
            .map_err(|e| ReplayKitError::VideoSink(format!("ffmpeg write failed: {}", e)))
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| ReplayKitError::VideoSink(format!("ffmpeg wait failed: {}", e)))?;
        if status.success() {
            Ok(())
        } else {
            Err(ReplayKitError::VideoSink(format!(
                "ffmpeg exited with {}",
                status
            )))
        }
    }
}

impl Drop for FfmpegVideoSink {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            let _ = self.child.wait();
        }
    }
}
