//! Configuration module for ReplayKit
//!
//! Settings for screen capture, recording and replay, persisted as TOML.
//!
//! # Config Location
//!
//! The first of these that exists is loaded:
//! - `./replaykit.toml` in the working directory
//! - **Linux**: `~/.config/dev.replaykit.replaykit-rs/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.replaykit.replaykit-rs/config.toml`
//! - **Windows**: `%APPDATA%\dev.replaykit.replaykit-rs\config.toml`
//!
//! Missing files fall back to [`AppConfig::default`]. Missing keys inside a
//! file fall back to their individual defaults.
//!
//! # Example
//!
//! ```ignore
//! use replaykit_rs::config::AppConfig;
//!
//! let config = AppConfig::load_or_default();
//! println!("Recording at {} fps into {:?}", config.capture.fps, config.recording.output_dir);
//! ```

use crate::backend::{CaptureRegion, CaptureTarget};
use crate::error::{ReplayKitError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config and data directories
pub const APP_ID: &str = "dev.replaykit.replaykit-rs";

/// Config filename inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Config filename looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "replaykit.toml";

/// Default capture frame rate
pub const DEFAULT_FPS: u32 = 15;

/// Default stop/poll interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default bound on joining the event drain thread
pub const DEFAULT_DRAIN_JOIN_TIMEOUT_MS: u64 = 1000;

/// Default hotkey toggling pause during a recording
pub const DEFAULT_PAUSE_HOTKEY: &str = "Key.pause";

// ==================== Directories ====================

/// Platform config directory for ReplayKit
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Platform data directory for ReplayKit (logs)
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        ReplayKitError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            ReplayKitError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Path of the config file that [`AppConfig::load`] would read, if any
pub fn config_path() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    config_dir()
        .map(|p| p.join(CONFIG_FILE))
        .filter(|p| p.exists())
}

// ==================== Capture ====================

/// Screen capture settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Target frame rate
    pub fps: u32,

    /// Encoder passed to ffmpeg (`-c:v`)
    pub codec: String,

    /// Four-character code tag, empty for none
    pub fourcc: String,

    /// Video container extension
    pub extension: String,

    /// Monitor to record when no region is set (1-based)
    pub monitor: usize,

    /// Fixed capture region; overrides `monitor`
    pub screen_region: Option<CaptureRegion>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            codec: "mpeg4".to_string(),
            fourcc: "XVID".to_string(),
            extension: "avi".to_string(),
            monitor: 1,
            screen_region: None,
        }
    }
}

impl CaptureConfig {
    /// The capture target these settings describe
    pub fn target(&self) -> CaptureTarget {
        match self.screen_region {
            Some(region) => CaptureTarget::Region(region),
            None => CaptureTarget::Monitor(self.monitor),
        }
    }
}

// ==================== Recording ====================

/// Recording session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Directory receiving screen videos and event logs
    pub output_dir: PathBuf,

    /// How often loops check the stop signal
    pub poll_interval_ms: u64,

    /// Bound on joining the drain thread at stop
    pub drain_join_timeout_ms: u64,

    /// Listener key name that toggles pause
    pub pause_hotkey: String,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("recordings"),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            drain_join_timeout_ms: DEFAULT_DRAIN_JOIN_TIMEOUT_MS,
            pause_hotkey: DEFAULT_PAUSE_HOTKEY.to_string(),
        }
    }
}

impl RecordingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn drain_join_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_join_timeout_ms)
    }
}

// ==================== Replay ====================

/// Replay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Seconds counted down before replay starts (0 disables)
    pub countdown_secs: u32,

    /// Log progress every N events
    pub progress_every: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 3,
            progress_every: 10,
        }
    }
}

// ==================== App Config ====================

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub recording: RecordingConfig,
    pub replay: ReplayConfig,
}

impl AppConfig {
    /// Load from the first config file found, or defaults if there is none
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load and validate a specific TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReplayKitError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            ReplayKitError::Config(format!("Failed to parse config {:?}: {}", path, e))
        })?;
        config.validate()?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ReplayKitError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ReplayKitError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            ReplayKitError::Config(format!("Failed to write config {:?}: {}", path, e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.capture.fps == 0 {
            return Err(ReplayKitError::Config("capture.fps must be at least 1".to_string()));
        }
        if self.capture.monitor == 0 {
            return Err(ReplayKitError::Config(
                "capture.monitor is 1-based and must be at least 1".to_string(),
            ));
        }
        if let Some(region) = &self.capture.screen_region {
            if region.width == 0 || region.height == 0 {
                return Err(ReplayKitError::Config(format!(
                    "capture.screen_region must have a non-zero size, got {}x{}",
                    region.width, region.height
                )));
            }
        }
        if self.recording.poll_interval_ms == 0 {
            return Err(ReplayKitError::Config(
                "recording.poll_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.recording.pause_hotkey.is_empty() {
            return Err(ReplayKitError::Config(
                "recording.pause_hotkey must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
