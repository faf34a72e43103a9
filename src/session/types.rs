//! Session data types

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{ReplayKitError, Result, ResultExt};
use crate::types::Event;

/// Filename prefix of screen recordings
pub const SCREEN_PREFIX: &str = "screen";

/// Filename prefix of event logs
pub const EVENTS_PREFIX: &str = "events";

/// Filename prefix of verification videos and manifests
pub const VERIFICATION_PREFIX: &str = "verification";

/// Timestamp layout embedded in artifact names
pub const ARTIFACT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Human readable timestamp used in manifests and listings
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// State of a recording or replay session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No active session
    #[default]
    Idle,
    /// Capturing screen and input
    Recording,
    /// Artifacts finalized
    Stopped,
    /// Replaying an event log
    Replaying,
}

impl SessionState {
    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        matches!(self, SessionState::Recording)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording",
            SessionState::Stopped => "Stopped",
            SessionState::Replaying => "Replaying",
        }
    }
}

// ==================== Event Log ====================

/// Ordered sequence of recorded events
///
/// Serialized as a bare JSON array of event records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Append keeping timestamps non-decreasing
    ///
    /// Insertion order is authoritative: an event stamped earlier than its
    /// predecessor is re-stamped with the predecessor's time.
    pub fn append(&mut self, mut event: Event) {
        if let Some(last) = self.events.last() {
            let floor = last.timestamp();
            if event.timestamp() < floor {
                tracing::trace!(
                    "Clamping out-of-order timestamp {:.6} to {:.6}",
                    event.timestamp(),
                    floor
                );
                event.set_timestamp(floor);
            }
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Timestamp of the last event in seconds
    pub fn duration_secs(&self) -> f64 {
        self.events.last().map(|e| e.timestamp()).unwrap_or(0.0)
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Save the log to a file (pretty JSON)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Writing event log {:?}", path))
    }

    /// Load a whole log from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Reading event log {:?}", path))?;
        serde_json::from_str(&json).map_err(|e| {
            ReplayKitError::EventLog(format!("{:?}: {}", path, e))
        })
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Event log shared between the drain task and the orchestrator
///
/// One exclusive lock, taken briefly per append.
#[derive(Debug, Clone, Default)]
pub struct SharedEventLog {
    inner: Arc<Mutex<EventLog>>,
}

impl SharedEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, event: Event) {
        self.lock().append(event);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> EventLog {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EventLog> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ==================== Artifacts ====================

/// Names of the files produced by one session, sharing a timestamp suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    dir: PathBuf,
    stamp: String,
}

impl ArtifactNames {
    /// Names stamped with the current local time
    pub fn now(dir: impl Into<PathBuf>) -> Self {
        Self::at(dir, Local::now())
    }

    pub fn at(dir: impl Into<PathBuf>, time: DateTime<Local>) -> Self {
        Self {
            dir: dir.into(),
            stamp: time.format(ARTIFACT_TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// `<dir>/<prefix>_<stamp>.<ext>`
    pub fn path(&self, prefix: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.{}", prefix, self.stamp, ext))
    }

    pub fn screen_video(&self, ext: &str) -> PathBuf {
        self.path(SCREEN_PREFIX, ext)
    }

    pub fn event_log(&self) -> PathBuf {
        self.path(EVENTS_PREFIX, "json")
    }

    pub fn verification_video(&self, ext: &str) -> PathBuf {
        self.path(VERIFICATION_PREFIX, ext)
    }

    pub fn verification_manifest(&self) -> PathBuf {
        self.path(VERIFICATION_PREFIX, "json")
    }

    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Create the artifact directory if missing
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        ReplayKitError::Artifact(format!("Failed to create output directory {:?}: {}", dir, e))
    })
}

/// Summary written after a verification replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationManifest {
    /// Path of the replayed event log
    pub original_recording: String,
    /// Local completion time, `%Y-%m-%d %H:%M:%S`
    pub verification_time: String,
    /// Number of events in the replayed log
    pub events_replayed: usize,
}

impl VerificationManifest {
    pub fn new(original_recording: &Path, events_replayed: usize) -> Self {
        Self {
            original_recording: original_recording.display().to_string(),
            verification_time: Local::now().format(DISPLAY_TIMESTAMP_FORMAT).to_string(),
            events_replayed,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Writing verification manifest {:?}", path))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ==================== Recording Listing ====================

/// An event log found in the output directory
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingInfo {
    pub path: PathBuf,
    /// Timestamp parsed from the file name
    pub recorded_at: Option<NaiveDateTime>,
    pub size_bytes: u64,
}

impl RecordingInfo {
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// `2026-10-17 12:00:00 (1.2KB) - events_20261017_120000.json`
    pub fn display_line(&self) -> String {
        let when = self
            .recorded_at
            .map(|t| t.format(DISPLAY_TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "unknown time".to_string());
        format!("{} ({:.1}KB) - {}", when, self.size_kb(), self.file_name())
    }
}

/// Parse the timestamp out of `events_YYYYMMDD_HHMMSS.json`
pub fn parse_artifact_timestamp(path: &Path) -> Option<NaiveDateTime> {
    let stem = path.file_stem()?.to_str()?;
    let (_, stamp) = stem.split_once('_')?;
    NaiveDateTime::parse_from_str(stamp, ARTIFACT_TIMESTAMP_FORMAT).ok()
}

/// List event logs in `dir`, most recent first
///
/// A missing directory yields an empty list.
pub fn list_recordings(dir: &Path) -> Result<Vec<RecordingInfo>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut recordings = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Listing {:?}", dir))? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !(name.starts_with("events_") && name.ends_with(".json")) {
            continue;
        }
        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        recordings.push(RecordingInfo {
            recorded_at: parse_artifact_timestamp(&path),
            path,
            size_bytes,
        });
    }

    // Stamps sort lexicographically in time order
    recordings.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(recordings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_state() {
        assert!(SessionState::Recording.is_recording());
        assert!(!SessionState::Replaying.is_recording());
        assert!(!SessionState::Stopped.is_recording());
        assert_eq!(SessionState::Replaying.display_name(), "Replaying");
    }

    #[test]
    fn test_append_keeps_order_and_clamps() {
        let mut log = EventLog::new();
        log.append(Event::mouse_move(0, 0, 0.5));
        log.append(Event::mouse_move(1, 1, 0.4));
        log.append(Event::mouse_move(2, 2, 0.9));

        let times: Vec<f64> = log.iter().map(|e| e.timestamp()).collect();
        assert_eq!(times, vec![0.5, 0.5, 0.9]);
        assert_eq!(log.events()[1].position().unwrap().x, 1);
        assert_eq!(log.duration_secs(), 0.9);
    }

    #[test]
    fn test_event_log_is_a_json_array() {
        let log = EventLog::from_events(vec![Event::key_press("'a'", 0.0)]);
        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["key"], "'a'");
    }

    #[test]
    fn test_artifact_names_share_stamp() {
        let time = Local.with_ymd_and_hms(2026, 10, 17, 9, 5, 3).unwrap();
        let names = ArtifactNames::at("recordings", time);
        assert_eq!(
            names.screen_video("avi"),
            PathBuf::from("recordings/screen_20261017_090503.avi")
        );
        assert_eq!(
            names.event_log(),
            PathBuf::from("recordings/events_20261017_090503.json")
        );
        assert_eq!(
            names.verification_manifest(),
            PathBuf::from("recordings/verification_20261017_090503.json")
        );
    }

    #[test]
    fn test_parse_artifact_timestamp() {
        let parsed = parse_artifact_timestamp(Path::new("events_20261017_090503.json")).unwrap();
        assert_eq!(
            parsed.format(DISPLAY_TIMESTAMP_FORMAT).to_string(),
            "2026-10-17 09:05:03"
        );
        assert!(parse_artifact_timestamp(Path::new("events_garbage.json")).is_none());
    }

    #[test]
    fn test_list_recordings_missing_dir() {
        let list = list_recordings(Path::new("/definitely/not/here/recordings")).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_list_recordings_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "events_20260101_000000.json",
            "events_20261017_120000.json",
            "screen_20261017_120000.avi",
            "verification_20261017_120000.json",
        ] {
            std::fs::write(dir.path().join(name), "[]").unwrap();
        }

        let list = list_recordings(dir.path()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].file_name(), "events_20261017_120000.json");
        assert!(list[0].display_line().starts_with("2026-10-17 12:00:00 (0.0KB)"));
    }

    #[test]
    fn test_manifest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verification.json");
        let manifest = VerificationManifest::new(Path::new("recordings/events_x.json"), 42);
        manifest.save(&path).unwrap();

        let loaded = VerificationManifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.verification_time.len(), "2026-10-17 12:00:00".len());
    }
}
