//! Menu and listing text

use std::fmt::Write;

use crate::backend::MonitorInfo;
use crate::session::RecordingInfo;

use super::ids::MenuChoice;

/// Main menu followed by the choice prompt
pub fn build_main_menu() -> String {
    let mut out = String::from("\n");
    for choice in MenuChoice::ALL {
        let _ = writeln!(out, "{}. {}", choice.key(), choice.label());
    }
    let last = MenuChoice::ALL.len() - 1;
    let _ = write!(out, "\nEnter your choice (0-{}): ", last);
    out
}

/// Numbered monitor list
pub fn build_monitor_list(monitors: &[MonitorInfo]) -> String {
    let mut out = String::from("\nAvailable monitors:\n");
    for (i, monitor) in monitors.iter().enumerate() {
        let _ = writeln!(out, "Monitor {}:", i + 1);
        let _ = writeln!(out, "  Position: ({}, {})", monitor.left, monitor.top);
        let _ = writeln!(out, "  Resolution: {}x{}", monitor.width, monitor.height);
        out.push('\n');
    }
    out
}

/// Numbered recording list, newest first as given
pub fn build_recording_list(recordings: &[RecordingInfo]) -> String {
    let mut out = String::from("\nAvailable recordings:\n");
    for (i, recording) in recordings.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, recording.display_line());
    }
    out
}

/// Controls shown while a recording runs
pub fn build_recording_controls(pause_hotkey: &str) -> String {
    format!(
        "\nRecording... Controls:\n\
         - Press Ctrl+C in this console to stop recording\n\
         - Press {} to pause/resume recording\n",
        pause_hotkey
    )
}
