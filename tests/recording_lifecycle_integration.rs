//! Recording sessions end to end against simulated devices

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::files_with_prefix;
use replaykit_rs::backend::{
    CaptureTarget, InputListener, MemoryVideoSinkFactory, MockScreenGrabber, RawInput,
    ScriptedInputListener,
};
use replaykit_rs::session::{CaptureSettings, RecorderSettings, RecordingSession, StopSignal};
use replaykit_rs::{Event, EventLog};
use serial_test::serial;

fn settings(dir: &std::path::Path, target: CaptureTarget) -> RecorderSettings {
    RecorderSettings {
        output_dir: dir.to_path_buf(),
        capture: CaptureSettings {
            target,
            fps: 25,
            poll_interval: Duration::from_millis(5),
        },
        drain_join_timeout: Duration::from_millis(500),
        pause_hotkey: "Key.pause".to_string(),
    }
}

fn stop_after(stop: &StopSignal, ms: u64) -> std::thread::JoinHandle<()> {
    let stop = stop.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(ms));
        stop.trigger();
    })
}

#[test]
fn test_zero_event_session_writes_both_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("recordings");
    let stop = StopSignal::new();
    let sinks = MemoryVideoSinkFactory::new().touching_files();

    let mut session = RecordingSession::new(
        settings(&output, CaptureTarget::Monitor(1)),
        stop.clone(),
    );
    let stopper = stop_after(&stop, 150);
    let outcome = session
        .run(
            Box::new(MockScreenGrabber::single_hd()),
            vec![Box::new(ScriptedInputListener::idle("keyboard")) as Box<dyn InputListener>],
            Arc::new(sinks.clone()),
        )
        .unwrap();
    stopper.join().unwrap();

    assert!(outcome.event_log.is_empty());
    assert!(EventLog::load_from_file(&outcome.events_path).unwrap().is_empty());
    assert!(outcome.video_path.exists());
    assert!(sinks.video(&outcome.video_path).unwrap().finished);

    assert_eq!(files_with_prefix(&output, "events_").len(), 1);
    assert_eq!(files_with_prefix(&output, "screen_").len(), 1);
    let stamp = outcome.names.stamp();
    assert!(outcome.events_path.ends_with(format!("events_{}.json", stamp)));
    assert!(outcome.video_path.ends_with(format!("screen_{}.avi", stamp)));
}

#[test]
#[serial]
fn test_pause_hotkey_suppresses_input_and_time() {
    let dir = tempfile::tempdir().unwrap();
    let stop = StopSignal::new();
    let listener = ScriptedInputListener::new(
        "keyboard+mouse",
        vec![
            (Duration::from_millis(20), RawInput::MouseMove { x: 1, y: 1 }),
            (Duration::from_millis(10), RawInput::KeyPress("Key.pause".to_string())),
            (Duration::from_millis(10), RawInput::KeyRelease("Key.pause".to_string())),
            (Duration::from_millis(10), RawInput::MouseMove { x: 2, y: 2 }),
            (Duration::from_millis(200), RawInput::KeyPress("Key.pause".to_string())),
            (Duration::from_millis(10), RawInput::MouseMove { x: 3, y: 3 }),
        ],
    );

    let mut session = RecordingSession::new(
        settings(dir.path(), CaptureTarget::Monitor(1)),
        stop.clone(),
    );
    let stopper = stop_after(&stop, 600);
    let outcome = session
        .run(
            Box::new(MockScreenGrabber::single_hd()),
            vec![Box::new(listener) as Box<dyn InputListener>],
            Arc::new(MemoryVideoSinkFactory::new()),
        )
        .unwrap();
    stopper.join().unwrap();

    let events = outcome.event_log.events();
    assert_eq!(events.len(), 2, "events: {:?}", events);
    assert_eq!(events[0].position().unwrap().x, 1);
    assert_eq!(events[1].position().unwrap().x, 3);

    // About 20ms of active time passed between the two moves; the ~220ms
    // pause is excluded
    let gap = events[1].timestamp() - events[0].timestamp();
    assert!(gap >= 0.0);
    assert!(gap < 0.15, "gap {} includes paused time", gap);
}

#[test]
fn test_events_from_two_listeners_are_time_ordered() {
    let dir = tempfile::tempdir().unwrap();
    let stop = StopSignal::new();
    let keyboard = ScriptedInputListener::new(
        "keyboard",
        (0..5)
            .map(|_| (Duration::from_millis(7), RawInput::KeyPress("'k'".to_string())))
            .collect(),
    );
    let mouse = ScriptedInputListener::new(
        "mouse",
        (0..5)
            .map(|i| (Duration::from_millis(5), RawInput::MouseMove { x: i, y: i }))
            .collect(),
    );

    let mut session = RecordingSession::new(
        settings(dir.path(), CaptureTarget::Monitor(1)),
        stop.clone(),
    );
    let stopper = stop_after(&stop, 300);
    let outcome = session
        .run(
            Box::new(MockScreenGrabber::single_hd()),
            vec![Box::new(keyboard) as Box<dyn InputListener>, Box::new(mouse)],
            Arc::new(MemoryVideoSinkFactory::new()),
        )
        .unwrap();
    stopper.join().unwrap();

    let events = outcome.event_log.events();
    assert_eq!(events.len(), 10);
    assert_eq!(events.iter().filter(|e| e.is_keyboard()).count(), 5);
    assert!(events.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));

    let moves: Vec<i32> = events
        .iter()
        .filter_map(|e| match e {
            Event::MouseMove { position, .. } => Some(position.x),
            _ => None,
        })
        .collect();
    assert_eq!(moves, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_sink_failure_keeps_frames_and_events() {
    let dir = tempfile::tempdir().unwrap();
    let stop = StopSignal::new();
    let sinks = MemoryVideoSinkFactory::new().failing_after(2);
    let listener = ScriptedInputListener::new(
        "mouse",
        vec![(Duration::from_millis(150), RawInput::MouseMove { x: 5, y: 5 })],
    );

    let mut session = RecordingSession::new(
        settings(dir.path(), CaptureTarget::Monitor(1)),
        stop.clone(),
    );
    let stopper = stop_after(&stop, 400);
    let outcome = session
        .run(
            Box::new(MockScreenGrabber::single_hd()),
            vec![Box::new(listener) as Box<dyn InputListener>],
            Arc::new(sinks.clone()),
        )
        .unwrap();
    stopper.join().unwrap();

    let report = outcome.capture.as_ref().unwrap();
    assert!(!report.is_ok());
    assert_eq!(report.frames_captured, 2);

    let video = sinks.video(&outcome.video_path).unwrap();
    assert_eq!(video.frames, 2);
    assert!(video.finished);

    // Input capture went on after the screen side failed
    assert_eq!(outcome.event_log.len(), 1);
    assert_eq!(EventLog::load_from_file(&outcome.events_path).unwrap().len(), 1);
}

#[test]
fn test_missing_monitor_still_records_input() {
    let dir = tempfile::tempdir().unwrap();
    let stop = StopSignal::new();
    let listener = ScriptedInputListener::new(
        "keyboard",
        vec![(Duration::from_millis(10), RawInput::KeyPress("Key.enter".to_string()))],
    );

    let mut session = RecordingSession::new(
        settings(dir.path(), CaptureTarget::Monitor(4)),
        stop.clone(),
    );
    let stopper = stop_after(&stop, 200);
    let outcome = session
        .run(
            Box::new(MockScreenGrabber::single_hd()),
            vec![Box::new(listener) as Box<dyn InputListener>],
            Arc::new(MemoryVideoSinkFactory::new()),
        )
        .unwrap();
    stopper.join().unwrap();

    assert!(outcome.capture.is_err());
    assert_eq!(outcome.frames_captured(), 0);
    assert_eq!(outcome.event_log.len(), 1);
}

#[test]
fn test_output_dir_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();

    let mut session = RecordingSession::new(
        settings(&blocker.join("recordings"), CaptureTarget::Monitor(1)),
        StopSignal::new(),
    );
    let result = session.run(
        Box::new(MockScreenGrabber::single_hd()),
        Vec::new(),
        Arc::new(MemoryVideoSinkFactory::new()),
    );

    assert!(matches!(result, Err(replaykit_rs::ReplayKitError::Artifact(_))));
}
