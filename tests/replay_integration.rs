//! Replay, verification and the interactive loop against simulated devices

mod common;

use std::io::Cursor;
use std::time::{Duration, Instant};

use common::builders::EventLogBuilder;
use common::files_with_prefix;
use common::mock_helpers::{keep_stopping, single_monitor, test_devices};
use replaykit_rs::backend::{InjectorCall, MonitorInfo, RecordingInjector};
use replaykit_rs::config::AppConfig;
use replaykit_rs::menu::Prompter;
use replaykit_rs::session::{ReplayOptions, VerificationManifest};
use replaykit_rs::{
    DeviceSet, Event, EventLog, MouseButton, ReplayEngine, ReplayKitApp, StopSignal,
};
use serial_test::serial;

type TestApp = ReplayKitApp<Cursor<Vec<u8>>, Vec<u8>>;

fn test_config(dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.recording.output_dir = dir.to_path_buf();
    config.recording.poll_interval_ms = 5;
    config.capture.fps = 20;
    config.replay.countdown_secs = 0;
    config
}

fn app(config: AppConfig, devices: DeviceSet, stop: StopSignal, input: &str) -> TestApp {
    let prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
    ReplayKitApp::new(config, devices, stop, prompter)
}

#[test]
fn test_replay_translates_and_clamps() {
    let log = EventLogBuilder::new()
        .move_to(99999, -5)
        .click(50, 60, MouseButton::Middle)
        .tap("Key.page_down")
        .tap("'q'")
        .scroll(10, 10, 1, -1)
        .build();

    let mut injector = RecordingInjector::new(1920, 1080);
    let report = ReplayEngine::new(ReplayOptions::immediate()).replay(&mut injector, &log);

    assert_eq!(report.total, 8);
    assert_eq!(report.failed, 0);
    assert_eq!(
        injector.call_list(),
        vec![
            InjectorCall::MoveTo { x: 1919, y: 0 },
            InjectorCall::MouseDown { x: 50, y: 60, button: "middle".to_string() },
            InjectorCall::MouseUp { x: 50, y: 60, button: "middle".to_string() },
            InjectorCall::KeyDown("pagedown".to_string()),
            InjectorCall::KeyUp("pagedown".to_string()),
            InjectorCall::KeyDown("q".to_string()),
            InjectorCall::KeyUp("q".to_string()),
            InjectorCall::Scroll { dx: 1, dy: -1, x: 10, y: 10 },
        ]
    );
}

#[test]
#[serial]
fn test_replay_keeps_relative_timing() {
    let times = [0.0, 0.5, 1.2];
    let log = EventLog::from_events(times.iter().map(|t| Event::mouse_move(1, 1, *t)).collect());

    let mut injector = RecordingInjector::new(1920, 1080);
    let before = Instant::now();
    ReplayEngine::new(ReplayOptions::immediate()).replay(&mut injector, &log);
    let calls = injector.calls();

    assert_eq!(calls.len(), 3);
    for (call, t) in calls.iter().zip(times) {
        let offset = call.at.duration_since(before).as_secs_f64();
        assert!(offset >= t, "dispatched at {} before {}", offset, t);
        assert!(offset < t + 0.5, "dispatched at {} long after {}", offset, t);
    }
}

#[test]
fn test_late_events_are_not_reordered() {
    // A failing injector still advances; past deadlines dispatch immediately
    let log = EventLog::from_events(vec![
        Event::key_press("'a'", 0.0),
        Event::key_press("'b'", 0.0),
        Event::key_press("'c'", 0.001),
    ]);
    let mut injector = RecordingInjector::new(10, 10).failing_on(0);
    let report = ReplayEngine::new(ReplayOptions::immediate()).replay(&mut injector, &log);

    assert_eq!(report.dispatched, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(
        injector.call_list(),
        vec![
            InjectorCall::KeyDown("b".to_string()),
            InjectorCall::KeyDown("c".to_string())
        ]
    );
}

#[test]
fn test_menu_replay_with_verification() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("events_20260101_120000.json");
    EventLogBuilder::new()
        .move_to(100, 100)
        .after(0.05)
        .tap("Key.space")
        .build()
        .save_to_file(&log_path)
        .unwrap();

    let devices = test_devices(single_monitor());
    let injector = devices.injector.clone();
    let sinks = devices.sinks.clone();
    let mut app = app(test_config(dir.path()), devices.devices, StopSignal::new(), "2\n1\nn\n");
    app.run().unwrap();

    assert_eq!(
        injector.call_list(),
        vec![
            InjectorCall::MoveTo { x: 100, y: 100 },
            InjectorCall::KeyDown("space".to_string()),
            InjectorCall::KeyUp("space".to_string()),
        ]
    );

    let videos = files_with_prefix(dir.path(), "verification_");
    let manifest_path = videos
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "json"))
        .unwrap();
    let video_path = videos
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "avi"))
        .unwrap();

    let manifest = VerificationManifest::load(manifest_path).unwrap();
    assert_eq!(manifest.events_replayed, 3);
    assert_eq!(manifest.original_recording, log_path.display().to_string());
    assert!(sinks.video(video_path).unwrap().finished);
}

#[test]
fn test_menu_replay_without_recordings() {
    let dir = tempfile::tempdir().unwrap();
    let devices = test_devices(single_monitor());
    let injector = devices.injector.clone();

    let mut app = app(
        test_config(&dir.path().join("missing")),
        devices.devices,
        StopSignal::new(),
        "2\nn\n",
    );
    app.run().unwrap();

    assert!(injector.calls().is_empty());
    assert!(!dir.path().join("missing").exists());
}

#[test]
#[serial]
fn test_menu_record_on_second_monitor() {
    let dir = tempfile::tempdir().unwrap();
    let devices = test_devices(vec![
        MonitorInfo::new(0, 0, 1920, 1080),
        MonitorInfo::new(1920, 0, 800, 600),
    ]);
    let sinks = devices.sinks.clone();
    let stop = StopSignal::new();
    let done = StopSignal::new();
    let stopper = keep_stopping(&stop, &done, Duration::from_millis(100));

    // monitor 2, then decline the immediate replay
    let mut app = app(test_config(dir.path()), devices.devices, stop, "2\nn\n");
    let outcome = app.record().unwrap();
    done.trigger();
    stopper.join().unwrap();

    let outcome = outcome.unwrap();
    assert!(outcome.event_log.is_empty());
    assert!(outcome.events_path.exists());

    let video = sinks.video(&outcome.video_path).unwrap();
    assert_eq!((video.width, video.height), (800, 600));
    assert!(video.finished);
}

#[test]
fn test_replay_picker_zero_backs_out() {
    let dir = tempfile::tempdir().unwrap();
    EventLogBuilder::new()
        .tap("Key.ctrl")
        .build()
        .save_to_file(&dir.path().join("events_20260101_120000.json"))
        .unwrap();

    let devices = test_devices(single_monitor());
    let injector = devices.injector.clone();
    let mut app = app(test_config(dir.path()), devices.devices, StopSignal::new(), "0\n1\n");

    assert!(app.replay_existing().unwrap().is_none());
    assert!(injector.calls().is_empty());
    assert!(files_with_prefix(dir.path(), "verification_").is_empty());
}
