//! Event log persistence: JSON shape and lossless round trips

mod common;

use common::builders::EventLogBuilder;
use proptest::prelude::*;
use replaykit_rs::{Event, EventLog, MouseButton, ReplayKitError};

fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9]".prop_map(|c| format!("'{}'", c)),
        prop::sample::select(vec!["Key.space", "Key.enter", "Key.shift_r", "Key.f5"])
            .prop_map(String::from),
    ]
}

fn arb_button() -> impl Strategy<Value = MouseButton> {
    prop::sample::select(vec![MouseButton::Left, MouseButton::Right, MouseButton::Middle])
}

fn arb_event() -> impl Strategy<Value = Event> {
    let time = 0.0f64..10_000.0;
    let coord = -5000i32..5000;
    prop_oneof![
        (arb_key(), any::<bool>(), time.clone()).prop_map(|(k, press, t)| if press {
            Event::key_press(k, t)
        } else {
            Event::key_release(k, t)
        }),
        (coord.clone(), coord.clone(), time.clone())
            .prop_map(|(x, y, t)| Event::mouse_move(x, y, t)),
        (coord.clone(), coord.clone(), arb_button(), any::<bool>(), time.clone())
            .prop_map(|(x, y, b, p, t)| Event::mouse_click(x, y, b, p, t)),
        (coord.clone(), coord, -10i32..10, -10i32..10, time)
            .prop_map(|(x, y, dx, dy, t)| Event::mouse_scroll(x, y, dx, dy, t)),
    ]
}

proptest! {
    #[test]
    fn prop_serialize_roundtrip(events in prop::collection::vec(arb_event(), 0..50)) {
        let log = EventLog::from_events(events);
        let json = serde_json::to_string(&log).unwrap();
        let parsed: EventLog = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, log);
    }
}

#[test]
fn test_log_file_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events_20260101_000000.json");
    let log = EventLogBuilder::new()
        .move_to(100, 200)
        .after(0.125)
        .click(100, 200, MouseButton::Right)
        .after(0.125)
        .scroll(100, 200, 0, -3)
        .tap("Key.enter")
        .build();
    log.save_to_file(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
    let records = raw.as_array().unwrap();
    assert_eq!(records.len(), 6);

    assert_eq!(records[0]["type"], "mouse");
    assert_eq!(records[0]["event"], "move");
    assert_eq!(records[0]["position"], serde_json::json!([100, 200]));
    assert_eq!(records[1]["button"], "Button.right");
    assert_eq!(records[1]["pressed"], true);
    assert_eq!(records[2]["pressed"], false);
    assert_eq!(records[3]["scroll"], serde_json::json!([0, -3]));
    assert_eq!(records[3]["time"], 0.25);
    assert_eq!(records[4]["type"], "keyboard");
    assert_eq!(records[4]["event"], "press");
    assert_eq!(records[4]["key"], "Key.enter");

    assert_eq!(EventLog::load_from_file(&path).unwrap(), log);
}

#[test]
fn test_empty_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    EventLog::new().save_to_file(&path).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert_eq!(raw.trim(), "[]");
    assert!(EventLog::load_from_file(&path).unwrap().is_empty());
}

#[test]
fn test_malformed_log_is_event_log_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.json");
    std::fs::write(&path, r#"[{"type": "mouse", "event": "move", "time": 0.1}]"#).unwrap();

    assert!(matches!(
        EventLog::load_from_file(&path),
        Err(ReplayKitError::EventLog(_))
    ));
}

#[test]
fn test_missing_log_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    assert!(EventLog::load_from_file(&dir.path().join("nope.json")).is_err());
}
