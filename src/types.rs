//! Core data types for ReplayKit
//!
//! This module contains the event model shared by the recorder and the
//! replay engine: a single timestamped input occurrence from either the
//! keyboard or the mouse.
//!
//! # Main Types
//!
//! - [`Event`] - Tagged union of keyboard and mouse events
//! - [`KeyAction`] - Press or release
//! - [`MouseButton`] - Left, right or middle button
//! - [`Position`] / [`ScrollDelta`] - Integer screen coordinates and wheel deltas
//!
//! # Wire Format
//!
//! Events serialize to flat JSON records with explicit field names:
//!
//! ```json
//! { "type": "keyboard", "event": "press", "key": "Key.space", "time": 0.25 }
//! { "type": "mouse", "event": "move", "position": [100, 100], "time": 0.5 }
//! { "type": "mouse", "event": "click", "button": "Button.left",
//!   "position": [5, 5], "pressed": true, "time": 0.75 }
//! { "type": "mouse", "event": "scroll", "position": [5, 5], "scroll": [0, -1], "time": 1.0 }
//! ```
//!
//! Keyboard keys are stored as the raw listener text and only normalized at
//! replay time (see [`crate::session::keymap`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Screen position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Clamp into `[0, width-1] x [0, height-1]`
    pub fn clamped(self, width: u32, height: u32) -> Self {
        let max_x = width.saturating_sub(1).min(i32::MAX as u32) as i32;
        let max_y = height.saturating_sub(1).min(i32::MAX as u32) as i32;
        Self {
            x: self.x.clamp(0, max_x),
            y: self.y.clamp(0, max_y),
        }
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Position> for (i32, i32) {
    fn from(p: Position) -> Self {
        (p.x, p.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Mouse wheel delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct ScrollDelta {
    pub dx: i32,
    pub dy: i32,
}

impl ScrollDelta {
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

impl From<(i32, i32)> for ScrollDelta {
    fn from((dx, dy): (i32, i32)) -> Self {
        Self { dx, dy }
    }
}

impl From<ScrollDelta> for (i32, i32) {
    fn from(d: ScrollDelta) -> Self {
        (d.dx, d.dy)
    }
}

/// Keyboard event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Press,
    Release,
}

impl KeyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAction::Press => "press",
            KeyAction::Release => "release",
        }
    }
}

/// Mouse button
///
/// Stored in the event log using the listener's raw names (`Button.left`).
/// Unrecognized raw names resolve to [`MouseButton::Left`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Parse a raw listener button name, defaulting to left
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "Button.left" | "left" => MouseButton::Left,
            "Button.right" | "right" => MouseButton::Right,
            "Button.middle" | "middle" => MouseButton::Middle,
            other => {
                tracing::trace!("Unrecognized mouse button {:?}, using left", other);
                MouseButton::Left
            }
        }
    }

    /// Raw listener name as written to the event log
    pub fn raw_name(&self) -> &'static str {
        match self {
            MouseButton::Left => "Button.left",
            MouseButton::Right => "Button.right",
            MouseButton::Middle => "Button.middle",
        }
    }

    /// Name understood by the injection sink
    pub fn injector_name(&self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

/// A single recorded input occurrence
///
/// `timestamp` is seconds of active (unpaused) recording time since the
/// session started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireEvent", into = "WireEvent")]
pub enum Event {
    Keyboard {
        action: KeyAction,
        key: String,
        timestamp: f64,
    },
    MouseMove {
        position: Position,
        timestamp: f64,
    },
    MouseClick {
        position: Position,
        button: MouseButton,
        pressed: bool,
        timestamp: f64,
    },
    MouseScroll {
        position: Position,
        delta: ScrollDelta,
        timestamp: f64,
    },
}

impl Event {
    pub fn key_press(key: impl Into<String>, timestamp: f64) -> Self {
        Event::Keyboard {
            action: KeyAction::Press,
            key: key.into(),
            timestamp,
        }
    }

    pub fn key_release(key: impl Into<String>, timestamp: f64) -> Self {
        Event::Keyboard {
            action: KeyAction::Release,
            key: key.into(),
            timestamp,
        }
    }

    pub fn mouse_move(x: i32, y: i32, timestamp: f64) -> Self {
        Event::MouseMove {
            position: Position::new(x, y),
            timestamp,
        }
    }

    pub fn mouse_click(x: i32, y: i32, button: MouseButton, pressed: bool, timestamp: f64) -> Self {
        Event::MouseClick {
            position: Position::new(x, y),
            button,
            pressed,
            timestamp,
        }
    }

    pub fn mouse_scroll(x: i32, y: i32, dx: i32, dy: i32, timestamp: f64) -> Self {
        Event::MouseScroll {
            position: Position::new(x, y),
            delta: ScrollDelta::new(dx, dy),
            timestamp,
        }
    }

    /// Seconds of active recording time
    pub fn timestamp(&self) -> f64 {
        match self {
            Event::Keyboard { timestamp, .. }
            | Event::MouseMove { timestamp, .. }
            | Event::MouseClick { timestamp, .. }
            | Event::MouseScroll { timestamp, .. } => *timestamp,
        }
    }

    pub(crate) fn set_timestamp(&mut self, value: f64) {
        match self {
            Event::Keyboard { timestamp, .. }
            | Event::MouseMove { timestamp, .. }
            | Event::MouseClick { timestamp, .. }
            | Event::MouseScroll { timestamp, .. } => *timestamp = value,
        }
    }

    /// Screen position for mouse events
    pub fn position(&self) -> Option<Position> {
        match self {
            Event::Keyboard { .. } => None,
            Event::MouseMove { position, .. }
            | Event::MouseClick { position, .. }
            | Event::MouseScroll { position, .. } => Some(*position),
        }
    }

    pub fn is_keyboard(&self) -> bool {
        matches!(self, Event::Keyboard { .. })
    }

    /// Short label used in logs (`keyboard/press`, `mouse/move`, ...)
    pub fn kind_label(&self) -> &'static str {
        match self {
            Event::Keyboard {
                action: KeyAction::Press,
                ..
            } => "keyboard/press",
            Event::Keyboard {
                action: KeyAction::Release,
                ..
            } => "keyboard/release",
            Event::MouseMove { .. } => "mouse/move",
            Event::MouseClick { .. } => "mouse/click",
            Event::MouseScroll { .. } => "mouse/scroll",
        }
    }
}

// ==================== Wire Representation ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireKind {
    Keyboard,
    Mouse,
}

/// Flat JSON record used for (de)serializing [`Event`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    kind: WireKind,
    event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    button: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<(i32, i32)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pressed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scroll: Option<(i32, i32)>,
    time: f64,
}

impl From<Event> for WireEvent {
    fn from(event: Event) -> Self {
        let mut wire = WireEvent {
            kind: WireKind::Mouse,
            event: String::new(),
            key: None,
            button: None,
            position: None,
            pressed: None,
            scroll: None,
            time: event.timestamp(),
        };

        match event {
            Event::Keyboard { action, key, .. } => {
                wire.kind = WireKind::Keyboard;
                wire.event = action.as_str().to_string();
                wire.key = Some(key);
            }
            Event::MouseMove { position, .. } => {
                wire.event = "move".to_string();
                wire.position = Some(position.into());
            }
            Event::MouseClick {
                position,
                button,
                pressed,
                ..
            } => {
                wire.event = "click".to_string();
                wire.button = Some(button.raw_name().to_string());
                wire.position = Some(position.into());
                wire.pressed = Some(pressed);
            }
            Event::MouseScroll {
                position, delta, ..
            } => {
                wire.event = "scroll".to_string();
                wire.position = Some(position.into());
                wire.scroll = Some(delta.into());
            }
        }

        wire
    }
}

impl TryFrom<WireEvent> for Event {
    type Error = String;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        if !wire.time.is_finite() || wire.time < 0.0 {
            return Err(format!("invalid event time {}", wire.time));
        }
        let timestamp = wire.time;

        let position = || {
            wire.position
                .map(Position::from)
                .ok_or_else(|| format!("mouse {} event without position", wire.event))
        };

        match (wire.kind, wire.event.as_str()) {
            (WireKind::Keyboard, "press" | "release") => {
                let key = wire
                    .key
                    .clone()
                    .ok_or_else(|| "keyboard event without key".to_string())?;
                let action = if wire.event == "press" {
                    KeyAction::Press
                } else {
                    KeyAction::Release
                };
                Ok(Event::Keyboard {
                    action,
                    key,
                    timestamp,
                })
            }
            (WireKind::Mouse, "move") => Ok(Event::MouseMove {
                position: position()?,
                timestamp,
            }),
            (WireKind::Mouse, "click") => Ok(Event::MouseClick {
                position: position()?,
                button: MouseButton::from_raw(wire.button.as_deref().unwrap_or_default()),
                pressed: wire
                    .pressed
                    .ok_or_else(|| "mouse click event without pressed flag".to_string())?,
                timestamp,
            }),
            (WireKind::Mouse, "scroll") => Ok(Event::MouseScroll {
                position: position()?,
                delta: wire
                    .scroll
                    .map(ScrollDelta::from)
                    .ok_or_else(|| "mouse scroll event without scroll delta".to_string())?,
                timestamp,
            }),
            (kind, other) => Err(format!("unknown {:?} event {:?}", kind, other)),
        }
    }
}
