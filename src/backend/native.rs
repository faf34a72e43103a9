//! OS-backed devices (feature `native`)
//!
//! - [`RdevListener`] - Global keyboard/mouse hook via `rdev::listen`
//! - [`RdevInjector`] - Input synthesis via `rdev::simulate`
//! - [`XcapGrabber`] - Monitor enumeration and screenshots via `xcap`
//!
//! `rdev::listen` never returns, so the hook thread is started once per
//! process and routes events to whichever session sink is currently
//! installed.

use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use rdev::{Button, EventType, Key};

use crate::error::{ReplayKitError, Result};
use crate::session::InputSink;

use super::device_trait::{
    CaptureTarget, Frame, InputInjector, InputListener, MonitorInfo, RawInput, ScreenGrabber,
};

// ==================== Listener ====================

type SinkSlot = Arc<Mutex<Option<InputSink>>>;

struct HookState {
    slot: SinkSlot,
    mouse: Mutex<(i32, i32)>,
}

static HOOK: OnceLock<Arc<HookState>> = OnceLock::new();

fn hook() -> Arc<HookState> {
    HOOK.get_or_init(|| {
        let state = Arc::new(HookState {
            slot: Arc::new(Mutex::new(None)),
            mouse: Mutex::new((0, 0)),
        });
        let hook_state = state.clone();
        let spawned = std::thread::Builder::new()
            .name("rdev-hook".to_string())
            .spawn(move || {
                if let Err(error) = rdev::listen(move |event| hook_state.dispatch(event)) {
                    tracing::error!("Global input hook failed: {:?}", error);
                }
            });
        if let Err(e) = spawned {
            tracing::error!("Failed to spawn input hook thread: {}", e);
        }
        state
    })
    .clone()
}

impl HookState {
    fn dispatch(&self, event: rdev::Event) {
        let raw = match event.event_type {
            EventType::MouseMove { x, y } => {
                let pos = (x as i32, y as i32);
                if let Ok(mut mouse) = self.mouse.lock() {
                    *mouse = pos;
                }
                RawInput::MouseMove { x: pos.0, y: pos.1 }
            }
            EventType::ButtonPress(button) | EventType::ButtonRelease(button) => {
                let (x, y) = self.mouse_position();
                RawInput::MouseClick {
                    x,
                    y,
                    button: button_name(button).to_string(),
                    pressed: matches!(event.event_type, EventType::ButtonPress(_)),
                }
            }
            EventType::Wheel { delta_x, delta_y } => {
                let (x, y) = self.mouse_position();
                RawInput::MouseScroll {
                    x,
                    y,
                    dx: delta_x as i32,
                    dy: delta_y as i32,
                }
            }
            EventType::KeyPress(key) => RawInput::KeyPress(key_name(key, event.name.as_deref())),
            EventType::KeyRelease(key) => RawInput::KeyRelease(key_name(key, None)),
        };

        let sink = self.slot.lock().ok().and_then(|slot| slot.clone());
        if let Some(sink) = sink {
            sink.emit(raw);
        }
    }

    fn mouse_position(&self) -> (i32, i32) {
        self.mouse.lock().map(|m| *m).unwrap_or((0, 0))
    }
}

fn button_name(button: Button) -> &'static str {
    match button {
        Button::Left => "Button.left",
        Button::Right => "Button.right",
        Button::Middle => "Button.middle",
        Button::Unknown(_) => "Button.unknown",
    }
}

/// rdev keys with a listener name of the form `Key.<name>`
const NAMED_KEYS: &[(Key, &str)] = &[
    (Key::Space, "space"),
    (Key::Return, "enter"),
    (Key::KpReturn, "enter"),
    (Key::Escape, "esc"),
    (Key::Tab, "tab"),
    (Key::Backspace, "backspace"),
    (Key::Delete, "delete"),
    (Key::ShiftLeft, "shift"),
    (Key::ShiftRight, "shift_r"),
    (Key::ControlLeft, "ctrl_l"),
    (Key::ControlRight, "ctrl_r"),
    (Key::Alt, "alt_l"),
    (Key::AltGr, "alt_gr"),
    (Key::UpArrow, "up"),
    (Key::DownArrow, "down"),
    (Key::LeftArrow, "left"),
    (Key::RightArrow, "right"),
    (Key::PageUp, "page_up"),
    (Key::PageDown, "page_down"),
    (Key::Home, "home"),
    (Key::End, "end"),
    (Key::CapsLock, "caps_lock"),
    (Key::MetaLeft, "cmd"),
    (Key::MetaRight, "cmd_r"),
    (Key::Insert, "insert"),
    (Key::NumLock, "num_lock"),
    (Key::ScrollLock, "scroll_lock"),
    (Key::PrintScreen, "print_screen"),
    (Key::Pause, "pause"),
    (Key::F1, "f1"),
    (Key::F2, "f2"),
    (Key::F3, "f3"),
    (Key::F4, "f4"),
    (Key::F5, "f5"),
    (Key::F6, "f6"),
    (Key::F7, "f7"),
    (Key::F8, "f8"),
    (Key::F9, "f9"),
    (Key::F10, "f10"),
    (Key::F11, "f11"),
    (Key::F12, "f12"),
];

/// rdev keys for unshifted printable characters
const CHAR_KEYS: &[(Key, char)] = &[
    (Key::KeyA, 'a'),
    (Key::KeyB, 'b'),
    (Key::KeyC, 'c'),
    (Key::KeyD, 'd'),
    (Key::KeyE, 'e'),
    (Key::KeyF, 'f'),
    (Key::KeyG, 'g'),
    (Key::KeyH, 'h'),
    (Key::KeyI, 'i'),
    (Key::KeyJ, 'j'),
    (Key::KeyK, 'k'),
    (Key::KeyL, 'l'),
    (Key::KeyM, 'm'),
    (Key::KeyN, 'n'),
    (Key::KeyO, 'o'),
    (Key::KeyP, 'p'),
    (Key::KeyQ, 'q'),
    (Key::KeyR, 'r'),
    (Key::KeyS, 's'),
    (Key::KeyT, 't'),
    (Key::KeyU, 'u'),
    (Key::KeyV, 'v'),
    (Key::KeyW, 'w'),
    (Key::KeyX, 'x'),
    (Key::KeyY, 'y'),
    (Key::KeyZ, 'z'),
    (Key::Num0, '0'),
    (Key::Num1, '1'),
    (Key::Num2, '2'),
    (Key::Num3, '3'),
    (Key::Num4, '4'),
    (Key::Num5, '5'),
    (Key::Num6, '6'),
    (Key::Num7, '7'),
    (Key::Num8, '8'),
    (Key::Num9, '9'),
    (Key::Minus, '-'),
    (Key::Equal, '='),
    (Key::LeftBracket, '['),
    (Key::RightBracket, ']'),
    (Key::SemiColon, ';'),
    (Key::Quote, '\''),
    (Key::BackSlash, '\\'),
    (Key::Comma, ','),
    (Key::Dot, '.'),
    (Key::Slash, '/'),
    (Key::BackQuote, '`'),
];

/// Listener-style name for a key: `Key.<name>` or a quoted character
fn key_name(key: Key, typed: Option<&str>) -> String {
    if let Some((_, name)) = NAMED_KEYS.iter().find(|(k, _)| *k == key) {
        return format!("Key.{}", name);
    }
    let typed = typed
        .and_then(|t| {
            let mut chars = t.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !c.is_control() => Some(c),
                _ => None,
            }
        })
        .or_else(|| CHAR_KEYS.iter().find(|(k, _)| *k == key).map(|(_, c)| *c));
    match typed {
        Some(c) => format!("'{}'", c),
        None => format!("Key.{}", format!("{:?}", key).to_lowercase()),
    }
}

/// rdev key for an injector key name
fn named_key(name: &str) -> Option<Key> {
    let key = match name {
        "space" => Key::Space,
        "enter" => Key::Return,
        "esc" => Key::Escape,
        "tab" => Key::Tab,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        "shift" | "shiftleft" => Key::ShiftLeft,
        "shiftright" => Key::ShiftRight,
        "ctrl" | "ctrlleft" => Key::ControlLeft,
        "ctrlright" => Key::ControlRight,
        "alt" | "altleft" => Key::Alt,
        "altright" => Key::AltGr,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "home" => Key::Home,
        "end" => Key::End,
        "capslock" => Key::CapsLock,
        "win" => Key::MetaLeft,
        "winright" => Key::MetaRight,
        "insert" => Key::Insert,
        "numlock" => Key::NumLock,
        "scrolllock" => Key::ScrollLock,
        "printscreen" => Key::PrintScreen,
        "pause" => Key::Pause,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        other => return platform_key(other).map(Key::Unknown),
    };
    Some(key)
}

/// Keys rdev has no variant for, as raw platform key codes
///
/// Windows takes virtual-key codes, X11 takes keycodes.
#[cfg(target_os = "windows")]
fn platform_key(name: &str) -> Option<u32> {
    match name {
        "apps" => Some(0x5D),
        _ => function_key_number(name).map(|n| 0x7C + (n - 13)),
    }
}

#[cfg(target_os = "linux")]
fn platform_key(name: &str) -> Option<u32> {
    match name {
        "apps" => Some(135),
        _ => function_key_number(name).map(|n| 191 + (n - 13)),
    }
}

#[cfg(target_os = "macos")]
fn platform_key(name: &str) -> Option<u32> {
    // No Menu key and no F21-F24 on macOS keyboards
    const CODES: [u32; 8] = [0x69, 0x6B, 0x71, 0x6A, 0x40, 0x4F, 0x50, 0x5A];
    let n = function_key_number(name)?;
    CODES.get((n - 13) as usize).copied()
}

/// `13..=24` for `f13`..`f24`
fn function_key_number(name: &str) -> Option<u32> {
    let n = name.strip_prefix('f')?.parse::<u32>().ok()?;
    (13..=24).contains(&n).then_some(n)
}

/// Global keyboard and mouse listener
///
/// Keyboard and mouse arrive through the same OS hook, so one instance
/// covers both listener roles.
pub struct RdevListener {
    name: String,
}

impl RdevListener {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl InputListener for RdevListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self, sink: InputSink) -> Result<()> {
        let state = hook();
        let mut slot = state
            .slot
            .lock()
            .map_err(|_| ReplayKitError::Listener("input hook state poisoned".to_string()))?;
        *slot = Some(sink);
        tracing::debug!("{} attached to global input hook", self.name);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(state) = HOOK.get() {
            if let Ok(mut slot) = state.slot.lock() {
                *slot = None;
            }
        }
        tracing::debug!("{} detached from global input hook", self.name);
    }
}

// ==================== Injector ====================

/// Synthesizes input through `rdev::simulate`
pub struct RdevInjector {
    /// Delay after each simulated event so the OS can process it
    settle: Duration,
}

impl RdevInjector {
    pub fn new() -> Self {
        Self {
            settle: Duration::from_millis(2),
        }
    }

    fn send(&self, event: EventType) -> Result<()> {
        rdev::simulate(&event)
            .map_err(|e| ReplayKitError::Injection(format!("{:?} rejected: {:?}", event, e)))?;
        std::thread::sleep(self.settle);
        Ok(())
    }

    fn key(name: &str) -> Result<Key> {
        if let Some(key) = named_key(name) {
            return Ok(key);
        }
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            let lower = c.to_ascii_lowercase();
            if let Some((key, _)) = CHAR_KEYS.iter().find(|(_, ch)| *ch == lower) {
                return Ok(*key);
            }
        }
        Err(ReplayKitError::Injection(format!("No key for '{}'", name)))
    }

    fn button(name: &str) -> Button {
        match name {
            "right" => Button::Right,
            "middle" => Button::Middle,
            _ => Button::Left,
        }
    }
}

impl Default for RdevInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl InputInjector for RdevInjector {
    fn screen_size(&mut self) -> Result<(u32, u32)> {
        let (w, h) = rdev::display_size()
            .map_err(|e| ReplayKitError::Injection(format!("display size: {:?}", e)))?;
        Ok((w as u32, h as u32))
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.send(EventType::MouseMove {
            x: f64::from(x),
            y: f64::from(y),
        })
    }

    fn key_down(&mut self, key: &str) -> Result<()> {
        self.send(EventType::KeyPress(Self::key(key)?))
    }

    fn key_up(&mut self, key: &str) -> Result<()> {
        self.send(EventType::KeyRelease(Self::key(key)?))
    }

    fn mouse_down(&mut self, x: i32, y: i32, button: &str) -> Result<()> {
        self.move_to(x, y)?;
        self.send(EventType::ButtonPress(Self::button(button)))
    }

    fn mouse_up(&mut self, x: i32, y: i32, button: &str) -> Result<()> {
        self.move_to(x, y)?;
        self.send(EventType::ButtonRelease(Self::button(button)))
    }

    fn scroll(&mut self, dx: i32, dy: i32, x: i32, y: i32) -> Result<()> {
        self.move_to(x, y)?;
        self.send(EventType::Wheel {
            delta_x: i64::from(dx),
            delta_y: i64::from(dy),
        })
    }
}

// ==================== Grabber ====================

/// Screenshots through `xcap`
#[derive(Default)]
pub struct XcapGrabber;

impl XcapGrabber {
    pub fn new() -> Self {
        Self
    }

    fn all() -> Result<Vec<xcap::Monitor>> {
        xcap::Monitor::all().map_err(|e| ReplayKitError::Capture(format!("{:?}", e)))
    }

    fn info(monitor: &xcap::Monitor) -> MonitorInfo {
        MonitorInfo::new(monitor.x(), monitor.y(), monitor.width(), monitor.height())
    }
}

/// Convert a tightly packed RGBA buffer to BGRA, cropped to a sub-rectangle
fn crop_to_bgra(
    rgba: &[u8],
    stride_px: u32,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for row in top..top + height {
        let start = (row as usize * stride_px as usize + left as usize) * 4;
        let end = start + width as usize * 4;
        for px in rgba[start..end].chunks_exact(4) {
            out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
        }
    }
    out
}

impl ScreenGrabber for XcapGrabber {
    fn monitors(&mut self) -> Result<Vec<MonitorInfo>> {
        Ok(Self::all()?.iter().map(Self::info).collect())
    }

    fn grab(&mut self, target: &CaptureTarget) -> Result<Frame> {
        let monitors = Self::all()?;
        let (monitor, left, top, width, height) = match target {
            CaptureTarget::Monitor(n) => {
                let monitor = monitors.get(n.saturating_sub(1)).ok_or_else(|| {
                    ReplayKitError::Capture(format!("Monitor {} not found", n))
                })?;
                (monitor, 0, 0, monitor.width(), monitor.height())
            }
            CaptureTarget::Region(region) => {
                let monitor = monitors
                    .iter()
                    .find(|m| {
                        region.left >= m.x()
                            && region.top >= m.y()
                            && region.left + region.width as i32 <= m.x() + m.width() as i32
                            && region.top + region.height as i32 <= m.y() + m.height() as i32
                    })
                    .ok_or_else(|| {
                        ReplayKitError::Capture(format!(
                            "Region {}x{} at ({}, {}) is not on a single monitor",
                            region.width, region.height, region.left, region.top
                        ))
                    })?;
                (
                    monitor,
                    (region.left - monitor.x()) as u32,
                    (region.top - monitor.y()) as u32,
                    region.width,
                    region.height,
                )
            }
        };

        let image = monitor
            .capture_image()
            .map_err(|e| ReplayKitError::Capture(format!("{:?}", e)))?;
        if left + width > image.width() || top + height > image.height() {
            return Err(ReplayKitError::Capture(format!(
                "Screenshot {}x{} smaller than requested area",
                image.width(),
                image.height()
            )));
        }

        Ok(Frame {
            width,
            height,
            data: crop_to_bgra(image.as_raw(), image.width(), left, top, width, height),
        })
    }
}
