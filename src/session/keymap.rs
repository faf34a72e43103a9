//! Listener key names to injector key names
//!
//! The event log stores whatever text the input listener produced for a key:
//! either a printable character (sometimes wrapped in single quotes, `'a'`)
//! or a named key such as `Key.space`. Replay maps the named keys through a
//! closed table and passes printable characters through unquoted.

use crate::types::MouseButton;

/// Named keys understood by the replay injector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Space,
    Enter,
    Esc,
    Tab,
    Backspace,
    Delete,
    Shift,
    ShiftLeft,
    ShiftRight,
    Ctrl,
    CtrlLeft,
    CtrlRight,
    Alt,
    AltLeft,
    AltRight,
    AltGr,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    CapsLock,
    Cmd,
    CmdRight,
    Insert,
    Menu,
    NumLock,
    ScrollLock,
    PrintScreen,
    Pause,
    F(u8),
}

/// `Key.<name>` suffix and canonical injector name for every fixed key
const KEY_TABLE: &[(&str, SpecialKey, &str)] = &[
    ("space", SpecialKey::Space, "space"),
    ("enter", SpecialKey::Enter, "enter"),
    ("esc", SpecialKey::Esc, "esc"),
    ("tab", SpecialKey::Tab, "tab"),
    ("backspace", SpecialKey::Backspace, "backspace"),
    ("delete", SpecialKey::Delete, "delete"),
    ("shift", SpecialKey::Shift, "shift"),
    ("shift_l", SpecialKey::ShiftLeft, "shiftleft"),
    ("shift_r", SpecialKey::ShiftRight, "shiftright"),
    ("ctrl", SpecialKey::Ctrl, "ctrl"),
    ("ctrl_l", SpecialKey::CtrlLeft, "ctrlleft"),
    ("ctrl_r", SpecialKey::CtrlRight, "ctrlright"),
    ("alt", SpecialKey::Alt, "alt"),
    ("alt_l", SpecialKey::AltLeft, "altleft"),
    ("alt_r", SpecialKey::AltRight, "altright"),
    ("alt_gr", SpecialKey::AltGr, "altright"),
    ("up", SpecialKey::Up, "up"),
    ("down", SpecialKey::Down, "down"),
    ("left", SpecialKey::Left, "left"),
    ("right", SpecialKey::Right, "right"),
    ("page_up", SpecialKey::PageUp, "pageup"),
    ("page_down", SpecialKey::PageDown, "pagedown"),
    ("home", SpecialKey::Home, "home"),
    ("end", SpecialKey::End, "end"),
    ("caps_lock", SpecialKey::CapsLock, "capslock"),
    ("cmd", SpecialKey::Cmd, "win"),
    ("cmd_l", SpecialKey::Cmd, "win"),
    ("cmd_r", SpecialKey::CmdRight, "winright"),
    ("insert", SpecialKey::Insert, "insert"),
    ("menu", SpecialKey::Menu, "apps"),
    ("num_lock", SpecialKey::NumLock, "numlock"),
    ("scroll_lock", SpecialKey::ScrollLock, "scrolllock"),
    ("print_screen", SpecialKey::PrintScreen, "printscreen"),
    ("pause", SpecialKey::Pause, "pause"),
];

impl SpecialKey {
    /// Parse a listener name such as `Key.page_up` or `Key.f5`
    pub fn from_raw(raw: &str) -> Option<Self> {
        let name = raw.strip_prefix("Key.")?;
        if let Some((_, key, _)) = KEY_TABLE.iter().find(|(n, _, _)| *n == name) {
            return Some(*key);
        }
        let number = name.strip_prefix('f')?.parse::<u8>().ok()?;
        (1..=24).contains(&number).then_some(SpecialKey::F(number))
    }

    /// Listener name written to event logs
    pub fn raw_name(&self) -> String {
        match self {
            SpecialKey::F(n) => format!("Key.f{}", n),
            other => KEY_TABLE
                .iter()
                .find(|(_, key, _)| key == other)
                .map(|(name, _, _)| format!("Key.{}", name))
                .unwrap_or_default(),
        }
    }

    /// Name understood by the injection sink
    pub fn injector_name(&self) -> String {
        match self {
            SpecialKey::F(n) => format!("f{}", n),
            other => KEY_TABLE
                .iter()
                .find(|(_, key, _)| key == other)
                .map(|(_, _, injector)| injector.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Every named key the injector may be asked for
pub fn injector_key_names() -> impl Iterator<Item = String> {
    KEY_TABLE
        .iter()
        .map(|(_, key, _)| key.injector_name())
        .chain((1..=24).map(|n| SpecialKey::F(n).injector_name()))
}

/// Translate a raw logged key to the injector's key name
///
/// Named keys go through [`SpecialKey`]; anything else is passed through
/// with surrounding single quotes removed.
pub fn translate_key(raw: &str) -> String {
    if let Some(key) = SpecialKey::from_raw(raw) {
        return key.injector_name();
    }
    let stripped = raw.trim_matches('\'');
    if stripped.is_empty() {
        // A quoted quote character: "'''"
        raw.chars().next().map(String::from).unwrap_or_default()
    } else {
        stripped.to_string()
    }
}

/// Translate a raw logged button name to the injector's button name
pub fn translate_button(raw: &str) -> &'static str {
    MouseButton::from_raw(raw).injector_name()
}
