//! # Device Key Codes
//!
//! Android key codes used by the fixed shortcuts, and resolution of the raw
//! identifiers that `getevent -l` reports into codes `input keyevent` accepts.

pub const KEYCODE_HOME: &str = "3";
pub const KEYCODE_BACK: &str = "4";
pub const KEYCODE_VOLUME_UP: &str = "24";
pub const KEYCODE_VOLUME_DOWN: &str = "25";
pub const KEYCODE_POWER: &str = "26";
pub const KEYCODE_ENTER: &str = "66";
pub const KEYCODE_DEL: &str = "67";
pub const KEYCODE_MENU: &str = "82";
pub const KEYCODE_CAMERA_SNAP: &str = "766";
pub const KEYCODE_FOCUS: &str = "800";

/// Symbolic names from the event log with a known key code.
const KNOWN_KEYS: &[(&str, &str)] = &[
    ("KEY_VOLUMEUP", KEYCODE_VOLUME_UP),
    ("KEY_VOLUMEDOWN", KEYCODE_VOLUME_DOWN),
    ("KEY_POWER", KEYCODE_POWER),
    ("KEY_CAMERA", "27"),
    ("KEY_FOCUS", KEYCODE_FOCUS),
    ("KEY_CAMERA_SNAP", KEYCODE_CAMERA_SNAP),
];

/// Resolves a raw event identifier into a key code.
///
/// Known symbolic names map through the table, hex identifiers are converted
/// to decimal, anything else is passed through unchanged.
pub fn resolve(raw: &str) -> String {
    if let Some((_, code)) = KNOWN_KEYS.iter().find(|(name, _)| *name == raw) {
        return (*code).to_string();
    }
    match i32::from_str_radix(raw, 16) {
        Ok(code) => code.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Codes that `input keyevent` cannot deliver; they are injected as raw
/// press/release events on an input node instead.
pub fn requires_raw_injection(code: &str) -> bool {
    code == KEYCODE_CAMERA_SNAP || code == KEYCODE_FOCUS
}
