//! # Actions
//!
//! Every keystroke the controller reads is a [`Key`]. Each mode owns a
//! declarative keymap that turns keys into actions; the controller only
//! executes actions and never matches on raw keys itself.
//!
//! ```text
//! Key  →  keymap (per mode)  →  Action  →  Controller
//! ```
//!
//! Keeping the tables as data makes the transition table auditable and
//! testable without a terminal or a device.

use crate::core::keycode;

/// A logical keystroke, independent of the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    /// Control chord, always lowercase (`Ctrl+O` is `Ctrl('o')`).
    Ctrl(char),
    Up,
    Down,
    Left,
    Right,
    Enter,
    Esc,
    Backspace,
    /// The terminal was resized; not a keystroke, only a redraw request.
    Resize,
}

pub const QUIT_KEY: Key = Key::Ctrl('c');
pub const OPERATION_MODE_KEY: Key = Key::Ctrl('o');
pub const INPUT_MODE_KEY: Key = Key::Ctrl('i');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector in device space (y grows downwards).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Hardware keys with a fixed shortcut in operation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareKey {
    Power,
    VolumeUp,
    VolumeDown,
    Home,
    Back,
    Menu,
}

impl HardwareKey {
    pub fn code(self) -> &'static str {
        match self {
            HardwareKey::Power => keycode::KEYCODE_POWER,
            HardwareKey::VolumeUp => keycode::KEYCODE_VOLUME_UP,
            HardwareKey::VolumeDown => keycode::KEYCODE_VOLUME_DOWN,
            HardwareKey::Home => keycode::KEYCODE_HOME,
            HardwareKey::Back => keycode::KEYCODE_BACK,
            HardwareKey::Menu => keycode::KEYCODE_MENU,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HardwareKey::Power => "power",
            HardwareKey::VolumeUp => "volume up",
            HardwareKey::VolumeDown => "volume down",
            HardwareKey::Home => "home",
            HardwareKey::Back => "back",
            HardwareKey::Menu => "menu",
        }
    }
}

/// Actions available while waiting for a mode to be picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleAction {
    EnterOperation,
    EnterInput,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationAction {
    Move(Direction),
    Tap,
    ToggleDrag,
    CancelDrag,
    Press(HardwareKey),
    TriggerCustom,
    RecordCustom,
    Leave,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Type(char),
    Newline,
    Delete,
    Leave,
    Quit,
}

pub const IDLE_KEYMAP: &[(Key, IdleAction)] = &[
    (OPERATION_MODE_KEY, IdleAction::EnterOperation),
    (INPUT_MODE_KEY, IdleAction::EnterInput),
    (QUIT_KEY, IdleAction::Quit),
];

pub const OPERATION_KEYMAP: &[(Key, OperationAction)] = &[
    (QUIT_KEY, OperationAction::Quit),
    (INPUT_MODE_KEY, OperationAction::Leave),
    (Key::Up, OperationAction::Move(Direction::Up)),
    (Key::Down, OperationAction::Move(Direction::Down)),
    (Key::Left, OperationAction::Move(Direction::Left)),
    (Key::Right, OperationAction::Move(Direction::Right)),
    (Key::Enter, OperationAction::Tap),
    (Key::Char(' '), OperationAction::ToggleDrag),
    (Key::Esc, OperationAction::CancelDrag),
    (Key::Char('p'), OperationAction::Press(HardwareKey::Power)),
    (Key::Char('+'), OperationAction::Press(HardwareKey::VolumeUp)),
    (Key::Char('-'), OperationAction::Press(HardwareKey::VolumeDown)),
    (Key::Char('h'), OperationAction::Press(HardwareKey::Home)),
    (Key::Char('b'), OperationAction::Press(HardwareKey::Back)),
    (Key::Char('m'), OperationAction::Press(HardwareKey::Menu)),
    (Key::Char('c'), OperationAction::TriggerCustom),
    (Key::Char('C'), OperationAction::RecordCustom),
];

pub const INPUT_KEYMAP: &[(Key, InputAction)] = &[
    (QUIT_KEY, InputAction::Quit),
    (OPERATION_MODE_KEY, InputAction::Leave),
    (Key::Enter, InputAction::Newline),
    (Key::Backspace, InputAction::Delete),
];

fn lookup<A: Copy>(keymap: &[(Key, A)], key: Key) -> Option<A> {
    keymap
        .iter()
        .find(|(bound, _)| *bound == key)
        .map(|(_, action)| *action)
}

pub fn idle_action(key: Key) -> Option<IdleAction> {
    lookup(IDLE_KEYMAP, key)
}

pub fn operation_action(key: Key) -> Option<OperationAction> {
    lookup(OPERATION_KEYMAP, key)
}

/// Fixed keys first, then any printable character is typed through.
pub fn input_action(key: Key) -> Option<InputAction> {
    lookup(INPUT_KEYMAP, key).or(match key {
        Key::Char(c) => Some(InputAction::Type(c)),
        _ => None,
    })
}
