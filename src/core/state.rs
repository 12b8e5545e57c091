//! # Session State
//!
//! Everything the remote mutates while it runs, in one owned struct.
//!
//! ```text
//! Session
//! ├── device: DeviceGeometry       // screen bounds, fixed after startup
//! ├── pointer: PointerState        // virtual pointer + drag anchor
//! ├── bindings: KeyBindingRegistry // c1..c9 → key code
//! ├── mode: Mode                   // which screen is active
//! ├── input_buffer: String         // text typed in input mode (display only)
//! ├── prompt: Option<String>       // pending question to the operator
//! └── transcript: VecDeque<String> // recent status messages
//! ```
//!
//! Only the controller's foreground loop touches the session, so nothing
//! here is shared or locked.

use std::collections::VecDeque;

use log::info;

use crate::core::bindings::KeyBindingRegistry;
use crate::core::geometry::DeviceGeometry;
use crate::core::pointer::PointerState;

/// Number of status messages kept for display.
pub const TRANSCRIPT_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Waiting for a mode to be picked.
    Idle,
    Operation,
    Input,
}

#[derive(Debug)]
pub struct Session {
    pub device: DeviceGeometry,
    /// Serial of the attached device, when known.
    pub serial: Option<String>,
    pub pointer: PointerState,
    pub bindings: KeyBindingRegistry,
    pub mode: Mode,
    pub input_buffer: String,
    pub prompt: Option<String>,
    transcript: VecDeque<String>,
}

impl Session {
    pub fn new(device: DeviceGeometry) -> Self {
        Self {
            device,
            serial: None,
            pointer: PointerState::centered(device),
            bindings: KeyBindingRegistry::new(),
            mode: Mode::Idle,
            input_buffer: String::new(),
            prompt: None,
            transcript: VecDeque::with_capacity(TRANSCRIPT_LEN),
        }
    }

    /// Appends a status message, dropping the oldest past [`TRANSCRIPT_LEN`].
    pub fn report(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        if self.transcript.len() == TRANSCRIPT_LEN {
            self.transcript.pop_front();
        }
        self.transcript.push_back(message);
    }

    pub fn transcript(&self) -> impl Iterator<Item = &str> {
        self.transcript.iter().map(String::as_str)
    }

    pub fn last_report(&self) -> Option<&str> {
        self.transcript.back().map(String::as_str)
    }
}
