use std::fmt;
use std::io;

use async_trait::async_trait;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;

use crate::core::action::Key;

/// Failure to read the next keystroke. Not recoverable for the current mode.
#[derive(Debug)]
pub enum KeystreamError {
    /// The terminal input ended.
    Closed,
    Io(io::Error),
}

impl fmt::Display for KeystreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeystreamError::Closed => write!(f, "keyboard input closed"),
            KeystreamError::Io(e) => write!(f, "keyboard read error: {e}"),
        }
    }
}

impl std::error::Error for KeystreamError {}

/// Source of logical keystrokes, one at a time, in arrival order.
#[async_trait]
pub trait Keystream: Send {
    async fn next_key(&mut self) -> Result<Key, KeystreamError>;
}

/// Keystrokes from the real terminal (raw mode must already be on).
pub struct TerminalKeystream {
    events: EventStream,
}

impl TerminalKeystream {
    pub fn new() -> Self {
        Self {
            events: EventStream::new(),
        }
    }
}

impl Default for TerminalKeystream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Keystream for TerminalKeystream {
    async fn next_key(&mut self) -> Result<Key, KeystreamError> {
        loop {
            match self.events.next().await {
                Some(Ok(event)) => {
                    if let Some(key) = translate(event) {
                        return Ok(key);
                    }
                }
                Some(Err(e)) => return Err(KeystreamError::Io(e)),
                None => return Err(KeystreamError::Closed),
            }
        }
    }
}

/// Maps a terminal event to a logical key; releases and mouse input are dropped.
pub fn translate(event: Event) -> Option<Key> {
    match event {
        Event::Key(key_event) => {
            if key_event.kind == KeyEventKind::Release {
                return None;
            }
            log::debug!(
                "Key event: {:?} with modifiers {:?}",
                key_event.code,
                key_event.modifiers
            );
            match (key_event.modifiers, key_event.code) {
                (m, KeyCode::Char(c)) if m.contains(KeyModifiers::CONTROL) => {
                    Some(Key::Ctrl(c.to_ascii_lowercase()))
                }
                // Without keyboard enhancement, Ctrl+I arrives as Tab
                (_, KeyCode::Tab) => Some(Key::Ctrl('i')),
                (_, KeyCode::Char(c)) => Some(Key::Char(c)),
                (_, KeyCode::Enter) => Some(Key::Enter),
                (_, KeyCode::Esc) => Some(Key::Esc),
                (_, KeyCode::Backspace) => Some(Key::Backspace),
                (_, KeyCode::Up) => Some(Key::Up),
                (_, KeyCode::Down) => Some(Key::Down),
                (_, KeyCode::Left) => Some(Key::Left),
                (_, KeyCode::Right) => Some(Key::Right),
                _ => None,
            }
        }
        Event::Resize(_, _) => Some(Key::Resize),
        _ => None,
    }
}
