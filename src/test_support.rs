//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::action::Key;
use crate::core::config::ControlSettings;
use crate::core::geometry::{DeviceGeometry, TerminalGeometry};
use crate::device::{Device, DeviceError, EventLines};
use crate::tui::console::Console;
use crate::tui::event::{Keystream, KeystreamError};

/// A device call as the fake saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Tap(u32, u32),
    Drag {
        from: (u32, u32),
        to: (u32, u32),
        duration_ms: u32,
    },
    KeyEvent(String),
    Text(String),
    OpenEventStream,
}

/// A device that records every call instead of talking to a phone.
pub struct RecordingDevice {
    calls: Mutex<Vec<DeviceCall>>,
    events: Mutex<Option<ScriptedEvents>>,
    failing: bool,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            events: Mutex::new(None),
            failing: false,
        }
    }

    /// Hands `events` out on the next `open_event_stream`.
    pub fn with_events(events: ScriptedEvents) -> Self {
        Self {
            events: Mutex::new(Some(events)),
            ..Self::new()
        }
    }

    /// Every command fails after being recorded.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: DeviceCall) -> Result<(), DeviceError> {
        let description = format!("{call:?}");
        self.calls.lock().unwrap().push(call);
        if self.failing {
            return Err(DeviceError::CommandFailed {
                command: description,
                status: Some(1),
                output: "error: device offline".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Device for RecordingDevice {
    async fn list_connected_devices(&self) -> Result<String, DeviceError> {
        Ok("List of devices attached\nFAKE0001\tdevice\n".to_string())
    }

    async fn query_screen_size(&self) -> Result<DeviceGeometry, DeviceError> {
        Ok(DeviceGeometry::FALLBACK)
    }

    async fn tap(&self, x: u32, y: u32) -> Result<(), DeviceError> {
        self.record(DeviceCall::Tap(x, y))
    }

    async fn drag(
        &self,
        from: (u32, u32),
        to: (u32, u32),
        duration_ms: u32,
    ) -> Result<(), DeviceError> {
        self.record(DeviceCall::Drag {
            from,
            to,
            duration_ms,
        })
    }

    async fn send_key_event(&self, code: &str) -> Result<(), DeviceError> {
        self.record(DeviceCall::KeyEvent(code.to_string()))
    }

    async fn send_text(&self, text: &str) -> Result<(), DeviceError> {
        self.record(DeviceCall::Text(text.to_string()))
    }

    async fn open_event_stream(&self) -> Result<Box<dyn EventLines>, DeviceError> {
        self.calls.lock().unwrap().push(DeviceCall::OpenEventStream);
        match self.events.lock().unwrap().take() {
            Some(events) => Ok(Box::new(events)),
            None => Err(DeviceError::Io(io::Error::other("no event stream scripted"))),
        }
    }
}

/// An event log that replays fixed lines, then ends or hangs.
pub struct ScriptedEvents {
    lines: VecDeque<String>,
    hang: bool,
    stopped: Arc<AtomicBool>,
}

impl ScriptedEvents {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            hang: false,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Blocks forever once the lines run out instead of ending.
    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Set once the stream is terminated or dropped.
    pub fn stopped_flag(&self) -> Arc<AtomicBool> {
        self.stopped.clone()
    }
}

#[async_trait]
impl EventLines for ScriptedEvents {
    async fn next_line(&mut self) -> Result<Option<String>, DeviceError> {
        match self.lines.pop_front() {
            Some(line) => Ok(Some(line)),
            None if self.hang => {
                futures::future::pending::<()>().await;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn terminate(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

impl Drop for ScriptedEvents {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Replays keys, then reports the input as closed.
pub struct ScriptedKeys {
    keys: VecDeque<Key>,
}

impl ScriptedKeys {
    pub fn new(keys: &[Key]) -> Self {
        Self {
            keys: keys.iter().copied().collect(),
        }
    }
}

#[async_trait]
impl Keystream for ScriptedKeys {
    async fn next_key(&mut self) -> Result<Key, KeystreamError> {
        self.keys.pop_front().ok_or(KeystreamError::Closed)
    }
}

#[derive(Debug, Default)]
pub struct ConsoleLog {
    pub frames: Vec<Vec<String>>,
    /// Every `set_echo` call, in order.
    pub echo: Vec<bool>,
}

/// A console that keeps every frame. Clones share the same log.
#[derive(Clone)]
pub struct RecordingConsole {
    size: Option<TerminalGeometry>,
    log: Arc<Mutex<ConsoleLog>>,
}

impl RecordingConsole {
    pub fn new(size: TerminalGeometry) -> Self {
        Self {
            size: Some(size),
            log: Arc::new(Mutex::new(ConsoleLog::default())),
        }
    }

    /// A console whose size query always fails.
    pub fn sizeless() -> Self {
        Self {
            size: None,
            ..Self::new(TerminalGeometry::FALLBACK)
        }
    }

    pub fn last_frame(&self) -> Vec<String> {
        self.log.lock().unwrap().frames.last().cloned().unwrap_or_default()
    }

    pub fn frame_count(&self) -> usize {
        self.log.lock().unwrap().frames.len()
    }

    pub fn echo_calls(&self) -> Vec<bool> {
        self.log.lock().unwrap().echo.clone()
    }
}

impl Console for RecordingConsole {
    fn size(&self) -> io::Result<TerminalGeometry> {
        self.size
            .ok_or_else(|| io::Error::other("not a terminal"))
    }

    fn draw(&mut self, lines: &[String]) -> io::Result<()> {
        self.log.lock().unwrap().frames.push(lines.to_vec());
        Ok(())
    }

    fn set_echo(&mut self, enabled: bool) -> io::Result<()> {
        self.log.lock().unwrap().echo.push(enabled);
        Ok(())
    }
}

/// Controls with no pauses and a short capture window.
pub fn fast_controls() -> ControlSettings {
    ControlSettings {
        settle_delay: Duration::ZERO,
        notice_delay: Duration::ZERO,
        capture_timeout: Duration::from_millis(50),
        ..ControlSettings::default()
    }
}
