//! # Custom Key Capture
//!
//! Learns a key code by watching the device's input event log while the
//! operator presses a physical key on the phone.
//!
//! ```text
//! getevent -l ──▶ listener task ──▶ KeyPressDetector ──▶ CapturedKeyEvent
//!                      │
//!        select! { listener result | stream error | timeout }
//! ```
//!
//! A key counts once a DOWN line is followed by an UP line, which filters out
//! unrelated events on the log. The listener runs on its own task and is
//! aborted as soon as the race is decided, which drops the stream and kills
//! `getevent`.

use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};

use crate::core::keycode;
use crate::device::{Device, DeviceError, EventLines};

/// A key learned from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedKeyEvent {
    /// Identifier as printed by the event log (`KEY_VOLUMEUP`, `004a`, ...).
    pub raw_identifier: String,
    /// Code usable with `input keyevent`.
    pub resolved_code: String,
}

#[derive(Debug)]
pub enum CaptureError {
    /// No complete key press within the window.
    Timeout(Duration),
    /// The event log could not be started or read.
    Stream(DeviceError),
    /// The event log ended before a key press was seen.
    Closed,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Timeout(window) => {
                write!(f, "no key press detected within {}s", window.as_secs_f32())
            }
            CaptureError::Stream(e) => write!(f, "event stream error: {e}"),
            CaptureError::Closed => write!(f, "event stream closed"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Pairs DOWN and UP transitions from `getevent -l` lines.
///
/// ```text
/// /dev/input/event0: EV_KEY       KEY_VOLUMEUP         DOWN
/// /dev/input/event0: EV_SYN       SYN_REPORT           00000000
/// /dev/input/event0: EV_KEY       KEY_VOLUMEUP         UP
/// ```
#[derive(Debug, Default)]
pub struct KeyPressDetector {
    last_down: Option<String>,
}

impl KeyPressDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one log line; returns the key once its release is seen.
    pub fn feed(&mut self, line: &str) -> Option<CapturedKeyEvent> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.last().copied() {
            Some("DOWN") => {
                if let Some(identifier) = fields.get(2) {
                    debug!("Key down: {}", identifier);
                    self.last_down = Some((*identifier).to_string());
                }
                None
            }
            Some("UP") => {
                let raw = self.last_down.take()?;
                let resolved_code = keycode::resolve(&raw);
                Some(CapturedKeyEvent {
                    raw_identifier: raw,
                    resolved_code,
                })
            }
            _ => None,
        }
    }
}

/// Reads lines until a full key press is seen.
async fn watch_for_key_press(stream: &mut dyn EventLines) -> Result<CapturedKeyEvent, CaptureError> {
    let mut detector = KeyPressDetector::new();
    loop {
        match stream.next_line().await {
            Ok(Some(line)) => {
                if let Some(captured) = detector.feed(&line) {
                    return Ok(captured);
                }
            }
            Ok(None) => return Err(CaptureError::Closed),
            Err(e) => return Err(CaptureError::Stream(e)),
        }
    }
}

/// Waits up to `timeout` for a key press on the device.
///
/// Blocks the caller until the first of: a captured key, a stream failure,
/// or the timeout. The listener is shut down in every case.
pub async fn capture_key_press(
    device: &dyn Device,
    timeout: Duration,
) -> Result<CapturedKeyEvent, CaptureError> {
    let mut stream = device.open_event_stream().await.map_err(CaptureError::Stream)?;
    info!("Listening for a key press ({}s)", timeout.as_secs_f32());

    let listener = tokio::spawn(async move {
        let outcome = watch_for_key_press(stream.as_mut()).await;
        stream.terminate().await;
        outcome
    });
    let abort_handle = listener.abort_handle();

    tokio::select! {
        joined = listener => match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Key listener task failed: {}", e);
                Err(CaptureError::Closed)
            }
        },
        _ = tokio::time::sleep(timeout) => {
            abort_handle.abort();
            Err(CaptureError::Timeout(timeout))
        }
    }
}
