//! # TUI Adapter
//!
//! Owns the terminal, reads keystrokes, and runs the mode state machine
//! against the device.
//!
//! ```text
//!            Ctrl+O                       Ctrl+I
//!   ┌──────┐ ───────▶ ┌───────────┐      ┌───────┐
//!   │ Idle │          │ Operation │      │ Input │
//!   └──────┘ ◀─────── └───────────┘      └───────┘
//!      │ ▲    Ctrl+I                      │  ▲
//!      │ └────────────── Ctrl+O ──────────┘  │
//!      └────────────────── Ctrl+I ───────────┘
//!
//!   Ctrl+C anywhere → quit
//! ```
//!
//! ## Redraw Strategy
//!
//! There is no frame timer. The full frame is redrawn on mode entry, after
//! every action that changes something, and on terminal resize. Device
//! actions pause for the settle delay first so the preview reflects a phone
//! that has caught up.
//!
//! Keystrokes are handled strictly one at a time. The only concurrent work is
//! the key-capture listener, and the loop waits for it before reading the
//! next key.

pub mod console;
pub mod event;
mod ui;

use log::{debug, info, warn};
use std::fmt;
use std::io::stdout;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use crossterm::cursor::SetCursorStyle;
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::core::action::{
    IdleAction, InputAction, Key, OperationAction, QUIT_KEY, idle_action, input_action,
    operation_action,
};
use crate::core::bindings::Slot;
use crate::core::config::{ControlSettings, RenderConfig, ResolvedConfig};
use crate::core::geometry::{DeviceGeometry, TerminalGeometry};
use crate::core::keycode;
use crate::core::state::{Mode, Session};
use crate::device::{AdbDevice, AttachedDevice, Device, DeviceError, adb, capture_key_press};
use crate::tui::console::{Console, TerminalConsole};
use crate::tui::event::{Keystream, KeystreamError, TerminalKeystream};

const IDLE_HINT: &str = "Press Ctrl+O for operation mode or Ctrl+I for input mode";

/// Why a mode loop handed control back to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModeExit {
    Leave,
    Quit,
}

/// Drives the session from keystrokes.
pub struct Controller {
    device: Arc<dyn Device>,
    keys: Box<dyn Keystream>,
    console: Box<dyn Console>,
    session: Session,
    render: RenderConfig,
    controls: ControlSettings,
}

impl Controller {
    pub fn new(
        device: Arc<dyn Device>,
        keys: Box<dyn Keystream>,
        console: Box<dyn Console>,
        session: Session,
        render: RenderConfig,
        controls: ControlSettings,
    ) -> Self {
        Self {
            device,
            keys,
            console,
            session,
            render,
            controls,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runs the top-level dispatcher until the quit key.
    ///
    /// A keystroke failure inside a mode drops back here; one while idle
    /// ends the session.
    pub async fn run(&mut self) -> Result<(), KeystreamError> {
        info!("Controller started");
        self.enter(Mode::Idle);
        loop {
            let key = self.next_key().await?;
            let (name, outcome) = match idle_action(key) {
                Some(IdleAction::Quit) => break,
                Some(IdleAction::EnterOperation) => ("Operation", self.operation_mode().await),
                Some(IdleAction::EnterInput) => ("Input", self.input_mode().await),
                None => {
                    if self.session.last_report() != Some(IDLE_HINT) {
                        self.session.report(IDLE_HINT);
                        self.redraw();
                    }
                    continue;
                }
            };
            match outcome {
                Ok(ModeExit::Quit) => break,
                Ok(ModeExit::Leave) => {}
                Err(e) => {
                    warn!("{} mode aborted: {}", name, e);
                    self.session.report(format!("{name} mode error: {e}"));
                }
            }
            self.session.prompt = None;
            self.enter(Mode::Idle);
        }
        info!("Quit requested");
        Ok(())
    }

    async fn operation_mode(&mut self) -> Result<ModeExit, KeystreamError> {
        self.enter(Mode::Operation);
        loop {
            let key = self.next_key().await?;
            let Some(action) = operation_action(key) else {
                debug!("Unbound key in operation mode: {:?}", key);
                continue;
            };
            debug!("Operation action: {:?}", action);
            match action {
                OperationAction::Quit => return Ok(ModeExit::Quit),
                OperationAction::Leave => return Ok(ModeExit::Leave),
                OperationAction::Move(direction) => {
                    let (dx, dy) = direction.delta();
                    let step = self.controls.move_step;
                    self.session.pointer.move_by(dx * step, dy * step);
                    self.redraw();
                }
                OperationAction::Tap => self.tap().await,
                OperationAction::ToggleDrag => self.toggle_drag().await,
                OperationAction::CancelDrag => self.cancel_drag().await,
                OperationAction::Press(hardware) => {
                    self.press_key(hardware.code(), hardware.label()).await;
                }
                OperationAction::TriggerCustom => {
                    if self.trigger_custom_key().await?.is_break() {
                        return Ok(ModeExit::Quit);
                    }
                }
                OperationAction::RecordCustom => {
                    if self.record_custom_key().await?.is_break() {
                        return Ok(ModeExit::Quit);
                    }
                }
            }
        }
    }

    async fn input_mode(&mut self) -> Result<ModeExit, KeystreamError> {
        self.session.input_buffer.clear();
        self.enter(Mode::Input);
        loop {
            let key = self.next_key().await?;
            let Some(action) = input_action(key) else {
                continue;
            };
            match action {
                InputAction::Quit => return Ok(ModeExit::Quit),
                InputAction::Leave => return Ok(ModeExit::Leave),
                InputAction::Type(c) => {
                    self.session.input_buffer.push(c);
                    self.redraw();
                    if let Err(e) = self.device.send_text(&c.to_string()).await {
                        self.report_and_redraw(format!("Sending {c:?} failed: {e}"));
                    }
                }
                InputAction::Newline => {
                    self.session.input_buffer.push('\n');
                    self.redraw();
                    if let Err(e) = self.device.send_key_event(keycode::KEYCODE_ENTER).await {
                        self.report_and_redraw(format!("Sending enter failed: {e}"));
                    }
                }
                InputAction::Delete => {
                    if self.session.input_buffer.pop().is_none() {
                        continue;
                    }
                    self.redraw();
                    if let Err(e) = self.device.send_key_event(keycode::KEYCODE_DEL).await {
                        self.report_and_redraw(format!("Sending delete failed: {e}"));
                    }
                }
            }
        }
    }

    async fn tap(&mut self) {
        if self.session.pointer.is_dragging() {
            debug!("Tap ignored while dragging");
            return;
        }
        let at = self.session.pointer.position();
        match self.device.tap(at.x, at.y).await {
            Ok(()) => self.session.report(format!("Tap at {at} succeeded")),
            Err(e) => self.session.report(format!("Tap at {at} failed: {e}")),
        }
        self.settle_and_redraw().await;
    }

    async fn toggle_drag(&mut self) {
        if let Ok((from, to)) = self.session.pointer.end_drag() {
            let result = self
                .device
                .drag((from.x, from.y), (to.x, to.y), self.controls.drag_duration_ms)
                .await;
            match result {
                Ok(()) => self.session.report(format!("Dragged from {from} to {to}")),
                Err(e) => self.session.report(format!("Drag failed: {e}")),
            }
            self.settle_and_redraw().await;
        } else if let Ok(anchor) = self.session.pointer.begin_drag() {
            self.session.report(format!(
                "Drag started at {anchor} (move, then Space to drop, Esc to cancel)"
            ));
            self.redraw();
        }
    }

    async fn cancel_drag(&mut self) {
        if self.session.pointer.cancel_drag() {
            self.session.report("Drag cancelled");
            self.settle_and_redraw().await;
        }
    }

    async fn press_key(&mut self, code: &str, label: &str) {
        match self.device.send_key_event(code).await {
            Ok(()) => self.session.report(format!("Sent {label} (key {code})")),
            Err(e) => self.session.report(format!("Sending {label} failed: {e}")),
        }
        self.settle_and_redraw().await;
    }

    /// `c` then a digit: sends the key bound to that slot.
    async fn trigger_custom_key(&mut self) -> Result<ControlFlow<()>, KeystreamError> {
        self.session.prompt = Some("Custom key to trigger (1-9): ".to_string());
        self.redraw();
        let key = self.next_key().await;
        self.session.prompt = None;
        let key = key?;
        if key == QUIT_KEY {
            return Ok(ControlFlow::Break(()));
        }

        match slot_for(key) {
            None => self.session.report("Invalid input"),
            Some(slot) => match self.session.bindings.lookup(slot).map(str::to_string) {
                Some(code) => match self.device.send_key_event(&code).await {
                    Ok(()) => self
                        .session
                        .report(format!("Triggered custom key {slot} (code {code})")),
                    Err(e) => self
                        .session
                        .report(format!("Custom key {slot} failed: {e}")),
                },
                None => self.session.report(format!("Custom key {slot} is unbound")),
            },
        }
        pause(self.controls.notice_delay).await;
        self.redraw();
        Ok(ControlFlow::Continue(()))
    }

    /// `C` then a digit: learns a key from the phone into that slot.
    ///
    /// Echo stays off for the whole flow and is turned back on exactly once,
    /// however the flow ends.
    async fn record_custom_key(&mut self) -> Result<ControlFlow<()>, KeystreamError> {
        if let Err(e) = self.console.set_echo(false) {
            warn!("Failed to suppress echo: {}", e);
        }
        let outcome = self.record_custom_key_with_echo_off().await;
        self.session.prompt = None;
        if let Err(e) = self.console.set_echo(true) {
            warn!("Failed to restore echo: {}", e);
        }

        if let Ok(ControlFlow::Continue(())) = outcome {
            pause(self.controls.notice_delay).await;
            self.redraw();
        }
        outcome
    }

    async fn record_custom_key_with_echo_off(&mut self) -> Result<ControlFlow<()>, KeystreamError> {
        self.session.prompt = Some("Slot to record (1-9): ".to_string());
        self.redraw();
        let slot = loop {
            let key = self.next_key().await?;
            if key == QUIT_KEY {
                return Ok(ControlFlow::Break(()));
            }
            if let Some(slot) = slot_for(key) {
                break slot;
            }
            self.session.prompt = Some("Enter a valid slot (1-9): ".to_string());
            self.redraw();
        };

        let window = self.controls.capture_timeout;
        self.session.prompt = Some(format!(
            "Press and release the key to bind to {slot} on the phone (within {}s)...",
            window.as_secs_f32()
        ));
        self.redraw();

        match capture_key_press(self.device.as_ref(), window).await {
            Ok(captured) => {
                self.session
                    .bindings
                    .bind(slot, captured.resolved_code.clone());
                self.session.report(format!(
                    "Captured {} -> code {}, bound to {slot}",
                    captured.raw_identifier, captured.resolved_code
                ));
            }
            Err(e) => self.session.report(format!("Key capture failed: {e}")),
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Next keystroke; resizes are absorbed here with a redraw.
    async fn next_key(&mut self) -> Result<Key, KeystreamError> {
        loop {
            match self.keys.next_key().await? {
                Key::Resize => self.redraw(),
                key => return Ok(key),
            }
        }
    }

    fn enter(&mut self, mode: Mode) {
        debug!("Entering {:?} mode", mode);
        self.session.mode = mode;
        self.redraw();
    }

    fn report_and_redraw(&mut self, message: String) {
        self.session.report(message);
        self.redraw();
    }

    async fn settle_and_redraw(&mut self) {
        pause(self.controls.settle_delay).await;
        self.redraw();
    }

    fn redraw(&mut self) {
        let terminal = match self.console.size() {
            Ok(size) => size,
            Err(e) => {
                warn!("Terminal size query failed, using 80x24: {}", e);
                TerminalGeometry::FALLBACK
            }
        };
        let lines = ui::render(&self.session, &self.render, terminal);
        if let Err(e) = self.console.draw(&lines) {
            warn!("Redraw failed: {}", e);
        }
    }
}

fn slot_for(key: Key) -> Option<Slot> {
    match key {
        Key::Char(c) => Slot::from_digit(c),
        _ => None,
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Conditions that end the program with a failure exit code.
#[derive(Debug)]
pub enum SessionError {
    BridgeMissing(String),
    NoDevice,
    /// Devices are attached but none has authorized this host.
    Unauthorized(Vec<String>),
    Device(DeviceError),
    Terminal(std::io::Error),
    Keystream(KeystreamError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::BridgeMissing(program) => write!(
                f,
                "`{program}` not found. Install the Android platform tools and add adb to PATH"
            ),
            SessionError::NoDevice => write!(
                f,
                "no device detected. Connect the phone over USB and enable USB debugging"
            ),
            SessionError::Unauthorized(serials) => write!(
                f,
                "device {} has not authorized this computer. Accept the prompt on the phone",
                serials.join(", ")
            ),
            SessionError::Device(e) => write!(f, "adb failed: {e}"),
            SessionError::Terminal(e) => write!(f, "terminal setup failed: {e}"),
            SessionError::Keystream(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Lets Ctrl+I be told apart from Tab where the terminal supports it;
        // terminals that don't simply ignore the request
        execute!(
            stdout(),
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        info!("Terminal modes enabled (steady block cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            SetCursorStyle::DefaultUserShape
        );
    }
}

/// Serial of the first authorized device in `adb devices` order.
fn select_device(attached: Vec<AttachedDevice>) -> Result<String, SessionError> {
    if attached.is_empty() {
        return Err(SessionError::NoDevice);
    }
    let (authorized, unauthorized): (Vec<_>, Vec<_>) =
        attached.into_iter().partition(AttachedDevice::is_authorized);
    match authorized.into_iter().next() {
        Some(device) => Ok(device.serial),
        None => Err(SessionError::Unauthorized(
            unauthorized.into_iter().map(|d| d.serial).collect(),
        )),
    }
}

/// Connects to the device, takes over the terminal and runs until quit.
pub async fn run(config: ResolvedConfig) -> Result<(), SessionError> {
    let device = AdbDevice::locate(config.adb_path.clone())
        .await
        .map_err(|e| match e {
            DeviceError::BridgeMissing(program) => SessionError::BridgeMissing(program),
            other => SessionError::Device(other),
        })?;

    let listing = device
        .list_connected_devices()
        .await
        .map_err(SessionError::Device)?;
    let serial = select_device(adb::parse_device_list(&listing))?;
    info!("Using device {}", serial);

    let mut session = match device.query_screen_size().await {
        Ok(size) => {
            info!("Device screen is {}x{}", size.width, size.height);
            Session::new(size)
        }
        Err(e) => {
            warn!("Screen size query failed: {}", e);
            let fallback = DeviceGeometry::FALLBACK;
            let mut session = Session::new(fallback);
            session.report(format!(
                "Warning: screen size query failed, using {}x{} ({e})",
                fallback.width, fallback.height
            ));
            session
        }
    };
    session.serial = Some(serial);

    let terminal = ratatui::try_init().map_err(SessionError::Terminal)?;
    let terminal_mode_guard = match TerminalModeGuard::new() {
        Ok(guard) => Some(guard),
        Err(e) => {
            warn!("Terminal modes not enabled: {}", e);
            None
        }
    };

    let mut controller = Controller::new(
        Arc::new(device),
        Box::new(TerminalKeystream::new()),
        Box::new(TerminalConsole::new(terminal)),
        session,
        config.render,
        config.controls,
    );
    let result = controller.run().await;

    drop(terminal_mode_guard);
    ratatui::restore();
    result.map_err(SessionError::Keystream)
}
