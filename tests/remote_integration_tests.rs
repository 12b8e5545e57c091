use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adb_remote::core::action::Key;
use adb_remote::core::config::{ControlSettings, RenderConfig};
use adb_remote::core::geometry::{DeviceGeometry, TerminalGeometry};
use adb_remote::core::state::{Mode, Session};
use adb_remote::device::adb::{parse_device_list, parse_screen_size};
use adb_remote::device::{
    CaptureError, Device, DeviceError, EventLines, capture_key_press,
};
use adb_remote::tui::Controller;
use adb_remote::tui::console::Console;
use adb_remote::tui::event::{Keystream, KeystreamError};
use async_trait::async_trait;
use tokio_test::{assert_err, assert_ok};

// ============================================================================
// Fakes
// ============================================================================

/// Replays `getevent -l` lines, then either ends or stalls.
struct FakeEventLog {
    lines: VecDeque<String>,
    stall: bool,
}

#[async_trait]
impl EventLines for FakeEventLog {
    async fn next_line(&mut self) -> Result<Option<String>, DeviceError> {
        match self.lines.pop_front() {
            Some(line) => Ok(Some(line)),
            None if self.stall => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn terminate(&mut self) {}
}

/// A phone that logs shell-level commands the way `adb shell input` sees them.
#[derive(Default)]
struct FakePhone {
    log: Mutex<Vec<String>>,
    events: Mutex<Option<FakeEventLog>>,
}

impl FakePhone {
    fn with_events(lines: &[&str], stall: bool) -> Self {
        Self {
            events: Mutex::new(Some(FakeEventLog {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                stall,
            })),
            ..Default::default()
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, entry: String) -> Result<(), DeviceError> {
        self.log.lock().unwrap().push(entry);
        Ok(())
    }
}

#[async_trait]
impl Device for FakePhone {
    async fn list_connected_devices(&self) -> Result<String, DeviceError> {
        Ok("List of devices attached\nemulator-5554\tdevice\n".to_string())
    }

    async fn query_screen_size(&self) -> Result<DeviceGeometry, DeviceError> {
        parse_screen_size("Physical size: 1080x1920")
    }

    async fn tap(&self, x: u32, y: u32) -> Result<(), DeviceError> {
        self.push(format!("input tap {x} {y}"))
    }

    async fn drag(
        &self,
        from: (u32, u32),
        to: (u32, u32),
        duration_ms: u32,
    ) -> Result<(), DeviceError> {
        self.push(format!(
            "input swipe {} {} {} {} {duration_ms}",
            from.0, from.1, to.0, to.1
        ))
    }

    async fn send_key_event(&self, code: &str) -> Result<(), DeviceError> {
        self.push(format!("input keyevent {code}"))
    }

    async fn send_text(&self, text: &str) -> Result<(), DeviceError> {
        self.push(format!("input text {text}"))
    }

    async fn open_event_stream(&self) -> Result<Box<dyn EventLines>, DeviceError> {
        match self.events.lock().unwrap().take() {
            Some(events) => Ok(Box::new(events)),
            None => Err(DeviceError::NoInputDevice),
        }
    }
}

struct Keys(VecDeque<Key>);

#[async_trait]
impl Keystream for Keys {
    async fn next_key(&mut self) -> Result<Key, KeystreamError> {
        self.0.pop_front().ok_or(KeystreamError::Closed)
    }
}

#[derive(Clone, Default)]
struct Screen(Arc<Mutex<Vec<Vec<String>>>>);

impl Screen {
    fn last(&self) -> Vec<String> {
        self.0.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl Console for Screen {
    fn size(&self) -> io::Result<TerminalGeometry> {
        Ok(TerminalGeometry { cols: 80, rows: 24 })
    }

    fn draw(&mut self, lines: &[String]) -> io::Result<()> {
        self.0.lock().unwrap().push(lines.to_vec());
        Ok(())
    }

    fn set_echo(&mut self, _enabled: bool) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn quick_controls() -> ControlSettings {
    ControlSettings {
        settle_delay: Duration::ZERO,
        notice_delay: Duration::ZERO,
        capture_timeout: Duration::from_millis(100),
        ..ControlSettings::default()
    }
}

async fn drive(phone: Arc<FakePhone>, keys: &[Key]) -> (Controller, Screen) {
    let size = assert_ok!(phone.query_screen_size().await);
    let screen = Screen::default();
    let mut controller = Controller::new(
        phone,
        Box::new(Keys(keys.iter().copied().collect())),
        Box::new(screen.clone()),
        Session::new(size),
        RenderConfig::default(),
        quick_controls(),
    );
    assert_ok!(controller.run().await);
    (controller, screen)
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_operation_session_end_to_end() {
    let phone = Arc::new(FakePhone::default());
    let keys = [
        Key::Ctrl('o'),
        Key::Right,
        Key::Right,
        Key::Enter,
        Key::Char(' '),
        Key::Up,
        Key::Char(' '),
        Key::Char('b'),
        Key::Ctrl('c'),
    ];
    let (controller, screen) = drive(phone.clone(), &keys).await;

    assert_eq!(
        phone.log(),
        vec![
            "input tap 570 960",
            "input swipe 570 960 570 945 300",
            "input keyevent 4",
        ]
    );
    assert_eq!(controller.session().mode, Mode::Operation);
    assert!(screen.last().contains(&"Position: (570, 945)".to_string()));
}

#[tokio::test]
async fn test_recorded_key_is_replayed() {
    let phone = Arc::new(FakePhone::with_events(
        &[
            "add device 1: /dev/input/event3",
            "/dev/input/event3: EV_KEY       KEY_CAMERA           DOWN",
            "/dev/input/event3: EV_SYN       SYN_REPORT           00000000",
            "/dev/input/event3: EV_KEY       KEY_CAMERA           UP",
        ],
        false,
    ));
    let keys = [
        Key::Ctrl('o'),
        Key::Char('C'),
        Key::Char('7'),
        Key::Char('c'),
        Key::Char('7'),
        Key::Ctrl('c'),
    ];
    let (_, screen) = drive(phone.clone(), &keys).await;

    assert_eq!(phone.log(), vec!["input keyevent 27"]);
    assert!(screen.last().contains(&"Custom keys: c7=27".to_string()));
}

#[tokio::test]
async fn test_input_session_end_to_end() {
    let phone = Arc::new(FakePhone::default());
    let keys = [
        Key::Ctrl('i'),
        Key::Char('o'),
        Key::Char('k'),
        Key::Enter,
        Key::Ctrl('o'),
        Key::Ctrl('c'),
    ];
    let (controller, _) = drive(phone.clone(), &keys).await;

    assert_eq!(
        phone.log(),
        vec!["input text o", "input text k", "input keyevent 66"]
    );
    assert_eq!(controller.session().mode, Mode::Idle);
}

// ============================================================================
// Capture Tests
// ============================================================================

#[tokio::test]
async fn test_capture_resolves_hex_identifier() {
    let phone = FakePhone::with_events(
        &[
            "/dev/input/event1: EV_KEY       000000fe             DOWN",
            "/dev/input/event1: EV_KEY       000000fe             UP",
        ],
        false,
    );
    let captured = assert_ok!(capture_key_press(&phone, Duration::from_secs(1)).await);
    assert_eq!(captured.raw_identifier, "000000fe");
    assert_eq!(captured.resolved_code, "254");
}

#[tokio::test]
async fn test_capture_times_out_on_silent_device() {
    let phone = FakePhone::with_events(&[], true);
    let err = assert_err!(capture_key_press(&phone, Duration::from_millis(50)).await);
    assert!(matches!(err, CaptureError::Timeout(_)));
}

#[tokio::test]
async fn test_capture_reports_closed_log() {
    let phone = FakePhone::with_events(
        &["/dev/input/event1: EV_KEY       KEY_POWER            DOWN"],
        false,
    );
    let err = assert_err!(capture_key_press(&phone, Duration::from_secs(1)).await);
    assert!(matches!(err, CaptureError::Closed));
}

// ============================================================================
// Bridge Output Parsing
// ============================================================================

#[test]
fn test_device_list_with_daemon_startup() {
    let output = "\
* daemon not running; starting now at tcp:5037
* daemon started successfully
List of devices attached
R58M123ABC\tunauthorized
emulator-5554\tdevice
";
    let devices = parse_device_list(output);
    assert_eq!(devices.len(), 2);
    assert!(!devices[0].is_authorized());
    assert_eq!(devices[1].serial, "emulator-5554");
    assert!(devices[1].is_authorized());
}

#[test]
fn test_screen_size_prefers_override() {
    let size = assert_ok!(parse_screen_size(
        "Physical size: 1440x3120\nOverride size: 1080x2340\n"
    ));
    assert_eq!((size.width, size.height), (1080, 2340));
    assert_err!(parse_screen_size("cmd: Can't find service: window"));
}
