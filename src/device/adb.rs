//! `adb`-backed [`Device`] implementation.
//!
//! Every operation is one `adb` invocation (two for raw key injection).
//! Output parsing lives in free functions so it can be tested without a
//! phone attached.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

use crate::core::geometry::DeviceGeometry;
use crate::core::keycode;
use crate::device::{Device, DeviceError, EventLines};

/// Device state string `adb devices` uses for an authorized device.
const AUTHORIZED_STATE: &str = "device";

/// One row of `adb devices` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedDevice {
    pub serial: String,
    /// `device`, `unauthorized`, `offline`, ...
    pub state: String,
}

impl AttachedDevice {
    pub fn is_authorized(&self) -> bool {
        self.state == AUTHORIZED_STATE
    }
}

/// Parses `adb devices` output, skipping the header and daemon chatter.
pub fn parse_device_list(output: &str) -> Vec<AttachedDevice> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of devices") && !line.starts_with('*'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let serial = fields.next()?;
            let state = fields.next()?;
            Some(AttachedDevice {
                serial: serial.to_string(),
                state: state.to_string(),
            })
        })
        .collect()
}

/// Parses `wm size` output.
///
/// ```text
/// Physical size: 1080x2400
/// Override size: 720x1600
/// ```
///
/// An override wins over the physical size since input coordinates follow it.
pub fn parse_screen_size(output: &str) -> Result<DeviceGeometry, DeviceError> {
    let mut physical = None;
    let mut fallback = None;
    for line in output.lines() {
        let Some(size) = line.split_whitespace().find_map(parse_dimensions) else {
            continue;
        };
        if line.trim_start().starts_with("Override size") {
            return Ok(size);
        }
        if line.trim_start().starts_with("Physical size") {
            physical.get_or_insert(size);
        }
        fallback.get_or_insert(size);
    }
    physical
        .or(fallback)
        .ok_or_else(|| DeviceError::SizeQuery(output.to_string()))
}

/// Parses a `WIDTHxHEIGHT` token.
fn parse_dimensions(token: &str) -> Option<DeviceGeometry> {
    let (w, h) = token.split_once('x')?;
    DeviceGeometry::new(w.parse().ok()?, h.parse().ok()?)
}

/// Escapes text for `input text`, which runs through the device shell.
/// Spaces become `%s`; shell metacharacters are backslash-escaped.
pub fn escape_input_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' ' => escaped.push_str("%s"),
            '\\' | '\'' | '"' | '`' | '$' | '&' | '|' | ';' | '<' | '>' | '(' | ')' | '*' | '?'
            | '~' | '#' | '!' | '[' | ']' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Shell script pressing and releasing `code` directly on an input node,
/// with a sync report after each transition.
pub fn raw_key_script(node: &str, code: &str) -> String {
    format!(
        "sendevent {node} 1 {code} 1 && sendevent {node} 0 0 0 && sleep 0.1 && \
         sendevent {node} 1 {code} 0 && sendevent {node} 0 0 0"
    )
}

pub struct AdbDevice {
    program: String,
}

impl AdbDevice {
    /// Checks that `program` runs before handing out a device.
    pub async fn locate(program: impl Into<String>) -> Result<Self, DeviceError> {
        let device = Self {
            program: program.into(),
        };
        let version = device.run(&["version"]).await?;
        info!(
            "Using {} ({})",
            device.program,
            version.lines().next().unwrap_or("unknown version")
        );
        Ok(device)
    }

    /// Runs `adb <args>` and returns stdout followed by stderr.
    async fn run(&self, args: &[&str]) -> Result<String, DeviceError> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!("Running {}", command);

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            warn!("{} failed with {:?}: {}", command, output.status.code(), text.trim());
            return Err(DeviceError::CommandFailed {
                command,
                status: output.status.code(),
                output: text,
            });
        }
        Ok(text)
    }

    async fn shell(&self, args: &[&str]) -> Result<String, DeviceError> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("shell");
        full.extend_from_slice(args);
        self.run(&full).await
    }

    fn spawn_error(&self, e: io::Error) -> DeviceError {
        if e.kind() == io::ErrorKind::NotFound {
            DeviceError::BridgeMissing(self.program.clone())
        } else {
            DeviceError::Io(e)
        }
    }

    /// Injects a press/release pair on the first input node.
    async fn inject_raw_key(&self, code: &str) -> Result<(), DeviceError> {
        let nodes = self.shell(&["ls /dev/input/event*"]).await?;
        let node = nodes
            .split_whitespace()
            .next()
            .ok_or(DeviceError::NoInputDevice)?;
        debug!("Injecting raw key {} on {}", code, node);
        self.shell(&[&raw_key_script(node, code)]).await?;
        Ok(())
    }
}

#[async_trait]
impl Device for AdbDevice {
    async fn list_connected_devices(&self) -> Result<String, DeviceError> {
        self.run(&["devices"]).await
    }

    async fn query_screen_size(&self) -> Result<DeviceGeometry, DeviceError> {
        let output = self.shell(&["wm", "size"]).await?;
        parse_screen_size(&output)
    }

    async fn tap(&self, x: u32, y: u32) -> Result<(), DeviceError> {
        self.shell(&["input", "tap", &x.to_string(), &y.to_string()])
            .await
            .map(drop)
    }

    async fn drag(
        &self,
        from: (u32, u32),
        to: (u32, u32),
        duration_ms: u32,
    ) -> Result<(), DeviceError> {
        self.shell(&[
            "input",
            "swipe",
            &from.0.to_string(),
            &from.1.to_string(),
            &to.0.to_string(),
            &to.1.to_string(),
            &duration_ms.to_string(),
        ])
        .await
        .map(drop)
    }

    async fn send_key_event(&self, code: &str) -> Result<(), DeviceError> {
        if keycode::requires_raw_injection(code) {
            return self.inject_raw_key(code).await;
        }
        self.shell(&["input", "keyevent", code]).await.map(drop)
    }

    async fn send_text(&self, text: &str) -> Result<(), DeviceError> {
        self.shell(&["input", "text", &escape_input_text(text)])
            .await
            .map(drop)
    }

    async fn open_event_stream(&self) -> Result<Box<dyn EventLines>, DeviceError> {
        debug!("Starting {} shell getevent -l", self.program);
        let mut child = Command::new(&self.program)
            .args(["shell", "getevent", "-l"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DeviceError::Io(io::Error::other("getevent stdout not captured")))?;
        Ok(Box::new(AdbEventStream {
            child,
            lines: BufReader::new(stdout).lines(),
        }))
    }
}

/// `getevent -l` running on the device.
struct AdbEventStream {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
}

#[async_trait]
impl EventLines for AdbEventStream {
    async fn next_line(&mut self) -> Result<Option<String>, DeviceError> {
        self.lines.next_line().await.map_err(DeviceError::Io)
    }

    async fn terminate(&mut self) {
        if let Err(e) = self.child.kill().await {
            debug!("getevent already gone: {}", e);
        }
    }
}
