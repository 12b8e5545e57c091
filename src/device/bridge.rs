use std::fmt;

use async_trait::async_trait;

use crate::core::geometry::DeviceGeometry;

/// Errors that can occur while talking to the device.
/// None of them are retried; the operator repeats the action by hand.
#[derive(Debug)]
pub enum DeviceError {
    /// The bridge executable could not be started.
    BridgeMissing(String),
    /// Spawning or reading from a bridge process failed.
    Io(std::io::Error),
    /// The bridge ran but reported failure.
    CommandFailed {
        command: String,
        status: Option<i32>,
        output: String,
    },
    /// `wm size` output could not be parsed.
    SizeQuery(String),
    /// No `/dev/input/event*` node to inject raw key events into.
    NoInputDevice,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::BridgeMissing(program) => write!(f, "device bridge not found: {program}"),
            DeviceError::Io(e) => write!(f, "I/O error: {e}"),
            DeviceError::CommandFailed {
                command,
                status,
                output,
            } => {
                match status {
                    Some(code) => write!(f, "`{command}` exited with {code}")?,
                    None => write!(f, "`{command}` was terminated")?,
                }
                let output = output.trim();
                if !output.is_empty() {
                    write!(f, ": {output}")?;
                }
                Ok(())
            }
            DeviceError::SizeQuery(output) => {
                write!(f, "cannot parse screen size from {:?}", output.trim())
            }
            DeviceError::NoInputDevice => write!(f, "no input device found"),
        }
    }
}

impl std::error::Error for DeviceError {}

/// A live line-oriented event log from the device.
#[async_trait]
pub trait EventLines: Send {
    /// Next line, or `None` once the log has ended.
    async fn next_line(&mut self) -> Result<Option<String>, DeviceError>;

    /// Stops the underlying reader. Dropping the stream has the same effect.
    async fn terminate(&mut self);
}

/// Everything the remote needs from the device bridge.
#[async_trait]
pub trait Device: Send + Sync {
    /// Raw output of the connected-devices listing.
    async fn list_connected_devices(&self) -> Result<String, DeviceError>;

    async fn query_screen_size(&self) -> Result<DeviceGeometry, DeviceError>;

    async fn tap(&self, x: u32, y: u32) -> Result<(), DeviceError>;

    async fn drag(
        &self,
        from: (u32, u32),
        to: (u32, u32),
        duration_ms: u32,
    ) -> Result<(), DeviceError>;

    async fn send_key_event(&self, code: &str) -> Result<(), DeviceError>;

    async fn send_text(&self, text: &str) -> Result<(), DeviceError>;

    /// Starts the device's input event log.
    async fn open_event_stream(&self) -> Result<Box<dyn EventLines>, DeviceError>;
}
