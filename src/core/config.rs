//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars.
//!
//! Config lives at `~/.adb-remote/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub adb: AdbConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub char_aspect_ratio: Option<f64>,
    pub scale_factor: Option<f64>,
    pub dense_fill: Option<bool>,
    pub pointer_glyph: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ControlConfig {
    pub move_step: Option<i32>,
    pub settle_ms: Option<u64>,
    pub notice_ms: Option<u64>,
    pub drag_duration_ms: Option<u32>,
    pub capture_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AdbConfig {
    pub path: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_CHAR_ASPECT_RATIO: f64 = 0.5;
pub const DEFAULT_SCALE_FACTOR: f64 = 0.8;
pub const MAX_SCALE_FACTOR: f64 = 1.0;
pub const DEFAULT_POINTER_GLYPH: &str = "●";
pub const DEFAULT_MOVE_STEP: i32 = 15;
pub const DEFAULT_SETTLE_MS: u64 = 300;
pub const DEFAULT_NOTICE_MS: u64 = 1000;
pub const DEFAULT_DRAG_DURATION_MS: u32 = 300;
pub const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_ADB_PATH: &str = "adb";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

/// How the screen preview is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Width / height of one terminal cell.
    pub char_aspect_ratio: f64,
    /// Fraction of the terminal the preview may use.
    pub scale_factor: f64,
    /// Fill empty cells with `·` instead of spaces.
    pub dense_fill: bool,
    pub pointer_glyph: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            char_aspect_ratio: DEFAULT_CHAR_ASPECT_RATIO,
            scale_factor: DEFAULT_SCALE_FACTOR,
            dense_fill: false,
            pointer_glyph: DEFAULT_POINTER_GLYPH.to_string(),
        }
    }
}

impl RenderConfig {
    pub fn fill_char(&self) -> char {
        if self.dense_fill { '·' } else { ' ' }
    }
}

/// Pointer step and the pauses that follow device actions.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSettings {
    pub move_step: i32,
    /// Pause after a device action so the phone catches up before redraw.
    pub settle_delay: Duration,
    /// Pause after custom-key messages so they can be read.
    pub notice_delay: Duration,
    pub drag_duration_ms: u32,
    pub capture_timeout: Duration,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            move_step: DEFAULT_MOVE_STEP,
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_MS),
            notice_delay: Duration::from_millis(DEFAULT_NOTICE_MS),
            drag_duration_ms: DEFAULT_DRAG_DURATION_MS,
            capture_timeout: Duration::from_secs(DEFAULT_CAPTURE_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub render: RenderConfig,
    pub controls: ControlSettings,
    pub adb_path: String,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.adb-remote/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".adb-remote").join("config.toml"))
}

/// Load config from `~/.adb-remote/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `RemoteConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<RemoteConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(RemoteConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(RemoteConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: RemoteConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# adb-remote configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars.

# [display]
# char_aspect_ratio = 0.5       # Or set TERM_CHAR_ASPECT_RATIO
# scale_factor = 0.8            # Or set TERM_BOX_SCALE
# dense_fill = false            # Or set TERM_DENSE_FILL=1
# pointer_glyph = "●"

# [control]
# move_step = 15                # Pointer step in device pixels
# settle_ms = 300               # Pause after each device action
# notice_ms = 1000              # Pause after custom-key messages
# drag_duration_ms = 300
# capture_timeout_secs = 5

# [adb]
# path = "adb"                  # Or set ADB_PATH
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars.
pub fn resolve(config: &RemoteConfig) -> ResolvedConfig {
    resolve_with(config, |name| std::env::var(name).ok())
}

/// Same as [`resolve`], reading variables through `env`.
pub fn resolve_with(config: &RemoteConfig, env: impl Fn(&str) -> Option<String>) -> ResolvedConfig {
    let display = &config.display;

    // Ratios: env → config → default, rejecting anything not finite and positive
    let char_aspect_ratio = positive_ratio(
        "char aspect ratio",
        env_f64(&env, "TERM_CHAR_ASPECT_RATIO").or(display.char_aspect_ratio),
        DEFAULT_CHAR_ASPECT_RATIO,
    );
    let scale_factor = match positive_ratio(
        "box scale",
        env_f64(&env, "TERM_BOX_SCALE").or(display.scale_factor),
        DEFAULT_SCALE_FACTOR,
    ) {
        // The preview must fit inside the terminal it is drawn in
        scale if scale > MAX_SCALE_FACTOR => {
            warn!(
                "Ignoring box scale {} above {}, using {}",
                scale, MAX_SCALE_FACTOR, DEFAULT_SCALE_FACTOR
            );
            DEFAULT_SCALE_FACTOR
        }
        scale => scale,
    };

    // Dense fill: TERM_DENSE_FILL=1 turns it on, any other value turns it off
    let dense_fill = env("TERM_DENSE_FILL")
        .map(|v| v == "1")
        .or(display.dense_fill)
        .unwrap_or(false);

    let pointer_glyph = match display.pointer_glyph.as_deref() {
        Some(glyph) if glyph.width() == 1 => glyph.to_string(),
        Some(glyph) => {
            warn!("Pointer glyph {:?} is not one cell wide, using default", glyph);
            DEFAULT_POINTER_GLYPH.to_string()
        }
        None => DEFAULT_POINTER_GLYPH.to_string(),
    };

    let control = &config.control;
    let move_step = match control.move_step {
        Some(step) if step > 0 => step,
        Some(step) => {
            warn!("Ignoring non-positive move step {}", step);
            DEFAULT_MOVE_STEP
        }
        None => DEFAULT_MOVE_STEP,
    };

    // adb path: env → config → default
    let adb_path = env("ADB_PATH")
        .or_else(|| config.adb.path.clone())
        .unwrap_or_else(|| DEFAULT_ADB_PATH.to_string());

    ResolvedConfig {
        render: RenderConfig {
            char_aspect_ratio,
            scale_factor,
            dense_fill,
            pointer_glyph,
        },
        controls: ControlSettings {
            move_step,
            settle_delay: Duration::from_millis(control.settle_ms.unwrap_or(DEFAULT_SETTLE_MS)),
            notice_delay: Duration::from_millis(control.notice_ms.unwrap_or(DEFAULT_NOTICE_MS)),
            drag_duration_ms: control.drag_duration_ms.unwrap_or(DEFAULT_DRAG_DURATION_MS),
            capture_timeout: Duration::from_secs(
                control
                    .capture_timeout_secs
                    .unwrap_or(DEFAULT_CAPTURE_TIMEOUT_SECS),
            ),
        },
        adb_path,
    }
}

/// Parses a float variable. Unparseable values count as unset.
fn env_f64(env: &impl Fn(&str) -> Option<String>, name: &str) -> Option<f64> {
    let raw = env(name)?;
    match raw.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable {}={:?}", name, raw);
            None
        }
    }
}

fn positive_ratio(what: &str, value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        Some(v) => {
            warn!("Ignoring {} {}, using {}", what, v, default);
            default
        }
        None => default,
    }
}
