//! # Preview Geometry
//!
//! Pure functions that fit the device screen into the terminal as an ASCII
//! box and map device pixels onto cells of that box.
//!
//! ```text
//! terminal (cols × rows)
//!   └─ × scale_factor, − 4 margin, floor 8  →  max box
//!        └─ fit device aspect (corrected by char aspect ratio)  →  PreviewBox
//! ```
//!
//! Terminal cells are taller than they are wide, so the device aspect is
//! corrected by `char_aspect_ratio` (cell width / cell height) before fitting.

use crate::core::config::RenderConfig;

/// Margin reserved around the box for its border and padding.
const BOX_MARGIN: i64 = 4;

/// Smallest box dimension ever produced.
pub const MIN_BOX_DIM: usize = 8;

/// Device pixel bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceGeometry {
    pub width: u32,
    pub height: u32,
}

impl DeviceGeometry {
    /// Used when the device cannot report its size.
    pub const FALLBACK: DeviceGeometry = DeviceGeometry {
        width: 1080,
        height: 1920,
    };

    /// Returns `None` unless both dimensions are positive.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Terminal size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalGeometry {
    pub cols: u16,
    pub rows: u16,
}

impl TerminalGeometry {
    /// Used when the terminal cannot report its size.
    pub const FALLBACK: TerminalGeometry = TerminalGeometry { cols: 80, rows: 24 };
}

/// Size of the rendered screen preview, in cells (border excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewBox {
    pub cols: usize,
    pub rows: usize,
}

/// Fits the device screen into the scaled terminal area.
///
/// When the aspect-correct height does not fit, the width is recomputed from
/// the maximum height instead. If that overflows as well the box falls back to
/// the full `(max_width, max_height)` area without preserving the aspect.
pub fn compute_box(
    device: DeviceGeometry,
    terminal: TerminalGeometry,
    config: &RenderConfig,
) -> PreviewBox {
    let min = MIN_BOX_DIM as i64;
    let scaled_w = (f64::from(terminal.cols) * config.scale_factor) as i64;
    let scaled_h = (f64::from(terminal.rows) * config.scale_factor) as i64;
    let max_w = (scaled_w - BOX_MARGIN).max(min);
    let max_h = (scaled_h - BOX_MARGIN).max(min);

    let aspect = device.aspect();
    let char_ratio = config.char_aspect_ratio;

    let candidate_h = (max_w as f64 / aspect * char_ratio) as i64;
    if candidate_h <= max_h {
        return PreviewBox {
            cols: max_w as usize,
            rows: candidate_h.max(min) as usize,
        };
    }

    let candidate_w = (max_h as f64 * aspect / char_ratio) as i64;
    if candidate_w > max_w {
        return PreviewBox {
            cols: max_w as usize,
            rows: max_h as usize,
        };
    }
    PreviewBox {
        cols: candidate_w.max(min) as usize,
        rows: max_h as usize,
    }
}

/// Maps a device coordinate to a `(col, row)` cell of the preview box.
///
/// A coordinate on the far edge (`x == width`) maps one past the last cell;
/// callers that draw the cell clamp it themselves.
pub fn to_box_cell(x: u32, y: u32, device: DeviceGeometry, preview: PreviewBox) -> (usize, usize) {
    let col = u64::from(x) * preview.cols as u64 / u64::from(device.width);
    let row = u64::from(y) * preview.rows as u64 / u64::from(device.height);
    (col as usize, row as usize)
}
