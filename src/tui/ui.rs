//! Frame rendering.
//!
//! Turns the session into plain text lines; the console decides how they hit
//! the terminal. Each mode has its own screen:
//!
//! ```text
//! Idle       banner, device, mode keys, transcript
//! Operation  help, scaled preview box with pointer, status, transcript, prompt
//! Input      help, transcript, typed buffer
//! ```

use crate::core::config::RenderConfig;
use crate::core::geometry::{PreviewBox, TerminalGeometry, compute_box, to_box_cell};
use crate::core::state::{Mode, Session};

const RULE: &str = "-----------------------------------";

pub fn render(session: &Session, config: &RenderConfig, terminal: TerminalGeometry) -> Vec<String> {
    match session.mode {
        Mode::Idle => idle_screen(session),
        Mode::Operation => operation_screen(session, config, terminal),
        Mode::Input => input_screen(session),
    }
}

fn idle_screen(session: &Session) -> Vec<String> {
    let mut lines = vec!["ADB Remote".to_string()];
    let device = session.device;
    match &session.serial {
        Some(serial) => lines.push(format!("Device: {serial} ({}x{})", device.width, device.height)),
        None => lines.push(format!("Device: {}x{}", device.width, device.height)),
    }
    lines.push(RULE.to_string());
    lines.push("Ctrl+O: operation mode".to_string());
    lines.push("Ctrl+I: input mode".to_string());
    lines.push("Ctrl+C: quit".to_string());
    lines.push(RULE.to_string());
    lines.extend(session.transcript().map(str::to_string));
    lines
}

fn operation_screen(session: &Session, config: &RenderConfig, terminal: TerminalGeometry) -> Vec<String> {
    let mut lines = vec![
        "===== Operation Mode =====".to_string(),
        "Ctrl+I: leave operation mode | Ctrl+C: quit".to_string(),
        RULE.to_string(),
        "Arrows: move pointer | Enter: tap".to_string(),
        "Space: start/end drag | Esc: cancel drag".to_string(),
        "p: power | +: volume up | -: volume down | h: home | b: back | m: menu".to_string(),
        "c1-c9: trigger custom key | C1-C9: record custom key".to_string(),
        RULE.to_string(),
    ];
    lines.extend(preview_lines(session, config, terminal));

    let pointer = &session.pointer;
    match pointer.drag_anchor() {
        Some(anchor) => lines.push(format!(
            "Position: {} | dragging from {}",
            pointer.position(),
            anchor
        )),
        None => lines.push(format!("Position: {}", pointer.position())),
    }
    if !session.bindings.is_empty() {
        let bound: Vec<String> = session
            .bindings
            .iter()
            .map(|(slot, code)| format!("{slot}={code}"))
            .collect();
        lines.push(format!("Custom keys: {}", bound.join(" ")));
    }
    lines.extend(session.transcript().map(str::to_string));
    lines.push(
        session
            .prompt
            .clone()
            .unwrap_or_else(|| "Command: ".to_string()),
    );
    lines
}

/// The bordered screen preview with the pointer glyph.
pub fn preview_lines(session: &Session, config: &RenderConfig, terminal: TerminalGeometry) -> Vec<String> {
    let device = session.device;
    let preview = compute_box(device, terminal, config);
    let position = session.pointer.position();
    let (col, row) = visible_cell(to_box_cell(position.x, position.y, device, preview), preview);
    let fill = config.fill_char();

    let border = format!("+{}+", "-".repeat(preview.cols));
    let mut lines = Vec::with_capacity(preview.rows + 3);
    lines.push(format!(
        "Screen preview (device {}:{}, char aspect {:.1})",
        device.width, device.height, config.char_aspect_ratio
    ));
    lines.push(border.clone());
    for y in 0..preview.rows {
        let mut line = String::with_capacity(preview.cols + 2);
        line.push('|');
        for x in 0..preview.cols {
            if (x, y) == (col, row) {
                line.push_str(&config.pointer_glyph);
            } else {
                line.push(fill);
            }
        }
        line.push('|');
        lines.push(line);
    }
    lines.push(border);
    lines
}

/// Pulls a pointer sitting on the far edge back onto the last cell.
fn visible_cell((col, row): (usize, usize), preview: PreviewBox) -> (usize, usize) {
    (
        col.min(preview.cols.saturating_sub(1)),
        row.min(preview.rows.saturating_sub(1)),
    )
}

fn input_screen(session: &Session) -> Vec<String> {
    let mut lines = vec![
        "===== Input Mode =====".to_string(),
        "Typed text is sent to the phone as you type".to_string(),
        "Backspace: delete last character".to_string(),
        "Enter: send enter".to_string(),
        "Ctrl+O: leave input mode".to_string(),
        "Ctrl+C: quit".to_string(),
        "======================".to_string(),
    ];
    lines.extend(session.transcript().map(str::to_string));
    lines.push(format!("Input: {}", session.input_buffer.replace('\n', "↵")));
    lines
}
