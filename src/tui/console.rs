//! Terminal output: size queries, frame drawing and echo control.
//!
//! The terminal runs in raw mode, so keystrokes are never echoed by the
//! terminal itself. What the operator sees as echo is the cursor parked after
//! the prompt; suppressing echo hides it.

use std::io;

use ratatui::layout::Position;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::{DefaultTerminal, Frame};
use unicode_width::UnicodeWidthStr;

use crate::core::geometry::TerminalGeometry;

pub trait Console {
    /// Current terminal size in cells.
    fn size(&self) -> io::Result<TerminalGeometry>;

    /// Replaces the whole screen with `lines`.
    fn draw(&mut self, lines: &[String]) -> io::Result<()>;

    fn set_echo(&mut self, enabled: bool) -> io::Result<()>;
}

/// Console over the ratatui terminal set up by `ratatui::try_init`.
pub struct TerminalConsole {
    terminal: DefaultTerminal,
    echo: bool,
}

impl TerminalConsole {
    pub fn new(terminal: DefaultTerminal) -> Self {
        Self {
            terminal,
            echo: true,
        }
    }
}

impl Console for TerminalConsole {
    fn size(&self) -> io::Result<TerminalGeometry> {
        let (cols, rows) = crossterm::terminal::size()?;
        if cols == 0 || rows == 0 {
            return Err(io::Error::other(format!("terminal reported {cols}x{rows}")));
        }
        Ok(TerminalGeometry { cols, rows })
    }

    fn draw(&mut self, lines: &[String]) -> io::Result<()> {
        let echo = self.echo;
        self.terminal.draw(|frame| draw_lines(frame, lines, echo))?;
        Ok(())
    }

    fn set_echo(&mut self, enabled: bool) -> io::Result<()> {
        self.echo = enabled;
        if enabled {
            self.terminal.show_cursor()
        } else {
            self.terminal.hide_cursor()
        }
    }
}

/// Draws `lines` top-down. When they do not fit, the top is scrolled off so
/// the status lines and prompt at the bottom stay visible.
pub fn draw_lines(frame: &mut Frame, lines: &[String], echo: bool) {
    let area = frame.area();
    let overflow = lines.len().saturating_sub(area.height as usize);
    let text: Vec<Line> = lines.iter().map(|line| Line::raw(line.as_str())).collect();
    frame.render_widget(Paragraph::new(text).scroll((overflow as u16, 0)), area);

    if echo && let Some(last) = lines.last() {
        let row = (lines.len() - overflow).saturating_sub(1) as u16;
        let col = (last.width() as u16).min(area.width.saturating_sub(1));
        frame.set_cursor_position(Position::new(area.x + col, area.y + row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.width)
            .map(|x| buffer.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "))
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn test_short_frame_drawn_from_top() {
        let mut terminal = Terminal::new(TestBackend::new(20, 4)).unwrap();
        let frame = lines(&["header", "Command: "]);
        terminal.draw(|f| draw_lines(f, &frame, true)).unwrap();
        assert_eq!(row_text(&terminal, 0), "header");
        assert_eq!(row_text(&terminal, 1), "Command:");
        assert_eq!(
            terminal.get_cursor_position().unwrap(),
            Position::new(9, 1)
        );
    }

    #[test]
    fn test_tall_frame_keeps_bottom_visible() {
        let mut terminal = Terminal::new(TestBackend::new(20, 3)).unwrap();
        let frame = lines(&["one", "two", "three", "four", "prompt"]);
        terminal.draw(|f| draw_lines(f, &frame, false)).unwrap();
        assert_eq!(row_text(&terminal, 0), "three");
        assert_eq!(row_text(&terminal, 2), "prompt");
    }
}
