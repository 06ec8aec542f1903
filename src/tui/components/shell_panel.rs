//! # ShellPanel Component
//!
//! The main panel: a bordered, green-on-black view of the shell's emulated
//! screen with an amber frame.
//!
//! The screen is 80×24 whatever the panel size. A shorter panel shows the
//! bottom of the used rows (see [`Viewport::fit`]), a narrower one the left
//! columns.
//!
//! [`Viewport::fit`]: crate::tui::screen::Viewport::fit

use crate::core::state::ShellStatus;
use crate::tui::component::Component;
use crate::tui::screen::{Viewport, render_lines};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Paragraph};

pub const AMBER: Color = Color::Rgb(255, 191, 0);

pub struct ShellPanel<'a> {
    pub screen: &'a vt100::Screen,
    pub status: &'a ShellStatus,
    pub command: &'a str,
}

impl<'a> ShellPanel<'a> {
    pub fn new(screen: &'a vt100::Screen, status: &'a ShellStatus, command: &'a str) -> Self {
        Self {
            screen,
            status,
            command,
        }
    }

    fn block(&self) -> Block<'static> {
        let border = Style::default().fg(AMBER);
        Block::bordered()
            .title(format!(" {} [{}] ", self.command, self.status))
            .border_style(border)
            .title_style(border.add_modifier(Modifier::BOLD))
    }
}

impl Component for ShellPanel<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let base = Style::default().fg(Color::Green).bg(Color::Black);
        let block = self.block().style(base);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if *self.status == ShellStatus::Disabled {
            let notice = Paragraph::new("Shell disabled")
                .style(base.add_modifier(Modifier::DIM))
                .alignment(Alignment::Center);
            frame.render_widget(notice, inner);
            return;
        }

        let running = *self.status == ShellStatus::Running;
        let view = Viewport::fit(self.screen, inner.height, inner.width, running);
        let lines = render_lines(self.screen, view);
        frame.render_widget(Paragraph::new(lines).style(base), inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::DisplayBuffer;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    fn draw(content: &str, status: &ShellStatus, width: u16, height: u16) -> Buffer {
        let mut display = DisplayBuffer::new();
        display.append(content);
        let mut panel = ShellPanel::new(display.screen(), status, "/bin/sh");
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| panel.render(f, f.area())).unwrap();
        terminal.backend().buffer().clone()
    }

    fn rows(buffer: &Buffer) -> Vec<String> {
        let area = buffer.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_panel_shows_newest_output() {
        let buffer = draw("line1\r\nline2\r\nline3\r\nline4\r\n$ ", &ShellStatus::Ended, 40, 5);
        let rows = rows(&buffer);

        assert!(rows[0].contains("/bin/sh [session ended]"));
        assert!(rows[1].contains("line3"));
        assert!(rows[2].contains("line4"));
        assert!(rows[3].contains("$ "));
        assert!(!rows.iter().any(|r| r.contains("line2")));
    }

    #[test]
    fn test_colour_set_above_visible_rows_persists() {
        let buffer = draw(
            "\x1b[31mline1\r\nline2\r\nline3\r\nline4",
            &ShellStatus::Ended,
            20,
            4,
        );
        assert_eq!(rows(&buffer)[2], "│line4             │");
        assert_eq!(buffer[(1, 2)].fg, Color::Red);
        assert_eq!(buffer[(1, 2)].bg, Color::Black);
    }

    #[test]
    fn test_running_panel_draws_cursor_and_colors() {
        let buffer = draw("\x1b[31merr\x1b[0m ok", &ShellStatus::Running, 20, 3);

        assert_eq!(buffer[(1, 1)].symbol(), "e");
        assert_eq!(buffer[(1, 1)].fg, Color::Red);
        assert_eq!(buffer[(5, 1)].symbol(), "o");
        assert_eq!(buffer[(5, 1)].fg, Color::Green);
        assert_eq!(buffer[(5, 1)].bg, Color::Black);
        assert!(buffer[(7, 1)].modifier.contains(Modifier::REVERSED));
        assert!(!buffer[(6, 1)].modifier.contains(Modifier::REVERSED));
        assert_eq!(buffer[(0, 0)].fg, AMBER);
    }

    #[test]
    fn test_no_cursor_once_ended() {
        let buffer = draw("$ ", &ShellStatus::Ended, 20, 3);
        assert!(!buffer[(3, 1)].modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_full_screen_redraw_replaces_old_text() {
        let buffer = draw("old prompt\r\n\x1b[2J\x1b[Htop", &ShellStatus::Running, 20, 4);
        let rows = rows(&buffer);
        assert!(rows[1].starts_with("│top"));
        assert!(!rows.iter().any(|r| r.contains("old prompt")));
    }

    #[test]
    fn test_disabled_panel() {
        let buffer = draw("", &ShellStatus::Disabled, 30, 3);
        assert!(rows(&buffer)[1].contains("Shell disabled"));
    }
}
