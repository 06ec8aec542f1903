//! # TitleBar Component
//!
//! Top status line: app name, shell state, chatpad state, status message
//! and a clock.
//!
//! Stateless: every field is a prop filled in by `draw_ui` from `App`, so
//! the bar itself never reads core state.
//!
//! ```text
//! Termyte | shell: running (pty) | chatpad: Xbox Chatpad | Shell: /bin/bash   14:05
//! ```
//!
//! The clock is right-aligned and dropped first when the terminal is too
//! narrow for everything.

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

pub struct TitleBar {
    /// e.g. `"running (pty)"`, `"ended"`
    pub shell_status: String,
    /// e.g. `"Xbox Chatpad"`, `"none"`
    pub chatpad_status: String,
    pub status_message: String,
    /// Preformatted wall-clock time (`HH:MM`).
    pub clock: String,
}

impl TitleBar {
    pub fn new(
        shell_status: String,
        chatpad_status: String,
        status_message: String,
        clock: String,
    ) -> Self {
        Self {
            shell_status,
            chatpad_status,
            status_message,
            clock,
        }
    }

    fn title_line(&self) -> Line<'static> {
        let accent = Style::default()
            .fg(Color::LightGreen)
            .add_modifier(Modifier::BOLD);
        let mut spans = vec![
            Span::styled("Termyte", accent),
            Span::raw(format!(" | shell: {}", self.shell_status)),
            Span::raw(format!(" | chatpad: {}", self.chatpad_status)),
        ];
        if !self.status_message.is_empty() {
            spans.push(Span::raw(format!(" | {}", self.status_message)));
        }
        Line::from(spans)
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let title = self.title_line();
        let clock_width = self.clock.width() as u16;
        let fits_clock = title.width() as u16 + clock_width + 1 <= area.width;

        if self.clock.is_empty() || !fits_clock {
            frame.render_widget(title, area);
            return;
        }

        let [title_area, clock_area] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(clock_width)]).areas(area);
        frame.render_widget(title, title_area);
        frame.render_widget(
            Span::styled(self.clock.clone(), Style::default().fg(Color::Yellow)),
            clock_area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render_text(title_bar: &mut TitleBar, width: u16) -> String {
        let backend = TestBackend::new(width, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                title_bar.render(f, f.area());
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_title_bar_shows_both_components() {
        let mut title_bar = TitleBar::new(
            "running (pty)".to_string(),
            "Xbox Chatpad".to_string(),
            "".to_string(),
            "14:05".to_string(),
        );
        let text = render_text(&mut title_bar, 80);

        assert!(text.starts_with("Termyte | shell: running (pty) | chatpad: Xbox Chatpad"));
        assert!(text.trim_end().ends_with("14:05"));
    }

    #[test]
    fn test_title_bar_with_status_message() {
        let mut title_bar = TitleBar::new(
            "ended".to_string(),
            "none".to_string(),
            "Session ended. Ctrl+R restarts the shell".to_string(),
            "09:00".to_string(),
        );
        let text = render_text(&mut title_bar, 120);

        assert!(text.contains("shell: ended"));
        assert!(text.contains("| Session ended. Ctrl+R restarts the shell"));
        assert!(text.contains("09:00"));
    }

    #[test]
    fn test_narrow_terminal_drops_clock() {
        let mut title_bar = TitleBar::new(
            "starting".to_string(),
            "none".to_string(),
            "".to_string(),
            "23:59".to_string(),
        );
        let text = render_text(&mut title_bar, 30);

        assert!(text.starts_with("Termyte | shell: starting"));
        assert!(!text.contains("23:59"));
    }
}
