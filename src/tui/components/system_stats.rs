//! # SystemStats Component
//!
//! One line of host figures between the title bar and the shell:
//!
//! ```text
//!  CPU 12.5%  MEM 43.0%  TX 1.2 MiB  RX 310.4 MiB
//! ```

use crate::core::state::SystemStats;
use crate::tui::component::Component;
use crate::tui::components::shell_panel::AMBER;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

pub struct SystemStatsBar {
    pub stats: SystemStats,
}

impl SystemStatsBar {
    pub fn new(stats: SystemStats) -> Self {
        Self { stats }
    }

    fn line(&self) -> Line<'static> {
        let label = Style::default().fg(AMBER).add_modifier(Modifier::BOLD);
        let value = Style::default().fg(Color::Green);
        let fields = [
            ("CPU", format!("{:.1}%", self.stats.cpu_percent)),
            ("MEM", format!("{:.1}%", self.stats.memory_percent)),
            ("TX", format_bytes(self.stats.bytes_sent)),
            ("RX", format_bytes(self.stats.bytes_received)),
        ];
        let mut spans = Vec::with_capacity(fields.len() * 2);
        for (name, figure) in fields {
            spans.push(Span::styled(format!(" {name} "), label));
            spans.push(Span::styled(format!("{figure} "), value));
        }
        Line::from(spans)
    }
}

impl Component for SystemStatsBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let line = self.line().style(Style::default().bg(Color::Black));
        frame.render_widget(line, area);
    }
}

/// Binary units with one decimal, bytes as a whole number.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
