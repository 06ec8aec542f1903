use crate::core::state::{App, ShellStatus};
use crate::tui::component::Component;
use crate::tui::components::{ShellPanel, SystemStatsBar, TitleBar};

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const HINTS: &str = " Ctrl+Q quit  Ctrl+R restart shell";

pub fn draw_ui(frame: &mut Frame, app: &App, clock: &str) {
    use Constraint::{Length, Min};
    let stats_height = if app.stats.is_some() { 1 } else { 0 };
    let layout = Layout::vertical([Length(1), Length(stats_height), Min(0), Length(1)]);
    let [title_area, stats_area, shell_area, hint_area] = layout.areas(frame.area());

    let mut title_bar = TitleBar::new(
        shell_label(app),
        app.chatpad.to_string(),
        app.status_message.clone(),
        clock.to_string(),
    );
    title_bar.render(frame, title_area);

    if let Some(stats) = app.stats {
        SystemStatsBar::new(stats).render(frame, stats_area);
    }

    let mut shell_panel = ShellPanel::new(
        app.shell.buffer.screen(),
        &app.shell.status,
        &app.shell_command,
    );
    shell_panel.render(frame, shell_area);

    let hints = Line::from(vec![Span::styled(
        HINTS,
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
    )]);
    frame.render_widget(hints, hint_area);
}

/// `"running (pty)"` while a session is live, the bare status otherwise.
fn shell_label(app: &App) -> String {
    match (&app.shell.status, app.shell.backend) {
        (ShellStatus::Running, Some(backend)) => format!("running ({backend})"),
        (status, _) => status.to_string(),
    }
}
