//! vt100 screen → ratatui lines.
//!
//! The display buffer keeps a full terminal emulator fed with every output
//! chunk. This module only reads its cells: colours and attributes become a
//! ratatui `Style`, and runs of equally styled cells are batched into spans.
//! Cells left at the terminal's default colour get no colour at all, so the
//! panel's own green-on-black shows through.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use vt100::{Color as VtColor, Screen};

/// Which screen rows the panel can show and whether the cursor is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub first_row: u16,
    pub rows: u16,
    pub cols: u16,
    pub show_cursor: bool,
}

impl Viewport {
    /// The bottom `height` rows of the used part of the screen, so the
    /// cursor and the newest output stay in view on a short panel.
    pub fn fit(screen: &Screen, height: u16, width: u16, show_cursor: bool) -> Self {
        let (screen_rows, screen_cols) = screen.size();
        let rows = height.min(screen_rows);
        let (cursor_row, _) = screen.cursor_position();
        let used = cursor_row.max(last_written_row(screen)) + 1;
        Self {
            first_row: used.saturating_sub(rows),
            rows,
            cols: width.min(screen_cols),
            show_cursor: show_cursor && !screen.hide_cursor(),
        }
    }
}

fn last_written_row(screen: &Screen) -> u16 {
    let (rows, cols) = screen.size();
    (0..rows)
        .rev()
        .find(|&row| {
            (0..cols).any(|col| screen.cell(row, col).is_some_and(|c| c.has_contents()))
        })
        .unwrap_or(0)
}

pub fn render_lines(screen: &Screen, view: Viewport) -> Vec<Line<'static>> {
    let (cursor_row, cursor_col) = screen.cursor_position();

    let mut lines = Vec::with_capacity(view.rows as usize);
    for row in view.first_row..view.first_row + view.rows {
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut run = String::new();
        let mut run_style: Option<Style> = None;

        for col in 0..view.cols {
            let Some(cell) = screen.cell(row, col) else {
                continue;
            };
            if cell.is_wide_continuation() {
                continue;
            }

            let mut style = style_for_cell(cell);
            if view.show_cursor && row == cursor_row && col == cursor_col {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let content = if cell.has_contents() {
                cell.contents()
            } else {
                " ".into()
            };

            match run_style {
                Some(current) if current == style => {}
                Some(current) => {
                    spans.push(Span::styled(std::mem::take(&mut run), current));
                    run_style = Some(style);
                }
                None => run_style = Some(style),
            }
            run.push_str(&content);
        }

        if let Some(style) = run_style {
            spans.push(Span::styled(run, style));
        }
        lines.push(Line::from(spans));
    }
    lines
}

fn style_for_cell(cell: &vt100::Cell) -> Style {
    let mut style = Style::default();
    if let Some(fg) = map_color(cell.fgcolor()) {
        style = style.fg(fg);
    }
    if let Some(bg) = map_color(cell.bgcolor()) {
        style = style.bg(bg);
    }

    if cell.bold() {
        style = style.add_modifier(Modifier::BOLD);
    }
    if cell.dim() {
        style = style.add_modifier(Modifier::DIM);
    }
    if cell.italic() {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if cell.underline() {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if cell.inverse() {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

/// `None` for the default colour. The 16 base indices map to ratatui's
/// named colours so the user's terminal palette applies.
fn map_color(color: VtColor) -> Option<Color> {
    let color = match color {
        VtColor::Default => return None,
        VtColor::Idx(idx) => match idx {
            0 => Color::Black,
            1 => Color::Red,
            2 => Color::Green,
            3 => Color::Yellow,
            4 => Color::Blue,
            5 => Color::Magenta,
            6 => Color::Cyan,
            7 => Color::Gray,
            8 => Color::DarkGray,
            9 => Color::LightRed,
            10 => Color::LightGreen,
            11 => Color::LightYellow,
            12 => Color::LightBlue,
            13 => Color::LightMagenta,
            14 => Color::LightCyan,
            15 => Color::White,
            idx => Color::Indexed(idx),
        },
        VtColor::Rgb(r, g, b) => Color::Rgb(r, g, b),
    };
    Some(color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::DisplayBuffer;

    fn buffer(text: &str) -> DisplayBuffer {
        let mut buffer = DisplayBuffer::new();
        buffer.append(text);
        buffer
    }

    fn text_of(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.to_string().trim_end().to_string())
            .collect()
    }

    #[test]
    fn test_viewport_follows_cursor() {
        let buffer = buffer("a\r\nb\r\nc\r\nd\r\n$ ");
        let view = Viewport::fit(buffer.screen(), 2, 40, true);
        assert_eq!(view.first_row, 3);
        assert_eq!(view.rows, 2);
        assert_eq!(text_of(&render_lines(buffer.screen(), view)), vec!["d", "$"]);
    }

    #[test]
    fn test_viewport_on_tall_panel_starts_at_top() {
        let buffer = buffer("$ ");
        let view = Viewport::fit(buffer.screen(), 40, 200, false);
        assert_eq!(view.first_row, 0);
        assert_eq!(view.rows, 24);
        assert_eq!(view.cols, 80);
    }

    #[test]
    fn test_colours_and_attributes() {
        let buffer = buffer("\x1b[1;34mdir\x1b[0m \x1b[38;5;208mx\x1b[38;2;1;2;3my\x1b[7mz");
        let view = Viewport::fit(buffer.screen(), 1, 10, false);
        let lines = render_lines(buffer.screen(), view);
        let spans = &lines[0].spans;

        assert_eq!(spans[0].content, "dir");
        assert_eq!(spans[0].style.fg, Some(Color::Blue));
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[1].content, " ");
        assert_eq!(spans[1].style, Style::default());
        assert_eq!(spans[2].style.fg, Some(Color::Indexed(208)));
        assert_eq!(spans[3].style.fg, Some(Color::Rgb(1, 2, 3)));
        assert!(spans[4].style.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_cursor_cell_is_reversed() {
        let buffer = buffer("$ ");
        let view = Viewport::fit(buffer.screen(), 1, 4, true);
        let lines = render_lines(buffer.screen(), view);
        let cursor = lines[0]
            .spans
            .iter()
            .find(|s| s.style.add_modifier.contains(Modifier::REVERSED))
            .expect("cursor span");
        assert_eq!(cursor.content, " ");

        let hidden = Viewport::fit(buffer.screen(), 1, 4, false);
        let lines = render_lines(buffer.screen(), hidden);
        assert!(lines[0].spans.iter().all(|s| s.style.add_modifier.is_empty()));
    }

    #[test]
    fn test_cursor_moves_and_erase_apply() {
        let buffer = buffer("hello\rJ\x1b[K\r\nab\x08X");
        let view = Viewport::fit(buffer.screen(), 2, 10, false);
        assert_eq!(text_of(&render_lines(buffer.screen(), view)), vec!["J", "aX"]);
    }

    #[test]
    fn test_wide_characters_take_one_span_slot() {
        let buffer = buffer("日本");
        let view = Viewport::fit(buffer.screen(), 1, 6, false);
        assert_eq!(text_of(&render_lines(buffer.screen(), view)), vec!["日本"]);
    }
}
