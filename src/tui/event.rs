use crossterm::event::{Event, KeyCode, KeyEvent as TermKey, KeyEventKind, KeyModifiers};

use crate::core::key::KeyEvent;

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq)]
pub enum TuiEvent {
    // Handled by the TUI itself
    Quit,
    RestartShell,
    Resize,

    // Passed to core::update as Action::Key
    Key(KeyEvent),
}

/// Translate one crossterm event. `None` for anything the console ignores
/// (mouse, focus, key releases).
pub fn map_event(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => map_key(key),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        Event::Paste(text) => {
            // Only single characters make sense to the shell one at a time.
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(TuiEvent::Key(KeyEvent::new(c.to_string()))),
                _ => None,
            }
        }
        _ => None,
    }
}

pub fn map_key(key: TermKey) -> Option<TuiEvent> {
    log::debug!("Key event: {:?} with modifiers {:?}", key.code, key.modifiers);
    match (key.modifiers, key.code) {
        // Ctrl+Q quits, Ctrl+R restarts an ended shell
        (KeyModifiers::CONTROL, KeyCode::Char('q')) => Some(TuiEvent::Quit),
        (KeyModifiers::CONTROL, KeyCode::Char('r')) => Some(TuiEvent::RestartShell),
        (m, KeyCode::Char(c)) if m.contains(KeyModifiers::CONTROL) => Some(TuiEvent::Key(
            KeyEvent::new(format!("ctrl+{}", c.to_ascii_lowercase())),
        )),
        (_, KeyCode::Char(' ')) => Some(TuiEvent::Key(KeyEvent::with_character("space", ' '))),
        (_, KeyCode::Char(c)) => Some(TuiEvent::Key(KeyEvent::new(c.to_string()))),
        (_, code) => named_key(code).map(|name| TuiEvent::Key(KeyEvent::new(name))),
    }
}

fn named_key(code: KeyCode) -> Option<&'static str> {
    let name = match code {
        KeyCode::Enter => "enter",
        KeyCode::Tab => "tab",
        KeyCode::Backspace => "backspace",
        KeyCode::Esc => "escape",
        KeyCode::Up => "up",
        KeyCode::Down => "down",
        KeyCode::Left => "left",
        KeyCode::Right => "right",
        KeyCode::Home => "home",
        KeyCode::End => "end",
        KeyCode::PageUp => "pageup",
        KeyCode::PageDown => "pagedown",
        KeyCode::Delete => "delete",
        _ => return None,
    };
    Some(name)
}
