//! # Actions
//!
//! Everything that can happen in Termyte becomes an `Action`.
//! Chatpad key pressed? That's `Action::Key(event)`.
//! Shell printed something? That's `Action::ShellOutput { .. }`.
//!
//! Shell events carry the [`Generation`] of the session that sent them. A
//! restart bumps the panel's generation before the new session exists, so
//! whatever the old read loop queued in the meantime is dropped.
//!
//! Background tasks never touch `App` directly. They push actions into the
//! [`EventSink`], and the TUI loop feeds them through `update()` one at a
//! time. The sink is the only synchronization point in the app.
//!
//! ```text
//! State + Action  →  update()  →  New State (+ Effect)
//! ```
//!
//! `update()` does no I/O. When something must happen outside the state
//! (write to the shell, restart it, quit) it returns an `Effect` and the
//! caller carries it out.

use log::{debug, info};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::core::key::KeyEvent;
use crate::core::state::{App, ChatpadStatus, Generation, ShellStatus, SystemStats};

/// Where background tasks deliver their events.
pub type EventSink = UnboundedSender<Action>;

/// Creates the sink and the receiving end drained by the UI loop.
pub fn event_channel() -> (EventSink, UnboundedReceiver<Action>) {
    tokio::sync::mpsc::unbounded_channel()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A logical key from the chatpad or the keyboard.
    Key(KeyEvent),
    ShellStarted {
        generation: Generation,
        backend: &'static str,
        pid: Option<u32>,
    },
    /// Decoded output chunk; the shell panel must re-render.
    ShellOutput {
        generation: Generation,
        chunk: String,
    },
    /// The shell closed its end. Sent at most once per session.
    ShellEnded { generation: Generation },
    ShellFailed {
        generation: Generation,
        reason: String,
    },
    /// Fresh host figures for the stats bar.
    StatsSampled(SystemStats),
    ChatpadConnected(String),
    ChatpadDisconnected,
    RestartShell,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Quit,
    SendToShell(KeyEvent),
    RestartShell,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Key(key) => {
            if app.shell.is_running() {
                Effect::SendToShell(key)
            } else {
                debug!("Dropping key {} (shell {})", key, app.shell.status);
                Effect::None
            }
        }
        Action::ShellStarted {
            generation,
            backend,
            pid,
        } => {
            if !accept_generation(app, generation) {
                return Effect::None;
            }
            app.shell.status = ShellStatus::Running;
            app.shell.backend = Some(backend);
            app.shell.pid = pid;
            app.status_message = format!("Shell: {}", app.shell_command);
            Effect::None
        }
        Action::ShellOutput { generation, chunk } => {
            if accept_generation(app, generation) {
                app.shell.buffer.append(&chunk);
            }
            Effect::None
        }
        Action::ShellEnded { generation } => {
            if !accept_generation(app, generation) {
                return Effect::None;
            }
            info!("Shell session ended");
            app.shell.status = ShellStatus::Ended;
            app.shell.pid = None;
            app.status_message = "Session ended. Ctrl+R restarts the shell".to_string();
            Effect::None
        }
        Action::ShellFailed { generation, reason } => {
            if !accept_generation(app, generation) {
                return Effect::None;
            }
            app.status_message = format!("Shell error: {reason}");
            app.shell.status = ShellStatus::Failed(reason);
            app.shell.pid = None;
            Effect::None
        }
        Action::StatsSampled(stats) => {
            if app.stats.is_some() {
                app.stats = Some(stats);
            }
            Effect::None
        }
        Action::ChatpadConnected(name) => {
            app.status_message = format!("Chatpad connected: {name}");
            app.chatpad = ChatpadStatus::Connected(name);
            Effect::None
        }
        Action::ChatpadDisconnected => {
            app.chatpad = ChatpadStatus::Disconnected;
            app.status_message = "Chatpad disconnected".to_string();
            Effect::None
        }
        Action::RestartShell => {
            if app.shell.status == ShellStatus::Disabled {
                return Effect::None;
            }
            app.shell.buffer.reset();
            app.shell.generation += 1;
            app.shell.status = ShellStatus::Starting;
            app.shell.backend = None;
            app.shell.pid = None;
            Effect::RestartShell
        }
        Action::Quit => Effect::Quit,
    }
}

/// Whether an event from session `generation` still belongs to the panel.
/// A newer generation than expected is adopted; an older one is stale.
fn accept_generation(app: &mut App, generation: Generation) -> bool {
    if generation < app.shell.generation {
        debug!(
            "Dropping event from shell session {} (current {})",
            generation, app.shell.generation
        );
        return false;
    }
    app.shell.generation = generation;
    true
}
