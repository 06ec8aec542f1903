//! # Application State
//!
//! Core state for Termyte. Domain data only; presentation state (scroll,
//! redraw flags) lives in the `tui` module.
//!
//! ```text
//! App
//! ├── shell: ShellPanelState     // display buffer + session status
//! ├── chatpad: ChatpadStatus     // external keypad presence
//! ├── stats: Option<SystemStats> // host figures, None when the bar is off
//! ├── shell_command: String      // resolved shell program
//! └── status_message: String     // status bar text
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::fmt;

use crate::core::config::ResolvedConfig;

/// Rows of the shell's terminal. The pty is opened at this size and the
/// display buffer's screen emulates the same grid.
pub const SCREEN_ROWS: u16 = 24;
pub const SCREEN_COLS: u16 = 80;

/// Counts shell sessions. Every opened session gets the next number, and
/// every action it sends carries it.
pub type Generation = u64;

/// Generation of the session opened at startup.
pub const FIRST_GENERATION: Generation = 1;

/// Decoded shell output.
///
/// Keeps the raw transcript (escapes verbatim) and feeds every chunk through
/// a terminal emulator, so colours and cursor moves survive no matter where
/// in the stream they were set. Append-only during normal operation; `reset`
/// is reserved for a full session restart.
pub struct DisplayBuffer {
    text: String,
    terminal: vt100::Parser,
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            terminal: vt100::Parser::new(SCREEN_ROWS, SCREEN_COLS, 0),
        }
    }

    pub fn append(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        self.terminal.process(chunk.as_bytes());
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The emulated screen after everything appended so far.
    pub fn screen(&self) -> &vt100::Screen {
        self.terminal.screen()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DisplayBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayBuffer")
            .field("len", &self.text.len())
            .field("cursor", &self.terminal.screen().cursor_position())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellStatus {
    /// Shell panel turned off in config or on the command line.
    Disabled,
    Starting,
    Running,
    /// The shell exited on its own. Manual restart only.
    Ended,
    /// Session creation or I/O failed; panel left inert.
    Failed(String),
}

impl fmt::Display for ShellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellStatus::Disabled => write!(f, "off"),
            ShellStatus::Starting => write!(f, "starting"),
            ShellStatus::Running => write!(f, "running"),
            ShellStatus::Ended => write!(f, "session ended"),
            ShellStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatpadStatus {
    Absent,
    Connected(String),
    Disconnected,
}

impl fmt::Display for ChatpadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatpadStatus::Absent => write!(f, "none"),
            ChatpadStatus::Connected(name) => write!(f, "{name}"),
            ChatpadStatus::Disconnected => write!(f, "unplugged"),
        }
    }
}

/// Host figures for the stats bar, refreshed on the clock tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemStats {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    /// Totals across all interfaces since boot.
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

#[derive(Debug)]
pub struct ShellPanelState {
    pub buffer: DisplayBuffer,
    pub status: ShellStatus,
    /// Session whose events the panel accepts. Anything older is stale.
    pub generation: Generation,
    /// Which session variant is live (`"pty"` or `"pipe"`).
    pub backend: Option<&'static str>,
    pub pid: Option<u32>,
}

impl ShellPanelState {
    pub fn new(enabled: bool) -> Self {
        Self {
            buffer: DisplayBuffer::new(),
            status: if enabled {
                ShellStatus::Starting
            } else {
                ShellStatus::Disabled
            },
            backend: None,
            pid: None,
            generation: FIRST_GENERATION,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == ShellStatus::Running
    }
}

pub struct App {
    pub shell: ShellPanelState,
    pub chatpad: ChatpadStatus,
    pub stats: Option<SystemStats>,
    pub shell_command: String,
    pub status_message: String,
}

impl App {
    pub fn new(shell_command: String, shell_enabled: bool) -> Self {
        Self {
            shell: ShellPanelState::new(shell_enabled),
            chatpad: ChatpadStatus::Absent,
            stats: None,
            shell_command,
            status_message: String::from("Welcome to Termyte!"),
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        let mut app = Self::new(config.shell_command.clone(), config.shell_enabled);
        if config.system_stats_enabled {
            app.stats = Some(SystemStats::default());
        }
        app
    }
}
