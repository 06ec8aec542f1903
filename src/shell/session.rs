use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::watch;

use super::decode::Utf8Decoder;
use crate::core::action::{Action, EventSink};
use crate::core::config::ResolvedConfig;
use crate::core::key::KeyEvent;
use crate::core::state::Generation;

/// Upper bound on bytes taken from the child per read.
pub const READ_CHUNK: usize = 1024;

/// Errors surfaced by shell sessions.
///
/// A shell that exits is *not* an error; it shows up as
/// `SessionStatus::Ended` and a single `Action::ShellEnded`.
#[derive(Debug)]
pub enum SessionError {
    /// Pty/process allocation failed. Fatal to session creation.
    Spawn(String),
    /// Writing to the child failed (usually: it just died).
    Write(io::Error),
    /// The requested backend does not exist on this host.
    Unsupported(&'static str),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Spawn(msg) => write!(f, "failed to start shell: {msg}"),
            SessionError::Write(e) => write!(f, "failed to write to shell: {e}"),
            SessionError::Unsupported(what) => write!(f, "{what} is not supported on this host"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Write(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    /// The child closed its end of the stream.
    Ended,
    /// Reading from the child failed.
    Failed,
    /// `close()` was called.
    Closed,
}

impl SessionStatus {
    /// Whether writes should still reach the child.
    pub fn accepts_input(self) -> bool {
        self == SessionStatus::Running
    }
}

/// One running shell, whatever is underneath it.
///
/// Output never comes back through this trait: the session's read loop
/// pushes it into the event sink as `Action::ShellOutput`, tagged with the
/// generation the session was opened with.
#[async_trait]
pub trait ShellSession: Send {
    /// Short backend name (`"pty"`, `"pipe"`).
    fn backend(&self) -> &'static str;

    fn pid(&self) -> Option<u32>;

    fn status(&self) -> SessionStatus;

    /// Forward a key to the child. Keys with no byte encoding are ignored.
    /// On a session that is no longer running this is a no-op returning `Ok`.
    async fn send(&mut self, key: &KeyEvent) -> Result<(), SessionError>;

    /// Stop the read loop, wait for it, and release the child and its
    /// descriptors. Idempotent.
    async fn close(&mut self);
}

/// Which session variant to build. Probed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellBackend {
    /// Pseudo-terminal: full interactive shell.
    Pty,
    /// Plain pipes, for hosts without a pty device.
    Pipe,
}

impl ShellBackend {
    pub fn probe() -> Self {
        if cfg!(unix) && Path::new("/dev/ptmx").exists() {
            ShellBackend::Pty
        } else {
            ShellBackend::Pipe
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShellBackend::Pty => "pty",
            ShellBackend::Pipe => "pipe",
        }
    }
}

impl FromStr for ShellBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pty" => Ok(ShellBackend::Pty),
            "pipe" => Ok(ShellBackend::Pipe),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ShellBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything needed to (re)open the shell panel's session.
#[derive(Debug, Clone)]
pub struct ShellLauncher {
    pub backend: ShellBackend,
    pub command: String,
    pub poll_interval: Duration,
    pub term: Option<String>,
}

impl ShellLauncher {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        let backend = config.shell_backend.unwrap_or_else(ShellBackend::probe);
        info!("Shell backend: {} ({})", backend, config.shell_command);
        Self {
            backend,
            command: config.shell_command.clone(),
            poll_interval: config.poll_interval,
            term: config.term.clone(),
        }
    }

    /// Spawn the shell and its read loop. Requires a tokio runtime.
    pub fn open(
        &self,
        generation: Generation,
        sink: EventSink,
    ) -> Result<Box<dyn ShellSession>, SessionError> {
        let relay = OutputRelay::new(sink, generation);
        match self.backend {
            #[cfg(unix)]
            ShellBackend::Pty => Ok(Box::new(super::pty::PtySession::open(
                &self.command,
                self.term.as_deref(),
                self.poll_interval,
                relay,
            )?)),
            #[cfg(not(unix))]
            ShellBackend::Pty => Err(SessionError::Unsupported("pty backend")),
            ShellBackend::Pipe => Ok(Box::new(super::pipe::PipeSession::open(
                &self.command,
                self.term.as_deref(),
                relay,
            )?)),
        }
    }
}

/// How a read loop finished.
#[derive(Debug)]
pub enum SessionOutcome {
    Ended,
    Failed(io::Error),
}

/// The read-loop half shared by every backend: decode, forward, and report
/// the end of the session exactly once.
pub struct OutputRelay {
    decoder: Utf8Decoder,
    sink: EventSink,
    generation: Generation,
    status: watch::Sender<SessionStatus>,
}

impl OutputRelay {
    pub fn new(sink: EventSink, generation: Generation) -> Self {
        let (status, _) = watch::channel(SessionStatus::Running);
        Self {
            decoder: Utf8Decoder::new(),
            sink,
            generation,
            status,
        }
    }

    /// Live view of the session status this relay publishes.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    fn output(&self, chunk: String) -> Action {
        Action::ShellOutput {
            generation: self.generation,
            chunk,
        }
    }

    /// Decode `bytes` and forward them. Returns `false` once nobody is
    /// listening any more.
    pub fn relay(&mut self, bytes: &[u8]) -> bool {
        let text = self.decoder.decode(bytes);
        if text.is_empty() {
            return true;
        }
        self.sink.send(self.output(text)).is_ok()
    }

    /// Publish the final status and notify the UI. Consumes the relay so it
    /// cannot happen twice.
    pub fn finish(mut self, outcome: SessionOutcome) {
        let tail = self.decoder.finish();
        if !tail.is_empty() {
            let _ = self.sink.send(self.output(tail));
        }
        let (status, action) = match outcome {
            SessionOutcome::Ended => {
                info!("Shell exited");
                let generation = self.generation;
                (SessionStatus::Ended, Action::ShellEnded { generation })
            }
            SessionOutcome::Failed(e) => {
                warn!("Shell read failed: {}", e);
                let action = Action::ShellFailed {
                    generation: self.generation,
                    reason: e.to_string(),
                };
                (SessionStatus::Failed, action)
            }
        };
        self.status.send_replace(status);
        if self.sink.send(action).is_err() {
            debug!("Event sink closed before shell end was reported");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::action::event_channel;

    #[test]
    fn test_backend_names_parse() {
        assert_eq!("pty".parse::<ShellBackend>(), Ok(ShellBackend::Pty));
        assert_eq!(" PIPE ".parse::<ShellBackend>(), Ok(ShellBackend::Pipe));
        assert_eq!("auto".parse::<ShellBackend>(), Err(()));
        assert_eq!(ShellBackend::Pty.to_string(), "pty");
    }

    #[test]
    fn test_backend_detection_matches_host() {
        let expected = if cfg!(unix) && Path::new("/dev/ptmx").exists() {
            ShellBackend::Pty
        } else {
            ShellBackend::Pipe
        };
        assert_eq!(ShellBackend::probe(), expected);
    }

    fn output(generation: Generation, chunk: &str) -> Action {
        Action::ShellOutput {
            generation,
            chunk: chunk.to_string(),
        }
    }

    #[test]
    fn test_relay_forwards_decoded_chunks() {
        let (sink, mut rx) = event_channel();
        let mut relay = OutputRelay::new(sink, 3);
        let status = relay.subscribe();
        assert!(relay.relay(b"\x1b[31mred\x1b[0m"));
        assert!(relay.relay(&"é".as_bytes()[..1]));
        assert!(relay.relay(&"é".as_bytes()[1..]));
        assert_eq!(rx.try_recv().unwrap(), output(3, "\x1b[31mred\x1b[0m"));
        assert_eq!(rx.try_recv().unwrap(), output(3, "é"));
        assert!(rx.try_recv().is_err());
        assert_eq!(*status.borrow(), SessionStatus::Running);
    }

    #[test]
    fn test_relay_reports_closed_sink() {
        let (sink, rx) = event_channel();
        let mut relay = OutputRelay::new(sink, 1);
        drop(rx);
        assert!(!relay.relay(b"lost"));
    }

    #[test]
    fn test_finish_ended_reports_once() {
        let (sink, mut rx) = event_channel();
        let relay = OutputRelay::new(sink, 2);
        let status = relay.subscribe();
        relay.finish(SessionOutcome::Ended);
        assert_eq!(*status.borrow(), SessionStatus::Ended);
        assert_eq!(rx.try_recv().unwrap(), Action::ShellEnded { generation: 2 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_finish_failed_flushes_tail() {
        let (sink, mut rx) = event_channel();
        let mut relay = OutputRelay::new(sink, 1);
        let status = relay.subscribe();
        relay.relay(b"\xe2\x82");
        relay.finish(SessionOutcome::Failed(io::Error::other("boom")));
        assert_eq!(*status.borrow(), SessionStatus::Failed);
        assert_eq!(rx.try_recv().unwrap(), output(1, "\u{FFFD}"));
        assert_eq!(
            rx.try_recv().unwrap(),
            Action::ShellFailed {
                generation: 1,
                reason: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_error_display() {
        let e = SessionError::Spawn("out of ptys".to_string());
        assert_eq!(e.to_string(), "failed to start shell: out of ptys");
        let e = SessionError::Write(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(e.to_string().starts_with("failed to write to shell"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn test_only_running_accepts_input() {
        assert!(SessionStatus::Running.accepts_input());
        assert!(!SessionStatus::Ended.accepts_input());
        assert!(!SessionStatus::Failed.accepts_input());
        assert!(!SessionStatus::Closed.accepts_input());
    }
}
