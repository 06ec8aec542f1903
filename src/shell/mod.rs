//! Shell sessions behind the console's main panel.
//!
//! A session owns one child shell and a read loop that pushes its output
//! into the event sink. Key events go the other way through
//! [`ShellSession::send`], encoded by [`encode_key`].
//!
//! Two variants exist: a pseudo-terminal session (the normal case) and a
//! pipe session for hosts without `/dev/ptmx`. [`ShellBackend::probe`]
//! picks one at startup and [`ShellLauncher`] builds it.

mod decode;
pub mod encode;
mod pipe;
#[cfg(unix)]
mod pty;
mod session;

pub use decode::Utf8Decoder;
pub use encode::encode_key;
pub use pipe::PipeSession;
#[cfg(unix)]
pub use pty::PtySession;
pub use session::{
    OutputRelay, READ_CHUNK, SessionError, SessionOutcome, SessionStatus, ShellBackend,
    ShellLauncher, ShellSession,
};
