//! PTY-backed shell session.
//!
//! Handles the low-level portable-pty integration:
//! - Spawning the shell on the slave side of a fresh pseudo-terminal
//! - Draining the (non-blocking) master side on a tokio task
//! - Writing encoded keys back to the master
//!
//! The master is switched to `O_NONBLOCK`, so a read with nothing pending
//! returns `WouldBlock` and the loop sleeps for the poll interval instead
//! of parking a runtime thread.
//!
//! The child is waited on from a blocking task as soon as it is spawned, so
//! a shell that exits is reaped right away even if nobody closes the session.

use std::io::{self, Read, Write};
use std::os::fd::RawFd;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use portable_pty::{
    Child, ChildKiller, CommandBuilder, ExitStatus, MasterPty, PtySize, native_pty_system,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::encode::encode_key;
use super::session::{
    OutputRelay, READ_CHUNK, SessionError, SessionOutcome, SessionStatus, ShellSession,
};
use crate::core::key::KeyEvent;
use crate::core::state::{SCREEN_COLS, SCREEN_ROWS};

/// 80×24: what a 5" 800×480 panel fits with an 8×16 font.
const PTY_SIZE: PtySize = PtySize {
    rows: SCREEN_ROWS,
    cols: SCREEN_COLS,
    pixel_width: 0,
    pixel_height: 0,
};

/// How long `close` waits for a hung-up shell before SIGKILL.
const REAP_GRACE: Duration = Duration::from_secs(1);

pub struct PtySession {
    pid: Option<u32>,
    writer: Option<Box<dyn Write + Send>>,
    master: Option<Box<dyn MasterPty + Send>>,
    killer: Option<Box<dyn ChildKiller + Send + Sync>>,
    /// Blocking `wait()` on the child; finished once it has been reaped.
    reaper: Option<JoinHandle<io::Result<ExitStatus>>>,
    reader: Option<JoinHandle<()>>,
    status: watch::Receiver<SessionStatus>,
    closed: bool,
}

impl PtySession {
    /// Allocate a pty, start `command` on it, and start relaying its output
    /// into `sink`. Fails only if the pty or the process can't be created.
    pub fn open(
        command: &str,
        term: Option<&str>,
        poll_interval: Duration,
        relay: OutputRelay,
    ) -> Result<Self, SessionError> {
        let pair = native_pty_system()
            .openpty(PTY_SIZE)
            .map_err(|e| SessionError::Spawn(format!("failed to open pty: {e}")))?;

        let fd = pair
            .master
            .as_raw_fd()
            .ok_or_else(|| SessionError::Spawn("pty master has no descriptor".to_string()))?;
        set_nonblocking(fd).map_err(|e| SessionError::Spawn(format!("O_NONBLOCK on pty: {e}")))?;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| SessionError::Spawn(format!("failed to clone pty reader: {e}")))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| SessionError::Spawn(format!("failed to take pty writer: {e}")))?;

        let mut cmd = CommandBuilder::new(command);
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }
        if let Some(term) = term {
            cmd.env("TERM", term);
        }
        let mut child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| SessionError::Spawn(format!("failed to spawn {command}: {e}")))?;
        // Only the child may hold the slave, or EOF never arrives.
        drop(pair.slave);

        let pid = child.process_id();
        info!("Spawned {} on pty (pid {:?})", command, pid);

        let mut session = Self::from_parts(reader, writer, poll_interval, relay);
        session.pid = pid;
        session.master = Some(pair.master);
        session.killer = Some(child.clone_killer());
        session.reaper = Some(tokio::task::spawn_blocking(move || child.wait()));
        Ok(session)
    }

    /// Wire a session around an already-open non-blocking reader and a
    /// writer. `open` uses this with the pty master; tests use socket pairs.
    pub(crate) fn from_parts<R, W>(
        reader: R,
        writer: W,
        poll_interval: Duration,
        relay: OutputRelay,
    ) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let status = relay.subscribe();
        let task = tokio::spawn(read_loop(reader, relay, poll_interval));
        Self {
            pid: None,
            writer: Some(Box::new(writer)),
            master: None,
            killer: None,
            reaper: None,
            reader: Some(task),
            status,
            closed: false,
        }
    }
}

#[async_trait]
impl ShellSession for PtySession {
    fn backend(&self) -> &'static str {
        "pty"
    }

    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn status(&self) -> SessionStatus {
        if self.closed {
            SessionStatus::Closed
        } else {
            *self.status.borrow()
        }
    }

    async fn send(&mut self, key: &KeyEvent) -> Result<(), SessionError> {
        if !self.status().accepts_input() {
            debug!("Shell not running, dropping {}", key);
            return Ok(());
        }
        let Some(bytes) = encode_key(key) else {
            return Ok(());
        };
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writer
            .write_all(&bytes)
            .and_then(|()| writer.flush())
            .map_err(SessionError::Write)
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(task) = self.reader.take() {
            task.abort();
            match task.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => warn!("Pty read task failed: {}", e),
            }
        }

        // Dropping the master hangs up the shell's terminal.
        self.writer = None;
        self.master = None;

        if let Some(mut reaper) = self.reaper.take() {
            if !reaper.is_finished() {
                self.hang_up();
            }
            let reaped = match tokio::time::timeout(REAP_GRACE, &mut reaper).await {
                Ok(reaped) => reaped,
                Err(_) => {
                    warn!("Shell ignored hangup, killing pid {:?}", self.pid);
                    self.force_kill();
                    reaper.await
                }
            };
            match reaped {
                Ok(Ok(status)) => debug!("Shell reaped: {:?}", status),
                Ok(Err(e)) => debug!("Failed to reap shell: {}", e),
                Err(e) => warn!("Reaper task failed: {}", e),
            }
        }
        self.killer = None;
        info!("Pty session closed");
    }
}

impl PtySession {
    /// SIGHUP the shell.
    fn hang_up(&mut self) {
        if let Some(killer) = self.killer.as_mut()
            && let Err(e) = killer.kill()
        {
            debug!("Failed to signal shell: {}", e);
        }
    }

    fn force_kill(&self) {
        let Some(pid) = self.pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
            return;
        };
        // SAFETY: plain signal delivery; the reaper has not collected `pid` yet.
        if unsafe { libc::kill(pid, libc::SIGKILL) } < 0 {
            debug!("Failed to kill shell: {}", io::Error::last_os_error());
        }
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        if let Some(task) = self.reader.take() {
            task.abort();
        }
        // The detached reaper collects the child once the hangup lands.
        if let Some(reaper) = self.reaper.take()
            && !reaper.is_finished()
        {
            self.hang_up();
        }
    }
}

async fn read_loop<R: Read>(mut reader: R, mut relay: OutputRelay, poll_interval: Duration) {
    let mut buf = [0u8; READ_CHUNK];
    let outcome = loop {
        match reader.read(&mut buf) {
            Ok(0) => break SessionOutcome::Ended,
            Ok(n) => {
                if !relay.relay(&buf[..n]) {
                    debug!("Event sink closed, pty read loop exiting");
                    return;
                }
                // Stay cancellable under a steady stream of output.
                tokio::task::yield_now().await;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                tokio::time::sleep(poll_interval).await;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            // Linux reports a hung-up pty (child gone) as EIO rather than EOF.
            Err(e) if e.raw_os_error() == Some(libc::EIO) => break SessionOutcome::Ended,
            Err(e) => break SessionOutcome::Failed(e),
        }
    };
    relay.finish(outcome);
}

fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    // SAFETY: fcntl on a descriptor we own; no memory is passed.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
