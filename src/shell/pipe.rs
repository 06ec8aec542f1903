//! Pipe-backed shell session, for hosts without a pty device.
//!
//! The shell runs with plain pipes for stdin/stdout/stderr. It won't see a
//! terminal (no job control, no line editing) but the panel stays usable.
//! Both output pipes feed the same relay, so stderr shows up inline.
//!
//! A pipe has no line discipline, so the read loop puts back the `\r` a tty
//! would add before each `\n`. The child itself is owned by a reaper task
//! that waits on it from the start and kills it on request.

use std::io;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use super::encode::encode_key;
use super::session::{
    OutputRelay, READ_CHUNK, SessionError, SessionOutcome, SessionStatus, ShellSession,
};
use crate::core::key::KeyEvent;

pub struct PipeSession {
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
    /// Dropping or firing this makes the reaper kill the child.
    kill: Option<oneshot::Sender<()>>,
    reaper: Option<JoinHandle<io::Result<ExitStatus>>>,
    reader: Option<JoinHandle<()>>,
    status: watch::Receiver<SessionStatus>,
    closed: bool,
}

impl PipeSession {
    pub fn open(
        command: &str,
        term: Option<&str>,
        relay: OutputRelay,
    ) -> Result<Self, SessionError> {
        let mut cmd = Command::new(command);
        cmd.arg("-i")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(term) = term {
            cmd.env("TERM", term);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| SessionError::Spawn(format!("failed to spawn {command}: {e}")))?;
        let pid = child.id();
        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(SessionError::Spawn("child stdio was not piped".to_string()));
        };
        info!("Spawned {} on pipes (pid {:?})", command, pid);

        let status = relay.subscribe();
        let task = tokio::spawn(read_loop(stdout, stderr, relay));
        let (kill, kill_rx) = oneshot::channel();
        let reaper = tokio::spawn(reap(child, kill_rx));
        Ok(Self {
            pid,
            stdin: Some(stdin),
            kill: Some(kill),
            reaper: Some(reaper),
            reader: Some(task),
            status,
            closed: false,
        })
    }
}

#[async_trait]
impl ShellSession for PipeSession {
    fn backend(&self) -> &'static str {
        "pipe"
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
        let Some(stdin) = self.stdin.as_mut() else {
            return Ok(());
        };
        stdin.write_all(&bytes).await.map_err(SessionError::Write)?;
        stdin.flush().await.map_err(SessionError::Write)
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
                Err(e) => warn!("Pipe read task failed: {}", e),
            }
        }

        self.stdin = None;
        if let Some(kill) = self.kill.take() {
            let _ = kill.send(());
        }
        if let Some(reaper) = self.reaper.take() {
            match reaper.await {
                Ok(Ok(status)) => debug!("Shell reaped: {}", status),
                Ok(Err(e)) => debug!("Failed to reap shell: {}", e),
                Err(e) => warn!("Reaper task failed: {}", e),
            }
        }
        info!("Pipe session closed");
    }
}

impl Drop for PipeSession {
    fn drop(&mut self) {
        if let Some(task) = self.reader.take() {
            task.abort();
        }
        // The reaper sees the kill sender go away and takes the child down.
    }
}

/// Wait for the child, or kill it once `kill` fires or its sender is gone.
async fn reap(mut child: Child, kill: oneshot::Receiver<()>) -> io::Result<ExitStatus> {
    tokio::select! {
        status = child.wait() => status,
        _ = kill => {
            if let Err(e) = child.kill().await {
                debug!("Failed to kill shell: {}", e);
            }
            child.wait().await
        }
    }
}

/// Insert `\r` before every `\n` that lacks one, as a tty's `onlcr` would.
fn with_carriage_returns(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 8);
    let mut prev = 0u8;
    for &b in bytes {
        if b == b'\n' && prev != b'\r' {
            out.push(b'\r');
        }
        out.push(b);
        prev = b;
    }
    out
}

async fn read_loop<O, E>(mut stdout: O, mut stderr: E, mut relay: OutputRelay)
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut out_buf = [0u8; READ_CHUNK];
    let mut err_buf = [0u8; READ_CHUNK];
    let mut stderr_open = true;

    let outcome = loop {
        tokio::select! {
            read = stdout.read(&mut out_buf) => match read {
                Ok(0) => break SessionOutcome::Ended,
                Ok(n) => {
                    if !relay.relay(&with_carriage_returns(&out_buf[..n])) {
                        return;
                    }
                }
                Err(e) => break SessionOutcome::Failed(e),
            },
            read = stderr.read(&mut err_buf), if stderr_open => match read {
                Ok(0) => stderr_open = false,
                Ok(n) => {
                    if !relay.relay(&with_carriage_returns(&err_buf[..n])) {
                        return;
                    }
                }
                Err(e) => {
                    debug!("Shell stderr closed: {}", e);
                    stderr_open = false;
                }
            },
        }
    };

    // Whatever the shell wrote to stderr on its way out.
    if stderr_open {
        loop {
            match stderr.read(&mut err_buf).await {
                Ok(n) if n > 0 => {
                    if !relay.relay(&with_carriage_returns(&err_buf[..n])) {
                        return;
                    }
                }
                _ => break,
            }
        }
    }
    relay.finish(outcome);
}
