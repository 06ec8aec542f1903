//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::chatpad::{EventSource, InputDevice, RawInputEvent};
use crate::core::action::{Action, update};
use crate::core::state::{App, FIRST_GENERATION};

/// How long `next_action` waits before giving up.
const ACTION_TIMEOUT: Duration = Duration::from_secs(2);

/// A freshly started App: shell enabled, session not up yet.
pub fn test_app() -> App {
    App::new("/bin/sh".to_string(), true)
}

/// An App whose pty session has reported in.
pub fn running_app() -> App {
    let mut app = test_app();
    update(
        &mut app,
        Action::ShellStarted {
            generation: FIRST_GENERATION,
            backend: "pty",
            pid: Some(4242),
        },
    );
    app
}

/// Event source fed from a channel. Dropping the sender unplugs it.
pub struct ChannelSource {
    events: UnboundedReceiver<RawInputEvent>,
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn next_event(&mut self) -> io::Result<RawInputEvent> {
        self.events
            .recv()
            .await
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "device removed"))
    }
}

/// A fake chatpad plus the handle that types on it.
pub fn channel_device(name: &str) -> (UnboundedSender<RawInputEvent>, InputDevice) {
    let (tx, events) = unbounded_channel();
    (tx, InputDevice::from_source(name, ChannelSource { events }))
}

/// Next action on the sink, or `None` if it closed or nothing came in time.
pub async fn next_action(rx: &mut UnboundedReceiver<Action>) -> Option<Action> {
    tokio::time::timeout(ACTION_TIMEOUT, rx.recv()).await.ok().flatten()
}

/// True if nothing arrives on the sink within `window`.
pub async fn no_action_within(rx: &mut UnboundedReceiver<Action>, window: Duration) -> bool {
    match tokio::time::timeout(window, rx.recv()).await {
        Err(_) => true,
        Ok(None) => true,
        Ok(Some(_)) => false,
    }
}
