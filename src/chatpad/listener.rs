//! Chatpad input listener.
//!
//! Owns the discovered device, reads its raw events on a background task,
//! and turns key presses into [`KeyEvent`]s for the UI.
//!
//! ```text
//! Stopped ──start()──► Starting ──► Running ──stop()──► Stopping ──► Stopped
//!    ▲                                  │
//!    └──────── device gone ─────────────┘
//! ```
//!
//! Only press transitions count. Releases, autorepeat and non-key events
//! are ignored, and so are scancodes the keymap doesn't know.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use super::keymap::KeyMapping;
use crate::core::action::{Action, EventSink};
use crate::core::key::KeyEvent;

/// `EV_KEY` from the Linux input event codes.
pub const EV_KEY: u16 = 0x01;
pub const KEY_RELEASE: i32 = 0;
pub const KEY_PRESS: i32 = 1;
pub const KEY_REPEAT: i32 = 2;

/// A device event stripped down to what translation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInputEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl RawInputEvent {
    pub fn key(code: u16, value: i32) -> Self {
        Self {
            kind: EV_KEY,
            code,
            value,
        }
    }

    pub fn is_key_press(&self) -> bool {
        self.kind == EV_KEY && self.value == KEY_PRESS
    }
}

#[cfg(target_os = "linux")]
impl From<evdev::InputEvent> for RawInputEvent {
    fn from(event: evdev::InputEvent) -> Self {
        Self {
            kind: event.event_type().0,
            code: event.code(),
            value: event.value(),
        }
    }
}

/// An asynchronous, unending sequence of device events.
///
/// `next_event` suspends until an event is available. An error means the
/// sequence is over (typically the device was unplugged).
#[async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> io::Result<RawInputEvent>;
}

#[cfg(target_os = "linux")]
#[async_trait]
impl EventSource for evdev::EventStream {
    async fn next_event(&mut self) -> io::Result<RawInputEvent> {
        evdev::EventStream::next_event(self)
            .await
            .map(RawInputEvent::from)
    }
}

enum DeviceHandle {
    #[cfg(target_os = "linux")]
    Evdev(evdev::Device),
    /// Already-open event source (replays, tests).
    Source(Box<dyn EventSource>),
}

/// A discovered input device. Opened and consumed by [`InputListener::start`].
pub struct InputDevice {
    name: String,
    path: PathBuf,
    handle: DeviceHandle,
}

impl InputDevice {
    #[cfg(target_os = "linux")]
    pub(crate) fn from_evdev(name: String, path: PathBuf, device: evdev::Device) -> Self {
        Self {
            name,
            path,
            handle: DeviceHandle::Evdev(device),
        }
    }

    pub fn from_source(name: impl Into<String>, source: impl EventSource + 'static) -> Self {
        Self {
            name: name.into(),
            path: PathBuf::new(),
            handle: DeviceHandle::Source(Box::new(source)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(self) -> io::Result<Box<dyn EventSource>> {
        match self.handle {
            #[cfg(target_os = "linux")]
            DeviceHandle::Evdev(device) => Ok(Box::new(device.into_event_stream()?)),
            DeviceHandle::Source(source) => Ok(source),
        }
    }
}

impl fmt::Debug for InputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputDevice")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Translate one raw event. `Some` only for a press of a mapped scancode.
pub fn translate(keymap: &KeyMapping, event: &RawInputEvent) -> Option<KeyEvent> {
    if !event.is_key_press() {
        return None;
    }
    keymap
        .get(event.code)
        .filter(|key| !key.is_empty())
        .map(KeyEvent::new)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

pub struct InputListener {
    device: Option<InputDevice>,
    device_name: Option<String>,
    keymap: Arc<KeyMapping>,
    sink: EventSink,
    task: Option<JoinHandle<()>>,
    state: ListenerState,
}

impl InputListener {
    /// `device` is the discovery result; `None` makes the listener inert.
    pub fn new(device: Option<InputDevice>, keymap: Arc<KeyMapping>, sink: EventSink) -> Self {
        Self {
            device_name: device.as_ref().map(|d| d.name().to_string()),
            device,
            keymap,
            sink,
            task: None,
            state: ListenerState::Stopped,
        }
    }

    /// Current state. A loop that ended on its own (device unplugged)
    /// reads as `Stopped`.
    pub fn state(&self) -> ListenerState {
        match (&self.task, self.state) {
            (Some(task), ListenerState::Running) if task.is_finished() => ListenerState::Stopped,
            (_, state) => state,
        }
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    pub fn has_task(&self) -> bool {
        self.task.is_some()
    }

    /// Open the device and spawn the read loop. Without a device this is a
    /// no-op that leaves the listener `Stopped`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) -> io::Result<()> {
        if self.task.is_some() {
            return Ok(());
        }
        let Some(device) = self.device.take() else {
            debug!("No chatpad device, listener stays inert");
            self.state = ListenerState::Stopped;
            return Ok(());
        };

        self.state = ListenerState::Starting;
        let name = device.name().to_string();
        let source = match device.open() {
            Ok(source) => source,
            Err(e) => {
                warn!("Failed to open chatpad '{}': {}", name, e);
                self.state = ListenerState::Stopped;
                return Err(e);
            }
        };

        info!("Chatpad listener started on '{}'", name);
        if self.sink.send(Action::ChatpadConnected(name.clone())).is_err() {
            debug!("Event sink closed before chatpad connected");
        }
        self.task = Some(tokio::spawn(read_loop(
            source,
            Arc::clone(&self.keymap),
            self.sink.clone(),
            name,
        )));
        self.state = ListenerState::Running;
        Ok(())
    }

    /// Cancel the read loop and wait for it to finish. Safe to call in any
    /// state, any number of times.
    pub async fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            self.state = ListenerState::Stopped;
            return;
        };
        self.state = ListenerState::Stopping;
        task.abort();
        match task.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => warn!("Chatpad listener task failed: {}", e),
        }
        self.state = ListenerState::Stopped;
        debug!("Chatpad listener stopped");
    }
}

impl Drop for InputListener {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn read_loop(
    mut source: Box<dyn EventSource>,
    keymap: Arc<KeyMapping>,
    sink: EventSink,
    name: String,
) {
    loop {
        let event = match source.next_event().await {
            Ok(event) => event,
            Err(e) => {
                info!("Chatpad '{}' event stream ended: {}", name, e);
                let _ = sink.send(Action::ChatpadDisconnected);
                return;
            }
        };

        let Some(key) = translate(&keymap, &event) else {
            continue;
        };
        debug!("Chatpad scancode {} -> {}", event.code, key);
        if sink.send(Action::Key(key)).is_err() {
            debug!("Event sink closed, chatpad listener exiting");
            return;
        }
    }
}
