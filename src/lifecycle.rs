//! # Lifecycle
//!
//! Owns the two background components, the chatpad listener and the shell
//! session, and is the only place that starts or stops them.
//!
//! ```text
//! Lifecycle::new(config)
//!     ├── KeyMapping::load(keymap_path)
//!     ├── find_device(device_name)      → InputListener
//!     └── ShellLauncher::from_config    → ShellSession (on start)
//! ```
//!
//! Failures in either component are logged and reported through the event
//! sink; the affected panel goes inert and the other keeps running.
//! `shutdown()` stops both and waits for both, whatever triggered it.
//!
//! Each opened session is numbered. The first is [`FIRST_GENERATION`] and
//! every restart takes the next one, the same count `update()` keeps on
//! `RestartShell`.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::chatpad::{InputListener, KeyMapping, find_device};
use crate::core::action::{Action, EventSink};
use crate::core::config::ResolvedConfig;
use crate::core::key::KeyEvent;
use crate::core::state::{FIRST_GENERATION, Generation};
use crate::shell::{ShellLauncher, ShellSession};

pub struct Lifecycle {
    listener: InputListener,
    launcher: Option<ShellLauncher>,
    shell: Option<Box<dyn ShellSession>>,
    next_generation: Generation,
    sink: EventSink,
}

impl Lifecycle {
    /// Probe everything once: keymap, chatpad, shell backend.
    pub fn new(config: &ResolvedConfig, sink: EventSink) -> Self {
        let (device, keymap) = if config.chatpad_enabled {
            let keymap = KeyMapping::load(&config.keymap_path);
            let device = find_device(&config.device_name);
            if device.is_none() {
                info!("No input device matching '{}'", config.device_name);
            }
            (device, keymap)
        } else {
            debug!("Chatpad disabled");
            (None, KeyMapping::empty())
        };
        let listener = InputListener::new(device, Arc::new(keymap), sink.clone());

        let launcher = config
            .shell_enabled
            .then(|| ShellLauncher::from_config(config));

        Self::from_parts(listener, launcher, sink)
    }

    /// Assemble from already-built pieces. `launcher: None` disables the
    /// shell panel.
    pub fn from_parts(
        listener: InputListener,
        launcher: Option<ShellLauncher>,
        sink: EventSink,
    ) -> Self {
        Self {
            listener,
            launcher,
            shell: None,
            next_generation: FIRST_GENERATION,
            sink,
        }
    }

    pub fn listener(&self) -> &InputListener {
        &self.listener
    }

    pub fn shell(&self) -> Option<&dyn ShellSession> {
        self.shell.as_deref()
    }

    /// Start the listener and open the shell. Neither depends on the other.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if let Err(e) = self.listener.start() {
            warn!("Chatpad listener failed to start: {}", e);
        }
        self.open_shell();
    }

    /// Forward a key to the live session. Write failures are logged; the
    /// session's own read loop reports it if the child is gone.
    pub async fn send_to_shell(&mut self, key: &KeyEvent) {
        let Some(shell) = self.shell.as_mut() else {
            debug!("No shell session, dropping {}", key);
            return;
        };
        if let Err(e) = shell.send(key).await {
            warn!("{}", e);
        }
    }

    /// Close whatever session exists and open a fresh one.
    pub async fn restart_shell(&mut self) {
        if self.launcher.is_none() {
            return;
        }
        if let Some(mut shell) = self.shell.take() {
            shell.close().await;
        }
        info!("Restarting shell");
        self.open_shell();
    }

    /// Stop the listener and close the shell, concurrently, and wait for
    /// both. Safe to call more than once.
    pub async fn shutdown(&mut self) {
        let shell = self.shell.as_mut();
        tokio::join!(self.listener.stop(), async move {
            if let Some(shell) = shell {
                shell.close().await;
            }
        });
        self.shell = None;
        info!("Lifecycle shut down");
    }

    fn open_shell(&mut self) {
        let Some(launcher) = self.launcher.as_ref() else {
            return;
        };
        let generation = self.next_generation;
        self.next_generation += 1;
        match launcher.open(generation, self.sink.clone()) {
            Ok(shell) => {
                let _ = self.sink.send(Action::ShellStarted {
                    generation,
                    backend: shell.backend(),
                    pid: shell.pid(),
                });
                self.shell = Some(shell);
            }
            Err(e) => {
                warn!("{}", e);
                let _ = self.sink.send(Action::ShellFailed {
                    generation,
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Best effort only, for paths that never reach `shutdown()` (a panic in
/// the UI loop). Field drops abort the tasks without awaiting them.
impl Drop for Lifecycle {
    fn drop(&mut self) {
        if self.shell.is_some() || self.listener.has_task() {
            debug!("Lifecycle dropped without shutdown, aborting tasks");
        }
    }
}
