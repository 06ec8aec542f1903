//! # TUI Adapter
//!
//! The ratatui-specific layer. Owns the terminal, renders `App`, and turns
//! keyboard events into `core::Action` values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Event Loop
//!
//! One `tokio::select!` over three sources:
//!
//! - **Terminal events** (crossterm `EventStream`): keys become
//!   `Action::Key`, Ctrl+Q and Ctrl+R become `Quit` / `RestartShell`.
//! - **Action channel**: everything the chatpad listener and the shell
//!   session report.
//! - **Clock tick** (1s): keeps the title bar clock current and, when the
//!   stats bar is on, samples the host as `Action::StatsSampled`.
//!
//! Every action goes through `update()`; the returned `Effect` is carried
//! out here against the `Lifecycle`. Pending actions are drained before the
//! next draw, so a burst of shell output costs one frame, not one per chunk.

mod component;
mod components;
mod event;
mod screen;
mod ui;

use std::time::Duration;

use futures::StreamExt;
use log::{debug, info};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc::UnboundedReceiver;

use crossterm::event::EventStream;

use crate::core::action::{Action, Effect, event_channel, update};
use crate::core::config::ResolvedConfig;
use crate::core::state::App;
use crate::lifecycle::Lifecycle;
use crate::stats::StatsSampler;
use crate::tui::event::{TuiEvent, map_event};

const CLOCK_TICK: Duration = Duration::from_secs(1);

pub async fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let mut app = App::from_config(&config);
    let (sink, mut actions) = event_channel();
    let mut lifecycle = Lifecycle::new(&config, sink);

    let mut terminal = ratatui::init();
    lifecycle.start();

    let result = event_loop(&mut terminal, &mut app, &mut lifecycle, &mut actions).await;

    // Both background components go down before the terminal is handed back,
    // whether the loop quit normally or bailed out with an error.
    lifecycle.shutdown().await;
    ratatui::restore();
    info!("Termyte shutting down");
    result
}

async fn event_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    lifecycle: &mut Lifecycle,
    actions: &mut UnboundedReceiver<Action>,
) -> std::io::Result<()> {
    let mut events = EventStream::new();
    let mut clock = tokio::time::interval(CLOCK_TICK);
    let mut sampler = app.stats.is_some().then(StatsSampler::new);
    let mut needs_redraw = true; // Force first frame

    loop {
        if needs_redraw {
            let now = chrono::Local::now().format("%H:%M").to_string();
            terminal.draw(|f| ui::draw_ui(f, app, &now))?;
            needs_redraw = false;
        }

        let action = tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(event)) => match map_event(event) {
                    Some(TuiEvent::Quit) => Action::Quit,
                    Some(TuiEvent::RestartShell) => Action::RestartShell,
                    Some(TuiEvent::Key(key)) => Action::Key(key),
                    Some(TuiEvent::Resize) => {
                        needs_redraw = true;
                        continue;
                    }
                    None => continue,
                },
                Some(Err(e)) => return Err(e),
                None => {
                    debug!("Terminal event stream closed");
                    Action::Quit
                }
            },
            Some(action) = actions.recv() => action,
            _ = clock.tick() => match sampler.as_mut() {
                Some(sampler) => Action::StatsSampled(sampler.sample()),
                None => {
                    needs_redraw = true;
                    continue;
                }
            },
        };

        needs_redraw = true;
        if dispatch(app, lifecycle, action).await {
            return Ok(());
        }
        while let Ok(action) = actions.try_recv() {
            if dispatch(app, lifecycle, action).await {
                return Ok(());
            }
        }
    }
}

/// Run one action through the reducer and carry out its effect. Returns
/// `true` when the app should quit.
async fn dispatch(app: &mut App, lifecycle: &mut Lifecycle, action: Action) -> bool {
    match update(app, action) {
        Effect::None => false,
        Effect::Quit => true,
        Effect::SendToShell(key) => {
            lifecycle.send_to_shell(&key).await;
            false
        }
        Effect::RestartShell => {
            lifecycle.restart_shell().await;
            false
        }
    }
}
