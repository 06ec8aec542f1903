//! # Core Application Logic
//!
//! This module contains Termyte's domain state and reducer.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!   chatpad listener ──┐                      ┌──► shell write path
//!                      ├──► EventSink ──► update() ──┤
//!   shell read loop ───┘        (Action)       └──► TUI redraw
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all application state in one place
//! - [`action`]: The `Action` enum and `update()` reducer
//! - [`key`]: The logical `KeyEvent` shared by every input path
//! - [`config`]: Layered configuration

pub mod action;
pub mod config;
pub mod key;
pub mod state;
