//! Termyte library exports for testing

use clap::ValueEnum;

pub mod chatpad;
pub mod core;
pub mod lifecycle;
pub mod shell;
pub mod stats;
pub mod tui;

#[cfg(test)]
pub mod test_support;

/// `--backend` values. `Auto` probes the host for a pty device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum BackendChoice {
    #[default]
    Auto,
    Pty,
    Pipe,
}

impl BackendChoice {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendChoice::Auto => "auto",
            BackendChoice::Pty => "pty",
            BackendChoice::Pipe => "pipe",
        }
    }
}
