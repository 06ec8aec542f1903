//! # TUI Components
//!
//! Stateless, props-based widgets for the console screen:
//! - `TitleBar`: top status line (shell, chatpad, status message, clock)
//! - `SystemStatsBar`: CPU, memory and network figures
//! - `ShellPanel`: the shell's display buffer in a retro terminal frame
//!
//! Components never read `App` themselves. `draw_ui` copies or borrows
//! what each one needs into its props, which keeps them testable with
//! ratatui's `TestBackend`.
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (Top status line)
//! ├── system_stats.rs  (Host figures)
//! └── shell_panel.rs   (Shell output view)
//! ```

mod shell_panel;
mod system_stats;
mod title_bar;

pub use shell_panel::ShellPanel;
pub use system_stats::SystemStatsBar;
pub use title_bar::TitleBar;
