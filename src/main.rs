use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;

use termyte::BackendChoice;
use termyte::chatpad::list_devices;
use termyte::core::config::{self, CliOverrides, TermyteConfig};

#[derive(Parser)]
#[command(name = "termyte", about = "Handheld terminal console with chatpad input")]
struct Args {
    /// Shell program to run (default: $SHELL, then /bin/bash)
    #[arg(short, long)]
    shell: Option<String>,

    /// Scancode → key mapping file (TOML or JSON)
    #[arg(short, long)]
    keymap: Option<PathBuf>,

    /// Substring of the chatpad's input device name
    #[arg(short, long)]
    device: Option<String>,

    /// How long the shell read loop sleeps when there is no output
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Shell backend
    #[arg(long, value_enum)]
    backend: Option<BackendChoice>,

    /// Don't start a shell
    #[arg(long)]
    no_shell: bool,

    /// Don't look for a chatpad
    #[arg(long)]
    no_chatpad: bool,

    /// Hide the CPU/memory/network bar
    #[arg(long)]
    no_stats: bool,

    /// Print the input devices this host exposes and exit
    #[arg(long)]
    list_devices: bool,

    /// Log level written to termyte.log (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "debug")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            shell: self.shell.clone(),
            keymap: self.keymap.clone(),
            device_name: self.device.clone(),
            poll_interval_ms: self.poll_interval_ms,
            backend: self.backend.map(|b| b.as_str().to_string()),
            no_shell: self.no_shell,
            no_chatpad: self.no_chatpad,
            no_stats: self.no_stats,
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    if args.list_devices {
        let devices = list_devices();
        if devices.is_empty() {
            println!("No input devices found (are you in the 'input' group?)");
        }
        for device in devices {
            println!("{}\t{}", device.path.display(), device.name);
        }
        return Ok(());
    }

    // Initialize file logger - writes to termyte.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    let level = args.log_level.parse().unwrap_or(LevelFilter::Debug);
    if let Ok(log_file) = File::create("termyte.log") {
        let _ = WriteLogger::init(level, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("{}, using defaults", e);
        TermyteConfig::default()
    });
    let resolved = config::resolve(&file_config, &args.overrides());

    log::info!(
        "Termyte starting up (shell: {}, chatpad: {})",
        resolved.shell_command,
        resolved.device_name
    );

    termyte::tui::run(resolved).await
}
