//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.termyte/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//!
//! The shell program is the one exception to the ordering: an explicit
//! choice (CLI or config file) beats the `$SHELL` preference, which beats
//! the host default.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::shell::ShellBackend;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TermyteConfig {
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub chatpad: ChatpadConfig,
    #[serde(default)]
    pub widgets: WidgetsConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ShellConfig {
    pub enabled: Option<bool>,
    pub command: Option<String>,
    pub backend: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub term: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatpadConfig {
    pub enabled: Option<bool>,
    pub device_name: Option<String>,
    pub keymap: Option<String>,
}

/// Optional panels around the shell.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WidgetsConfig {
    pub system_stats: Option<bool>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_SHELL: &str = "/bin/bash";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
pub const DEFAULT_DEVICE_NAME: &str = "Chatpad";
pub const DEFAULT_KEYMAP_FILE: &str = "chatpad_keymap.toml";

// ============================================================================
// CLI overrides
// ============================================================================

/// Values given on the command line. `None` = not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub shell: Option<String>,
    pub keymap: Option<PathBuf>,
    pub device_name: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub backend: Option<String>,
    pub no_shell: bool,
    pub no_chatpad: bool,
    pub no_stats: bool,
}

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub shell_enabled: bool,
    pub shell_command: String,
    /// `None` = probe the host at startup.
    pub shell_backend: Option<ShellBackend>,
    pub poll_interval: Duration,
    pub term: Option<String>,
    pub chatpad_enabled: bool,
    pub device_name: String,
    pub keymap_path: PathBuf,
    pub system_stats_enabled: bool,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.termyte/`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".termyte"))
}

/// Returns the path to `~/.termyte/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.termyte/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `TermyteConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<TermyteConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(TermyteConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(TermyteConfig::default());
    }

    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<TermyteConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: TermyteConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Termyte Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [shell]
# enabled = true
# command = "/bin/bash"              # Falls back to $SHELL, then /bin/bash
# backend = "auto"                   # "auto", "pty" or "pipe"
# poll_interval_ms = 50              # Or set TERMYTE_POLL_INTERVAL_MS
# term = "xterm-256color"            # TERM for the child; inherited when unset

# [chatpad]
# enabled = true
# device_name = "Chatpad"            # Substring of the input device name
# keymap = "chatpad_keymap.toml"     # Path relative to ~/.termyte/ (or TERMYTE_KEYMAP)

# [widgets]
# system_stats = true                # CPU, memory and network bar above the shell
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &TermyteConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |name| std::env::var(name).ok())
}

/// Same as [`resolve`], reading environment variables through `env`.
pub fn resolve_with_env(
    config: &TermyteConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Shell: CLI → config → $SHELL → default
    let shell_command = cli
        .shell
        .clone()
        .or_else(|| config.shell.command.clone())
        .or_else(|| env("SHELL").filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_SHELL.to_string());

    // Backend: CLI → config → probe
    let shell_backend = cli
        .backend
        .as_deref()
        .or(config.shell.backend.as_deref())
        .and_then(|name| match name.parse::<ShellBackend>() {
            Ok(backend) => Some(backend),
            Err(()) => {
                if name != "auto" {
                    warn!("Unknown shell backend '{}', probing the host instead", name);
                }
                None
            }
        });

    // Poll interval: CLI → env → config → default
    let poll_interval_ms = cli
        .poll_interval_ms
        .or_else(|| {
            env("TERMYTE_POLL_INTERVAL_MS").and_then(|v| match v.trim().parse() {
                Ok(ms) => Some(ms),
                Err(e) => {
                    warn!("Ignoring TERMYTE_POLL_INTERVAL_MS={:?}: {}", v, e);
                    None
                }
            })
        })
        .or(config.shell.poll_interval_ms)
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
        .max(1);

    // Keymap: CLI → env → config (relative to ~/.termyte/) → default
    let keymap_path = cli
        .keymap
        .clone()
        .or_else(|| env("TERMYTE_KEYMAP").map(PathBuf::from))
        .or_else(|| config.chatpad.keymap.as_deref().map(relative_to_config_dir))
        .unwrap_or_else(|| relative_to_config_dir(DEFAULT_KEYMAP_FILE));

    ResolvedConfig {
        shell_enabled: !cli.no_shell && config.shell.enabled.unwrap_or(true),
        shell_command,
        shell_backend,
        poll_interval: Duration::from_millis(poll_interval_ms),
        term: config.shell.term.clone(),
        chatpad_enabled: !cli.no_chatpad && config.chatpad.enabled.unwrap_or(true),
        device_name: cli
            .device_name
            .clone()
            .or_else(|| config.chatpad.device_name.clone())
            .unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string()),
        keymap_path,
        system_stats_enabled: !cli.no_stats && config.widgets.system_stats.unwrap_or(true),
    }
}

fn relative_to_config_dir(file: &str) -> PathBuf {
    let path = PathBuf::from(file);
    if path.is_absolute() {
        return path;
    }
    match config_dir() {
        Some(dir) => dir.join(path),
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn no_env() -> impl Fn(&str) -> Option<String> {
        env_from(&[])
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&TermyteConfig::default(), &CliOverrides::default(), no_env());
        assert!(resolved.shell_enabled);
        assert!(resolved.chatpad_enabled);
        assert_eq!(resolved.shell_command, DEFAULT_SHELL);
        assert_eq!(resolved.shell_backend, None);
        assert_eq!(resolved.poll_interval, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
        assert_eq!(resolved.device_name, DEFAULT_DEVICE_NAME);
        assert!(resolved.keymap_path.ends_with(DEFAULT_KEYMAP_FILE));
        assert!(resolved.term.is_none());
        assert!(resolved.system_stats_enabled);
    }

    #[test]
    fn test_shell_env_preference_below_explicit_choices() {
        let env = env_from(&[("SHELL", "/usr/bin/zsh")]);
        let resolved = resolve_with_env(&TermyteConfig::default(), &CliOverrides::default(), &env);
        assert_eq!(resolved.shell_command, "/usr/bin/zsh");

        let config = TermyteConfig {
            shell: ShellConfig {
                command: Some("/bin/dash".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), &env);
        assert_eq!(resolved.shell_command, "/bin/dash");

        let cli = CliOverrides {
            shell: Some("/bin/sh".to_string()),
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &cli, &env);
        assert_eq!(resolved.shell_command, "/bin/sh");
    }

    #[test]
    fn test_empty_shell_env_is_ignored() {
        let env = env_from(&[("SHELL", "  ")]);
        let resolved = resolve_with_env(&TermyteConfig::default(), &CliOverrides::default(), env);
        assert_eq!(resolved.shell_command, DEFAULT_SHELL);
    }

    #[test]
    fn test_poll_interval_hierarchy() {
        let config = TermyteConfig {
            shell: ShellConfig {
                poll_interval_ms: Some(20),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env());
        assert_eq!(resolved.poll_interval, Duration::from_millis(20));

        let env = env_from(&[("TERMYTE_POLL_INTERVAL_MS", "10")]);
        let resolved = resolve_with_env(&config, &CliOverrides::default(), &env);
        assert_eq!(resolved.poll_interval, Duration::from_millis(10));

        let cli = CliOverrides {
            poll_interval_ms: Some(5),
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &cli, &env);
        assert_eq!(resolved.poll_interval, Duration::from_millis(5));
    }

    #[test]
    fn test_bad_poll_interval_env_falls_through() {
        let env = env_from(&[("TERMYTE_POLL_INTERVAL_MS", "soon")]);
        let resolved = resolve_with_env(&TermyteConfig::default(), &CliOverrides::default(), env);
        assert_eq!(resolved.poll_interval, Duration::from_millis(DEFAULT_POLL_INTERVAL_MS));
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let cli = CliOverrides {
            poll_interval_ms: Some(0),
            ..Default::default()
        };
        let resolved = resolve_with_env(&TermyteConfig::default(), &cli, no_env());
        assert_eq!(resolved.poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_backend_selection() {
        let config = TermyteConfig {
            shell: ShellConfig {
                backend: Some("pipe".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env());
        assert_eq!(resolved.shell_backend, Some(ShellBackend::Pipe));

        let cli = CliOverrides {
            backend: Some("auto".to_string()),
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &cli, no_env());
        assert_eq!(resolved.shell_backend, None);
    }

    #[test]
    fn test_keymap_path_hierarchy() {
        let config = TermyteConfig {
            chatpad: ChatpadConfig {
                keymap: Some("/etc/termyte/pad.toml".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env());
        assert_eq!(resolved.keymap_path, PathBuf::from("/etc/termyte/pad.toml"));

        let env = env_from(&[("TERMYTE_KEYMAP", "/tmp/env.toml")]);
        let resolved = resolve_with_env(&config, &CliOverrides::default(), &env);
        assert_eq!(resolved.keymap_path, PathBuf::from("/tmp/env.toml"));

        let cli = CliOverrides {
            keymap: Some(PathBuf::from("/tmp/cli.toml")),
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &cli, &env);
        assert_eq!(resolved.keymap_path, PathBuf::from("/tmp/cli.toml"));
    }

    #[test]
    fn test_cli_disable_flags_win() {
        let config = TermyteConfig {
            shell: ShellConfig {
                enabled: Some(true),
                ..Default::default()
            },
            chatpad: ChatpadConfig {
                enabled: Some(true),
                ..Default::default()
            },
            widgets: WidgetsConfig {
                system_stats: Some(true),
            },
        };
        let cli = CliOverrides {
            no_shell: true,
            no_chatpad: true,
            no_stats: true,
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, &cli, no_env());
        assert!(!resolved.shell_enabled);
        assert!(!resolved.chatpad_enabled);
        assert!(!resolved.system_stats_enabled);
    }

    #[test]
    fn test_widgets_section_turns_stats_off() {
        let config: TermyteConfig = toml::from_str("[widgets]\nsystem_stats = false\n").unwrap();
        assert_eq!(config.widgets.system_stats, Some(false));
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env());
        assert!(!resolved.system_stats_enabled);
        assert!(resolved.shell_enabled);
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[shell]
command = "/bin/zsh"
backend = "pty"
poll_interval_ms = 25
term = "xterm-256color"

[chatpad]
enabled = false
device_name = "Microsoft X-Box 360 pad"
"#;
        let config: TermyteConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.shell.command.as_deref(), Some("/bin/zsh"));
        assert_eq!(config.shell.poll_interval_ms, Some(25));
        assert_eq!(config.chatpad.enabled, Some(false));
        assert!(config.chatpad.keymap.is_none());

        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env());
        assert_eq!(resolved.shell_backend, Some(ShellBackend::Pty));
        assert_eq!(resolved.term.as_deref(), Some("xterm-256color"));
        assert!(!resolved.chatpad_enabled);
        assert_eq!(resolved.device_name, "Microsoft X-Box 360 pad");
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config: TermyteConfig = toml::from_str("[chatpad]\ndevice_name = \"Pad\"\n").unwrap();
        assert_eq!(config.chatpad.device_name.as_deref(), Some("Pad"));
        assert!(config.shell.command.is_none());
        assert!(config.shell.enabled.is_none());
    }

    #[test]
    fn test_load_config_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[shell\ncommand = ").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(load_config_from(&missing), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_generated_default_config_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        generate_default_config(&path);
        let config = load_config_from(&path).unwrap();
        assert!(config.shell.command.is_none());
        assert!(config.chatpad.device_name.is_none());
        assert!(config.widgets.system_stats.is_none());

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("# [widgets]"));
    }
}
