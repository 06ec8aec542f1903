//! Scancode → logical key table.
//!
//! Loaded once at startup from a flat TOML (or JSON) table whose keys are
//! integer literals written as strings:
//!
//! ```toml
//! "0x1e" = "a"
//! "28" = "enter"
//! ```
//!
//! Loading never fails the caller. A missing or broken file is an empty
//! mapping, and an empty mapping just means no chatpad key translates.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMapping {
    keys: HashMap<u16, String>,
}

/// Source document format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeymapFormat {
    Toml,
    Json,
}

impl KeymapFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => KeymapFormat::Json,
            _ => KeymapFormat::Toml,
        }
    }
}

impl KeyMapping {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a mapping from `path`. Absent or unreadable sources yield an
    /// empty mapping.
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No keymap at {}, chatpad keys will not translate", path.display());
                return Self::empty();
            }
            Err(e) => {
                warn!("Failed to read keymap {}: {}", path.display(), e);
                return Self::empty();
            }
        };

        match Self::parse(&contents, KeymapFormat::for_path(path)) {
            Ok(mapping) => {
                info!("Loaded {} chatpad key(s) from {}", mapping.len(), path.display());
                mapping
            }
            Err(e) => {
                warn!("Ignoring malformed keymap {}: {}", path.display(), e);
                Self::empty()
            }
        }
    }

    /// Parse a keymap document. Errors only when the document itself is not
    /// a table; individual bad entries are skipped.
    pub fn parse(contents: &str, format: KeymapFormat) -> Result<Self, String> {
        let entries: Vec<(String, Option<String>)> = match format {
            KeymapFormat::Toml => {
                let table: toml::Table = toml::from_str(contents).map_err(|e| e.to_string())?;
                table
                    .into_iter()
                    .map(|(k, v)| (k, toml_value_to_key(v)))
                    .collect()
            }
            KeymapFormat::Json => {
                if contents.trim().is_empty() {
                    return Ok(Self::empty());
                }
                let value: serde_json::Value =
                    serde_json::from_str(contents).map_err(|e| e.to_string())?;
                match value {
                    serde_json::Value::Object(map) => map
                        .into_iter()
                        .map(|(k, v)| (k, json_value_to_key(v)))
                        .collect(),
                    serde_json::Value::Null => Vec::new(),
                    other => return Err(format!("expected an object, found {other}")),
                }
            }
        };

        let mut keys = HashMap::with_capacity(entries.len());
        for (raw_code, key) in entries {
            let Some(code) = parse_scancode(&raw_code) else {
                debug!("Skipping keymap entry with invalid scancode {:?}", raw_code);
                continue;
            };
            let Some(key) = key else {
                debug!("Skipping keymap entry {:?}: value is not a scalar", raw_code);
                continue;
            };
            keys.insert(code, key);
        }
        Ok(Self { keys })
    }

    pub fn get(&self, code: u16) -> Option<&str> {
        self.keys.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<(u16, String)> for KeyMapping {
    fn from_iter<I: IntoIterator<Item = (u16, String)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Parse an integer literal the way a scancode table writes them: decimal,
/// or `0x`/`0o`/`0b` prefixed, with optional `_` separators. Anything
/// negative or wider than 16 bits is rejected.
pub fn parse_scancode(raw: &str) -> Option<u16> {
    let s = raw.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    let (digits, radix) = match s.get(..2) {
        Some("0x") | Some("0X") => (&s[2..], 16),
        Some("0o") | Some("0O") => (&s[2..], 8),
        Some("0b") | Some("0B") => (&s[2..], 2),
        _ => (s, 10),
    };
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') {
        return None;
    }
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u16::from_str_radix(&cleaned, radix).ok()
}

fn toml_value_to_key(value: toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

fn json_value_to_key(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
