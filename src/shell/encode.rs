//! Logical key → bytes for the child shell.

use crate::core::key::KeyEvent;

/// ASCII ETX, what a terminal sends for Ctrl+C.
pub const ETX: u8 = 0x03;
/// ASCII DEL, what a terminal sends for Backspace.
pub const DEL: u8 = 0x7f;

/// Bytes the shell should receive for `key`, or `None` if the key has no
/// meaning to it.
pub fn encode_key(key: &KeyEvent) -> Option<Vec<u8>> {
    match key.key.as_str() {
        "enter" => Some(b"\n".to_vec()),
        "tab" => Some(b"\t".to_vec()),
        "backspace" => Some(vec![DEL]),
        "ctrl+c" => Some(vec![ETX]),
        "space" => Some(b" ".to_vec()),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    let mut buf = [0u8; 4];
                    Some(c.encode_utf8(&mut buf).as_bytes().to_vec())
                }
                _ => None,
            }
        }
    }
}
