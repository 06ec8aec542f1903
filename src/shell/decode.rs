//! Lossy streaming UTF-8 decoder for shell output.
//!
//! Reads come back in arbitrary chunks, so a multi-byte character can be
//! split across two reads. The decoder holds back an incomplete tail until
//! the next chunk completes it. Bytes that can never form valid UTF-8 are
//! replaced with U+FFFD. Escape sequences are plain ASCII and pass through
//! untouched.

/// Longest possible incomplete UTF-8 prefix.
const MAX_PENDING: usize = 3;

#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk. May return an empty string when the chunk
    /// only extends a held-back partial character.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // from_utf8 just validated this prefix.
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            // Truncated sequence at the end: keep it for later.
                            self.pending.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush whatever is held back, replacing it. Call once the stream ends.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        debug_assert!(self.pending.len() <= MAX_PENDING);
        self.pending.clear();
        char::REPLACEMENT_CHARACTER.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_and_escapes_pass_through() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"\x1b[1;32muser@host\x1b[0m:~$ "), "\x1b[1;32muser@host\x1b[0m:~$ ");
    }

    #[test]
    fn test_split_multibyte_character() {
        let mut decoder = Utf8Decoder::new();
        let bytes = "héllo".as_bytes();
        // 'é' is two bytes at index 1..3; split between them.
        assert_eq!(decoder.decode(&bytes[..2]), "h");
        assert_eq!(decoder.decode(&bytes[2..]), "éllo");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_four_byte_character_across_three_chunks() {
        let mut decoder = Utf8Decoder::new();
        let crab = "🦀".as_bytes();
        assert_eq!(decoder.decode(&crab[..1]), "");
        assert_eq!(decoder.decode(&crab[1..3]), "");
        assert_eq!(decoder.decode(&crab[3..]), "🦀");
    }

    #[test]
    fn test_malformed_bytes_are_replaced() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"ok\xffok"), "ok\u{FFFD}ok");
        assert_eq!(decoder.decode(b"\xc3\x28"), "\u{FFFD}(");
    }

    #[test]
    fn test_finish_replaces_dangling_tail() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xe2\x82"), "a");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }
}
