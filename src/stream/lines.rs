//! Incremental byte-to-line splitter for newline-delimited chunk streams.
//!
//! Bytes may arrive at arbitrary boundaries, including inside a multi-byte
//! UTF-8 character. The decoder keeps the incomplete character and the
//! incomplete trailing line until more bytes arrive.
use memchr::memchr_iter;

const COMPACT_THRESHOLD: usize = 8 * 1024;

#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: String,
    read_offset: usize,
    utf8_tail: Vec<u8>,
}

impl LineDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return every line completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        self.feed_into(bytes, &mut out);
        out
    }

    /// Feed raw bytes and append completed lines (without the `\n`) to `out`.
    pub fn feed_into<E>(&mut self, bytes: &[u8], out: &mut E)
    where
        E: Extend<String>,
    {
        self.decode_utf8(bytes);

        let mut processed_up_to = self.read_offset;
        let scan_start = processed_up_to;
        let haystack = &self.buffer.as_bytes()[scan_start..];
        let mut lines = Vec::new();
        for rel_pos in memchr_iter(b'\n', haystack) {
            let line_end = scan_start + rel_pos;
            lines.push(self.buffer[processed_up_to..line_end].to_string());
            processed_up_to = line_end + 1;
        }
        out.extend(lines);

        self.read_offset = processed_up_to;
        if self.read_offset == self.buffer.len() {
            self.buffer.clear();
            self.read_offset = 0;
            return;
        }
        let should_compact = self.read_offset > 0
            && (self.read_offset >= self.buffer.len() / 2
                || self.read_offset >= COMPACT_THRESHOLD);
        if should_compact {
            self.buffer.drain(..self.read_offset);
            self.read_offset = 0;
        }
    }

    /// The incomplete trailing line held back for the next feed.
    #[must_use]
    pub fn pending_line(&self) -> &str {
        &self.buffer[self.read_offset..]
    }

    /// Number of bytes not yet emitted as part of a complete line.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.buffer.len() - self.read_offset + self.utf8_tail.len()
    }

    /// Drop everything not yet emitted, returning how many bytes were discarded.
    pub fn discard_pending(&mut self) -> usize {
        let discarded = self.pending_len();
        self.buffer.clear();
        self.read_offset = 0;
        self.utf8_tail.clear();
        discarded
    }

    fn decode_utf8(&mut self, bytes: &[u8]) {
        let joined: Vec<u8>;
        let mut rest: &[u8] = if self.utf8_tail.is_empty() {
            bytes
        } else {
            let mut tail = std::mem::take(&mut self.utf8_tail);
            tail.extend_from_slice(bytes);
            joined = tail;
            &joined
        };

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(err) => {
                    let (valid, invalid) = rest.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        self.buffer.push_str(text);
                    }
                    match err.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &invalid[len..];
                        }
                        None => {
                            // Truncated character; wait for the rest of it.
                            self.utf8_tail.extend_from_slice(invalid);
                            return;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.feed(b"hello\n"), vec!["hello".to_string()]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_partial_line_is_held_back() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.feed(b"data: hel").is_empty());
        assert_eq!(decoder.pending_line(), "data: hel");
        assert_eq!(decoder.feed(b"lo\nnext"), vec!["data: hello".to_string()]);
        assert_eq!(decoder.pending_line(), "next");
    }

    #[test]
    fn test_multiple_lines_in_one_feed() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.feed(b"a\n\nb\r\nc");
        assert_eq!(lines, vec!["a".to_string(), String::new(), "b\r".to_string()]);
        assert_eq!(decoder.pending_line(), "c");
    }

    #[test]
    fn test_multibyte_character_split_across_feeds() {
        let text = "héllo 世界\n";
        let bytes = text.as_bytes();
        // Split inside the three-byte '世'.
        let split = text.find('世').unwrap() + 1;
        let mut decoder = LineDecoder::new();
        assert!(decoder.feed(&bytes[..split]).is_empty());
        assert_eq!(decoder.pending_len(), split);
        let lines = decoder.feed(&bytes[split..]);
        assert_eq!(lines, vec!["héllo 世界".to_string()]);
    }

    #[test]
    fn test_byte_at_a_time() {
        let text = "€ one\n€ two\n";
        let mut decoder = LineDecoder::new();
        let mut lines = Vec::new();
        for byte in text.as_bytes() {
            decoder.feed_into(std::slice::from_ref(byte), &mut lines);
        }
        assert_eq!(lines, vec!["€ one".to_string(), "€ two".to_string()]);
    }

    #[test]
    fn test_invalid_bytes_become_replacement_character() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.feed(b"a\xffb\n");
        assert_eq!(lines, vec!["a\u{FFFD}b".to_string()]);
    }

    #[test]
    fn test_discard_pending() {
        let mut decoder = LineDecoder::new();
        decoder.feed(b"done\npartial \xe4\xb8");
        assert_eq!(decoder.discard_pending(), "partial ".len() + 2);
        assert_eq!(decoder.pending_len(), 0);
        assert!(decoder.feed(b"\n").len() == 1);
    }

    #[test]
    fn test_compaction_keeps_pending_line() {
        let mut decoder = LineDecoder::new();
        let long_line = "x".repeat(COMPACT_THRESHOLD + 10);
        let input = format!("{long_line}\ntail");
        let lines = decoder.feed(input.as_bytes());
        assert_eq!(lines.len(), 1);
        assert_eq!(decoder.pending_line(), "tail");
        assert_eq!(decoder.feed(b"\n"), vec!["tail".to_string()]);
    }
}
