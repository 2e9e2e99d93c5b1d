// Chunk: docs/chunks/utf8_runes - Rune counting over raw line bytes

//! Rune (codepoint) scanning over raw bytes.
//!
//! Buffer columns count runes, not bytes. Stored bytes are not required to be
//! valid UTF-8: every byte that is not part of a well-formed sequence counts as
//! exactly one rune (it renders as U+FFFD). All helpers here agree on that
//! policy so that counting, resolving and decoding never disagree on where a
//! column lands.

/// Iterator over the byte offset at which each rune starts.
#[derive(Debug, Clone)]
pub struct RuneStarts<'a> {
    chunks: std::str::Utf8Chunks<'a>,
    /// Offset of the current chunk within the scanned bytes.
    base: usize,
    valid: std::str::CharIndices<'a>,
    /// Remaining invalid bytes of the current chunk, as `(next, end)`.
    invalid: (usize, usize),
}

impl<'a> RuneStarts<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            chunks: bytes.utf8_chunks(),
            base: 0,
            valid: "".char_indices(),
            invalid: (0, 0),
        }
    }
}

impl Iterator for RuneStarts<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if let Some((i, _)) = self.valid.next() {
                return Some(self.base + i);
            }
            let (next, end) = self.invalid;
            if next < end {
                self.invalid.0 += 1;
                return Some(next);
            }
            let chunk = self.chunks.next()?;
            self.base = end;
            let valid = chunk.valid();
            let invalid_start = self.base + valid.len();
            self.valid = valid.char_indices();
            self.invalid = (invalid_start, invalid_start + chunk.invalid().len());
        }
    }
}

/// Counts the runes in `bytes`.
pub fn count_runes(bytes: &[u8]) -> usize {
    // Fast path for ASCII-only content.
    if bytes.is_ascii() {
        return bytes.len();
    }
    bytes
        .utf8_chunks()
        .map(|chunk| chunk.valid().chars().count() + chunk.invalid().len())
        .sum()
}

/// Returns the byte offset where rune `col` starts.
///
/// `col == count_runes(bytes)` resolves to `bytes.len()`. Returns `None` past
/// that.
pub fn rune_start(bytes: &[u8], col: usize) -> Option<usize> {
    if bytes.is_ascii() {
        return (col <= bytes.len()).then_some(col);
    }
    let mut starts = RuneStarts::new(bytes);
    match starts.nth(col) {
        Some(offset) => Some(offset),
        None => (count_runes(bytes) == col).then_some(bytes.len()),
    }
}

/// Returns the byte offset immediately after rune `col`.
///
/// Returns `None` if there is no rune at `col`.
pub fn rune_end(bytes: &[u8], col: usize) -> Option<usize> {
    if bytes.is_ascii() {
        return (col < bytes.len()).then_some(col + 1);
    }
    let mut starts = RuneStarts::new(bytes);
    starts.nth(col)?;
    Some(starts.next().unwrap_or(bytes.len()))
}

/// Decodes `bytes` to a `String`, emitting one U+FFFD per invalid byte.
///
/// Unlike [`String::from_utf8_lossy`], which collapses a truncated sequence
/// into a single replacement character, the output always has exactly
/// [`count_runes`] chars.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
        for _ in chunk.invalid() {
            out.push(char::REPLACEMENT_CHARACTER);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_ascii() {
        assert_eq!(count_runes(b""), 0);
        assert_eq!(count_runes(b"hello"), 5);
    }

    #[test]
    fn count_multibyte() {
        assert_eq!(count_runes("héllo".as_bytes()), 5);
        assert_eq!(count_runes("世界".as_bytes()), 2);
        assert_eq!(count_runes("a😀b".as_bytes()), 3);
    }

    #[test]
    fn count_invalid_bytes_individually() {
        // Lone continuation byte
        assert_eq!(count_runes(&[b'a', 0x80, b'b']), 3);
        // Truncated 3-byte sequence: two invalid bytes, two runes
        assert_eq!(count_runes(&[0xE4, 0xB8, b'x']), 3);
        assert_eq!(count_runes(&[0xFF, 0xFE]), 2);
    }

    #[test]
    fn rune_starts_mixed() {
        let bytes = "a世b".as_bytes();
        let starts: Vec<usize> = RuneStarts::new(bytes).collect();
        assert_eq!(starts, vec![0, 1, 4]);
    }

    #[test]
    fn rune_starts_with_invalid_runs() {
        let bytes = [b'a', 0xE4, 0xB8, b'b', 0x80];
        let starts: Vec<usize> = RuneStarts::new(&bytes).collect();
        assert_eq!(starts, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn rune_starts_between_invalid_and_valid() {
        let mut bytes = vec![0xFF];
        bytes.extend_from_slice("é".as_bytes());
        bytes.push(0xFF);
        bytes.extend_from_slice("z".as_bytes());
        let starts: Vec<usize> = RuneStarts::new(&bytes).collect();
        assert_eq!(starts, vec![0, 1, 3, 4]);
    }

    #[test]
    fn rune_start_resolves_end_of_line() {
        let bytes = "héllo".as_bytes();
        assert_eq!(rune_start(bytes, 0), Some(0));
        assert_eq!(rune_start(bytes, 2), Some(3));
        assert_eq!(rune_start(bytes, 5), Some(6));
        assert_eq!(rune_start(bytes, 6), None);
    }

    #[test]
    fn rune_end_covers_whole_rune() {
        let bytes = "a世".as_bytes();
        assert_eq!(rune_end(bytes, 0), Some(1));
        assert_eq!(rune_end(bytes, 1), Some(4));
        assert_eq!(rune_end(bytes, 2), None);
        assert_eq!(rune_end(b"abc", 2), Some(3));
        assert_eq!(rune_end(b"abc", 3), None);
    }

    #[test]
    fn decode_lossy_matches_rune_count() {
        let bytes = [b'a', 0xE4, 0xB8, b'b'];
        let decoded = decode_lossy(&bytes);
        assert_eq!(decoded, "a\u{FFFD}\u{FFFD}b");
        assert_eq!(decoded.chars().count(), count_runes(&bytes));
    }
}
