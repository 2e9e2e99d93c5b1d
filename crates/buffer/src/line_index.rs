// Chunk: docs/chunks/line_index - Byte-offset line index

//! Line index for tracking line boundaries in the text buffer.
//!
//! Maintains an array of line start byte offsets for O(1) line count and O(1)
//! line access. It is a cache derived from rope storage: the buffer patches it
//! after every edit instead of rescanning the document.

use memchr::memchr_iter;

/// Tracks line boundaries in a text buffer.
///
/// The line index maintains a list of byte offsets where each line starts.
/// A line starts at offset 0 and after every `'\n'`, so a trailing newline
/// produces a final empty line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offsets where each line starts. line_starts[0] = 0 always.
    /// Strictly increasing.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Creates a new line index with a single empty line.
    pub fn new() -> Self {
        Self {
            line_starts: vec![0],
        }
    }

    /// Rebuilds the line index from the given content chunks.
    ///
    /// This is O(n) where n is the content length, and is only needed when a
    /// buffer is constructed (and by the debug drift check).
    pub fn rebuild<'a, I>(&mut self, chunks: I)
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        self.line_starts.clear();
        self.line_starts.push(0);

        let mut base = 0;
        for chunk in chunks {
            self.line_starts
                .extend(memchr_iter(b'\n', chunk).map(|i| base + i + 1));
            base += chunk.len();
        }
    }

    /// Returns the number of lines in the buffer.
    ///
    /// A buffer always has at least one line (even if empty).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the byte offset where the given line starts.
    ///
    /// Returns None if the line index is out of bounds.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Returns the half-open byte span of `line`, including its newline.
    ///
    /// For the last line the span ends at `total_len`.
    pub fn line_span(&self, line: usize, total_len: usize) -> Option<(usize, usize)> {
        let start = self.line_start(line)?;
        let end = self.line_start(line + 1).unwrap_or(total_len);
        Some((start, end))
    }

    /// Returns the byte offset of the end of the given line's content.
    ///
    /// For all lines except the last, this points to the newline byte.
    /// For the last line, this equals the total buffer length.
    pub fn line_end(&self, line: usize, total_len: usize) -> Option<usize> {
        if line >= self.line_count() {
            return None;
        }

        if line + 1 < self.line_count() {
            Some(self.line_starts[line + 1] - 1)
        } else {
            Some(total_len)
        }
    }

    /// Returns the length in bytes of the given line, excluding the newline.
    pub fn line_len(&self, line: usize, total_len: usize) -> Option<usize> {
        let start = self.line_start(line)?;
        let end = self.line_end(line, total_len)?;
        Some(end - start)
    }

    /// Returns true if `line` is terminated by a newline.
    pub fn has_delimiter(&self, line: usize) -> bool {
        line + 1 < self.line_count()
    }

    /// Returns the line number containing the given byte offset.
    ///
    /// Uses binary search for O(log n) lookup. The newline byte belongs to the
    /// line it terminates.
    pub fn line_at_offset(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        }
    }

    /// Updates the index after `inserted` was spliced in at `offset`.
    ///
    /// Shifts every later line start by the inserted length and adds one
    /// line start per newline in `inserted`. Returns the number of lines added.
    pub fn apply_insert(&mut self, offset: usize, inserted: &[u8]) -> usize {
        if inserted.is_empty() {
            return 0;
        }
        let line = self.line_at_offset(offset);

        for start in self.line_starts_after_mut(line) {
            *start += inserted.len();
        }

        let new_starts: Vec<usize> = memchr_iter(b'\n', inserted)
            .map(|i| offset + i + 1)
            .collect();
        self.insert_line_starts_after(line, &new_starts);
        new_starts.len()
    }

    /// Updates the index after the byte range `start..end` was removed.
    ///
    /// Drops the line starts created by newlines inside the range and shifts
    /// every later start back by the removed length. Returns the number of
    /// lines removed.
    pub fn apply_remove(&mut self, start: usize, end: usize) -> usize {
        if start >= end {
            return 0;
        }
        let removed_len = end - start;

        // Line starts in (start, end] were produced by newlines in start..end.
        let first = self.line_starts.partition_point(|&s| s <= start);
        let last = self.line_starts.partition_point(|&s| s <= end);
        self.line_starts.drain(first..last);

        for s in &mut self.line_starts[first..] {
            *s -= removed_len;
        }
        last - first
    }

    /// Returns a mutable slice of all line starts strictly after `after_line`.
    fn line_starts_after_mut(&mut self, after_line: usize) -> &mut [usize] {
        let start = (after_line + 1).min(self.line_starts.len());
        &mut self.line_starts[start..]
    }

    /// Inserts multiple new line-start offsets after `after_line` in a single
    /// splice, preserving the ascending sort order of the array.
    ///
    /// `new_starts` must already be in ascending order and must logically
    /// follow `line_starts[after_line]`.
    fn insert_line_starts_after(&mut self, after_line: usize, new_starts: &[usize]) {
        if new_starts.is_empty() {
            return;
        }
        let insert_pos = after_line + 1;
        let old_len = self.line_starts.len();
        let add = new_starts.len();

        // Extend storage, then shift the tail right to make room.
        self.line_starts.resize(old_len + add, 0);
        self.line_starts
            .copy_within(insert_pos..old_len, insert_pos + add);
        self.line_starts[insert_pos..insert_pos + add].copy_from_slice(new_starts);
    }

    /// Returns the raw line_starts array (for debug validation).
    #[cfg(any(debug_assertions, test))]
    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}
