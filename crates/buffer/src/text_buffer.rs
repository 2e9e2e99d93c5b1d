// Chunk: docs/chunks/line_col_facade - Line/column addressed buffer API

//! TextBuffer is the main public API for text editing operations.
//!
//! It combines a rope (for byte storage) with a line index (for O(1) line
//! access) and addresses everything by (line, column). Columns count runes, so
//! converting a column to a byte offset scans forward through that one line.
//!
//! Every bounds-taking operation fails fast with
//! [`BufferError::OutOfRange`]; only [`TextBuffer::clamp_line_col`] clamps.
//! Ranges passed to [`TextBuffer::slice`] and [`TextBuffer::remove`] are
//! inclusive on both ends.

use std::io;

use crate::error::{BufferError, Result, WriteError};
use crate::grapheme;
use crate::line_index::LineIndex;
use crate::options::BufferOptions;
use crate::rope::{Chunks, Rope};
use crate::slice::Slice;
use crate::types::{DirtyLines, Position};
use crate::utf8;

/// A rope-backed text buffer addressed by line and column.
///
/// The buffer maintains:
/// - Byte storage via a rope of bounded-size chunks
/// - Line boundary tracking, patched incrementally after each edit
///
/// Views returned by [`line`](Self::line) and [`slice`](Self::slice) borrow
/// the buffer and cannot outlive the next mutation.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    line_index: LineIndex,
    options: BufferOptions,
    /// Mutation counter for sampling debug assertions (debug builds only).
    #[cfg(debug_assertions)]
    debug_mutation_count: u64,
}

impl TextBuffer {
    /// Creates a new empty text buffer.
    pub fn new() -> Self {
        Self::build(b"", BufferOptions::default())
    }

    /// Creates an empty buffer with custom options.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidOptions`] if the options fail validation.
    pub fn with_options(options: BufferOptions) -> Result<Self> {
        Self::from_bytes_with_options(b"", options)
    }

    /// Creates a text buffer seeded with `bytes`.
    ///
    /// The bytes need not be valid UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::build(bytes, BufferOptions::default())
    }

    /// Creates a text buffer seeded with `bytes` using custom options.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidOptions`] if the options fail validation.
    pub fn from_bytes_with_options(bytes: &[u8], options: BufferOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(bytes, options))
    }

    /// Creates a text buffer initialized with the given content.
    ///
    /// Note: We don't implement `FromStr` because it requires returning `Result`,
    /// but parsing a string into a TextBuffer cannot fail.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    fn build(bytes: &[u8], options: BufferOptions) -> Self {
        let rope = Rope::from_bytes(bytes, options.max_chunk_bytes);
        let mut line_index = LineIndex::new();
        line_index.rebuild(rope.chunks());
        tracing::debug!(
            len = rope.len(),
            lines = line_index.line_count(),
            height = rope.height(),
            "buffer loaded"
        );

        Self {
            rope,
            line_index,
            options,
            #[cfg(debug_assertions)]
            debug_mutation_count: 0,
        }
    }

    // ==================== Accessors ====================

    /// Returns the options this buffer was created with.
    pub fn options(&self) -> &BufferOptions {
        &self.options
    }

    /// Returns the number of bytes in the buffer. O(1).
    pub fn len(&self) -> usize {
        self.rope.len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.is_empty()
    }

    /// Returns the number of lines in the buffer.
    ///
    /// Always at least 1 (even for an empty buffer). A trailing newline
    /// starts a final empty line, so `"a\n"` has two lines.
    pub fn line_count(&self) -> usize {
        self.line_index.line_count()
    }

    /// Returns a copy of every byte in the buffer.
    ///
    /// This materializes the whole document; prefer [`line`](Self::line),
    /// [`slice`](Self::slice), [`chunks`](Self::chunks) or
    /// [`write_to`](Self::write_to) on hot paths.
    pub fn bytes(&self) -> Vec<u8> {
        self.rope.to_vec()
    }

    /// Iterates the storage chunks in document order without copying.
    pub fn chunks(&self) -> Chunks<'_> {
        self.rope.chunks()
    }

    /// Returns the bytes of `line`, including its trailing newline (absent
    /// only on the final line).
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if `line >= line_count()`.
    pub fn line(&self, line: usize) -> Result<Slice<'_>> {
        let (start, end) = self.line_span(line)?;
        Ok(self.rope.slice(start, end))
    }

    /// Returns the text of `line` without its newline, decoding invalid
    /// bytes as U+FFFD (one per byte).
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if `line >= line_count()`.
    pub fn line_content(&self, line: usize) -> Result<String> {
        let content = self.line_body(line)?;
        Ok(utf8::decode_lossy(&content.to_cow()))
    }

    /// Returns the number of runes in `line`, excluding the newline.
    ///
    /// Each byte of a malformed UTF-8 sequence counts as one rune.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if `line >= line_count()`.
    pub fn runes_in_line(&self, line: usize) -> Result<usize> {
        Ok(self.line_body(line)?.rune_count())
    }

    /// Clamps any line and column to the nearest valid position.
    ///
    /// The line is clamped first (negative values saturate to 0), then the
    /// column is clamped to `0..=runes_in_line(line)`. Never fails.
    pub fn clamp_line_col(&self, line: isize, col: isize) -> (usize, usize) {
        let last_line = self.line_count() - 1;
        let line = usize::try_from(line).unwrap_or(0).min(last_line);
        let max_col = self.runes_in_line(line).unwrap_or(0);
        let col = usize::try_from(col).unwrap_or(0).min(max_col);
        (line, col)
    }

    /// Returns the bytes from `(start_line, start_col)` through
    /// `(end_line, end_col)`, both inclusive.
    ///
    /// The end column names the last rune included. On a line that ends in a
    /// newline, column `runes_in_line` names the newline itself.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if either position is outside the
    /// buffer, and [`BufferError::InvalidRange`] if the start resolves past
    /// the end.
    pub fn slice(
        &self,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Result<Slice<'_>> {
        let (start, end) = self.resolve_range(start_line, start_col, end_line, end_col)?;
        Ok(self.rope.slice(start, end))
    }

    /// Streams the buffer into `sink` chunk by chunk.
    ///
    /// # Errors
    ///
    /// Returns a [`WriteError`] carrying the number of bytes written before
    /// the sink failed. The buffer is never modified.
    pub fn write_to<W: io::Write + ?Sized>(
        &self,
        sink: &mut W,
    ) -> std::result::Result<u64, WriteError> {
        self.rope.write_to(sink)
    }

    // ==================== Position Conversion ====================

    /// Converts an insertion point to a byte offset.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if the line does not exist or the
    /// column exceeds `runes_in_line(line)`.
    pub fn position_to_offset(&self, pos: Position) -> Result<usize> {
        self.resolve_start(pos.line, pos.col)
    }

    /// Converts a byte offset to a position.
    ///
    /// An offset inside a multi-byte rune resolves to the column after that
    /// rune.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OffsetOutOfRange`] if `offset > len()`.
    pub fn offset_to_position(&self, offset: usize) -> Result<Position> {
        let line = self.line_at_offset(offset)?;
        let content = self.line_body(line)?.to_cow();
        let rel = offset - self.line_span(line)?.0;
        let col = utf8::RuneStarts::new(&content)
            .take_while(|&start| start < rel)
            .count();
        Ok(Position::new(line, col))
    }

    /// Returns the line containing byte `offset`. A newline byte belongs to
    /// the line it ends.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OffsetOutOfRange`] if `offset > len()`.
    pub fn line_at_offset(&self, offset: usize) -> Result<usize> {
        if offset > self.len() {
            return Err(BufferError::OffsetOutOfRange {
                offset,
                len: self.len(),
            });
        }
        Ok(self.line_index.line_at_offset(offset))
    }

    // ==================== Grapheme Boundaries ====================
    // Chunk: docs/chunks/grapheme_cluster_awareness - Grapheme cluster boundary helpers

    /// Returns the column of the grapheme cluster boundary before `col`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] for a position outside the buffer.
    pub fn grapheme_boundary_left(&self, line: usize, col: usize) -> Result<usize> {
        let text = self.checked_line_text(line, col)?;
        Ok(grapheme::grapheme_boundary_left(&text, col))
    }

    /// Returns the column of the grapheme cluster boundary after `col`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] for a position outside the buffer.
    pub fn grapheme_boundary_right(&self, line: usize, col: usize) -> Result<usize> {
        let text = self.checked_line_text(line, col)?;
        Ok(grapheme::grapheme_boundary_right(&text, col))
    }

    /// Returns true if `col` does not split a grapheme cluster.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] for a position outside the buffer.
    pub fn is_grapheme_boundary(&self, line: usize, col: usize) -> Result<bool> {
        let text = self.checked_line_text(line, col)?;
        Ok(grapheme::is_grapheme_boundary(&text, col))
    }

    fn checked_line_text(&self, line: usize, col: usize) -> Result<String> {
        let text = self.line_content(line)?;
        if col > text.chars().count() {
            return Err(self.out_of_range(line, Some(col)));
        }
        Ok(text)
    }

    // ==================== Resolution ====================

    fn out_of_range(&self, line: usize, col: Option<usize>) -> BufferError {
        BufferError::OutOfRange {
            line,
            col,
            line_count: self.line_count(),
        }
    }

    /// Byte span of `line` including its newline.
    fn line_span(&self, line: usize) -> Result<(usize, usize)> {
        self.line_index
            .line_span(line, self.len())
            .ok_or_else(|| self.out_of_range(line, None))
    }

    /// Bytes of `line` without its newline.
    fn line_body(&self, line: usize) -> Result<Slice<'_>> {
        let start = self.line_span(line)?.0;
        let len = self
            .line_index
            .line_len(line, self.len())
            .ok_or_else(|| self.out_of_range(line, None))?;
        Ok(self.rope.slice(start, start + len))
    }

    /// Byte offset where rune `col` of `line` starts. `col` may equal the
    /// line's rune count (the newline position, or end of buffer).
    fn resolve_start(&self, line: usize, col: usize) -> Result<usize> {
        let start = self.line_span(line)?.0;
        let content = self.line_body(line)?.to_cow();
        utf8::rune_start(&content, col)
            .map(|rel| start + rel)
            .ok_or_else(|| self.out_of_range(line, Some(col)))
    }

    /// Byte offset just past rune `col` of `line`. The newline counts as the
    /// rune at column `runes_in_line(line)`.
    fn resolve_end(&self, line: usize, col: usize) -> Result<usize> {
        let start = self.line_span(line)?.0;
        let content = self.line_body(line)?.to_cow();
        if let Some(rel) = utf8::rune_end(&content, col) {
            return Ok(start + rel);
        }
        if self.line_index.has_delimiter(line) && utf8::count_runes(&content) == col {
            return Ok(start + content.len() + 1);
        }
        Err(self.out_of_range(line, Some(col)))
    }

    /// Resolves an inclusive position range to a half-open byte range.
    fn resolve_range(
        &self,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Result<(usize, usize)> {
        let start = self.resolve_start(start_line, start_col)?;
        let end = self.resolve_end(end_line, end_col)?;
        if start > end {
            return Err(BufferError::InvalidRange { start, end });
        }
        Ok((start, end))
    }

    // ==================== Validation ====================

    /// Debug assertion: verifies that the incremental line_index matches
    /// a fresh rebuild from the rope, and that the rope is balanced.
    ///
    /// Uses a mutation counter so the O(n) rebuild doesn't tank perf
    /// in tight loops. Only every `verify_every`-th mutation is checked.
    #[cfg(debug_assertions)]
    fn assert_line_index_consistent(&mut self) {
        let every = self.options.verify_every;
        if every == 0 {
            return;
        }
        self.debug_mutation_count += 1;
        if self.debug_mutation_count % every != 0 {
            return;
        }
        let mut expected = LineIndex::new();
        expected.rebuild(self.rope.chunks());
        let actual = self.line_index.line_starts();
        let expected_starts = expected.line_starts();
        assert_eq!(
            actual, expected_starts,
            "line_index drift detected after {} mutations!\n  buffer len: {}\n  actual line_starts:   {:?}\n  expected line_starts: {:?}",
            self.debug_mutation_count, self.rope.len(), actual, expected_starts,
        );
        self.rope.assert_invariants();
    }

    #[cfg(not(debug_assertions))]
    fn assert_line_index_consistent(&mut self) {}

    // ==================== Mutations ====================

    /// Inserts `value` so that it starts at `(line, col)`.
    ///
    /// `col` may equal `runes_in_line(line)` to append to the line.
    /// Returns the dirty lines affected by this operation.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if the position is outside the
    /// buffer. The buffer is unchanged on error.
    pub fn insert(&mut self, line: usize, col: usize, value: &[u8]) -> Result<DirtyLines> {
        let offset = self.resolve_start(line, col)?;
        if value.is_empty() {
            return Ok(DirtyLines::None);
        }

        self.rope.insert(offset, value);
        let lines_added = self.line_index.apply_insert(offset, value);
        tracing::debug!(line, col, offset, len = value.len(), lines_added, "insert");

        self.assert_line_index_consistent();
        Ok(DirtyLines::for_edit(line, lines_added))
    }

    /// Removes everything from `(start_line, start_col)` through
    /// `(end_line, end_col)`, both inclusive.
    ///
    /// Range resolution matches [`slice`](Self::slice). Returns the dirty
    /// lines affected by this operation.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] or [`BufferError::InvalidRange`];
    /// the buffer is unchanged on error.
    pub fn remove(
        &mut self,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Result<DirtyLines> {
        let (start, end) = self.resolve_range(start_line, start_col, end_line, end_col)?;
        if start == end {
            return Ok(DirtyLines::None);
        }

        self.rope.remove(start, end);
        let lines_removed = self.line_index.apply_remove(start, end);
        tracing::debug!(start, end, lines_removed, "remove");

        self.assert_line_index_consistent();
        Ok(DirtyLines::for_edit(start_line, lines_removed))
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TextBuffer {
    fn from(content: &str) -> Self {
        Self::from_str(content)
    }
}

impl From<&[u8]> for TextBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for TextBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(&bytes)
    }
}
