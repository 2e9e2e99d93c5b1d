// Chunk: docs/chunks/buffer_errors - Typed buffer errors

//! Error types returned by [`TextBuffer`](crate::TextBuffer) operations.
//!
//! Bounds are checked eagerly: any line or column outside the buffer is an
//! error, never silently clamped. [`TextBuffer::clamp_line_col`] is the one
//! operation that cannot fail.
//!
//! [`TextBuffer::clamp_line_col`]: crate::TextBuffer::clamp_line_col

use std::io;

/// Errors produced by line/column addressed buffer operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    /// A line or column argument lies outside the current buffer bounds.
    ///
    /// `col` is `None` when the line itself was out of range.
    #[error("position out of range: line {line}{}, buffer has {line_count} lines", fmt_col(.col))]
    OutOfRange {
        line: usize,
        col: Option<usize>,
        line_count: usize,
    },

    /// A byte offset lies past the end of the buffer.
    #[error("byte offset {offset} is past the end of the buffer ({len} bytes)")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// The resolved start of a range comes after its resolved end.
    #[error("invalid range: start offset {start} is after end offset {end}")]
    InvalidRange { start: usize, end: usize },

    /// Rejected [`BufferOptions`](crate::BufferOptions).
    #[error("invalid buffer options: {0}")]
    InvalidOptions(String),
}

fn fmt_col(col: &Option<usize>) -> String {
    match col {
        Some(col) => format!(", col {col}"),
        None => String::new(),
    }
}

/// Failure while streaming the buffer into a sink.
///
/// The buffer is never modified by a write; `written` is the number of bytes
/// the sink accepted before `source` was returned.
#[derive(Debug, thiserror::Error)]
#[error("write failed after {written} bytes: {source}")]
pub struct WriteError {
    pub written: u64,
    #[source]
    pub source: io::Error,
}

impl WriteError {
    /// Returns the kind of the underlying I/O error.
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }
}

/// Result alias for buffer operations.
pub type Result<T> = std::result::Result<T, BufferError>;
