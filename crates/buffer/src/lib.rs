// Chunk: docs/chunks/rope_storage - Chunked B-tree rope storage
// Chunk: docs/chunks/line_col_facade - Line/column addressed buffer API

//! lite-rope-buffer: a rope-backed text buffer addressed by line and column.
//!
//! This crate stores text as a balanced tree of bounded-size byte chunks and
//! keeps an incrementally patched index of line starts, so large documents
//! can be edited and read by `(line, column)` without copying them.
//!
//! # Overview
//!
//! The main type is [`TextBuffer`], which provides:
//! - Line access and inclusive range slicing as zero-copy [`Slice`] views
//! - Insertion and inclusive range removal at rune columns
//! - Position clamping for cursor-style callers
//! - Streaming output via [`TextBuffer::write_to`]
//!
//! Columns count runes (Unicode scalar values). Content does not have to be
//! valid UTF-8: each byte of a malformed sequence counts as a single rune.
//!
//! # Example
//!
//! ```
//! use lite_rope_buffer::{DirtyLines, TextBuffer};
//!
//! let mut buffer = TextBuffer::from_str("abc\ndef\n");
//! assert_eq!(buffer.line_count(), 3);
//!
//! // Append to the first line
//! let dirty = buffer.insert(0, 3, b"X").unwrap();
//! assert_eq!(dirty, DirtyLines::Single(0));
//! assert_eq!(buffer.line(0).unwrap(), "abcX\n");
//!
//! // Remove columns 0 through 3 (inclusive)
//! buffer.remove(0, 0, 0, 3).unwrap();
//! assert_eq!(buffer.line(0).unwrap(), "\n");
//! ```
//!
//! # Dirty Line Tracking
//!
//! Each mutation returns a [`DirtyLines`] value indicating which lines were
//! affected:
//!
//! - `DirtyLines::None` - Nothing changed (empty insert or empty range)
//! - `DirtyLines::Single(line)` - Only one line changed
//! - `DirtyLines::FromLineToEnd(line)` - All lines from `line` to the end
//!   changed (used when lines are split or joined)

mod error;
pub mod grapheme;
mod line_index;
mod options;
mod rope;
mod slice;
mod text_buffer;
mod types;
pub mod utf8;

pub use error::{BufferError, Result, WriteError};
pub use line_index::LineIndex;
pub use options::{BufferOptions, DEFAULT_MAX_CHUNK_BYTES, DEFAULT_VERIFY_EVERY, MIN_CHUNK_BYTES};
pub use rope::{Chunks, Rope};
pub use slice::Slice;
pub use text_buffer::TextBuffer;
pub use types::{DirtyLines, Position};
