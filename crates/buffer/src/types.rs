// Chunk: docs/chunks/line_col_facade - Line/column addressed buffer API

use std::fmt;

/// Position in the buffer as (line, column) where both are 0-indexed.
///
/// `col` counts runes (codepoints) within the line, never bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl From<(usize, usize)> for Position {
    fn from((line, col): (usize, usize)) -> Self {
        Self::new(line, col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Which lines a mutation touched, so a renderer can limit redraws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyLines {
    /// Nothing changed (empty insert or empty range).
    None,
    /// Only this line's content changed; line numbering is unaffected.
    Single(usize),
    /// Lines were split or joined: everything from this line down moved.
    FromLineToEnd(usize),
}

impl DirtyLines {
    /// Returns true if no lines were dirtied.
    pub fn is_none(&self) -> bool {
        matches!(self, DirtyLines::None)
    }

    /// Returns the first dirty line, if any.
    pub fn start_line(&self) -> Option<usize> {
        match self {
            DirtyLines::None => None,
            DirtyLines::Single(line) | DirtyLines::FromLineToEnd(line) => Some(*line),
        }
    }

    /// Classifies an edit at `line` that added or removed `lines_changed`
    /// line breaks.
    pub(crate) fn for_edit(line: usize, lines_changed: usize) -> Self {
        if lines_changed == 0 {
            DirtyLines::Single(line)
        } else {
            DirtyLines::FromLineToEnd(line)
        }
    }
}
