// Chunk: docs/chunks/grapheme_cluster_awareness - Grapheme cluster boundary helpers

//! Grapheme cluster boundaries expressed in rune columns.
//!
//! Buffer columns count runes, but a user-perceived character may span
//! several of them:
//!
//! - ZWJ emoji sequences: 👨‍👩‍👧‍👦 (4 codepoints + 3 ZWJ = 7 runes)
//! - Combining character sequences: é (e + combining acute = 2 runes)
//! - Regional indicator pairs: 🇺🇸 (2 runes)
//!
//! These helpers let callers widen a column range to whole clusters before
//! removing it. Input is a decoded line (see [`crate::utf8::decode_lossy`]),
//! so each invalid byte is its own replacement-character cluster and columns
//! stay aligned with the buffer's rune columns.

use unicode_segmentation::UnicodeSegmentation;

/// Iterates `(start_col, end_col)` of each extended grapheme cluster.
fn clusters(text: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut col = 0;
    text.graphemes(true).map(move |grapheme| {
        let start = col;
        col += grapheme.chars().count();
        (start, col)
    })
}

/// Returns the rune column of the grapheme boundary immediately before `col`.
///
/// At a boundary this is the start of the previous cluster; inside a cluster
/// it is the start of that cluster. Column 0 maps to 0.
pub fn grapheme_boundary_left(text: &str, col: usize) -> usize {
    if col == 0 {
        return 0;
    }
    if text.is_ascii() {
        return col.min(text.len()).saturating_sub(1);
    }
    clusters(text)
        .take_while(|&(start, _)| start < col)
        .last()
        .map_or(0, |(start, _)| start)
}

/// Returns the rune column of the grapheme boundary immediately after `col`.
///
/// This is the end of the cluster containing `col`. Columns at or past the
/// end of the line map to the rune count.
pub fn grapheme_boundary_right(text: &str, col: usize) -> usize {
    if text.is_ascii() {
        return (col + 1).min(text.len());
    }
    let mut total = 0;
    for (_, end) in clusters(text) {
        if col < end {
            return end;
        }
        total = end;
    }
    total
}

/// Returns true if `col` falls between two clusters (or at either end).
pub fn is_grapheme_boundary(text: &str, col: usize) -> bool {
    if col == 0 || text.is_ascii() {
        return true;
    }
    clusters(text)
        .map(|(_, end)| end)
        .take_while(|&end| end <= col)
        .any(|end| end == col)
}
