// Chunk: docs/chunks/rope_storage - Borrowed byte views over rope chunks

//! Borrowed, no-copy views into buffer storage.

use std::borrow::Cow;
use std::fmt;

use smallvec::SmallVec;

use crate::utf8;

/// A read-only view over a byte range of a buffer.
///
/// The range may straddle several rope leaves, so the view is a short list of
/// borrowed pieces rather than one contiguous slice. It borrows the buffer:
/// the borrow checker ends the view's life before the next mutation.
///
/// ```
/// use lite_rope_buffer::TextBuffer;
///
/// let buf = TextBuffer::from_str("abc\ndef\n");
/// let line = buf.line(1).unwrap();
/// assert_eq!(line, "def\n");
/// assert_eq!(line.len(), 4);
/// ```
#[derive(Clone, Default)]
pub struct Slice<'a> {
    pieces: SmallVec<[&'a [u8]; 2]>,
    len: usize,
}

impl<'a> Slice<'a> {
    pub(crate) fn push(&mut self, piece: &'a [u8]) {
        if !piece.is_empty() {
            self.len += piece.len();
            self.pieces.push(piece);
        }
    }

    /// Returns the number of bytes in the view.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the view contains no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates the borrowed pieces in order. Pieces are never empty.
    pub fn chunks(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.pieces.iter().copied()
    }

    /// Iterates every byte of the view.
    pub fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.pieces.iter().flat_map(|piece| piece.iter().copied())
    }

    /// Returns the bytes as one slice if they live in a single leaf.
    pub fn as_contiguous(&self) -> Option<&'a [u8]> {
        match self.pieces.as_slice() {
            [] => Some(&[]),
            [piece] => Some(piece),
            _ => None,
        }
    }

    /// Returns the bytes, borrowing when they are contiguous and copying
    /// otherwise.
    pub fn to_cow(&self) -> Cow<'a, [u8]> {
        match self.as_contiguous() {
            Some(bytes) => Cow::Borrowed(bytes),
            None => Cow::Owned(self.to_vec()),
        }
    }

    /// Copies the view into a new vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for piece in &self.pieces {
            out.extend_from_slice(piece);
        }
        out
    }

    /// Decodes the view, one U+FFFD per invalid byte.
    pub fn to_string_lossy(&self) -> String {
        utf8::decode_lossy(&self.to_cow())
    }

    /// Counts the runes in the view.
    pub fn rune_count(&self) -> usize {
        utf8::count_runes(&self.to_cow())
    }

    fn eq_bytes(&self, other: &[u8]) -> bool {
        self.len == other.len() && self.bytes().eq(other.iter().copied())
    }
}

impl fmt::Debug for Slice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.to_cow()))
    }
}

impl PartialEq for Slice<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.bytes().eq(other.bytes())
    }
}

impl Eq for Slice<'_> {}

impl PartialEq<[u8]> for Slice<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.eq_bytes(other)
    }
}

impl PartialEq<&[u8]> for Slice<'_> {
    fn eq(&self, other: &&[u8]) -> bool {
        self.eq_bytes(other)
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for Slice<'_> {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.eq_bytes(&other[..])
    }
}

impl PartialEq<Vec<u8>> for Slice<'_> {
    fn eq(&self, other: &Vec<u8>) -> bool {
        self.eq_bytes(other)
    }
}

impl PartialEq<str> for Slice<'_> {
    fn eq(&self, other: &str) -> bool {
        self.eq_bytes(other.as_bytes())
    }
}

impl PartialEq<&str> for Slice<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.eq_bytes(other.as_bytes())
    }
}
