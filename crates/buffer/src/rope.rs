// Chunk: docs/chunks/rope_storage - Chunked B-tree rope storage

//! Rope storage for buffer bytes.
//!
//! The rope is a B-tree whose leaves hold contiguous runs of bytes ("chunks")
//! and whose internal nodes cache the byte length of their subtree. All leaves
//! sit at the same depth, so offset lookups, inserts and removes are
//! O(log n) regardless of where in the document they land.
//!
//! Leaves hold at most `max_leaf` bytes and, unless the leaf is the root, at
//! least a quarter of that. Internal nodes other than the root hold between
//! [`MIN_CHILDREN`] and [`MAX_CHILDREN`] children.

use std::io;

use crate::error::WriteError;
use crate::options::MIN_CHUNK_BYTES;
use crate::slice::Slice;

/// Maximum number of children per internal node.
const MAX_CHILDREN: usize = 8;
/// Minimum number of children per non-root internal node.
const MIN_CHILDREN: usize = MAX_CHILDREN / 2;

#[derive(Debug, Clone)]
enum Node {
    Leaf(Vec<u8>),
    Internal { children: Vec<Node>, len: usize },
}

impl Node {
    fn internal(children: Vec<Node>) -> Self {
        let len = children.iter().map(Node::len).sum();
        Node::Internal { children, len }
    }

    fn len(&self) -> usize {
        match self {
            Node::Leaf(data) => data.len(),
            Node::Internal { len, .. } => *len,
        }
    }

    fn is_underfull(&self, min_leaf: usize) -> bool {
        match self {
            Node::Leaf(data) => data.len() < min_leaf,
            Node::Internal { children, .. } => children.len() < MIN_CHILDREN,
        }
    }
}

/// A balanced tree of byte chunks.
#[derive(Debug, Clone)]
pub struct Rope {
    root: Node,
    max_leaf: usize,
}

impl Rope {
    /// Creates an empty rope whose leaves hold at most `max_leaf` bytes
    /// (raised to [`MIN_CHUNK_BYTES`] if smaller).
    pub fn new(max_leaf: usize) -> Self {
        Self {
            root: Node::Leaf(Vec::new()),
            max_leaf: max_leaf.max(MIN_CHUNK_BYTES),
        }
    }

    /// Builds a rope from `bytes`, packing leaves bottom-up.
    pub fn from_bytes(bytes: &[u8], max_leaf: usize) -> Self {
        let max_leaf = max_leaf.max(MIN_CHUNK_BYTES);
        let mut level: Vec<Node> = split_chunks(bytes, max_leaf)
            .into_iter()
            .map(Node::Leaf)
            .collect();
        while level.len() > 1 {
            level = pack(level);
        }
        let root = level.pop().unwrap_or_else(|| Node::Leaf(Vec::new()));
        Self { root, max_leaf }
    }

    fn min_leaf(&self) -> usize {
        self.max_leaf / 4
    }

    /// Returns the number of bytes stored. O(1).
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts `bytes` at `offset`.
    ///
    /// An insert landing exactly between two leaves extends the preceding one,
    /// so sequential typing keeps appending to the same chunk.
    pub fn insert(&mut self, offset: usize, bytes: &[u8]) {
        debug_assert!(offset <= self.len(), "insert offset {offset} past end");
        if bytes.is_empty() {
            return;
        }

        let overflow = insert_at(&mut self.root, offset, bytes, self.max_leaf);
        if overflow.is_empty() {
            return;
        }

        let root = std::mem::replace(&mut self.root, Node::Leaf(Vec::new()));
        let mut level = Vec::with_capacity(overflow.len() + 1);
        level.push(root);
        level.extend(overflow);
        while level.len() > 1 {
            level = pack(level);
            tracing::trace!(width = level.len(), "rope grew a level");
        }
        if let Some(root) = level.pop() {
            self.root = root;
        }
    }

    /// Removes the half-open byte range `start..end`.
    pub fn remove(&mut self, start: usize, end: usize) {
        debug_assert!(
            start <= end && end <= self.len(),
            "remove range {start}..{end} outside 0..{}",
            self.len()
        );
        if start == end {
            return;
        }

        let (min_leaf, max_leaf) = (self.min_leaf(), self.max_leaf);
        remove_range(&mut self.root, start, end, min_leaf, max_leaf);

        while let Node::Internal { children, .. } = &mut self.root {
            if children.len() > 1 {
                break;
            }
            self.root = children.pop().unwrap_or_else(|| Node::Leaf(Vec::new()));
            tracing::trace!("rope root collapsed");
        }
    }

    /// Returns a borrowed view over `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Slice<'_> {
        debug_assert!(start <= end && end <= self.len());
        let mut out = Slice::default();
        collect(&self.root, start, end, &mut out);
        out
    }

    /// Iterates the leaves in document order, skipping an empty root.
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            stack: vec![&self.root],
        }
    }

    /// Copies every byte into a new vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for chunk in self.chunks() {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Streams every leaf into `sink` without materializing the document.
    ///
    /// Interrupted writes are retried. The first other failure stops the
    /// stream and is returned together with the number of bytes the sink
    /// accepted.
    pub fn write_to<W: io::Write + ?Sized>(&self, sink: &mut W) -> Result<u64, WriteError> {
        let mut written: u64 = 0;
        for chunk in self.chunks() {
            let mut rest = chunk;
            while !rest.is_empty() {
                match sink.write(rest) {
                    Ok(0) => {
                        return Err(WriteError {
                            written,
                            source: io::Error::new(
                                io::ErrorKind::WriteZero,
                                "sink stopped accepting bytes",
                            ),
                        });
                    }
                    Ok(n) => {
                        written += n as u64;
                        rest = &rest[n..];
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(source) => return Err(WriteError { written, source }),
                }
            }
        }
        Ok(written)
    }

    /// Returns the depth of the tree (1 for a lone leaf).
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = &self.root;
        while let Node::Internal { children, .. } = node {
            match children.first() {
                Some(child) => node = child,
                None => break,
            }
            height += 1;
        }
        height
    }

    /// Panics if any structural invariant is broken: cached lengths, uniform
    /// leaf depth, and node fill bounds.
    #[cfg(any(debug_assertions, test))]
    pub fn assert_invariants(&self) {
        check_node(&self.root, true, self.min_leaf(), self.max_leaf);
    }
}

/// In-order iterator over rope leaves.
#[derive(Debug)]
pub struct Chunks<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf(data) if data.is_empty() => {}
                Node::Leaf(data) => return Some(data),
                Node::Internal { children, .. } => self.stack.extend(children.iter().rev()),
            }
        }
        None
    }
}

/// Splits `bytes` into evenly sized pieces of at most `max_leaf` bytes.
///
/// Always returns at least one piece; empty input yields one empty piece.
fn split_chunks(bytes: &[u8], max_leaf: usize) -> Vec<Vec<u8>> {
    let count = bytes.len().div_ceil(max_leaf).max(1);
    let base = bytes.len() / count;
    let extra = bytes.len() % count;

    let mut pieces = Vec::with_capacity(count);
    let mut at = 0;
    for i in 0..count {
        let size = base + usize::from(i < extra);
        pieces.push(bytes[at..at + size].to_vec());
        at += size;
    }
    pieces
}

/// Groups sibling nodes under as few parents as possible, each parent
/// receiving an even share of at most [`MAX_CHILDREN`] children.
fn pack(nodes: Vec<Node>) -> Vec<Node> {
    let groups = nodes.len().div_ceil(MAX_CHILDREN).max(1);
    let base = nodes.len() / groups;
    let extra = nodes.len() % groups;

    let mut rest = nodes.into_iter();
    (0..groups)
        .map(|i| {
            let take = base + usize::from(i < extra);
            Node::internal(rest.by_ref().take(take).collect())
        })
        .collect()
}

/// Finds the child holding `offset`, preferring the left child on a boundary.
/// Returns the child index and the offset relative to that child.
fn locate(children: &[Node], offset: usize) -> (usize, usize) {
    let mut acc = 0;
    for (i, child) in children.iter().enumerate() {
        let end = acc + child.len();
        if offset <= end {
            return (i, offset - acc);
        }
        acc = end;
    }
    let last = children.len().saturating_sub(1);
    let last_len = children.last().map_or(0, Node::len);
    (last, offset - (acc - last_len))
}

/// Inserts into `node`, returning new right-hand siblings when it overflows.
fn insert_at(node: &mut Node, offset: usize, bytes: &[u8], max_leaf: usize) -> Vec<Node> {
    match node {
        Node::Leaf(data) => {
            if data.len() + bytes.len() <= max_leaf {
                data.splice(offset..offset, bytes.iter().copied());
                return Vec::new();
            }

            let mut combined = Vec::with_capacity(data.len() + bytes.len());
            combined.extend_from_slice(&data[..offset]);
            combined.extend_from_slice(bytes);
            combined.extend_from_slice(&data[offset..]);

            let mut pieces = split_chunks(&combined, max_leaf).into_iter();
            *data = pieces.next().unwrap_or_default();
            let siblings: Vec<Node> = pieces.map(Node::Leaf).collect();
            tracing::trace!(pieces = siblings.len() + 1, "split leaf");
            siblings
        }
        Node::Internal { children, len } => {
            *len += bytes.len();
            let (idx, child_offset) = locate(children, offset);
            let overflow = insert_at(&mut children[idx], child_offset, bytes, max_leaf);
            if overflow.is_empty() {
                return Vec::new();
            }

            children.splice(idx + 1..idx + 1, overflow);
            if children.len() <= MAX_CHILDREN {
                return Vec::new();
            }

            let mut groups = pack(std::mem::take(children)).into_iter();
            if let Some(first) = groups.next() {
                *node = first;
            }
            groups.collect()
        }
    }
}

/// Removes the node-relative range `start..end` and repairs underfull
/// children. The caller repairs `node` itself.
fn remove_range(node: &mut Node, start: usize, end: usize, min_leaf: usize, max_leaf: usize) {
    match node {
        Node::Leaf(data) => {
            data.drain(start..end);
        }
        Node::Internal { children, len } => {
            *len -= end - start;

            let mut acc = 0;
            let mut i = 0;
            while i < children.len() && acc < end {
                let child_len = children[i].len();
                let child_end = acc + child_len;
                if child_end <= start {
                    acc = child_end;
                    i += 1;
                    continue;
                }

                let from = start.max(acc) - acc;
                let to = end.min(child_end) - acc;
                if from == 0 && to == child_len {
                    children.remove(i);
                } else {
                    remove_range(&mut children[i], from, to, min_leaf, max_leaf);
                    i += 1;
                }
                acc = child_end;
            }

            rebalance(children, min_leaf, max_leaf);
        }
    }
}

/// Merges every underfull child into a neighbour, redistributing when the
/// merged node would overflow.
fn rebalance(children: &mut Vec<Node>, min_leaf: usize, max_leaf: usize) {
    let mut i = 0;
    while i < children.len() && children.len() > 1 {
        if !children[i].is_underfull(min_leaf) {
            i += 1;
            continue;
        }

        let left = if i + 1 < children.len() { i } else { i - 1 };
        let right = children.remove(left + 1);
        let merged = merge(children.remove(left), right, min_leaf, max_leaf);
        tracing::trace!(into = merged.len(), "merged underfull node");
        children.splice(left..left, merged);
        i = left;
    }
}

/// Merges two siblings of equal depth into one node, or two if the result
/// would overflow.
fn merge(left: Node, right: Node, min_leaf: usize, max_leaf: usize) -> Vec<Node> {
    match (left, right) {
        (Node::Leaf(mut a), Node::Leaf(b)) => {
            if a.len() + b.len() <= max_leaf {
                a.extend_from_slice(&b);
                return vec![Node::Leaf(a)];
            }
            a.extend_from_slice(&b);
            split_chunks(&a, max_leaf)
                .into_iter()
                .map(Node::Leaf)
                .collect()
        }
        (
            Node::Internal {
                children: mut a, ..
            },
            Node::Internal { children: b, .. },
        ) => {
            a.extend(b);
            rebalance(&mut a, min_leaf, max_leaf);
            if a.len() <= MAX_CHILDREN {
                vec![Node::internal(a)]
            } else {
                pack(a)
            }
        }
        // Siblings always share a depth.
        (left, right) => vec![left, right],
    }
}

fn collect<'a>(node: &'a Node, start: usize, end: usize, out: &mut Slice<'a>) {
    match node {
        Node::Leaf(data) => out.push(&data[start..end]),
        Node::Internal { children, .. } => {
            let mut acc = 0;
            for child in children {
                if acc >= end {
                    break;
                }
                let child_end = acc + child.len();
                if child_end > start {
                    collect(child, start.max(acc) - acc, end.min(child_end) - acc, out);
                }
                acc = child_end;
            }
        }
    }
}

/// Returns the depth of `node` after checking its invariants.
#[cfg(any(debug_assertions, test))]
fn check_node(node: &Node, is_root: bool, min_leaf: usize, max_leaf: usize) -> usize {
    match node {
        Node::Leaf(data) => {
            assert!(data.len() <= max_leaf, "leaf holds {} bytes", data.len());
            if !is_root {
                assert!(
                    data.len() >= min_leaf,
                    "non-root leaf holds {} bytes, minimum {min_leaf}",
                    data.len()
                );
            }
            1
        }
        Node::Internal { children, len } => {
            assert!(children.len() <= MAX_CHILDREN, "{} children", children.len());
            if is_root {
                assert!(children.len() >= 2, "root has {} children", children.len());
            } else {
                assert!(children.len() >= MIN_CHILDREN, "{} children", children.len());
            }
            let actual: usize = children.iter().map(Node::len).sum();
            assert_eq!(*len, actual, "cached length drift");

            let mut depths = children
                .iter()
                .map(|child| check_node(child, false, min_leaf, max_leaf));
            let depth = depths.next().unwrap_or(0);
            assert!(depths.all(|d| d == depth), "leaves at uneven depth");
            depth + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(rope: &Rope) -> String {
        String::from_utf8(rope.to_vec()).unwrap()
    }

    fn numbered(n: usize) -> Vec<u8> {
        (0..n).map(|i| b'a' + (i % 26) as u8).collect()
    }

    #[test]
    fn test_new_empty() {
        let rope = Rope::new(16);
        assert!(rope.is_empty());
        assert_eq!(rope.len(), 0);
        assert_eq!(rope.height(), 1);
        assert_eq!(rope.chunks().count(), 0);
        rope.assert_invariants();
    }

    #[test]
    fn test_from_bytes_splits_evenly() {
        let rope = Rope::from_bytes(&numbered(100), 16);
        assert_eq!(rope.len(), 100);
        assert_eq!(rope.to_vec(), numbered(100));
        assert!(rope.chunks().all(|c| (8..=16).contains(&c.len())));
        rope.assert_invariants();
    }

    #[test]
    fn test_from_bytes_builds_multiple_levels() {
        let rope = Rope::from_bytes(&numbered(10_000), 16);
        assert!(rope.height() >= 3);
        assert_eq!(rope.to_vec(), numbered(10_000));
        rope.assert_invariants();
    }

    #[test]
    fn test_insert_into_empty() {
        let mut rope = Rope::new(16);
        rope.insert(0, b"hello");
        assert_eq!(text(&rope), "hello");
        rope.assert_invariants();
    }

    #[test]
    fn test_insert_middle() {
        let mut rope = Rope::from_bytes(b"helloworld", 16);
        rope.insert(5, b", ");
        assert_eq!(text(&rope), "hello, world");
    }

    #[test]
    fn test_sequential_typing_appends() {
        let mut rope = Rope::new(16);
        for (i, ch) in numbered(500).iter().enumerate() {
            rope.insert(i, &[*ch]);
        }
        assert_eq!(rope.to_vec(), numbered(500));
        rope.assert_invariants();
    }

    #[test]
    fn test_insert_at_front_repeatedly() {
        let mut rope = Rope::new(16);
        for _ in 0..300 {
            rope.insert(0, b"xy");
        }
        assert_eq!(rope.len(), 600);
        assert!(rope.to_vec().chunks(2).all(|pair| pair == b"xy"));
        rope.assert_invariants();
    }

    #[test]
    fn test_boundary_insert_extends_preceding_leaf() {
        let mut rope = Rope::from_bytes(&numbered(32), 16);
        let first_len = rope.chunks().next().unwrap().len();
        assert_eq!(first_len, 16);
        rope.remove(15, 16);
        // Offset 15 is now the end of the first leaf.
        rope.insert(15, b"Z");
        assert_eq!(rope.chunks().next().unwrap().last(), Some(&b'Z'));
        rope.assert_invariants();
    }

    #[test]
    fn test_bulk_insert_grows_tree() {
        let mut rope = Rope::from_bytes(b"[]", 16);
        rope.insert(1, &numbered(5_000));
        assert_eq!(rope.len(), 5_002);
        let bytes = rope.to_vec();
        assert_eq!(bytes[0], b'[');
        assert_eq!(bytes[5_001], b']');
        assert_eq!(&bytes[1..5_001], &numbered(5_000)[..]);
        rope.assert_invariants();
    }

    #[test]
    fn test_remove_within_leaf() {
        let mut rope = Rope::from_bytes(b"hello world", 16);
        rope.remove(5, 11);
        assert_eq!(text(&rope), "hello");
    }

    #[test]
    fn test_remove_across_leaves() {
        let mut rope = Rope::from_bytes(&numbered(200), 16);
        rope.remove(10, 190);
        let mut expected = numbered(200);
        expected.drain(10..190);
        assert_eq!(rope.to_vec(), expected);
        rope.assert_invariants();
    }

    #[test]
    fn test_remove_everything() {
        let mut rope = Rope::from_bytes(&numbered(1_000), 16);
        rope.remove(0, 1_000);
        assert!(rope.is_empty());
        assert_eq!(rope.height(), 1);
        rope.assert_invariants();
    }

    #[test]
    fn test_remove_front_repeatedly_keeps_balance() {
        let mut expected = numbered(2_000);
        let mut rope = Rope::from_bytes(&expected, 16);
        while !expected.is_empty() {
            let n = expected.len().min(7);
            rope.remove(0, n);
            expected.drain(0..n);
            rope.assert_invariants();
        }
        assert!(rope.is_empty());
    }

    #[test]
    fn test_remove_empty_range_is_noop() {
        let mut rope = Rope::from_bytes(b"abc", 16);
        rope.remove(1, 1);
        assert_eq!(text(&rope), "abc");
    }

    #[test]
    fn test_slice_spans_leaves() {
        let rope = Rope::from_bytes(&numbered(100), 16);
        let slice = rope.slice(10, 60);
        assert!(slice.chunks().count() > 1);
        assert_eq!(slice.to_vec(), numbered(100)[10..60].to_vec());
    }

    #[test]
    fn test_slice_empty_range() {
        let rope = Rope::from_bytes(&numbered(100), 16);
        assert!(rope.slice(40, 40).is_empty());
        assert!(rope.slice(100, 100).is_empty());
    }

    #[test]
    fn test_write_to_matches_to_vec() {
        let rope = Rope::from_bytes(&numbered(1_234), 16);
        let mut sink = Vec::new();
        let written = rope.write_to(&mut sink).unwrap();
        assert_eq!(written, 1_234);
        assert_eq!(sink, rope.to_vec());
    }

    /// Accepts a fixed number of bytes, then fails.
    struct FailAfter {
        remaining: usize,
        kind: io::ErrorKind,
    }

    impl io::Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(self.kind, "sink failed"));
            }
            let n = buf.len().min(self.remaining).min(5);
            self.remaining -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_to_reports_partial_count() {
        let rope = Rope::from_bytes(&numbered(100), 16);
        let mut sink = FailAfter {
            remaining: 37,
            kind: io::ErrorKind::BrokenPipe,
        };
        let err = rope.write_to(&mut sink).unwrap_err();
        assert_eq!(err.written, 37);
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        // Storage untouched
        assert_eq!(rope.to_vec(), numbered(100));
    }

    struct ZeroWriter;

    impl io::Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_to_zero_write_is_error() {
        let rope = Rope::from_bytes(b"abc", 16);
        let err = rope.write_to(&mut ZeroWriter).unwrap_err();
        assert_eq!(err.written, 0);
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    struct InterruptOnce {
        interrupted: bool,
        out: Vec<u8>,
    }

    impl io::Write for InterruptOnce {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_to_retries_interrupted() {
        let rope = Rope::from_bytes(&numbered(50), 16);
        let mut sink = InterruptOnce {
            interrupted: false,
            out: Vec::new(),
        };
        assert_eq!(rope.write_to(&mut sink).unwrap(), 50);
        assert_eq!(sink.out, numbered(50));
    }

    #[test]
    fn test_write_to_empty() {
        let rope = Rope::new(16);
        let mut sink = Vec::new();
        assert_eq!(rope.write_to(&mut sink).unwrap(), 0);
        assert!(sink.is_empty());
    }

    #[derive(Debug, Clone)]
    enum RopeEdit {
        Insert(usize, Vec<u8>),
        Remove(usize, usize),
    }

    fn rope_edit() -> impl proptest::strategy::Strategy<Value = RopeEdit> {
        use proptest::prelude::*;
        prop_oneof![
            (any::<usize>(), prop::collection::vec(any::<u8>(), 1..3_000))
                .prop_map(|(at, bytes)| RopeEdit::Insert(at, bytes)),
            (any::<usize>(), any::<usize>()).prop_map(|(a, b)| RopeEdit::Remove(a, b)),
        ]
    }

    proptest::proptest! {
        #[test]
        fn test_random_edits_keep_rope_balanced(
            max_leaf in 8usize..48,
            edits in proptest::collection::vec(rope_edit(), 1..60),
        ) {
            let mut rope = Rope::new(max_leaf);
            let mut model: Vec<u8> = Vec::new();
            for edit in edits {
                match edit {
                    RopeEdit::Insert(at, bytes) => {
                        let at = at % (model.len() + 1);
                        rope.insert(at, &bytes);
                        model.splice(at..at, bytes);
                    }
                    RopeEdit::Remove(a, b) => {
                        let a = a % (model.len() + 1);
                        let b = b % (model.len() + 1);
                        let (start, end) = (a.min(b), a.max(b));
                        rope.remove(start, end);
                        model.drain(start..end);
                    }
                }
                rope.assert_invariants();
                proptest::prop_assert_eq!(rope.len(), model.len());
                proptest::prop_assert_eq!(rope.to_vec(), model.clone());
            }
        }
    }
}
