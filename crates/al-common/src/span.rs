use serde::Serialize;
use std::cmp::Ordering;

/// A (line, column)-delimited source range, 1-indexed on both axes.
///
/// Every AST node and diagnostic carries one. Unlike byte-offset spans,
/// line/column positions survive independently of how the source was
/// sliced, which is what the formatter and LSP hover need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Span {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// A zero-width span at a single position, used for synthesized nodes.
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column)
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        let (start_line, start_column) = match self.start().cmp(&other.start()) {
            Ordering::Greater => (other.start_line, other.start_column),
            _ => (self.start_line, self.start_column),
        };
        let (end_line, end_column) = match self.end().cmp(&other.end()) {
            Ordering::Less => (other.end_line, other.end_column),
            _ => (self.end_line, self.end_column),
        };
        Span::new(start_line, start_column, end_line, end_column)
    }

    fn start(&self) -> (u32, u32) {
        (self.start_line, self.start_column)
    }

    fn end(&self) -> (u32, u32) {
        (self.end_line, self.end_column)
    }

    /// Whether `self` starts no later than, and ends no earlier than, `pos`.
    pub fn contains(&self, line: u32, column: u32) -> bool {
        (line, column) >= self.start() && (line, column) <= self.end()
    }
}

/// Tracks line starts so a byte offset can be converted back to (line, column).
///
/// The core itself never needs byte offsets -- the scanner produces
/// line/column directly -- but external renderers (ariadne, LSP transports)
/// operate on byte ranges, so this index bridges the two worlds.
#[derive(Debug)]
pub struct LineIndex {
    line_starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self {
            line_starts,
            len: source.len() as u32,
        }
    }

    /// Byte offset of the first byte of `line` (1-indexed). Tabs count as one
    /// byte/column each, matching the scanner's column bookkeeping.
    pub fn offset(&self, line: u32, column: u32) -> u32 {
        let idx = (line.saturating_sub(1)) as usize;
        let line_start = self
            .line_starts
            .get(idx)
            .copied()
            .unwrap_or(self.len);
        (line_start + column.saturating_sub(1)).min(self.len)
    }

    pub fn span_to_range(&self, span: Span) -> std::ops::Range<usize> {
        let start = self.offset(span.start_line, span.start_column) as usize;
        let end = self.offset(span.end_line, span.end_column) as usize;
        if end < start {
            start..start
        } else {
            start..end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_picks_outer_bounds() {
        let a = Span::new(1, 1, 1, 5);
        let b = Span::new(1, 3, 2, 2);
        let merged = a.merge(b);
        assert_eq!(merged, Span::new(1, 1, 2, 2));
    }

    #[test]
    fn line_index_offsets() {
        let idx = LineIndex::new("ab\ncd\n");
        assert_eq!(idx.offset(1, 1), 0);
        assert_eq!(idx.offset(2, 1), 3);
        assert_eq!(idx.offset(2, 3), 5);
    }

    #[test]
    fn span_contains_position() {
        let span = Span::new(2, 3, 4, 1);
        assert!(span.contains(3, 100));
        assert!(!span.contains(1, 1));
        assert!(!span.contains(4, 2));
    }
}
