// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Source positions and their total order.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

/// A byte offset within a file.
///
/// Positions are ordered by file path (byte-lexicographic) and then by
/// offset. `line` and `column` are derived from the offset and are only
/// used for display.
#[derive(Debug, Clone, Serialize)]
pub struct SourcePosition {
    pub file: PathBuf,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl PartialEq for SourcePosition {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.file.as_os_str() == other.file.as_os_str()
    }
}

impl Eq for SourcePosition {}

impl PartialOrd for SourcePosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourcePosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file
            .as_os_str()
            .cmp(other.file.as_os_str())
            .then(self.offset.cmp(&other.offset))
    }
}

impl std::hash::Hash for SourcePosition {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.file.as_os_str().hash(state);
        self.offset.hash(state);
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Line start offsets of a file, for offset to line:column conversion.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(src: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(src.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex { starts }
    }

    /// 1-based line and byte column of `offset`.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (line + 1, offset - self.starts[line] + 1)
    }

    pub fn position(&self, file: &Path, offset: usize) -> SourcePosition {
        let (line, column) = self.line_col(offset);
        SourcePosition {
            file: file.to_path_buf(),
            offset,
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let idx = LineIndex::new("package a\n\ntype T int\n");
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(10), (2, 1));
        assert_eq!(idx.line_col(16), (3, 6));
    }

    #[test]
    fn test_order_by_file_then_offset() {
        let idx = LineIndex::new("x\ny\n");
        let a = idx.position(Path::new("/a/b.go"), 2);
        let b = idx.position(Path::new("/a/b.go"), 0);
        let c = idx.position(Path::new("/a/a.go"), 3);
        let mut all = vec![a.clone(), b.clone(), c.clone()];
        all.sort();
        assert_eq!(all, vec![c, b, a]);
    }
}
