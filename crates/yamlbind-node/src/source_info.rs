//! Source positions carried by every node.

use serde::{Deserialize, Serialize};

/// Position of a node in the text it was parsed from.
///
/// Nodes built in memory (by the encoder, or by hand) carry the default
/// position, which reports line 1, column 1 and zero length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Optional filename or source identifier
    pub file: Option<String>,

    /// Character offset from start of source (0-based)
    pub offset: usize,

    /// Line number (1-based)
    pub line: usize,

    /// Column number (1-based, in characters)
    pub col: usize,

    /// Length in characters
    pub len: usize,
}

impl SourceInfo {
    pub fn new(file: Option<String>, offset: usize, line: usize, col: usize, len: usize) -> Self {
        Self {
            file,
            offset,
            line,
            col,
            len,
        }
    }

    /// Create a SourceInfo from a yaml-rust2 marker.
    ///
    /// yaml-rust2 reports 1-based lines and 0-based columns.
    pub fn from_marker(marker: &yaml_rust2::scanner::Marker, len: usize) -> Self {
        Self {
            file: None,
            offset: marker.index(),
            line: marker.line().max(1),
            col: marker.col() + 1,
            len,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn end_offset(&self) -> usize {
        self.offset + self.len
    }

    /// True for positions that never came from parsed text.
    pub fn is_synthetic(&self) -> bool {
        self.file.is_none() && self.offset == 0 && self.len == 0 && self.line == 1 && self.col == 1
    }
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self {
            file: None,
            offset: 0,
            line: 1,
            col: 1,
            len: 0,
        }
    }
}

impl std::fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.col),
            None => write!(f, "{}:{}", self.line, self.col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_synthetic() {
        assert!(SourceInfo::default().is_synthetic());
        assert!(!SourceInfo::new(None, 4, 2, 1, 3).is_synthetic());
    }

    #[test]
    fn test_display() {
        let info = SourceInfo::new(None, 10, 3, 5, 2);
        assert_eq!(info.to_string(), "3:5");
        assert_eq!(info.with_file("a.yaml").to_string(), "a.yaml:3:5");
    }

    #[test]
    fn test_end_offset() {
        assert_eq!(SourceInfo::new(None, 10, 1, 1, 5).end_offset(), 15);
    }
}
