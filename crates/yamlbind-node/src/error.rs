//! Errors raised while turning text into a tree, or resolving a path.

use crate::SourceInfo;
use thiserror::Error;

/// Result type alias for yamlbind-node operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Syntax error reported by the parser.
    #[error("{message}")]
    Parse {
        message: String,
        location: Option<SourceInfo>,
    },

    /// The input held no document.
    #[error("no document found")]
    Empty,

    /// Malformed comment path.
    #[error("invalid path '{path}': {message}")]
    Path { path: String, message: String },

    /// A comment position the selected node cannot carry.
    #[error("cannot attach a {position} comment at '{path}'")]
    UnsupportedCommentPosition {
        path: String,
        position: crate::CommentPosition,
    },
}

impl Error {
    pub fn location(&self) -> Option<&SourceInfo> {
        match self {
            Error::Parse { location, .. } => location.as_ref(),
            _ => None,
        }
    }

    /// Name the file a parse error came from.
    pub fn in_file(mut self, filename: Option<&str>) -> Self {
        if let (Error::Parse { location: Some(location), .. }, Some(name)) = (&mut self, filename) {
            location.file.get_or_insert_with(|| name.to_string());
        }
        self
    }
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        Error::Parse {
            message: err.info().to_string(),
            location: Some(SourceInfo::from_marker(err.marker(), 0)),
        }
    }
}
