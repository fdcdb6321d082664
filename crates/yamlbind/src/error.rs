//! Error kinds raised while encoding or decoding.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use yamlbind_node::{Node, SourceInfo};

/// Boxed error returned by custom codecs.
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for encode and decode operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Source node kind cannot become the destination type.
    #[error("cannot unmarshal {found} into a value of type {expected}")]
    TypeMismatch { expected: String, found: String },

    /// Numeric value outside the destination range.
    #[error("cannot unmarshal {value} into a value of type {target} (overflow)")]
    Overflow { value: String, target: &'static str },

    /// Mapping key with no matching struct field (strict mode).
    #[error("unknown field \"{field}\"")]
    UnknownField { field: String },

    /// Mapping key repeated at one level (strict mode).
    #[error("mapping key \"{key}\" already defined at {first}")]
    DuplicateKey { key: String, first: SourceInfo },

    #[error("cannot find anchor by alias name {name}")]
    UnresolvedAlias { name: String },

    /// A type that only encodes through a registered codec has none.
    #[error("no custom codec registered for {type_name}")]
    UnimplementedCodec { type_name: &'static str },

    #[error("invalid field tag on {type_name}.{field}: {message}")]
    InvalidStructTag {
        type_name: &'static str,
        field: String,
        message: String,
    },

    /// Auto-alias field whose value was never anchored.
    #[error("cannot find anchor for alias field {field}")]
    AnchorNotFound { field: String },

    #[error("document nesting exceeds {limit} levels")]
    DepthLimitExceeded { limit: usize },

    /// Error returned by a custom codec.
    #[error("{0}")]
    Codec(CodecError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Parse, path and comment placement errors from the tree layer.
    #[error(transparent)]
    Node(#[from] yamlbind_node::Error),
}

impl ErrorKind {
    /// Stable code for each kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::TypeMismatch { .. } => "Y-1-1",
            ErrorKind::Overflow { .. } => "Y-1-2",
            ErrorKind::UnknownField { .. } => "Y-1-3",
            ErrorKind::DuplicateKey { .. } => "Y-1-4",
            ErrorKind::UnresolvedAlias { .. } => "Y-1-5",
            ErrorKind::UnimplementedCodec { .. } => "Y-1-6",
            ErrorKind::InvalidStructTag { .. } => "Y-1-7",
            ErrorKind::AnchorNotFound { .. } => "Y-1-8",
            ErrorKind::DepthLimitExceeded { .. } => "Y-1-9",
            ErrorKind::Codec(_) => "Y-1-10",
            ErrorKind::Io { .. } => "Y-2-1",
            ErrorKind::Node(yamlbind_node::Error::Parse { .. } | yamlbind_node::Error::Empty) => {
                "Y-2-2"
            }
            ErrorKind::Node(_) => "Y-2-3",
        }
    }

    pub fn type_mismatch(expected: impl Into<String>, node: &Node) -> Self {
        ErrorKind::TypeMismatch {
            expected: expected.into(),
            found: node.kind_name().to_string(),
        }
    }
}

/// An error with the struct field path and the source position where it
/// arose.
#[derive(Debug)]
pub struct Error {
    kind: Box<ErrorKind>,
    path: FieldPath,
    location: Option<SourceInfo>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        let location = match &kind {
            ErrorKind::Node(err) => err.location().cloned(),
            _ => None,
        };
        Self {
            kind: Box::new(kind),
            path: FieldPath::new(),
            location,
        }
    }

    /// Error raised at `node`; synthetic positions are not recorded.
    pub fn at(kind: ErrorKind, node: &Node) -> Self {
        let mut err = Self::new(kind);
        if !node.source_info.is_synthetic() {
            err.location = Some(node.source_info.clone());
        }
        err
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.kind
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn location(&self) -> Option<&SourceInfo> {
        self.location.as_ref()
    }

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    /// Prefix the path with a struct field or map key.
    pub fn in_field(mut self, name: impl Into<String>) -> Self {
        self.path.segments.insert(0, PathSegment::Field(name.into()));
        self
    }

    /// Prefix the path with a sequence index.
    pub fn in_index(mut self, index: usize) -> Self {
        self.path.segments.insert(0, PathSegment::Index(index));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        if !self.path.is_empty() {
            write!(f, "field {}: ", self.path)?;
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind.as_ref() {
            ErrorKind::Codec(err) => Some(err.as_ref()),
            ErrorKind::Io { source, .. } => Some(source),
            ErrorKind::Node(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<yamlbind_node::Error> for Error {
    fn from(err: yamlbind_node::Error) -> Self {
        Error::new(ErrorKind::Node(err))
    }
}

/// Dotted path to the struct field an error came from
/// (`servers[1].port`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i > 0 => write!(f, ".{}", name)?,
                PathSegment::Field(name) => write!(f, "{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Struct field or map key
    Field(String),
    /// Sequence index
    Index(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_display() {
        let err = Error::new(ErrorKind::UnknownField { field: "x".into() })
            .in_field("port")
            .in_index(1)
            .in_field("servers");
        assert_eq!(err.path().to_string(), "servers[1].port");
        assert_eq!(err.path().len(), 3);
    }

    #[test]
    fn test_display_with_location() {
        let node = Node::null().with_source_info(SourceInfo::new(None, 4, 2, 3, 1));
        let err = Error::at(
            ErrorKind::Overflow {
                value: "300".into(),
                target: "u8",
            },
            &node,
        )
        .in_field("level");
        assert_eq!(
            err.to_string(),
            "2:3: field level: cannot unmarshal 300 into a value of type u8 (overflow)"
        );
        assert_eq!(err.error_code(), "Y-1-2");
    }

    #[test]
    fn test_synthetic_location_is_dropped() {
        let err = Error::at(ErrorKind::UnresolvedAlias { name: "a".into() }, &Node::null());
        assert!(err.location().is_none());
        assert_eq!(err.to_string(), "cannot find anchor by alias name a");
    }
}
