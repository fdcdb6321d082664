//! The document tree.
//!
//! A [`Node`] is a closed tagged variant over everything a document can
//! hold. Every node carries the [`SourceInfo`] it was parsed from (or the
//! default position when built in memory) plus an optional line comment.

use crate::SourceInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Consecutive comment lines, stored without the leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentGroup {
    pub lines: Vec<String>,
}

impl CommentGroup {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// Quoting requested for a string scalar.
///
/// `Plain` still falls back to double quotes when the text cannot be
/// written unquoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScalarStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
}

/// Explicit tag attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Str,
    Int,
    Float,
    Bool,
    Null,
    Binary,
    Map,
    Seq,
    Timestamp,
    /// Any tag outside the core schema, stored as written (`!point`,
    /// `!!python/tuple`).
    Other(String),
}

const CORE_PREFIX: &str = "tag:yaml.org,2002:";

impl Tag {
    /// Classify a tag from its parser handle and suffix.
    pub fn from_parts(handle: &str, suffix: &str) -> Self {
        if handle == "!!" || handle == CORE_PREFIX {
            return Self::core(suffix).unwrap_or_else(|| Tag::Other(format!("!!{}", suffix)));
        }
        if let Some(rest) = suffix.strip_prefix(CORE_PREFIX) {
            if let Some(tag) = Self::core(rest) {
                return tag;
            }
        }
        Tag::Other(format!("{}{}", handle, suffix))
    }

    fn core(name: &str) -> Option<Self> {
        Some(match name {
            "str" => Tag::Str,
            "int" => Tag::Int,
            "float" => Tag::Float,
            "bool" => Tag::Bool,
            "null" => Tag::Null,
            "binary" => Tag::Binary,
            "map" => Tag::Map,
            "seq" => Tag::Seq,
            "timestamp" => Tag::Timestamp,
            _ => return None,
        })
    }

    /// True for tags whose scalar content the decoder coerces itself.
    pub fn is_core(&self) -> bool {
        !matches!(self, Tag::Other(_))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tag::Str => "!!str",
            Tag::Int => "!!int",
            Tag::Float => "!!float",
            Tag::Bool => "!!bool",
            Tag::Null => "!!null",
            Tag::Binary => "!!binary",
            Tag::Map => "!!map",
            Tag::Seq => "!!seq",
            Tag::Timestamp => "!!timestamp",
            Tag::Other(s) => s,
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mapping {
    pub entries: Vec<MappingEntry>,
    pub flow: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub key: Node,
    pub value: Node,
    /// Comment lines written above the entry.
    pub head_comment: Option<CommentGroup>,
    /// Comment lines written after the entry's value.
    pub foot_comment: Option<CommentGroup>,
}

impl MappingEntry {
    pub fn new(key: Node, value: Node) -> Self {
        Self {
            key,
            value,
            head_comment: None,
            foot_comment: None,
        }
    }

    pub fn is_merge(&self) -> bool {
        matches!(self.key.kind, NodeKind::MergeKey)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sequence {
    pub items: Vec<Node>,
    pub flow: bool,
    /// Head comments keyed by item index.
    pub item_comments: BTreeMap<usize, CommentGroup>,
    pub foot_comment: Option<CommentGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Null,
    Bool(bool),
    Int(i64),
    /// Only produced for integers above `i64::MAX`.
    Uint(u64),
    Float(f64),
    String(String),
    /// Multi-line text written as a `|` block.
    Literal(String),
    /// The `<<` key of a merge entry.
    MergeKey,
    Mapping(Mapping),
    Sequence(Sequence),
    Anchor { name: String, value: Box<Node> },
    Alias { name: String },
    Tag { tag: Tag, value: Box<Node> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub source_info: SourceInfo,
    /// Comment written at the end of the node's line.
    pub comment: Option<CommentGroup>,
    pub style: ScalarStyle,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            source_info: SourceInfo::default(),
            comment: None,
            style: ScalarStyle::Plain,
        }
    }

    pub fn null() -> Self {
        Self::new(NodeKind::Null)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(NodeKind::String(value.into()))
    }

    pub fn mapping(entries: Vec<MappingEntry>) -> Self {
        Self::new(NodeKind::Mapping(Mapping {
            entries,
            flow: false,
        }))
    }

    pub fn sequence(items: Vec<Node>) -> Self {
        Self::new(NodeKind::Sequence(Sequence {
            items,
            ..Sequence::default()
        }))
    }

    pub fn anchor(name: impl Into<String>, value: Node) -> Self {
        Self::new(NodeKind::Anchor {
            name: name.into(),
            value: Box::new(value),
        })
    }

    pub fn alias(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Alias { name: name.into() })
    }

    pub fn tagged(tag: Tag, value: Node) -> Self {
        Self::new(NodeKind::Tag {
            tag,
            value: Box::new(value),
        })
    }

    pub fn with_source_info(mut self, source_info: SourceInfo) -> Self {
        self.source_info = source_info;
        self
    }

    pub fn with_style(mut self, style: ScalarStyle) -> Self {
        self.style = style;
        self
    }

    /// Short description used in type mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Null => "null",
            NodeKind::Bool(_) => "bool",
            NodeKind::Int(_) | NodeKind::Uint(_) => "int",
            NodeKind::Float(_) => "float",
            NodeKind::String(_) | NodeKind::Literal(_) => "string",
            NodeKind::MergeKey => "merge key",
            NodeKind::Mapping(_) => "mapping",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Anchor { value, .. } => value.kind_name(),
            NodeKind::Alias { .. } => "alias",
            NodeKind::Tag { value, .. } => value.kind_name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, NodeKind::Null)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Null
                | NodeKind::Bool(_)
                | NodeKind::Int(_)
                | NodeKind::Uint(_)
                | NodeKind::Float(_)
                | NodeKind::String(_)
                | NodeKind::Literal(_)
                | NodeKind::MergeKey
        )
    }

    /// True for non-empty block collections, which the printer places on
    /// the lines below their key.
    pub fn is_block_collection(&self) -> bool {
        match &self.kind {
            NodeKind::Mapping(m) => !m.flow && !m.entries.is_empty(),
            NodeKind::Sequence(s) => !s.flow && !s.items.is_empty(),
            NodeKind::Anchor { value, .. } | NodeKind::Tag { value, .. } => {
                value.is_block_collection()
            }
            _ => false,
        }
    }

    /// Skip over anchor and tag wrappers.
    pub fn unwrap_wrappers(&self) -> &Node {
        match &self.kind {
            NodeKind::Anchor { value, .. } | NodeKind::Tag { value, .. } => {
                value.unwrap_wrappers()
            }
            _ => self,
        }
    }

    pub fn unwrap_wrappers_mut(&mut self) -> &mut Node {
        match self.kind {
            NodeKind::Anchor { ref mut value, .. } | NodeKind::Tag { ref mut value, .. } => {
                value.unwrap_wrappers_mut()
            }
            _ => self,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::String(s) | NodeKind::Literal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match &self.kind {
            NodeKind::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match &self.kind {
            NodeKind::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a mapping value by the string form of its key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.unwrap_wrappers()
            .as_mapping()?
            .entries
            .iter()
            .find(|e| e.key.scalar_text().as_deref() == Some(key))
            .map(|e| &e.value)
    }

    /// String form of a scalar, as used for mapping keys.
    ///
    /// Returns `None` for collections and aliases.
    pub fn scalar_text(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Null => Some("null".to_string()),
            NodeKind::Bool(b) => Some(b.to_string()),
            NodeKind::Int(i) => Some(i.to_string()),
            NodeKind::Uint(u) => Some(u.to_string()),
            NodeKind::Float(f) => Some(crate::scalar::format_float(*f)),
            NodeKind::String(s) | NodeKind::Literal(s) => Some(s.clone()),
            NodeKind::MergeKey => Some("<<".to_string()),
            NodeKind::Anchor { value, .. } | NodeKind::Tag { value, .. } => value.scalar_text(),
            NodeKind::Mapping(_) | NodeKind::Sequence(_) | NodeKind::Alias { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_from_parts() {
        assert_eq!(Tag::from_parts("!!", "str"), Tag::Str);
        assert_eq!(Tag::from_parts("tag:yaml.org,2002:", "binary"), Tag::Binary);
        assert_eq!(Tag::from_parts("!", "point"), Tag::Other("!point".into()));
        assert_eq!(Tag::from_parts("!!", "set"), Tag::Other("!!set".into()));
        assert_eq!(Tag::Int.to_string(), "!!int");
    }

    #[test]
    fn test_get_and_unwrap() {
        let node = Node::anchor(
            "base",
            Node::mapping(vec![MappingEntry::new(Node::string("a"), Node::new(NodeKind::Int(1)))]),
        );
        assert_eq!(node.get("a").map(|n| &n.kind), Some(&NodeKind::Int(1)));
        assert!(node.get("b").is_none());
        assert_eq!(node.kind_name(), "mapping");
        assert!(node.is_block_collection());
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(Node::null().scalar_text().as_deref(), Some("null"));
        assert_eq!(Node::new(NodeKind::Float(1.0)).scalar_text().as_deref(), Some("1.0"));
        assert_eq!(Node::alias("x").scalar_text(), None);
    }
}
