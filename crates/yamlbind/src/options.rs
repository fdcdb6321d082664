//! Encode and decode options.
//!
//! Options are plain values handed to [`Encoder::new`](crate::Encoder::new)
//! or [`Decoder::new`](crate::Decoder::new) and fixed for the life of that
//! instance.

use crate::codec::CodecRegistry;
use crate::error::CodecError;
use std::any::Any;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use yamlbind_node::{CommentMap, Node};

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Extra documents whose anchors the main document may alias.
#[derive(Debug, Clone)]
pub enum Reference {
    Text(String),
    Node(Node),
    File(PathBuf),
    /// Every `.yml`/`.yaml` file in a directory.
    Dir { path: PathBuf, recursive: bool },
}

#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub(crate) disallow_unknown_field: bool,
    pub(crate) disallow_duplicate_key: bool,
    pub(crate) use_ordered_map: bool,
    pub(crate) references: Vec<Reference>,
    pub(crate) codecs: CodecRegistry,
    pub(crate) max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            disallow_unknown_field: false,
            disallow_duplicate_key: false,
            use_ordered_map: false,
            references: Vec::new(),
            codecs: CodecRegistry::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject unknown fields and duplicate keys.
    pub fn strict(self) -> Self {
        self.disallow_unknown_field().disallow_duplicate_key()
    }

    pub fn disallow_unknown_field(mut self) -> Self {
        self.disallow_unknown_field = true;
        self
    }

    pub fn disallow_duplicate_key(mut self) -> Self {
        self.disallow_duplicate_key = true;
        self
    }

    /// Decode untyped mappings into [`MapSlice`](crate::MapSlice), keeping
    /// document order.
    pub fn use_ordered_map(mut self) -> Self {
        self.use_ordered_map = true;
        self
    }

    pub fn reference_str(mut self, text: impl Into<String>) -> Self {
        self.references.push(Reference::Text(text.into()));
        self
    }

    pub fn reference_node(mut self, node: Node) -> Self {
        self.references.push(Reference::Node(node));
        self
    }

    pub fn reference_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.references.push(Reference::File(path.into()));
        self
    }

    pub fn reference_dir(mut self, path: impl Into<PathBuf>, recursive: bool) -> Self {
        self.references.push(Reference::Dir {
            path: path.into(),
            recursive,
        });
        self
    }

    pub fn custom_decoder<T, F>(mut self, decode: F) -> Self
    where
        T: Any,
        F: Fn(&Node) -> Result<T, CodecError> + Send + Sync + 'static,
    {
        self.codecs.register_decoder(decode);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Renames an anchor before it is emitted.
pub type AnchorCallback = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Clone)]
pub struct EncodeOptions {
    pub(crate) indent: usize,
    pub(crate) indent_sequence: bool,
    pub(crate) flow: bool,
    pub(crate) single_quote: bool,
    pub(crate) literal_multiline: bool,
    pub(crate) json: bool,
    pub(crate) comments: CommentMap,
    pub(crate) codecs: CodecRegistry,
    pub(crate) anchor_callback: Option<AnchorCallback>,
    pub(crate) max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            indent_sequence: false,
            flow: false,
            single_quote: false,
            literal_multiline: false,
            json: false,
            comments: CommentMap::new(),
            codecs: CodecRegistry::new(),
            anchor_callback: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Debug for EncodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodeOptions")
            .field("indent", &self.indent)
            .field("indent_sequence", &self.indent_sequence)
            .field("flow", &self.flow)
            .field("single_quote", &self.single_quote)
            .field("literal_multiline", &self.literal_multiline)
            .field("json", &self.json)
            .field("comments", &self.comments.len())
            .field("codecs", &self.codecs)
            .field("anchor_callback", &self.anchor_callback.is_some())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indent(mut self, spaces: usize) -> Self {
        self.indent = spaces.max(1);
        self
    }

    pub fn indent_sequence(mut self, indent: bool) -> Self {
        self.indent_sequence = indent;
        self
    }

    /// Write every mapping and sequence in flow style.
    pub fn flow(mut self, flow: bool) -> Self {
        self.flow = flow;
        self
    }

    /// Prefer single quotes for strings that need quoting.
    pub fn single_quote(mut self, single: bool) -> Self {
        self.single_quote = single;
        self
    }

    /// Write strings containing newlines as `|` blocks.
    pub fn literal_style_if_multiline(mut self, literal: bool) -> Self {
        self.literal_multiline = literal;
        self
    }

    /// JSON-compatible output: flow style with every string and key
    /// double-quoted.
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_comments(mut self, comments: CommentMap) -> Self {
        self.comments = comments;
        self
    }

    pub fn custom_encoder<T, F>(mut self, encode: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> Result<Node, CodecError> + Send + Sync + 'static,
    {
        self.codecs.register_encoder(encode);
        self
    }

    pub fn anchor_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.anchor_callback = Some(Arc::new(callback));
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub(crate) fn emit_options(&self) -> yamlbind_node::EmitOptions {
        yamlbind_node::EmitOptions {
            indent: self.indent,
            indent_sequence: self.indent_sequence,
        }
    }
}
