//! Typed value to tree.
//!
//! [`Encoder::encode_value`] is the single entry point every impl recurses
//! through. Custom codecs win over built-in impls, and a value whose
//! identity was already anchored in this document becomes an alias.

use crate::codec::{CodecLookup, SharedCodecRegistry, global_registry};
use crate::describe::{StructField, StructFieldMap};
use crate::error::{Error, ErrorKind, Result};
use crate::options::EncodeOptions;
use crate::traits::{Encode, Identity};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use yamlbind_node::scalar::needs_quotes;
use yamlbind_node::{
    Mapping, MappingEntry, Node, NodeKind, ScalarStyle, Sequence, attach_comments, emit,
    emit_documents,
};

/// Anchor names by the address of the value they were emitted for.
#[derive(Default)]
struct AnchorTable {
    names: HashMap<usize, String>,
    keepalive: Vec<Box<dyn Any>>,
}

impl AnchorTable {
    fn register(&mut self, identity: Identity, name: String) {
        self.names.insert(identity.addr, name);
        self.keepalive.push(identity.keepalive);
    }

    fn name_of(&self, addr: usize) -> Option<&str> {
        self.names.get(&addr).map(String::as_str)
    }

    fn clear(&mut self) {
        self.names.clear();
        self.keepalive.clear();
    }
}

pub struct Encoder {
    options: EncodeOptions,
    codecs: CodecLookup,
    anchors: AnchorTable,
    flow: bool,
    depth: usize,
}

impl Encoder {
    /// An encoder using the process-wide codec registry.
    pub fn new(options: EncodeOptions) -> Self {
        Self::with_registry(options, global_registry())
    }

    pub fn with_registry(mut options: EncodeOptions, shared: Arc<SharedCodecRegistry>) -> Self {
        let local = std::mem::take(&mut options.codecs);
        let flow = options.flow || options.json;
        Self {
            options,
            codecs: CodecLookup { local, shared },
            anchors: AnchorTable::default(),
            flow,
            depth: 0,
        }
    }

    /// Encode one document. Anchors from earlier documents are forgotten
    /// and the comment map, if any, is attached to the result.
    pub fn encode_document<T: Encode>(&mut self, value: &T) -> Result<Node> {
        tracing::debug!(type_name = std::any::type_name::<T>(), "encoding document");
        self.anchors.clear();
        self.flow = self.options.flow || self.options.json;
        let mut node = self.encode_value(value)?;
        if !self.options.comments.is_empty() {
            attach_comments(&mut node, &self.options.comments)?;
        }
        Ok(node)
    }

    pub fn to_string<T: Encode>(&mut self, value: &T) -> Result<String> {
        let node = self.encode_document(value)?;
        Ok(emit(&node, &self.options.emit_options()))
    }

    /// Encode each value as its own document of one stream.
    pub fn to_string_documents<T: Encode>(&mut self, values: &[T]) -> Result<String> {
        let mut nodes = Vec::with_capacity(values.len());
        for value in values {
            nodes.push(self.encode_document(value)?);
        }
        Ok(emit_documents(&nodes, &self.options.emit_options()))
    }

    /// Encode `value` into a node. Impls call this for every child.
    pub fn encode_value<T: Encode>(&mut self, value: &T) -> Result<Node> {
        if self.depth >= self.options.max_depth {
            return Err(Error::new(ErrorKind::DepthLimitExceeded {
                limit: self.options.max_depth,
            }));
        }
        self.depth += 1;
        let result = self.dispatch(value);
        self.depth -= 1;
        result
    }

    fn dispatch<T: Encode>(&mut self, value: &T) -> Result<Node> {
        if let Some(codec) = self.codecs.encoder(TypeId::of::<T>()) {
            tracing::trace!(type_name = std::any::type_name::<T>(), "custom encoder");
            return codec(value).map_err(|e| Error::new(ErrorKind::Codec(e)));
        }
        if let Some(identity) = value.identity() {
            if let Some(name) = self.anchors.name_of(identity.addr) {
                tracing::trace!(anchor = %name, "value already anchored, emitting alias");
                return Ok(Node::alias(name));
            }
        }
        value.encode(self)
    }

    pub fn is_flow(&self) -> bool {
        self.flow
    }

    pub fn is_json(&self) -> bool {
        self.options.json
    }

    /// A string scalar styled by the encode options.
    pub fn string(&self, text: &str) -> Node {
        if self.options.literal_multiline && !self.flow && !self.options.json && text.contains('\n')
        {
            return Node::new(NodeKind::Literal(text.to_string()));
        }
        let node = Node::string(text);
        if self.options.json {
            node.with_style(ScalarStyle::DoubleQuoted)
        } else if self.options.single_quote && needs_quotes(text, self.flow) {
            node.with_style(ScalarStyle::SingleQuoted)
        } else {
            node
        }
    }

    pub fn mapping(&self, entries: Vec<MappingEntry>) -> Node {
        Node::new(NodeKind::Mapping(Mapping {
            entries,
            flow: self.flow,
        }))
    }

    pub fn sequence(&self, items: Vec<Node>) -> Node {
        Node::new(NodeKind::Sequence(Sequence {
            items,
            flow: self.flow,
            ..Sequence::default()
        }))
    }

    /// Encode a mapping key. JSON output turns scalar keys into strings.
    pub fn encode_key<K: Encode>(&mut self, key: &K) -> Result<Node> {
        let node = self.encode_value(key)?;
        if !self.options.json {
            return Ok(node);
        }
        match (&node.kind, node.scalar_text()) {
            (NodeKind::String(_) | NodeKind::Literal(_), _) => {
                Ok(node.with_style(ScalarStyle::DoubleQuoted))
            }
            (_, Some(text)) => Ok(Node::string(text).with_style(ScalarStyle::DoubleQuoted)),
            (_, None) => Err(Error::new(ErrorKind::TypeMismatch {
                expected: "scalar key for JSON output".to_string(),
                found: node.kind_name().to_string(),
            })),
        }
    }

    /// Encode key/value pairs as a mapping, sorted by the text of each key
    /// when `sort` is set.
    pub fn encode_map<'a, K, V, I>(&mut self, pairs: I, sort: bool) -> Result<Node>
    where
        K: Encode,
        V: Encode,
        I: IntoIterator<Item = (&'a K, &'a V)>,
    {
        let mut entries = Vec::new();
        for (key, value) in pairs {
            let key = self.encode_key(key)?;
            let text = key.scalar_text().unwrap_or_default();
            let value = self.encode_value(value).map_err(|e| e.in_field(text.clone()))?;
            entries.push((text, MappingEntry::new(key, value)));
        }
        if sort {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }
        Ok(self.mapping(entries.into_iter().map(|(_, entry)| entry).collect()))
    }

    pub fn encode_sequence<'a, T, I>(&mut self, items: I) -> Result<Node>
    where
        T: Encode,
        I: IntoIterator<Item = &'a T>,
    {
        let mut nodes = Vec::new();
        for (i, item) in items.into_iter().enumerate() {
            nodes.push(self.encode_value(item).map_err(|e| e.in_index(i))?);
        }
        Ok(self.sequence(nodes))
    }

    fn anchor_name(&self, name: &str) -> String {
        match &self.options.anchor_callback {
            Some(callback) => callback(name),
            None => name.to_string(),
        }
    }

    /// Start encoding a struct. Derived impls call this.
    pub fn begin_struct(&mut self, fields: Arc<StructFieldMap>) -> StructEncoder<'_> {
        StructEncoder {
            encoder: self,
            fields,
            entries: Vec::new(),
            inline_anchor: None,
        }
    }
}

/// Encodes the fields of one struct into one mapping.
pub struct StructEncoder<'e> {
    encoder: &'e mut Encoder,
    fields: Arc<StructFieldMap>,
    entries: Vec<MappingEntry>,
    /// Anchor for the whole mapping, from an anchored inline field.
    inline_anchor: Option<String>,
}

impl StructEncoder<'_> {
    pub fn field<T: Encode>(&mut self, field_name: &str, value: &T) -> Result<()> {
        let fields = Arc::clone(&self.fields);
        let Some(field) = fields.by_field_name(field_name) else {
            return Ok(());
        };
        if field.omit_empty && value.is_zero() {
            return Ok(());
        }

        if let Some(alias) = &field.alias {
            self.push_alias(field, alias.clone());
            return Ok(());
        }
        if field.auto_alias {
            let name = value
                .identity()
                .and_then(|id| self.encoder.anchors.name_of(id.addr).map(str::to_string))
                .ok_or_else(|| {
                    Error::new(ErrorKind::AnchorNotFound {
                        field: field.render_name.clone(),
                    })
                })?;
            self.push_alias(field, name);
            return Ok(());
        }

        let outer_flow = self.encoder.flow;
        if field.flow {
            self.encoder.flow = true;
        }
        let encoded = self.encoder.encode_value(value);
        self.encoder.flow = outer_flow;
        let mut node = encoded.map_err(|e| e.in_field(field.render_name.clone()))?;

        if let Some(anchor) = &field.anchor {
            if !matches!(node.kind, NodeKind::Alias { .. }) {
                let name = self.encoder.anchor_name(anchor);
                if let Some(identity) = value.identity() {
                    self.encoder.anchors.register(identity, name.clone());
                }
                if field.inline {
                    self.inline_anchor = Some(name);
                } else {
                    node = Node::anchor(name, node);
                }
            }
        }

        if field.inline {
            return self.splice(field, node);
        }
        let key = self.encoder.string(&field.render_name);
        self.entries.push(MappingEntry::new(key, node));
        Ok(())
    }

    fn push_alias(&mut self, field: &StructField, name: String) {
        let key = if field.inline {
            Node::new(NodeKind::MergeKey)
        } else {
            self.encoder.string(&field.render_name)
        };
        self.entries.push(MappingEntry::new(key, Node::alias(name)));
    }

    /// Lift the entries of an inline field into this mapping. Keys owned by
    /// the struct's own fields are skipped.
    fn splice(&mut self, field: &StructField, node: Node) -> Result<()> {
        match node.kind {
            NodeKind::Null => Ok(()),
            NodeKind::Alias { name } => {
                self.entries
                    .push(MappingEntry::new(Node::new(NodeKind::MergeKey), Node::alias(name)));
                Ok(())
            }
            NodeKind::Mapping(mapping) => {
                for entry in mapping.entries {
                    let owned = entry
                        .key
                        .scalar_text()
                        .is_some_and(|key| self.fields.by_render_name(&key).is_some());
                    if !owned {
                        self.entries.push(entry);
                    }
                }
                Ok(())
            }
            _ => Err(Error::new(ErrorKind::TypeMismatch {
                expected: "mapping for inline field".to_string(),
                found: node.kind_name().to_string(),
            })
            .in_field(field.render_name.clone())),
        }
    }

    pub fn finish(self) -> Result<Node> {
        let node = self.encoder.mapping(self.entries);
        Ok(match self.inline_anchor {
            Some(name) => Node::anchor(name, node),
            None => node,
        })
    }
}
