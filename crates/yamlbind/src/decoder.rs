//! Tree to typed value.
//!
//! [`Decoder::decode_value`] is the single entry point every impl recurses
//! through. It resolves anchors and aliases, hands the node to a custom
//! codec when one is registered for the target type, applies explicit tag
//! coercions, and finally calls the type's [`Decode`] impl.

use crate::codec::{CodecLookup, SharedCodecRegistry, global_registry};
use crate::describe::StructFieldMap;
use crate::error::{Error, ErrorKind, Result};
use crate::options::{DecodeOptions, Reference};
use crate::traits::{Decode, InlineContext};
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use yamlbind_node::scalar::{parse_float, parse_int};
use yamlbind_node::{
    Mapping, Node, NodeKind, SourceInfo, Tag, parse_documents, parse_documents_file,
    parse_documents_with_anchors,
};

/// One key/value pair of a mapping after merge keys are expanded.
#[derive(Debug, Clone)]
pub struct MapEntry<'n> {
    pub key: Cow<'n, Node>,
    pub value: Cow<'n, Node>,
}

impl MapEntry<'_> {
    fn into_owned(self) -> MapEntry<'static> {
        MapEntry {
            key: Cow::Owned(self.key.into_owned()),
            value: Cow::Owned(self.value.into_owned()),
        }
    }
}

pub struct Decoder {
    disallow_unknown_field: bool,
    disallow_duplicate_key: bool,
    use_ordered_map: bool,
    max_depth: usize,
    codecs: CodecLookup,
    /// Anchored nodes by name, from reference documents and documents
    /// decoded so far.
    anchor_nodes: HashMap<String, Node>,
    /// Already decoded anchored values that aliases may share.
    anchor_values: HashMap<String, Box<dyn Any>>,
    /// Anchors whose shared value was first built by an alias; the anchor
    /// reuses it when decoded later.
    aliased_first: HashSet<String>,
    depth: usize,
    pending: VecDeque<Node>,
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("disallow_unknown_field", &self.disallow_unknown_field)
            .field("disallow_duplicate_key", &self.disallow_duplicate_key)
            .field("use_ordered_map", &self.use_ordered_map)
            .field("max_depth", &self.max_depth)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl Decoder {
    /// A decoder using the process-wide codec registry.
    ///
    /// # Errors
    ///
    /// Fails when a reference document cannot be read or parsed.
    pub fn new(options: DecodeOptions) -> Result<Self> {
        Self::with_registry(options, global_registry())
    }

    pub fn with_registry(options: DecodeOptions, shared: Arc<SharedCodecRegistry>) -> Result<Self> {
        let mut decoder = Self {
            disallow_unknown_field: options.disallow_unknown_field,
            disallow_duplicate_key: options.disallow_duplicate_key,
            use_ordered_map: options.use_ordered_map,
            max_depth: options.max_depth,
            codecs: CodecLookup {
                local: options.codecs,
                shared,
            },
            anchor_nodes: HashMap::new(),
            anchor_values: HashMap::new(),
            aliased_first: HashSet::new(),
            depth: 0,
            pending: VecDeque::new(),
        };
        for reference in &options.references {
            decoder.load_reference(reference)?;
        }
        Ok(decoder)
    }

    pub fn use_ordered_map(&self) -> bool {
        self.use_ordered_map
    }

    fn load_reference(&mut self, reference: &Reference) -> Result<()> {
        match reference {
            Reference::Text(text) => {
                for doc in parse_documents(text)? {
                    self.register_anchors(&doc, 0)?;
                }
            }
            Reference::Node(node) => self.register_anchors(node, 0)?,
            Reference::File(path) => self.load_reference_file(path)?,
            Reference::Dir { path, recursive } => self.load_reference_dir(path, *recursive)?,
        }
        Ok(())
    }

    fn load_reference_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(|source| ErrorKind::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading reference document");
        for doc in parse_documents_file(&text, &path.display().to_string())? {
            self.register_anchors(&doc, 0)?;
        }
        Ok(())
    }

    fn load_reference_dir(&mut self, dir: &Path, recursive: bool) -> Result<()> {
        let io_err = |source| ErrorKind::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths = std::fs::read_dir(dir)
            .map_err(io_err)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<PathBuf>>>()
            .map_err(io_err)?;
        paths.sort();
        for path in paths {
            if path.is_dir() {
                if recursive {
                    self.load_reference_dir(&path, true)?;
                }
            } else if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yml" | "yaml")
            ) {
                self.load_reference_file(&path)?;
            }
        }
        Ok(())
    }

    /// Record the anchors of `node` in document order. An alias must name
    /// an anchor recorded before it, in this tree or an earlier one.
    fn register_anchors(&mut self, node: &Node, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            return Err(Error::at(
                ErrorKind::DepthLimitExceeded {
                    limit: self.max_depth,
                },
                node,
            ));
        }
        match &node.kind {
            NodeKind::Anchor { name, value } => {
                self.anchor_nodes.insert(name.clone(), (**value).clone());
                self.anchor_values.remove(name);
                self.aliased_first.remove(name);
                self.register_anchors(value, depth + 1)?;
            }
            NodeKind::Alias { name } if !self.anchor_nodes.contains_key(name) => {
                return Err(Error::at(
                    ErrorKind::UnresolvedAlias { name: name.clone() },
                    node,
                ));
            }
            NodeKind::Tag { value, .. } => self.register_anchors(value, depth)?,
            NodeKind::Mapping(m) => {
                for entry in &m.entries {
                    let result = self
                        .register_anchors(&entry.key, depth + 1)
                        .and_then(|()| self.register_anchors(&entry.value, depth + 1));
                    if let Err(err) = result {
                        return Err(match entry.key.scalar_text() {
                            Some(key) => err.in_field(key),
                            None => err,
                        });
                    }
                }
            }
            NodeKind::Sequence(s) => {
                for (i, item) in s.items.iter().enumerate() {
                    self.register_anchors(item, depth + 1)
                        .map_err(|e| e.in_index(i))?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Decode one document tree.
    pub fn decode_node<T: Decode>(&mut self, node: &Node) -> Result<T> {
        tracing::debug!(type_name = std::any::type_name::<T>(), "decoding document");
        self.register_anchors(node, 0)?;
        self.decode_value(node)
    }

    /// Documents of `text`; aliases may name anchors from reference
    /// documents and from documents decoded earlier.
    fn parse_text(&self, text: &str) -> Result<Vec<Node>> {
        let known = |name: &str| self.anchor_nodes.contains_key(name);
        Ok(parse_documents_with_anchors(text, None, known)?)
    }

    /// Decode the first document of `text`. Empty input decodes as null.
    pub fn decode_str<T: Decode>(&mut self, text: &str) -> Result<T> {
        let docs = self.parse_text(text)?;
        match docs.first() {
            Some(doc) => self.decode_node(doc),
            None => self.decode_node(&Node::null()),
        }
    }

    /// Queue every document of `text` for [`Decoder::decode_next`].
    pub fn load_stream(&mut self, text: &str) -> Result<()> {
        let docs = self.parse_text(text)?;
        self.pending.extend(docs);
        Ok(())
    }

    /// Decode the next queued document; `None` once the stream is drained.
    /// Anchors carry over from earlier documents.
    pub fn decode_next<T: Decode>(&mut self) -> Option<Result<T>> {
        let doc = self.pending.pop_front()?;
        Some(self.decode_node(&doc))
    }

    /// Decode `node` into `T`. Impls call this for every child.
    pub fn decode_value<T: Decode>(&mut self, node: &Node) -> Result<T> {
        if self.depth >= self.max_depth {
            return Err(Error::at(
                ErrorKind::DepthLimitExceeded {
                    limit: self.max_depth,
                },
                node,
            ));
        }
        self.depth += 1;
        let result = self.dispatch::<T>(node);
        self.depth -= 1;
        result
    }

    fn dispatch<T: Decode>(&mut self, node: &Node) -> Result<T> {
        match &node.kind {
            NodeKind::Anchor { name, value } => {
                self.anchor_nodes.insert(name.clone(), (**value).clone());
                if self.aliased_first.remove(name) {
                    if let Some(shared) = self
                        .anchor_values
                        .get(name)
                        .and_then(|handle| T::from_shared(handle.as_ref()))
                    {
                        tracing::trace!(anchor = %name, "anchor shares value built by an alias");
                        return Ok(shared);
                    }
                }
                let decoded = self.decode_value::<T>(value)?;
                if let Some(handle) = decoded.shared_handle() {
                    tracing::trace!(anchor = %name, "recorded anchored value");
                    self.anchor_values.insert(name.clone(), handle);
                }
                return Ok(decoded);
            }
            NodeKind::Alias { name } => {
                if let Some(shared) = self
                    .anchor_values
                    .get(name)
                    .and_then(|handle| T::from_shared(handle.as_ref()))
                {
                    tracing::trace!(alias = %name, "alias shares anchored value");
                    return Ok(shared);
                }
                let target = self.resolve_alias(name, node)?;
                let decoded = self.decode_value::<T>(&target)?;
                if !self.anchor_values.contains_key(name) {
                    if let Some(handle) = decoded.shared_handle() {
                        self.anchor_values.insert(name.clone(), handle);
                        self.aliased_first.insert(name.clone());
                    }
                }
                return Ok(decoded);
            }
            _ => {}
        }

        if let Some(codec) = self.codecs.decoder(TypeId::of::<T>()) {
            tracing::trace!(type_name = std::any::type_name::<T>(), "custom decoder");
            let resolved = self.resolve_aliases(node, 0)?;
            let value = codec(&resolved).map_err(|e| Error::at(ErrorKind::Codec(e), node))?;
            return value.downcast::<T>().map(|v| *v).map_err(|_| {
                Error::at(
                    ErrorKind::type_mismatch(std::any::type_name::<T>(), node),
                    node,
                )
            });
        }

        let node = coerce_tag(node)?;
        T::decode(self, &node)
    }

    fn resolve_alias(&self, name: &str, node: &Node) -> Result<Node> {
        self.anchor_nodes.get(name).cloned().ok_or_else(|| {
            Error::at(
                ErrorKind::UnresolvedAlias {
                    name: name.to_string(),
                },
                node,
            )
        })
    }

    /// Copy of `node` with every alias replaced by its anchored node.
    fn resolve_aliases(&self, node: &Node, depth: usize) -> Result<Node> {
        if self.depth + depth >= self.max_depth {
            return Err(Error::at(
                ErrorKind::DepthLimitExceeded {
                    limit: self.max_depth,
                },
                node,
            ));
        }
        let kind = match &node.kind {
            NodeKind::Alias { name } => {
                let target = self.resolve_alias(name, node)?;
                return self.resolve_aliases(&target, depth + 1);
            }
            NodeKind::Anchor { name, value } => NodeKind::Anchor {
                name: name.clone(),
                value: Box::new(self.resolve_aliases(value, depth + 1)?),
            },
            NodeKind::Tag { tag, value } => NodeKind::Tag {
                tag: tag.clone(),
                value: Box::new(self.resolve_aliases(value, depth + 1)?),
            },
            NodeKind::Mapping(m) => {
                let mut mapping = m.clone();
                for entry in &mut mapping.entries {
                    entry.key = self.resolve_aliases(&entry.key, depth + 1)?;
                    entry.value = self.resolve_aliases(&entry.value, depth + 1)?;
                }
                NodeKind::Mapping(mapping)
            }
            NodeKind::Sequence(s) => {
                let mut sequence = s.clone();
                for item in &mut sequence.items {
                    *item = self.resolve_aliases(item, depth + 1)?;
                }
                NodeKind::Sequence(sequence)
            }
            _ => return Ok(node.clone()),
        };
        Ok(Node {
            kind,
            ..node.clone()
        })
    }

    /// Entries of a mapping with merge keys expanded.
    ///
    /// Merged entries come first, then the explicit ones in document
    /// order, so a consumer that lets later entries win gives explicit keys
    /// precedence. Null yields no entries. With duplicate keys disallowed,
    /// an explicit key repeated in this mapping is an error.
    pub fn mapping_entries<'n>(&mut self, node: &'n Node) -> Result<Vec<MapEntry<'n>>> {
        match &node.kind {
            NodeKind::Null => Ok(Vec::new()),
            NodeKind::Mapping(m) => self.flatten(m),
            _ => Err(Error::at(ErrorKind::type_mismatch("mapping", node), node)),
        }
    }

    fn flatten<'n>(&mut self, mapping: &'n Mapping) -> Result<Vec<MapEntry<'n>>> {
        let mut merged = Vec::new();
        let mut explicit = Vec::with_capacity(mapping.entries.len());
        let mut seen: HashMap<String, SourceInfo> = HashMap::new();

        for entry in &mapping.entries {
            if entry.is_merge() {
                if self.depth >= self.max_depth {
                    return Err(Error::at(
                        ErrorKind::DepthLimitExceeded {
                            limit: self.max_depth,
                        },
                        &entry.value,
                    ));
                }
                self.depth += 1;
                let sources = self.merge_sources(&entry.value);
                let result = sources.and_then(|sources| {
                    let mut out = Vec::new();
                    for source in &sources {
                        let nested = self.mapping_entries(source)?;
                        out.extend(nested.into_iter().map(MapEntry::into_owned));
                    }
                    Ok(out)
                });
                self.depth -= 1;
                merged.extend(result?);
                continue;
            }
            if self.disallow_duplicate_key {
                if let Some(text) = entry.key.scalar_text() {
                    if let Some(first) = seen.get(&text) {
                        return Err(Error::at(
                            ErrorKind::DuplicateKey {
                                key: text,
                                first: first.clone(),
                            },
                            &entry.key,
                        ));
                    }
                    seen.insert(text, entry.key.source_info.clone());
                }
            }
            explicit.push(MapEntry {
                key: Cow::Borrowed(&entry.key),
                value: Cow::Borrowed(&entry.value),
            });
        }

        merged.extend(explicit);
        Ok(merged)
    }

    /// Mappings named by a merge value, lowest precedence first.
    fn merge_sources(&mut self, value: &Node) -> Result<Vec<Node>> {
        match &value.kind {
            NodeKind::Null => Ok(Vec::new()),
            NodeKind::Mapping(_) => Ok(vec![value.clone()]),
            NodeKind::Alias { name } => {
                let target = self.resolve_alias(name, value)?;
                self.merge_sources(&target)
            }
            NodeKind::Anchor { name, value: inner } => {
                self.anchor_nodes.insert(name.clone(), (**inner).clone());
                self.merge_sources(inner)
            }
            NodeKind::Tag { value: inner, .. } => self.merge_sources(inner),
            // Earlier mappings in a merge list take precedence.
            NodeKind::Sequence(s) => {
                let mut out = Vec::new();
                for item in s.items.iter().rev() {
                    out.extend(self.merge_sources(item)?);
                }
                Ok(out)
            }
            _ => Err(Error::at(ErrorKind::type_mismatch("mapping", value), value)),
        }
    }

    /// Decode every entry of a mapping as a key/value pair.
    ///
    /// With `inline`, keys reserved by the enclosing struct are skipped and
    /// every decoded key is marked consumed.
    pub fn decode_map_entries<K: Decode, V: Decode>(
        &mut self,
        node: &Node,
        mut inline: Option<&mut InlineContext>,
    ) -> Result<Vec<(K, V)>> {
        let entries = self.mapping_entries(node)?;
        let mut out = Vec::with_capacity(entries.len());
        for entry in &entries {
            let key_text = entry.key.scalar_text();
            if let Some(ctx) = inline.as_mut() {
                if let Some(text) = &key_text {
                    if ctx.reserved.contains(text) {
                        continue;
                    }
                    ctx.consumed.insert(text.clone());
                }
            }
            let key = self.decode_value::<K>(&entry.key)?;
            let value = self
                .decode_value::<V>(&entry.value)
                .map_err(|e| e.in_field(key_text.clone().unwrap_or_default()))?;
            out.push((key, value));
        }
        Ok(out)
    }

    /// Decode every item of a sequence. Null yields no items.
    pub fn decode_sequence<T: Decode>(&mut self, node: &Node) -> Result<Vec<T>> {
        match &node.kind {
            NodeKind::Null => Ok(Vec::new()),
            NodeKind::Sequence(s) => {
                let mut out = Vec::with_capacity(s.items.len());
                for (i, item) in s.items.iter().enumerate() {
                    out.push(self.decode_value::<T>(item).map_err(|e| e.in_index(i))?);
                }
                Ok(out)
            }
            _ => Err(Error::at(ErrorKind::type_mismatch("sequence", node), node)),
        }
    }

    /// Start decoding a struct from `node`. Derived impls call this.
    ///
    /// `inline` is set when the struct is an inline field of another
    /// struct and reads its keys from the parent mapping.
    pub fn begin_struct<'d, 'n, T: 'static>(
        &'d mut self,
        node: &'n Node,
        fields: Arc<StructFieldMap>,
        inline: Option<&'d mut InlineContext>,
    ) -> Result<StructDecoder<'d, 'n>> {
        let type_name = std::any::type_name::<T>();
        if !matches!(node.kind, NodeKind::Null | NodeKind::Mapping(_)) {
            return Err(Error::at(ErrorKind::type_mismatch(type_name, node), node));
        }
        let entries = self.mapping_entries(node)?;
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if let Some(text) = entry.key.scalar_text() {
                index.insert(text, i);
            }
        }
        Ok(StructDecoder {
            decoder: self,
            fields,
            node,
            entries,
            index,
            consumed: HashSet::new(),
            inline,
        })
    }
}

/// Decodes the fields of one struct from one mapping.
///
/// The first failing field aborts the struct; fields after it keep their
/// default values and the error is returned to the caller.
pub struct StructDecoder<'d, 'n> {
    decoder: &'d mut Decoder,
    fields: Arc<StructFieldMap>,
    node: &'n Node,
    entries: Vec<MapEntry<'n>>,
    /// Key text to the entry that wins for it.
    index: HashMap<String, usize>,
    consumed: HashSet<String>,
    inline: Option<&'d mut InlineContext>,
}

impl StructDecoder<'_, '_> {
    /// Decode the field declared as `field_name` into `target`. Missing
    /// keys leave `target` untouched.
    pub fn field<T: Decode>(&mut self, field_name: &str, target: &mut T) -> Result<()> {
        let fields = Arc::clone(&self.fields);
        let Some(field) = fields.by_field_name(field_name) else {
            return Ok(());
        };

        if field.inline {
            let mut reserved: HashSet<String> =
                fields.render_names().map(str::to_string).collect();
            if let Some(parent) = self.inline.as_ref() {
                reserved.extend(parent.reserved.iter().cloned());
            }
            let mut ctx = InlineContext {
                consumed: HashSet::new(),
                reserved,
            };
            *target = T::decode_inline(self.decoder, self.node, &mut ctx)?;
            self.consumed.extend(ctx.consumed);
            return Ok(());
        }

        let Some(&i) = self.index.get(&field.render_name) else {
            return Ok(());
        };
        let value = self
            .decoder
            .decode_value::<T>(&self.entries[i].value)
            .map_err(|e| e.in_field(field.render_name.clone()))?;
        if let Some(anchor) = &field.anchor {
            if let Some(handle) = value.shared_handle() {
                self.decoder.anchor_values.insert(anchor.clone(), handle);
            }
        }
        self.consumed.insert(field.render_name.clone());
        *target = value;
        Ok(())
    }

    /// Finish the struct. Outside an inline context, with unknown fields
    /// disallowed, any key no field consumed is an error.
    pub fn finish(self) -> Result<()> {
        let StructDecoder {
            decoder,
            entries,
            consumed,
            inline,
            ..
        } = self;
        if let Some(ctx) = inline {
            ctx.consumed.extend(consumed);
            return Ok(());
        }
        if decoder.disallow_unknown_field {
            for entry in &entries {
                if let Some(key) = entry.key.scalar_text() {
                    if !consumed.contains(&key) {
                        return Err(Error::at(ErrorKind::UnknownField { field: key }, &entry.key));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Apply an explicit core tag to the scalar it wraps. `!!binary` and
/// `!!timestamp` are left in place for the types that accept them; local
/// tags are looked through.
fn coerce_tag(node: &Node) -> Result<Cow<'_, Node>> {
    let NodeKind::Tag { tag, value } = &node.kind else {
        return Ok(Cow::Borrowed(node));
    };
    let inner = value.as_ref();
    let mismatch = || {
        Error::at(
            ErrorKind::TypeMismatch {
                expected: tag.to_string(),
                found: inner
                    .scalar_text()
                    .unwrap_or_else(|| inner.kind_name().to_string()),
            },
            node,
        )
    };
    let kind = match (tag, &inner.kind) {
        (Tag::Binary | Tag::Timestamp, _) => return Ok(Cow::Borrowed(node)),
        (Tag::Map | Tag::Seq | Tag::Other(_), _) => return coerce_tag(inner),
        (Tag::Str, NodeKind::String(_) | NodeKind::Literal(_)) => return Ok(Cow::Borrowed(inner)),
        (Tag::Str, _) => NodeKind::String(inner.scalar_text().ok_or_else(mismatch)?),
        (Tag::Int, NodeKind::Int(_) | NodeKind::Uint(_)) => return Ok(Cow::Borrowed(inner)),
        (Tag::Int, NodeKind::String(s)) => parse_int(s).ok_or_else(mismatch)?,
        (Tag::Float, NodeKind::Float(_)) => return Ok(Cow::Borrowed(inner)),
        (Tag::Float, NodeKind::Int(i)) => NodeKind::Float(*i as f64),
        (Tag::Float, NodeKind::Uint(u)) => NodeKind::Float(*u as f64),
        (Tag::Float, NodeKind::String(s)) => match parse_float(s) {
            Some(f) => NodeKind::Float(f),
            None => match parse_int(s) {
                Some(NodeKind::Int(i)) => NodeKind::Float(i as f64),
                Some(NodeKind::Uint(u)) => NodeKind::Float(u as f64),
                _ => return Err(mismatch()),
            },
        },
        (Tag::Bool, NodeKind::Bool(_)) => return Ok(Cow::Borrowed(inner)),
        (Tag::Bool, NodeKind::String(s)) => match s.as_str() {
            "true" | "True" | "TRUE" => NodeKind::Bool(true),
            "false" | "False" | "FALSE" => NodeKind::Bool(false),
            _ => return Err(mismatch()),
        },
        (Tag::Null, _) => NodeKind::Null,
        _ => return Err(mismatch()),
    };
    Ok(Cow::Owned(Node {
        kind,
        source_info: inner.source_info.clone(),
        comment: None,
        style: inner.style,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use yamlbind_node::parse;

    fn decoder() -> Decoder {
        Decoder::with_registry(DecodeOptions::new(), Arc::new(SharedCodecRegistry::new())).unwrap()
    }

    #[test]
    fn test_coerce_tags() {
        let doc = parse("a: !!int '42'\nb: !!float 3\nc: !!str 7\nd: !!null x\ne: !!bool 'true'\n")
            .unwrap();
        let kinds: Vec<NodeKind> = doc
            .as_mapping()
            .unwrap()
            .entries
            .iter()
            .map(|e| coerce_tag(&e.value).unwrap().kind.clone())
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Int(42),
                NodeKind::Float(3.0),
                NodeKind::String("7".into()),
                NodeKind::Null,
                NodeKind::Bool(true),
            ]
        );
        let bad = parse("!!int abc").unwrap();
        assert!(matches!(
            coerce_tag(&bad).unwrap_err().kind(),
            ErrorKind::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_merge_entries_come_first() {
        let doc = parse("base: &b {a: 1, b: 2}\nv:\n  b: 3\n  <<: *b\n").unwrap();
        let mut decoder = decoder();
        decoder.register_anchors(&doc, 0).unwrap();
        let v = doc.get("v").unwrap();
        let keys: Vec<String> = decoder
            .mapping_entries(v)
            .unwrap()
            .iter()
            .map(|e| e.key.scalar_text().unwrap())
            .collect();
        assert_eq!(keys, vec!["a", "b", "b"]);
    }

    #[test]
    fn test_merge_list_precedence() {
        let doc = parse("x: &x {k: 1}\ny: &y {k: 2}\nv:\n  <<: [*x, *y]\n").unwrap();
        let mut decoder = decoder();
        decoder.register_anchors(&doc, 0).unwrap();
        let entries = decoder.mapping_entries(doc.get("v").unwrap()).unwrap();
        let last = entries.last().unwrap();
        assert_eq!(last.value.kind, NodeKind::Int(1));
    }

    #[test]
    fn test_resolve_aliases() {
        let doc = parse("a: &a [1, 2]\nb: *a\n").unwrap();
        let mut decoder = decoder();
        decoder.register_anchors(&doc, 0).unwrap();
        let resolved = decoder.resolve_aliases(doc.get("b").unwrap(), 0).unwrap();
        assert_eq!(resolved.as_sequence().unwrap().items.len(), 2);
    }

    #[test]
    fn test_depth_limit_on_self_merge() {
        let mut decoder = Decoder::with_registry(
            DecodeOptions::new().max_depth(16),
            Arc::new(SharedCodecRegistry::new()),
        )
        .unwrap();
        let looped = Node::anchor(
            "a",
            Node::mapping(vec![yamlbind_node::MappingEntry::new(
                Node::new(NodeKind::MergeKey),
                Node::alias("a"),
            )]),
        );
        decoder.register_anchors(&looped, 0).unwrap();
        let err = decoder.mapping_entries(looped.unwrap_wrappers()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::DepthLimitExceeded { limit: 16 }));
    }
}
