//! Parser adapter that builds [`Node`] trees from yaml-rust2 events.

use crate::anchors::{collect_anchor_names, scan_tokens};
use crate::scalar::resolve_plain;
use crate::{
    Error, Mapping, MappingEntry, Node, NodeKind, Result, ScalarStyle, Sequence, SourceInfo, Tag,
};
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Parse the first document of `content`.
///
/// # Example
///
/// ```rust
/// use yamlbind_node::{parse, NodeKind};
///
/// let doc = parse("port: 8080").unwrap();
/// assert_eq!(doc.get("port").map(|n| &n.kind), Some(&NodeKind::Int(8080)));
/// ```
///
/// # Errors
///
/// Returns an error if the text is not valid YAML or holds no document.
pub fn parse(content: &str) -> Result<Node> {
    parse_impl(content, None, false)?
        .into_iter()
        .next()
        .ok_or(Error::Empty)
}

/// Parse the first document, recording `filename` in every position.
pub fn parse_file(content: &str, filename: &str) -> Result<Node> {
    parse_impl(content, Some(filename), false)?
        .into_iter()
        .next()
        .ok_or(Error::Empty)
}

/// Parse every document of a stream. An empty stream yields no documents.
pub fn parse_documents(content: &str) -> Result<Vec<Node>> {
    parse_impl(content, None, true)
}

pub fn parse_documents_file(content: &str, filename: &str) -> Result<Vec<Node>> {
    parse_impl(content, Some(filename), true)
}

/// Local tag that marks a scalar standing in for an alias to an anchor the
/// text itself does not define.
const EXTERNAL_ALIAS_TAG: &str = "yamlbind-alias";

/// Parse every document of a stream where aliases may name anchors defined
/// outside the text.
///
/// An alias with no earlier anchor in its own document is kept as an alias
/// node when `known` accepts its name or when an earlier document of the
/// stream anchors it. Resolving such aliases is left to the caller. Other
/// dangling aliases fail as usual.
///
/// Columns reported on a line holding a rewritten alias are shifted for
/// positions after the alias.
pub fn parse_documents_with_anchors(
    content: &str,
    filename: Option<&str>,
    known: impl Fn(&str) -> bool,
) -> Result<Vec<Node>> {
    match rewrite_external_aliases(content, known) {
        Some(rewritten) => parse_impl(&rewritten, filename, true),
        None => parse_impl(content, filename, true),
    }
}

/// Replace external aliases with tagged placeholder scalars, or `None`
/// when the text has none.
fn rewrite_external_aliases(content: &str, known: impl Fn(&str) -> bool) -> Option<String> {
    let chars: Vec<char> = content.chars().collect();
    let tokens = scan_tokens(&chars);
    let external: Vec<_> = tokens
        .aliases
        .iter()
        .filter(|alias| {
            let defined_before = |doc_matches: &dyn Fn(usize) -> bool| {
                tokens.anchors.iter().any(|anchor| {
                    anchor.name == alias.name && anchor.start < alias.start && doc_matches(anchor.doc)
                })
            };
            !defined_before(&|doc| doc == alias.doc)
                && (known(&alias.name) || defined_before(&|doc| doc < alias.doc))
        })
        .collect();
    if external.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(content.len() + external.len() * 24);
    let mut pos = 0;
    for alias in external {
        out.extend(&chars[pos..alias.start]);
        out.push_str(&format!(
            "!{EXTERNAL_ALIAS_TAG} '{}'",
            alias.name.replace('\'', "''")
        ));
        pos = alias.end;
    }
    out.extend(&chars[pos..]);
    tracing::trace!("rewrote aliases to anchors defined outside the text");
    Some(out)
}

fn is_external_alias(tag: &yaml_rust2::parser::Tag) -> bool {
    tag.handle == "!" && tag.suffix == EXTERNAL_ALIAS_TAG
}

fn parse_impl(content: &str, filename: Option<&str>, multi: bool) -> Result<Vec<Node>> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = TreeBuilder::new(content, filename);

    parser
        .load(&mut builder, multi)
        .map_err(|err| Error::from(err).in_file(filename))?;

    builder.finish().map_err(|err| err.in_file(filename))
}

/// Receives parser events and assembles nodes on a stack.
struct TreeBuilder {
    chars: Vec<char>,
    filename: Option<String>,
    /// Names in the order their `&name` tokens appear.
    anchor_names: Vec<String>,
    /// Parser anchor id to name, filled as anchored nodes arrive.
    anchors_by_id: HashMap<usize, String>,
    next_anchor: usize,
    stack: Vec<BuildNode>,
    documents: Vec<Node>,
    error: Option<Error>,
}

struct Pending {
    start_marker: Marker,
    anchor: Option<String>,
    tag: Option<Tag>,
    flow: bool,
}

enum BuildNode {
    Sequence {
        pending: Pending,
        items: Vec<Node>,
    },
    Mapping {
        pending: Pending,
        entries: Vec<(Node, Option<Node>)>,
    },
}

impl TreeBuilder {
    fn new(source: &str, filename: Option<&str>) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let anchor_names = collect_anchor_names(&chars);
        Self {
            chars,
            filename: filename.map(|s| s.to_string()),
            anchor_names,
            anchors_by_id: HashMap::new(),
            next_anchor: 0,
            stack: Vec::new(),
            documents: Vec::new(),
            error: None,
        }
    }

    fn finish(self) -> Result<Vec<Node>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.documents),
        }
    }

    fn fail(&mut self, message: &str, marker: &Marker) {
        if self.error.is_none() {
            self.error = Some(Error::Parse {
                message: message.to_string(),
                location: Some(self.make_source_info(marker, 0)),
            });
        }
    }

    fn push_complete(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => self.documents.push(node),
            Some(BuildNode::Sequence { items, .. }) => items.push(node),
            Some(BuildNode::Mapping { entries, .. }) => match entries.last_mut() {
                Some((_, value @ None)) => *value = Some(node),
                _ => entries.push((node, None)),
            },
        }
    }

    fn make_source_info(&self, marker: &Marker, len: usize) -> SourceInfo {
        let info = SourceInfo::from_marker(marker, len);
        match &self.filename {
            Some(filename) => info.with_file(filename.clone()),
            None => info,
        }
    }

    /// Name for the anchored node that starts now. Called in event order,
    /// which is the order the `&name` tokens appear in.
    fn anchor_name(&mut self, anchor_id: usize) -> Option<String> {
        if anchor_id == 0 {
            return None;
        }
        let name = self
            .anchor_names
            .get(self.next_anchor)
            .cloned()
            .unwrap_or_else(|| format!("anchor{}", anchor_id));
        self.next_anchor += 1;
        self.anchors_by_id.insert(anchor_id, name.clone());
        Some(name)
    }

    fn char_at(&self, marker: &Marker) -> Option<char> {
        self.chars.get(marker.index()).copied()
    }

    /// Apply tag and anchor wrappers (anchor outermost).
    fn wrap(&self, mut node: Node, pending: &Pending) -> Node {
        let source_info = node.source_info.clone();
        if let Some(tag) = &pending.tag {
            node = Node::tagged(tag.clone(), node).with_source_info(source_info.clone());
        }
        if let Some(name) = &pending.anchor {
            node = Node::anchor(name.clone(), node).with_source_info(source_info);
        }
        node
    }

    fn scalar(&self, value: String, style: TScalarStyle, tag: Option<&Tag>) -> Node {
        let kind = match style {
            TScalarStyle::Plain if tag.is_some_and(Tag::is_core) => NodeKind::String(value),
            TScalarStyle::Plain => resolve_plain(&value),
            TScalarStyle::Literal => NodeKind::Literal(value),
            _ => NodeKind::String(value),
        };
        let node_style = match style {
            TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
            TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
            _ => ScalarStyle::Plain,
        };
        Node::new(kind).with_style(node_style)
    }
}

fn convert_tag(tag: Option<yaml_rust2::parser::Tag>) -> Option<Tag> {
    tag.map(|t| Tag::from_parts(&t.handle, &t.suffix))
}

/// A plain `<<` in key position is a merge key.
fn mark_merge_key(key: &mut Node) {
    if key.style == ScalarStyle::Plain && key.as_str() == Some("<<") {
        key.kind = NodeKind::MergeKey;
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }
        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(value, _, _, Some(tag)) if is_external_alias(&tag) => {
                let source_info = self.make_source_info(&marker, 0);
                self.push_complete(Node::alias(value).with_source_info(source_info));
            }

            Event::Scalar(value, style, anchor_id, tag) => {
                let tag = convert_tag(tag);
                let len = value.chars().count();
                let source_info = self.make_source_info(&marker, len);
                let node = self
                    .scalar(value, style, tag.as_ref())
                    .with_source_info(source_info);
                let pending = Pending {
                    start_marker: marker,
                    anchor: self.anchor_name(anchor_id),
                    tag,
                    flow: false,
                };
                let node = self.wrap(node, &pending);
                self.push_complete(node);
            }

            Event::SequenceStart(anchor_id, tag) => {
                let flow = self.char_at(&marker) == Some('[');
                let anchor = self.anchor_name(anchor_id);
                self.stack.push(BuildNode::Sequence {
                    pending: Pending {
                        start_marker: marker,
                        anchor,
                        tag: convert_tag(tag),
                        flow,
                    },
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => {
                let Some(BuildNode::Sequence { pending, items }) = self.stack.pop() else {
                    self.fail("sequence end without start", &marker);
                    return;
                };
                let len = marker.index().saturating_sub(pending.start_marker.index());
                let source_info = self.make_source_info(&pending.start_marker, len);
                let node = Node::new(NodeKind::Sequence(Sequence {
                    items,
                    flow: pending.flow,
                    ..Sequence::default()
                }))
                .with_source_info(source_info);
                let node = self.wrap(node, &pending);
                self.push_complete(node);
            }

            Event::MappingStart(anchor_id, tag) => {
                let flow = self.char_at(&marker) == Some('{');
                let anchor = self.anchor_name(anchor_id);
                self.stack.push(BuildNode::Mapping {
                    pending: Pending {
                        start_marker: marker,
                        anchor,
                        tag: convert_tag(tag),
                        flow,
                    },
                    entries: Vec::new(),
                });
            }

            Event::MappingEnd => {
                let Some(BuildNode::Mapping { pending, entries }) = self.stack.pop() else {
                    self.fail("mapping end without start", &marker);
                    return;
                };
                let len = marker.index().saturating_sub(pending.start_marker.index());
                let source_info = self.make_source_info(&pending.start_marker, len);

                let mut mapping = Mapping {
                    entries: Vec::with_capacity(entries.len()),
                    flow: pending.flow,
                };
                for (mut key, value) in entries {
                    let Some(value) = value else {
                        self.fail("mapping entry without value", &marker);
                        return;
                    };
                    mark_merge_key(&mut key);
                    mapping.entries.push(MappingEntry::new(key, value));
                }

                let node = Node::new(NodeKind::Mapping(mapping)).with_source_info(source_info);
                let node = self.wrap(node, &pending);
                self.push_complete(node);
            }

            Event::Alias(anchor_id) => {
                let source_info = self.make_source_info(&marker, 0);
                let name = self
                    .anchors_by_id
                    .get(&anchor_id)
                    .cloned()
                    .unwrap_or_else(|| format!("anchor{}", anchor_id));
                tracing::trace!(alias = %name, "parsed alias");
                self.push_complete(Node::alias(name).with_source_info(source_info));
            }
        }
    }
}
