//! Dynamic values for documents whose shape is not known ahead of time.

use crate::decoder::Decoder;
use crate::describe::TypeShape;
use crate::encoder::Encoder;
use crate::error::{Error, ErrorKind, Result};
use crate::hooks::{Binary, parse_timestamp};
use crate::impls::{binary_bytes, int_node};
use crate::traits::{Decode, Encode, InlineContext};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::collections::BTreeMap;
use yamlbind_node::{Node, NodeKind, Tag};

/// Any document value.
///
/// Mappings decode into [`Value::Map`], or into [`Value::Ordered`] when the
/// decoder was built with `use_ordered_map`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
    Timestamp(DateTime<FixedOffset>),
    Sequence(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Ordered(MapSlice),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Look up a key in either map form.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            Value::Ordered(slice) => slice.get(key),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl Encode for Value {
    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        match self {
            Value::Null => Ok(Node::null()),
            Value::Bool(b) => Ok(Node::new(NodeKind::Bool(*b))),
            Value::Int(i) => Ok(int_node(i128::from(*i))),
            Value::Uint(u) => Ok(int_node(i128::from(*u))),
            Value::Float(f) => Ok(Node::new(NodeKind::Float(*f))),
            Value::String(s) => Ok(encoder.string(s)),
            Value::Binary(bytes) => {
                let node = encoder.encode_value(&Binary(bytes.clone()))?;
                if encoder.is_json() {
                    return Ok(encoder.string(&node.scalar_text().unwrap_or_default()));
                }
                Ok(node)
            }
            Value::Timestamp(dt) => {
                let text = encoder.string(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true));
                if encoder.is_json() {
                    return Ok(text);
                }
                Ok(Node::tagged(Tag::Timestamp, text))
            }
            Value::Sequence(items) => encoder.encode_sequence(items),
            Value::Map(map) => encoder.encode_map(map, true),
            Value::Ordered(slice) => encoder.encode_value(slice),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_null()
    }
}

impl Decode for Value {
    fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self> {
        if let Some(bytes) = binary_bytes(node) {
            return bytes.map(Value::Binary);
        }
        match &node.kind {
            NodeKind::Null => Ok(Value::Null),
            NodeKind::Bool(b) => Ok(Value::Bool(*b)),
            NodeKind::Int(i) => Ok(Value::Int(*i)),
            NodeKind::Uint(u) => Ok(Value::Uint(*u)),
            NodeKind::Float(f) => Ok(Value::Float(*f)),
            NodeKind::String(s) | NodeKind::Literal(s) => Ok(Value::String(s.clone())),
            NodeKind::MergeKey => Ok(Value::String("<<".to_string())),
            NodeKind::Tag {
                tag: Tag::Timestamp,
                value,
            } => {
                let text = value.scalar_text().unwrap_or_default();
                parse_timestamp(&text).map(Value::Timestamp).ok_or_else(|| {
                    Error::at(
                        ErrorKind::TypeMismatch {
                            expected: Tag::Timestamp.to_string(),
                            found: format!("\"{}\"", text),
                        },
                        node,
                    )
                })
            }
            NodeKind::Sequence(_) => decoder.decode_sequence(node).map(Value::Sequence),
            NodeKind::Mapping(_) if decoder.use_ordered_map() => {
                decoder.decode_value::<MapSlice>(node).map(Value::Ordered)
            }
            NodeKind::Mapping(_) => Ok(Value::Map(
                decoder
                    .decode_map_entries::<String, Value>(node, None)?
                    .into_iter()
                    .collect(),
            )),
            _ => Err(Error::at(ErrorKind::type_mismatch("value", node), node)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapItem {
    pub key: Value,
    pub value: Value,
}

/// A mapping that keeps its keys in document order, duplicates included.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapSlice(pub Vec<MapItem>);

impl MapSlice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        self.0.push(MapItem {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Value of the last item whose key is the string `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0
            .iter()
            .rev()
            .find(|item| item.key.as_str() == Some(key))
            .map(|item| &item.value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapItem> {
        self.0.iter()
    }
}

impl Encode for MapSlice {
    const SHAPE: TypeShape = TypeShape::MAP;

    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        encoder.encode_map(self.0.iter().map(|item| (&item.key, &item.value)), false)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Decode for MapSlice {
    const SHAPE: TypeShape = TypeShape::MAP;

    fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self> {
        Self::decode_entries(decoder, node, None)
    }

    fn decode_inline(decoder: &mut Decoder, node: &Node, ctx: &mut InlineContext) -> Result<Self> {
        Self::decode_entries(decoder, node, Some(ctx))
    }
}

impl MapSlice {
    fn decode_entries(
        decoder: &mut Decoder,
        node: &Node,
        ctx: Option<&mut InlineContext>,
    ) -> Result<Self> {
        let entries = decoder.decode_map_entries::<Value, Value>(node, ctx)?;
        let items = entries
            .into_iter()
            .map(|(key, value)| MapItem { key, value });
        let merged = node
            .as_mapping()
            .is_some_and(|m| m.entries.iter().any(|e| e.is_merge()));
        if !merged {
            return Ok(MapSlice(items.collect()));
        }
        // A merged key gives way to a later entry for the same key, which
        // keeps its own position.
        let mut kept: Vec<MapItem> = Vec::new();
        for item in items.rev() {
            if !kept.iter().any(|k| k.key == item.key) {
                kept.push(item);
            }
        }
        kept.reverse();
        Ok(MapSlice(kept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SharedCodecRegistry;
    use crate::options::{DecodeOptions, EncodeOptions};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn decode_with(options: DecodeOptions, text: &str) -> Value {
        let mut decoder =
            Decoder::with_registry(options, Arc::new(SharedCodecRegistry::new())).unwrap();
        decoder.decode_str(text).unwrap()
    }

    #[test]
    fn test_scalars_and_map() {
        let value = decode_with(DecodeOptions::new(), "b: [1, 2.5, x, true, ~]\na: 18446744073709551615\n");
        assert_eq!(
            value.get("b"),
            Some(&Value::Sequence(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::from("x"),
                Value::Bool(true),
                Value::Null,
            ]))
        );
        assert_eq!(value.get("a"), Some(&Value::Uint(u64::MAX)));
    }

    #[test]
    fn test_ordered_map_keeps_document_order() {
        let value = decode_with(DecodeOptions::new().use_ordered_map(), "z: 1\na: 2\nz: 3\n");
        let Value::Ordered(slice) = value else {
            panic!("expected an ordered map");
        };
        let keys: Vec<&str> = slice.iter().filter_map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "z"]);
        assert_eq!(slice.get("z"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_ordered_map_merge_overrides() {
        let text = "base: &b {a: 1, b: 2}\nv:\n  <<: *b\n  c: 4\n  b: 3\n";
        let value = decode_with(DecodeOptions::new().use_ordered_map(), text);
        let Some(Value::Ordered(slice)) = value.get("v") else {
            panic!("expected an ordered map");
        };
        let items: Vec<(&str, i64)> = slice
            .iter()
            .filter_map(|i| Some((i.key.as_str()?, i.value.as_i64()?)))
            .collect();
        assert_eq!(items, vec![("a", 1), ("c", 4), ("b", 3)]);
    }

    #[test]
    fn test_tagged_values() {
        let value = decode_with(
            DecodeOptions::new(),
            "when: !!timestamp 2001-12-14 21:59:43\nraw: !!binary aGk=\n",
        );
        assert!(matches!(value.get("when"), Some(Value::Timestamp(_))));
        assert_eq!(value.get("raw"), Some(&Value::Binary(b"hi".to_vec())));
    }

    #[test]
    fn test_encode_ordered_slice() {
        let mut slice = MapSlice::new();
        slice.push("z", 1i64);
        slice.push("a", "two");
        let mut encoder =
            Encoder::with_registry(EncodeOptions::new(), Arc::new(SharedCodecRegistry::new()));
        let text = encoder.to_string(&Value::Ordered(slice)).unwrap();
        insta::assert_snapshot!(text, @r"
        z: 1
        a: two
        ");
    }
}
