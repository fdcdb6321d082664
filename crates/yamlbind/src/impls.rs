//! Built-in impls for std scalars, collections and shared pointers.

use crate::decoder::Decoder;
use crate::describe::TypeShape;
use crate::encoder::Encoder;
use crate::error::{Error, ErrorKind, Result};
use crate::traits::{Decode, Encode, Identity, InlineContext};
use base64::Engine as _;
use indexmap::IndexMap;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;
use yamlbind_node::scalar::format_float;
use yamlbind_node::{Node, NodeKind, Tag};

fn mismatch<T>(node: &Node) -> Error {
    Error::at(ErrorKind::type_mismatch(std::any::type_name::<T>(), node), node)
}

/// Integer node for any value that fits in `i64` or `u64`.
pub(crate) fn int_node(value: i128) -> Node {
    if let Ok(i) = i64::try_from(value) {
        Node::new(NodeKind::Int(i))
    } else if let Ok(u) = u64::try_from(value) {
        Node::new(NodeKind::Uint(u))
    } else {
        Node::string(value.to_string())
    }
}

fn decode_int<T>(node: &Node, target: &'static str) -> Result<T>
where
    T: TryFrom<i64> + TryFrom<u64> + Default,
{
    let overflow = |value: String| Error::at(ErrorKind::Overflow { value, target }, node);
    match node.kind {
        NodeKind::Null => Ok(T::default()),
        NodeKind::Int(i) => T::try_from(i).map_err(|_| overflow(i.to_string())),
        NodeKind::Uint(u) => T::try_from(u).map_err(|_| overflow(u.to_string())),
        NodeKind::Float(f) if f.is_finite() && f.fract() == 0.0 => {
            if f >= 0.0 && f < u64::MAX as f64 {
                T::try_from(f as u64).map_err(|_| overflow(format_float(f)))
            } else if f < 0.0 && f >= i64::MIN as f64 {
                T::try_from(f as i64).map_err(|_| overflow(format_float(f)))
            } else {
                Err(overflow(format_float(f)))
            }
        }
        _ => Err(Error::at(ErrorKind::type_mismatch(target, node), node)),
    }
}

macro_rules! int_impls {
    ($($ty:ty),*) => {$(
        impl Encode for $ty {
            fn encode(&self, _encoder: &mut Encoder) -> Result<Node> {
                Ok(int_node(*self as i128))
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }
        }

        impl Decode for $ty {
            fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
                decode_int::<$ty>(node, stringify!($ty))
            }
        }
    )*};
}

int_impls!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

fn float_of(node: &Node, target: &'static str) -> Result<f64> {
    match node.kind {
        NodeKind::Null => Ok(0.0),
        NodeKind::Float(f) => Ok(f),
        NodeKind::Int(i) => Ok(i as f64),
        NodeKind::Uint(u) => Ok(u as f64),
        _ => Err(Error::at(ErrorKind::type_mismatch(target, node), node)),
    }
}

impl Encode for f64 {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Node> {
        Ok(Node::new(NodeKind::Float(*self)))
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl Decode for f64 {
    fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
        float_of(node, "f64")
    }
}

impl Encode for f32 {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Node> {
        Ok(Node::new(NodeKind::Float(f64::from(*self))))
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl Decode for f32 {
    fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
        let value = float_of(node, "f32")?;
        if value.is_finite() && value.abs() > f64::from(f32::MAX) {
            return Err(Error::at(
                ErrorKind::Overflow {
                    value: format_float(value),
                    target: "f32",
                },
                node,
            ));
        }
        Ok(value as f32)
    }
}

impl Encode for bool {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Node> {
        Ok(Node::new(NodeKind::Bool(*self)))
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

impl Decode for bool {
    fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
        match node.kind {
            NodeKind::Null => Ok(false),
            NodeKind::Bool(b) => Ok(b),
            _ => Err(mismatch::<bool>(node)),
        }
    }
}

impl Encode for String {
    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        Ok(encoder.string(self))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

/// Bytes carried by a `!!binary` node.
pub(crate) fn binary_bytes(node: &Node) -> Option<Result<Vec<u8>>> {
    let NodeKind::Tag {
        tag: Tag::Binary,
        value,
    } = &node.kind
    else {
        return None;
    };
    let text = value.as_str().unwrap_or_default();
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    Some(
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| Error::at(ErrorKind::Codec(Box::new(e)), node)),
    )
}

impl Decode for String {
    fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
        if let Some(bytes) = binary_bytes(node) {
            return String::from_utf8(bytes?).map_err(|e| Error::at(ErrorKind::Codec(Box::new(e)), node));
        }
        match &node.kind {
            NodeKind::Null => Ok(String::new()),
            NodeKind::Mapping(_) | NodeKind::Sequence(_) => Err(mismatch::<String>(node)),
            _ => node.scalar_text().ok_or_else(|| mismatch::<String>(node)),
        }
    }
}

impl Encode for char {
    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        Ok(encoder.string(self.encode_utf8(&mut [0; 4])))
    }
}

impl Decode for char {
    fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
        let text = node.scalar_text().unwrap_or_default();
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(mismatch::<char>(node)),
        }
    }
}

impl<T: Encode> Encode for Option<T> {
    const SHAPE: TypeShape = T::SHAPE;

    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        match self {
            Some(value) => encoder.encode_value(value),
            None => Ok(Node::null()),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn identity(&self) -> Option<Identity> {
        self.as_ref().and_then(T::identity)
    }
}

impl<T: Decode> Decode for Option<T> {
    const SHAPE: TypeShape = T::SHAPE;

    fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self> {
        if node.is_null() {
            return Ok(None);
        }
        decoder.decode_value::<T>(node).map(Some)
    }

    fn decode_inline(decoder: &mut Decoder, node: &Node, ctx: &mut InlineContext) -> Result<Self> {
        T::decode_inline(decoder, node, ctx).map(Some)
    }

    fn shared_handle(&self) -> Option<Box<dyn Any>> {
        self.as_ref().and_then(T::shared_handle)
    }

    fn from_shared(handle: &dyn Any) -> Option<Self> {
        T::from_shared(handle).map(Some)
    }
}

impl<T: Encode> Encode for Box<T> {
    const SHAPE: TypeShape = T::SHAPE;

    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        encoder.encode_value(self.as_ref())
    }

    fn is_zero(&self) -> bool {
        self.as_ref().is_zero()
    }
}

impl<T: Decode> Decode for Box<T> {
    const SHAPE: TypeShape = T::SHAPE;

    fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self> {
        decoder.decode_value::<T>(node).map(Box::new)
    }

    fn decode_inline(decoder: &mut Decoder, node: &Node, ctx: &mut InlineContext) -> Result<Self> {
        T::decode_inline(decoder, node, ctx).map(Box::new)
    }
}

macro_rules! shared_pointer_impls {
    ($($ptr:ident),*) => {$(
        impl<T: Encode> Encode for $ptr<T> {
            const SHAPE: TypeShape = T::SHAPE.as_pointer();

            fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
                encoder.encode_value(self.as_ref())
            }

            fn identity(&self) -> Option<Identity> {
                Some(Identity::new($ptr::as_ptr(self) as *const () as usize, $ptr::clone(self)))
            }
        }

        impl<T: Decode> Decode for $ptr<T> {
            const SHAPE: TypeShape = T::SHAPE.as_pointer();

            fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self> {
                decoder.decode_value::<T>(node).map($ptr::new)
            }

            fn decode_inline(
                decoder: &mut Decoder,
                node: &Node,
                ctx: &mut InlineContext,
            ) -> Result<Self> {
                T::decode_inline(decoder, node, ctx).map($ptr::new)
            }

            fn shared_handle(&self) -> Option<Box<dyn Any>> {
                Some(Box::new($ptr::clone(self)))
            }

            fn from_shared(handle: &dyn Any) -> Option<Self> {
                handle.downcast_ref::<$ptr<T>>().cloned()
            }
        }
    )*};
}

shared_pointer_impls!(Rc, Arc);

impl<T: Encode> Encode for Vec<T> {
    const SHAPE: TypeShape = TypeShape::SEQUENCE;

    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        encoder.encode_sequence(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Decode> Decode for Vec<T> {
    const SHAPE: TypeShape = TypeShape::SEQUENCE;

    fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self> {
        decoder.decode_sequence(node)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    const SHAPE: TypeShape = TypeShape::SEQUENCE;

    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        encoder.encode_sequence(self)
    }

    fn is_zero(&self) -> bool {
        self.iter().all(Encode::is_zero)
    }
}

impl<T: Decode + Default, const N: usize> Decode for [T; N] {
    const SHAPE: TypeShape = TypeShape::SEQUENCE;

    /// Missing trailing items keep their default.
    fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self> {
        let items = decoder.decode_sequence::<T>(node)?;
        if items.len() > N {
            return Err(Error::at(
                ErrorKind::TypeMismatch {
                    expected: format!("sequence of at most {} items", N),
                    found: format!("sequence of {} items", items.len()),
                },
                node,
            ));
        }
        let mut out: [T; N] = std::array::from_fn(|_| T::default());
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = item;
        }
        Ok(out)
    }
}

impl<T: Encode + Ord> Encode for BTreeSet<T> {
    const SHAPE: TypeShape = TypeShape::SEQUENCE;

    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        encoder.encode_sequence(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    const SHAPE: TypeShape = TypeShape::SEQUENCE;

    fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self> {
        Ok(decoder.decode_sequence::<T>(node)?.into_iter().collect())
    }
}

impl<T: Encode + Eq + Hash, S: BuildHasher + 'static> Encode for HashSet<T, S> {
    const SHAPE: TypeShape = TypeShape::SEQUENCE;

    /// Items are written sorted by their text so output is stable.
    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        let mut items = Vec::with_capacity(self.len());
        for item in self {
            items.push(encoder.encode_value(item)?);
        }
        items.sort_by_cached_key(|node| node.scalar_text());
        Ok(encoder.sequence(items))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Decode + Eq + Hash, S: BuildHasher + Default + 'static> Decode for HashSet<T, S> {
    const SHAPE: TypeShape = TypeShape::SEQUENCE;

    fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self> {
        Ok(decoder.decode_sequence::<T>(node)?.into_iter().collect())
    }
}

impl<K: Encode, V: Encode, S: BuildHasher + 'static> Encode for HashMap<K, V, S> {
    const SHAPE: TypeShape = TypeShape::MAP;

    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        encoder.encode_map(self, true)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default + 'static,
{
    const SHAPE: TypeShape = TypeShape::MAP;

    fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self> {
        Ok(decoder.decode_map_entries(node, None)?.into_iter().collect())
    }

    fn decode_inline(decoder: &mut Decoder, node: &Node, ctx: &mut InlineContext) -> Result<Self> {
        Ok(decoder.decode_map_entries(node, Some(ctx))?.into_iter().collect())
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    const SHAPE: TypeShape = TypeShape::MAP;

    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        encoder.encode_map(self, true)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    const SHAPE: TypeShape = TypeShape::MAP;

    fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self> {
        Ok(decoder.decode_map_entries(node, None)?.into_iter().collect())
    }

    fn decode_inline(decoder: &mut Decoder, node: &Node, ctx: &mut InlineContext) -> Result<Self> {
        Ok(decoder.decode_map_entries(node, Some(ctx))?.into_iter().collect())
    }
}

/// Insertion order is kept on both sides.
impl<K: Encode, V: Encode, S: BuildHasher + 'static> Encode for IndexMap<K, V, S> {
    const SHAPE: TypeShape = TypeShape::MAP;

    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        encoder.encode_map(self, false)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> Decode for IndexMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default + 'static,
{
    const SHAPE: TypeShape = TypeShape::MAP;

    fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self> {
        Ok(decoder.decode_map_entries(node, None)?.into_iter().collect())
    }

    fn decode_inline(decoder: &mut Decoder, node: &Node, ctx: &mut InlineContext) -> Result<Self> {
        Ok(decoder.decode_map_entries(node, Some(ctx))?.into_iter().collect())
    }
}

impl Encode for Node {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Node> {
        Ok(self.clone())
    }

    fn is_zero(&self) -> bool {
        self.is_null()
    }
}

/// Decoding into `Node` copies the subtree; aliases below it are kept.
impl Decode for Node {
    fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
        Ok(node.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SharedCodecRegistry;
    use crate::options::{DecodeOptions, EncodeOptions};
    use pretty_assertions::assert_eq;
    use yamlbind_node::parse;

    fn decode<T: Decode>(text: &str) -> Result<T> {
        let mut decoder =
            Decoder::with_registry(DecodeOptions::new(), Arc::new(SharedCodecRegistry::new()))?;
        decoder.decode_str(text)
    }

    fn encode<T: Encode>(value: &T) -> Node {
        let mut encoder =
            Encoder::with_registry(EncodeOptions::new(), Arc::new(SharedCodecRegistry::new()));
        encoder.encode_document(value).unwrap()
    }

    #[test]
    fn test_integer_ranges() {
        assert_eq!(decode::<u8>("255").unwrap(), 255);
        let err = decode::<u8>("300").unwrap_err();
        assert_eq!(
            err.to_string(),
            "1:1: cannot unmarshal 300 into a value of type u8 (overflow)"
        );
        assert!(matches!(decode::<u32>("-1").unwrap_err().kind(), ErrorKind::Overflow { .. }));
        assert_eq!(decode::<u64>("18446744073709551615").unwrap(), u64::MAX);
        assert_eq!(decode::<i32>("2.0").unwrap(), 2);
        assert!(matches!(
            decode::<i32>("2.5").unwrap_err().kind(),
            ErrorKind::TypeMismatch { .. }
        ));
        assert_eq!(decode::<i16>("~").unwrap(), 0);
        assert_eq!(decode::<i64>("0x1F").unwrap(), 31);
    }

    #[test]
    fn test_int_node_widths() {
        assert_eq!(int_node(-3).kind, NodeKind::Int(-3));
        assert_eq!(int_node(u64::MAX as i128).kind, NodeKind::Uint(u64::MAX));
    }

    #[test]
    fn test_strings_accept_scalars() {
        assert_eq!(decode::<String>("12").unwrap(), "12");
        assert_eq!(decode::<String>("true").unwrap(), "true");
        assert_eq!(decode::<String>("!!binary aGVsbG8=").unwrap(), "hello");
        assert!(decode::<String>("[a]").is_err());
    }

    #[test]
    fn test_float_and_bool() {
        assert_eq!(decode::<f64>("3").unwrap(), 3.0);
        assert!(decode::<f64>(".inf").unwrap().is_infinite());
        assert!(matches!(decode::<f32>("1e300").unwrap_err().kind(), ErrorKind::Overflow { .. }));
        assert!(decode::<bool>("yes").is_err());
        assert!(decode::<bool>("True").unwrap());
    }

    #[test]
    fn test_fixed_arrays() {
        assert_eq!(decode::<[u8; 3]>("[1, 2]").unwrap(), [1, 2, 0]);
        assert!(decode::<[u8; 1]>("[1, 2]").is_err());
        assert!([0u8; 3].is_zero());
    }

    #[test]
    fn test_option_and_null() {
        assert_eq!(decode::<Option<u8>>("null").unwrap(), None);
        assert_eq!(decode::<Option<u8>>("4").unwrap(), Some(4));
        assert_eq!(encode(&None::<u8>).kind, NodeKind::Null);
    }

    #[test]
    fn test_map_keys_sorted() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), 2);
        map.insert("a".to_string(), 1);
        let node = encode(&map);
        let keys: Vec<String> = node
            .as_mapping()
            .unwrap()
            .entries
            .iter()
            .map(|e| e.key.scalar_text().unwrap())
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_index_map_keeps_order() {
        let map: IndexMap<String, u8> = decode("z: 1\na: 2\n").unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "a"]);
    }

    #[test]
    fn test_merge_precedence() {
        let doc = "base: &b {a: 1, b: 2}\nv:\n  <<: *b\n  b: 3\n";
        let value: BTreeMap<String, BTreeMap<String, u8>> = decode(doc).unwrap();
        assert_eq!(value["v"], BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 3)]));
    }

    #[test]
    fn test_shared_pointer_alias() {
        let doc = parse("a: &x [1, 2]\nb: *x\n").unwrap();
        let mut decoder =
            Decoder::with_registry(DecodeOptions::new(), Arc::new(SharedCodecRegistry::new()))
                .unwrap();
        let value: BTreeMap<String, Rc<Vec<u8>>> = decoder.decode_node(&doc).unwrap();
        assert!(Rc::ptr_eq(&value["a"], &value["b"]));
    }
}
