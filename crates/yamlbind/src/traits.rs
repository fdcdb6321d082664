//! The two traits every encodable or decodable type implements.

use crate::decoder::Decoder;
use crate::describe::TypeShape;
use crate::encoder::Encoder;
use crate::error::{Error, ErrorKind, Result};
use std::any::Any;
use std::collections::HashSet;
use yamlbind_node::Node;

/// Identity of a shared allocation.
///
/// Holds a clone of the owning handle, so the address cannot be reused by
/// another allocation while the encoder still refers to it.
pub struct Identity {
    pub(crate) addr: usize,
    pub(crate) keepalive: Box<dyn Any>,
}

impl Identity {
    pub fn new<H: Any>(addr: usize, handle: H) -> Self {
        Self {
            addr,
            keepalive: Box::new(handle),
        }
    }
}

pub trait Encode: Any {
    const SHAPE: TypeShape = TypeShape::SCALAR;

    fn encode(&self, encoder: &mut Encoder) -> Result<Node>;

    /// Whether an `omitempty` field holding this value is left out.
    fn is_zero(&self) -> bool {
        false
    }

    /// Shared identity, for types that can be anchored and aliased.
    fn identity(&self) -> Option<Identity> {
        None
    }
}

/// Keys claimed while decoding inline fields against a parent mapping.
#[derive(Debug, Default)]
pub struct InlineContext {
    /// Keys matched by some field.
    pub consumed: HashSet<String>,
    /// Keys owned by non-inline fields of the enclosing structs.
    pub reserved: HashSet<String>,
}

pub trait Decode: Sized + 'static {
    const SHAPE: TypeShape = TypeShape::SCALAR;

    fn decode(decoder: &mut Decoder, node: &Node) -> Result<Self>;

    /// Decode from the keys of an enclosing mapping, for `inline` fields.
    fn decode_inline(
        _decoder: &mut Decoder,
        node: &Node,
        _ctx: &mut InlineContext,
    ) -> Result<Self> {
        Err(Error::at(
            ErrorKind::type_mismatch(std::any::type_name::<Self>(), node),
            node,
        ))
    }

    /// Handle to store for an anchored value so later aliases can share it.
    fn shared_handle(&self) -> Option<Box<dyn Any>> {
        None
    }

    /// Rebuild a value from a handle stored by [`Decode::shared_handle`].
    fn from_shared(_handle: &dyn Any) -> Option<Self> {
        None
    }
}
