//! # yamlbind
//!
//! Typed YAML encoding and decoding over the document tree of
//! [`yamlbind_node`].
//!
//! Types opt in with `#[derive(Encode, Decode)]`. Fields are configured with
//! a tag string in `#[yaml("...")]`:
//!
//! ```rust
//! use yamlbind::{Decode, Encode};
//!
//! #[derive(Debug, Default, PartialEq, Encode, Decode)]
//! struct Server {
//!     host: String,
//!     #[yaml("listen_port,omitempty")]
//!     port: u16,
//! }
//!
//! let server: Server = yamlbind::from_str("host: example.org\nlisten_port: 8080\n").unwrap();
//! assert_eq!(server.port, 8080);
//! assert_eq!(yamlbind::to_string(&server).unwrap(), "host: example.org\nlisten_port: 8080\n");
//! ```
//!
//! Decoding resolves anchors, aliases and merge keys and reports errors
//! with the field path and source position. Encoding sorts map keys,
//! skips empty `omitempty` fields, writes anchors and aliases for shared
//! values, and can attach comments by path.

extern crate self as yamlbind;

mod codec;
mod decoder;
mod describe;
mod encoder;
mod error;
mod hooks;
mod impls;
mod json;
mod options;
mod traits;
mod value;

pub use codec::{
    CodecRegistry, SharedCodecRegistry, global_registry, register_decoder, register_encoder,
};
pub use decoder::{Decoder, MapEntry, StructDecoder};
pub use describe::{RawField, Shape, StructField, StructFieldMap, TypeShape, describe};
pub use encoder::{Encoder, StructEncoder};
pub use error::{CodecError, Error, ErrorKind, FieldPath, PathSegment, Result};
pub use hooks::{Binary, Registered, Text, format_duration, parse_duration, parse_timestamp};
pub use json::{json_to_yaml, json_to_yaml_with, yaml_to_json, yaml_to_json_with};
pub use options::{AnchorCallback, DEFAULT_MAX_DEPTH, DecodeOptions, EncodeOptions, Reference};
pub use traits::{Decode, Encode, Identity, InlineContext};
pub use value::{MapItem, MapSlice, Value};

pub use yamlbind_node::{Comment, CommentMap, CommentPosition, Node, NodeKind, SourceInfo};

#[cfg(feature = "derive")]
pub use yamlbind_derive::{Decode, Encode};

/// Decode the first document of `text` with default options.
pub fn from_str<T: Decode>(text: &str) -> Result<T> {
    from_str_with(text, DecodeOptions::new())
}

pub fn from_str_with<T: Decode>(text: &str, options: DecodeOptions) -> Result<T> {
    Decoder::new(options)?.decode_str(text)
}

pub fn from_node<T: Decode>(node: &Node) -> Result<T> {
    Decoder::new(DecodeOptions::new())?.decode_node(node)
}

/// Encode `value` as one YAML document with default options.
pub fn to_string<T: Encode>(value: &T) -> Result<String> {
    to_string_with(value, EncodeOptions::new())
}

pub fn to_string_with<T: Encode>(value: &T, options: EncodeOptions) -> Result<String> {
    Encoder::new(options).to_string(value)
}

/// Encode each value as one document of a `---` separated stream.
pub fn to_string_documents<T: Encode>(values: &[T], options: EncodeOptions) -> Result<String> {
    Encoder::new(options).to_string_documents(values)
}

pub fn to_node<T: Encode>(value: &T) -> Result<Node> {
    Encoder::new(EncodeOptions::new()).encode_document(value)
}
