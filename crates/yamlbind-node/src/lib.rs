//! # yamlbind-node
//!
//! The document tree shared by the yamlbind encoder and decoder.
//!
//! This crate provides [`Node`], a closed tagged variant over mappings,
//! sequences, scalars, anchors, aliases, tags and literal blocks, with a
//! source position on every node. Around it sit the collaborators the
//! engine needs to work on text:
//!
//! - [`parse`] / [`parse_documents`]: text to tree, built on yaml-rust2
//! - [`emit`] / [`emit_documents`]: tree to text
//! - [`Path`] and [`attach_comments`]: place comments on a finished tree
//!
//! ## Example
//!
//! ```rust
//! use yamlbind_node::{emit, parse, EmitOptions};
//!
//! let doc = parse("b: 2\na: [1, 2]\n").unwrap();
//! assert_eq!(emit(&doc, &EmitOptions::default()), "b: 2\na: [1, 2]\n");
//! ```

mod anchors;
mod comment;
mod emit;
mod error;
mod node;
mod parser;
pub mod path;
pub mod scalar;
mod source_info;

pub use comment::{Comment, CommentMap, CommentPosition, attach_comments};
pub use emit::{EmitOptions, emit, emit_documents};
pub use error::{Error, Result};
pub use node::{
    CommentGroup, Mapping, MappingEntry, Node, NodeKind, ScalarStyle, Sequence, Tag,
};
pub use parser::{
    parse, parse_documents, parse_documents_file, parse_documents_with_anchors, parse_file,
};
pub use path::Path;
pub use source_info::SourceInfo;
