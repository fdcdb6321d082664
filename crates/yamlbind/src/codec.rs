//! Custom codec tables.
//!
//! A codec replaces the built-in encoding or decoding of one concrete type.
//! Two tables are consulted: the one passed in the encode or decode
//! options, then the shared registry (by default the process-wide one).

use crate::error::CodecError;
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use yamlbind_node::Node;

pub(crate) type EncodeFn = dyn Fn(&dyn Any) -> Result<Node, CodecError> + Send + Sync;
pub(crate) type DecodeFn = dyn Fn(&Node) -> Result<Box<dyn Any>, CodecError> + Send + Sync;

/// Codecs keyed by the type they handle. Registering a type again
/// replaces its earlier codec.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    encoders: HashMap<TypeId, Arc<EncodeFn>>,
    decoders: HashMap<TypeId, Arc<DecodeFn>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_encoder<T, F>(&mut self, encode: F)
    where
        T: Any,
        F: Fn(&T) -> Result<Node, CodecError> + Send + Sync + 'static,
    {
        let wrapped = move |value: &dyn Any| -> Result<Node, CodecError> {
            match value.downcast_ref::<T>() {
                Some(value) => encode(value),
                None => Err(format!(
                    "codec for {} called with another type",
                    std::any::type_name::<T>()
                )
                .into()),
            }
        };
        self.encoders.insert(TypeId::of::<T>(), Arc::new(wrapped));
    }

    pub fn register_decoder<T, F>(&mut self, decode: F)
    where
        T: Any,
        F: Fn(&Node) -> Result<T, CodecError> + Send + Sync + 'static,
    {
        let wrapped = move |node: &Node| -> Result<Box<dyn Any>, CodecError> {
            decode(node).map(|value| Box::new(value) as Box<dyn Any>)
        };
        self.decoders.insert(TypeId::of::<T>(), Arc::new(wrapped));
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty() && self.decoders.is_empty()
    }

    pub(crate) fn encoder(&self, id: TypeId) -> Option<Arc<EncodeFn>> {
        self.encoders.get(&id).cloned()
    }

    pub(crate) fn decoder(&self, id: TypeId) -> Option<Arc<DecodeFn>> {
        self.decoders.get(&id).cloned()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("encoders", &self.encoders.len())
            .field("decoders", &self.decoders.len())
            .finish()
    }
}

/// A registry that may be shared between threads and written at any time.
///
/// Lookups clone the codec out of the table before calling it, so a codec
/// may itself encode or decode without holding the lock.
#[derive(Debug, Default)]
pub struct SharedCodecRegistry {
    inner: Mutex<CodecRegistry>,
}

impl SharedCodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CodecRegistry> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register_encoder<T, F>(&self, encode: F)
    where
        T: Any,
        F: Fn(&T) -> Result<Node, CodecError> + Send + Sync + 'static,
    {
        tracing::debug!(type_name = std::any::type_name::<T>(), "registered encoder");
        self.lock().register_encoder(encode);
    }

    pub fn register_decoder<T, F>(&self, decode: F)
    where
        T: Any,
        F: Fn(&Node) -> Result<T, CodecError> + Send + Sync + 'static,
    {
        tracing::debug!(type_name = std::any::type_name::<T>(), "registered decoder");
        self.lock().register_decoder(decode);
    }

    pub(crate) fn encoder(&self, id: TypeId) -> Option<Arc<EncodeFn>> {
        self.lock().encoder(id)
    }

    pub(crate) fn decoder(&self, id: TypeId) -> Option<Arc<DecodeFn>> {
        self.lock().decoder(id)
    }
}

static GLOBAL: Lazy<Arc<SharedCodecRegistry>> = Lazy::new(|| Arc::new(SharedCodecRegistry::new()));

/// The process-wide registry used by encoders and decoders built without
/// an explicit one. Entries live until the process exits.
pub fn global_registry() -> Arc<SharedCodecRegistry> {
    GLOBAL.clone()
}

/// Register an encoder for `T` in the process-wide registry.
pub fn register_encoder<T, F>(encode: F)
where
    T: Any,
    F: Fn(&T) -> Result<Node, CodecError> + Send + Sync + 'static,
{
    GLOBAL.register_encoder(encode);
}

/// Register a decoder for `T` in the process-wide registry.
pub fn register_decoder<T, F>(decode: F)
where
    T: Any,
    F: Fn(&Node) -> Result<T, CodecError> + Send + Sync + 'static,
{
    GLOBAL.register_decoder(decode);
}

/// Per-call table first, then the shared one.
pub(crate) struct CodecLookup {
    pub(crate) local: CodecRegistry,
    pub(crate) shared: Arc<SharedCodecRegistry>,
}

impl CodecLookup {
    pub(crate) fn encoder(&self, id: TypeId) -> Option<Arc<EncodeFn>> {
        self.local.encoder(id).or_else(|| self.shared.encoder(id))
    }

    pub(crate) fn decoder(&self, id: TypeId) -> Option<Arc<DecodeFn>> {
        self.local.decoder(id).or_else(|| self.shared.decoder(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yamlbind_node::NodeKind;

    struct Celsius(f64);

    #[test]
    fn test_last_registration_wins() {
        let mut registry = CodecRegistry::new();
        registry.register_encoder::<Celsius, _>(|_| Ok(Node::string("first")));
        registry.register_encoder::<Celsius, _>(|c| Ok(Node::new(NodeKind::Float(c.0))));
        let encode = registry.encoder(TypeId::of::<Celsius>()).unwrap();
        let node = encode(&Celsius(21.5)).unwrap();
        assert_eq!(node.kind, NodeKind::Float(21.5));
    }

    #[test]
    fn test_local_before_shared() {
        let shared = Arc::new(SharedCodecRegistry::new());
        shared.register_decoder::<u32, _>(|_| Ok(1));
        let mut local = CodecRegistry::new();
        local.register_decoder::<u32, _>(|_| Ok(2));
        let lookup = CodecLookup { local, shared };
        let decode = lookup.decoder(TypeId::of::<u32>()).unwrap();
        let value = decode(&Node::null()).unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&2));
        assert!(lookup.encoder(TypeId::of::<u32>()).is_none());
    }
}
