//! Struct field descriptors, built once per type and cached for the life of
//! the process.
//!
//! A field tag reads `name[,omitempty][,flow][,inline][,anchor[=name]][,alias[=name]]`.
//! An empty name keeps the default (the lowercased field name) and `-`
//! drops the field.

use crate::error::{ErrorKind, Result};
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Broad shape of a type, as far as field tags care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    Sequence,
    Map,
    Struct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeShape {
    pub kind: Shape,
    /// Values of the type have shared identity (`Rc`, `Arc`), so they can
    /// be anchored once and aliased afterwards.
    pub pointer: bool,
}

impl TypeShape {
    pub const SCALAR: Self = Self::new(Shape::Scalar);
    pub const SEQUENCE: Self = Self::new(Shape::Sequence);
    pub const MAP: Self = Self::new(Shape::Map);
    pub const STRUCT: Self = Self::new(Shape::Struct);

    pub const fn new(kind: Shape) -> Self {
        Self {
            kind,
            pointer: false,
        }
    }

    pub const fn as_pointer(self) -> Self {
        Self {
            kind: self.kind,
            pointer: true,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self.kind, Shape::Map | Shape::Struct)
    }
}

/// Field metadata as written in the source, fed to [`describe`] by the
/// derive macros.
#[derive(Debug, Clone, Copy)]
pub struct RawField {
    pub name: &'static str,
    pub tag: Option<&'static str>,
    pub shape: TypeShape,
}

impl RawField {
    pub const fn new(name: &'static str, tag: Option<&'static str>, shape: TypeShape) -> Self {
        Self { name, tag, shape }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructField {
    pub field_name: String,
    pub render_name: String,
    pub omit_empty: bool,
    pub flow: bool,
    pub inline: bool,
    /// Anchor name to emit on this field, explicit or derived from the
    /// render name.
    pub anchor: Option<String>,
    /// Explicit alias target.
    pub alias: Option<String>,
    /// Alias whose target is looked up by value identity at encode time.
    pub auto_alias: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StructFieldMap {
    fields: Vec<StructField>,
    by_render_name: HashMap<String, usize>,
    by_field_name: HashMap<String, usize>,
}

impl StructFieldMap {
    /// Fields in declaration order.
    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    pub fn by_field_name(&self, name: &str) -> Option<&StructField> {
        self.by_field_name.get(name).map(|i| &self.fields[*i])
    }

    /// Non-inline field rendered under `name`.
    pub fn by_render_name(&self, name: &str) -> Option<&StructField> {
        self.by_render_name.get(name).map(|i| &self.fields[*i])
    }

    /// Render names of non-inline fields.
    pub fn render_names(&self) -> impl Iterator<Item = &str> {
        self.by_render_name.keys().map(String::as_str)
    }
}

static CACHE: Lazy<Mutex<HashMap<TypeId, Arc<StructFieldMap>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Field map for `T`, computed from `raw` on first use and cached.
///
/// # Errors
///
/// Fails when a tag puts `inline` on a scalar or sequence field, asks for
/// an automatic alias on a field without shared identity, or two fields
/// share a name.
pub fn describe<T: 'static>(raw: &[RawField]) -> Result<Arc<StructFieldMap>> {
    let id = TypeId::of::<T>();
    if let Some(map) = CACHE.lock().unwrap_or_else(|e| e.into_inner()).get(&id) {
        return Ok(map.clone());
    }
    let map = Arc::new(build::<T>(raw)?);
    tracing::trace!(
        type_name = std::any::type_name::<T>(),
        fields = map.fields.len(),
        "described struct"
    );
    CACHE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(id, map.clone());
    Ok(map)
}

fn build<T: 'static>(raw: &[RawField]) -> Result<StructFieldMap> {
    let type_name = std::any::type_name::<T>();
    let invalid = |field: &str, message: &str| ErrorKind::InvalidStructTag {
        type_name,
        field: field.to_string(),
        message: message.to_string(),
    };

    let mut map = StructFieldMap::default();
    for raw_field in raw {
        let Some(field) = parse_tag(raw_field).map_err(|message| invalid(raw_field.name, &message))?
        else {
            continue;
        };
        if field.inline && !raw_field.shape.is_aggregate() {
            return Err(invalid(raw_field.name, "inline requires a struct or map field").into());
        }
        if field.auto_alias && !raw_field.shape.pointer {
            return Err(invalid(raw_field.name, "alias without a name requires an Rc or Arc field").into());
        }
        let index = map.fields.len();
        if !field.inline {
            if map.by_render_name.contains_key(&field.render_name) {
                return Err(invalid(
                    raw_field.name,
                    &format!("duplicate field name \"{}\"", field.render_name),
                )
                .into());
            }
            map.by_render_name.insert(field.render_name.clone(), index);
        }
        map.by_field_name.insert(field.field_name.clone(), index);
        map.fields.push(field);
    }
    Ok(map)
}

/// Parse one field's tag; `None` when the field is dropped with `-`.
fn parse_tag(raw: &RawField) -> std::result::Result<Option<StructField>, String> {
    let tag = raw.tag.unwrap_or("");
    let mut parts = tag.split(',');
    let name = parts.next().unwrap_or("").trim();
    if name == "-" {
        return Ok(None);
    }
    let render_name = if name.is_empty() {
        raw.name.trim_start_matches("r#").to_lowercase()
    } else {
        name.to_string()
    };
    let mut field = StructField {
        field_name: raw.name.to_string(),
        render_name,
        omit_empty: false,
        flow: false,
        inline: false,
        anchor: None,
        alias: None,
        auto_alias: false,
    };
    for option in parts.map(str::trim) {
        match option {
            "omitempty" => field.omit_empty = true,
            "flow" => field.flow = true,
            "inline" => field.inline = true,
            "anchor" => field.anchor = Some(field.render_name.clone()),
            "alias" => field.auto_alias = true,
            "" => {}
            _ => match option.split_once('=') {
                Some(("anchor", anchor)) if !anchor.is_empty() => {
                    field.anchor = Some(anchor.to_string());
                }
                Some(("alias", alias)) if !alias.is_empty() => {
                    field.alias = Some(alias.to_string());
                }
                _ => return Err(format!("unknown option \"{option}\"")),
            },
        }
    }
    Ok(Some(field))
}
