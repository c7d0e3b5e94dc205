//! Resolution of container and field attributes.
//!
//! Attributes arrive either as typed [`ShapeAttribute`]/[`FieldAttribute`]
//! values or as free-form `key = "value"` strings. Both are folded into the
//! small structs below, once per type or field and per call.

use std::collections::HashMap;

use tessera_core::{
    ConstTypeId, DefaultInPlaceFn, Field, FieldAttribute, Shape, ShapeAttribute,
};
use tessera_reflect::Peek;

use crate::ErrorKind;

/// How an enum tag is written
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TagRepr {
    /// The variant name
    #[default]
    String,
    /// The variant discriminant
    Number,
}

/// Attributes of a struct or enum
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerAttrs {
    /// Marshal as the single inner field
    pub transparent: bool,
    /// Name of the tag property of data-carrying enums
    pub tag: &'static str,
    /// How the tag value is written
    pub repr: TagRepr,
}

impl Default for ContainerAttrs {
    fn default() -> Self {
        Self {
            transparent: false,
            tag: "type",
            repr: TagRepr::String,
        }
    }
}

/// Where the value of an absent field comes from
#[derive(Clone, Copy, Debug)]
pub enum DefaultSource {
    /// A function given with the attribute
    Custom(DefaultInPlaceFn),
    /// The field type's own `Default`
    TypeDefault,
}

/// Attributes of one field
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldAttrs {
    /// Merge the field's properties into the parent object
    pub flatten: bool,
    /// Fill the field when its property is absent
    pub default: Option<DefaultSource>,
    /// Marshal a numeric sequence as a typed array
    pub typed_array: bool,
    /// Never marshal the field
    pub skip: bool,
}

/// Per-call cache of resolved attributes
#[derive(Debug, Default)]
pub struct AttributeResolver {
    containers: HashMap<ConstTypeId, ContainerAttrs>,
    fields: HashMap<usize, FieldAttrs>,
}

impl AttributeResolver {
    /// An empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Container attributes of `shape`
    pub fn container(&mut self, shape: &'static Shape) -> Result<ContainerAttrs, ErrorKind> {
        if let Some(attrs) = self.containers.get(&shape.id) {
            return Ok(*attrs);
        }
        let attrs = resolve_container(shape)?;
        self.containers.insert(shape.id, attrs);
        Ok(attrs)
    }

    /// Attributes of `field`, declared on `owner`
    pub fn field(
        &mut self,
        owner: &'static Shape,
        field: &'static Field,
    ) -> Result<FieldAttrs, ErrorKind> {
        let key = field as *const Field as usize;
        if let Some(attrs) = self.fields.get(&key) {
            return Ok(*attrs);
        }
        let attrs = resolve_field(owner, field)?;
        self.fields.insert(key, attrs);
        Ok(attrs)
    }
}

/// Splits `key = "value"` into its parts; bare words have no value.
fn split(attr: &'static str) -> (&'static str, Option<&'static str>) {
    match attr.split_once('=') {
        Some((key, value)) => (key.trim(), Some(value.trim().trim_matches('"'))),
        None => (attr.trim(), None),
    }
}

fn resolve_container(shape: &'static Shape) -> Result<ContainerAttrs, ErrorKind> {
    let mut attrs = ContainerAttrs {
        transparent: shape.is_transparent(),
        ..ContainerAttrs::default()
    };
    for attribute in shape.arbitrary_attributes() {
        let invalid = ErrorKind::InvalidAttribute { shape, attribute };
        match split(attribute) {
            ("transparent", None) => attrs.transparent = true,
            ("js_enum_tag", Some(tag)) if !tag.is_empty() => attrs.tag = tag,
            ("js_enum_repr", Some("string")) => attrs.repr = TagRepr::String,
            ("js_enum_repr", Some("number")) => attrs.repr = TagRepr::Number,
            ("transparent" | "js_enum_tag" | "js_enum_repr", _) => return Err(invalid),
            // belongs to some other tool
            _ => {}
        }
    }
    Ok(attrs)
}

fn resolve_field(owner: &'static Shape, field: &'static Field) -> Result<FieldAttrs, ErrorKind> {
    let mut attrs = FieldAttrs::default();
    for attribute in field.attributes {
        match attribute {
            FieldAttribute::Flatten => attrs.flatten = true,
            FieldAttribute::Default(Some(f)) => attrs.default = Some(DefaultSource::Custom(*f)),
            FieldAttribute::Default(None) => attrs.default = Some(DefaultSource::TypeDefault),
            FieldAttribute::TypedArray => attrs.typed_array = true,
            FieldAttribute::SkipSerializing => attrs.skip = true,
            // evaluated against the value, cf. `should_skip`
            FieldAttribute::SkipSerializingIf(_) => {}
            FieldAttribute::Arbitrary(raw) => match split(raw.trim()) {
                ("flatten", None) => attrs.flatten = true,
                ("default", None) => attrs.default = Some(DefaultSource::TypeDefault),
                ("typed_array", None) => attrs.typed_array = true,
                ("skip_serializing", None) => attrs.skip = true,
                ("flatten" | "default" | "typed_array" | "skip_serializing", Some(_)) => {
                    return Err(ErrorKind::InvalidAttribute {
                        shape: owner,
                        attribute: raw,
                    });
                }
                _ => {}
            },
        }
    }
    Ok(attrs)
}

/// Whether `value`, the current value of `field`, should be left out when
/// marshalling. Skip attributes on the field's type count too.
pub fn should_skip(field: &Field, attrs: &FieldAttrs, value: Peek<'_>) -> bool {
    if attrs.skip {
        return true;
    }
    let on_field = field.attributes.iter().any(|attr| match attr {
        FieldAttribute::SkipSerializingIf(predicate) => unsafe { predicate(value.data()) },
        _ => false,
    });
    on_field
        || value.shape().attributes.iter().any(|attr| match attr {
            ShapeAttribute::SkipSerializing => true,
            ShapeAttribute::SkipSerializingIf(predicate) => unsafe { predicate(value.data()) },
            _ => false,
        })
}
