use crate::{DefaultInPlaceFn, PtrConst, Shape};

/// Common fields for struct-like types
#[derive(Clone, Copy, Debug)]
pub struct StructDef {
    /// the kind of struct (e.g. struct, tuple struct, tuple)
    pub kind: StructKind,
    /// all fields, in declaration order (not necessarily in memory order)
    pub fields: &'static [Field],
}

impl StructDef {
    /// A struct without fields, also used as the payload of unit variants
    pub const UNIT: StructDef = StructDef {
        kind: StructKind::Unit,
        fields: &[],
    };

    /// Construct a `StructDef`
    pub const fn new(kind: StructKind, fields: &'static [Field]) -> Self {
        Self { kind, fields }
    }

    /// Whether fields are addressed by position rather than by name
    pub const fn is_positional(&self) -> bool {
        matches!(self.kind, StructKind::TupleStruct | StructKind::Tuple)
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Describes the kind of a struct definition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructKind {
    /// struct UnitStruct;
    Unit,
    /// struct TupleStruct(T0, T1);
    TupleStruct,
    /// struct S { foo: T0, bar: T1 }
    Struct,
    /// (T0, T1)
    Tuple,
}

/// Describes a field in a struct or tuple
#[derive(Clone, Copy, Debug)]
pub struct Field {
    /// key for the struct field (for tuples and tuple-structs, this is the 0-based index)
    pub name: &'static str,

    /// shape of the inner type, resolved lazily so types can contain themselves
    pub shape: fn() -> &'static Shape,

    /// offset of the field in the struct (obtained through `core::mem::offset_of`)
    pub offset: usize,

    /// arbitrary attributes set via the derive macro
    pub attributes: &'static [FieldAttribute],

    /// doc comments
    pub doc: &'static [&'static str],
}

impl Field {
    /// Returns the shape of the inner type
    #[inline]
    pub fn shape(&self) -> &'static Shape {
        (self.shape)()
    }

    /// Returns a builder for Field
    pub const fn builder() -> FieldBuilder {
        FieldBuilder::new()
    }

    /// The free-form attributes, trimmed
    pub fn arbitrary_attributes(&self) -> impl Iterator<Item = &'static str> {
        self.attributes.iter().filter_map(|attr| match attr {
            FieldAttribute::Arbitrary(s) => Some(s.trim()),
            _ => None,
        })
    }
}

/// Decides whether a value should be left out when marshalling
///
/// # Safety
///
/// `value` must point to an initialized value of the field's shape.
pub type SkipSerializingIfFn = for<'mem> unsafe fn(value: PtrConst<'mem>) -> bool;

/// An attribute that can be set on a field
#[derive(Clone, Copy, Debug)]
pub enum FieldAttribute {
    /// Never marshal this field
    SkipSerializing,
    /// Skip the field when the predicate holds for its value
    SkipSerializingIf(SkipSerializingIfFn),
    /// Merge the field's properties into the parent
    Flatten,
    /// Use a default when the field is absent; `None` means the field type's
    /// own `Default`
    Default(Option<DefaultInPlaceFn>),
    /// Marshal a numeric sequence as a typed array
    TypedArray,
    /// A free-form attribute, like `typed_array` or `skip_serializing`
    Arbitrary(&'static str),
}

/// Builder for Field
pub struct FieldBuilder {
    name: Option<&'static str>,
    shape: Option<fn() -> &'static Shape>,
    offset: Option<usize>,
    attributes: &'static [FieldAttribute],
    doc: &'static [&'static str],
}

impl FieldBuilder {
    /// Creates a new FieldBuilder
    #[allow(clippy::new_without_default)]
    pub const fn new() -> Self {
        Self {
            name: None,
            shape: None,
            offset: None,
            attributes: &[],
            doc: &[],
        }
    }

    /// Sets the name for the Field
    pub const fn name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Sets the lazy shape for the Field
    pub const fn shape(mut self, shape: fn() -> &'static Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Sets the offset for the Field
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the attributes for the Field
    pub const fn attributes(mut self, attributes: &'static [FieldAttribute]) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets the doc comments for the Field
    pub const fn doc(mut self, doc: &'static [&'static str]) -> Self {
        self.doc = doc;
        self
    }

    /// Builds the Field
    pub const fn build(self) -> Field {
        let (Some(name), Some(shape), Some(offset)) = (self.name, self.shape, self.offset) else {
            panic!("field requires a name, a shape and an offset")
        };
        Field {
            name,
            shape,
            offset,
            attributes: self.attributes,
            doc: self.doc,
        }
    }
}

/// Describes one field of a struct, tuple struct or enum variant payload.
///
/// ```
/// use tessera_core::{Field, FieldAttribute, field};
///
/// struct Packet {
///     id: u32,
///     body: Vec<u8>,
/// }
///
/// const FIELDS: &[Field] = &[
///     field!(Packet, id: u32),
///     field!(Packet, body: Vec<u8>, FieldAttribute::TypedArray),
/// ];
/// assert_eq!(FIELDS[1].name, "body");
/// ```
#[macro_export]
macro_rules! field {
    ($container:ty, $name:tt : $ty:ty $(, $attr:expr)* $(,)?) => {
        $crate::Field {
            name: stringify!($name),
            shape: || <$ty as $crate::Shaped>::SHAPE,
            offset: ::core::mem::offset_of!($container, $name),
            attributes: &[$($attr),*],
            doc: &[],
        }
    };
}
