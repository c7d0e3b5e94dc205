use core::alloc::Layout;
use core::fmt;

use crate::{ConstTypeId, Def, SkipSerializingIfFn, StructKind, ValueVTable};

/// Schema for reflection of a type
#[derive(Clone, Copy)]
pub struct Shape {
    /// Unique type identifier, provided by the compiler.
    pub id: ConstTypeId,

    /// Size and alignment, or `Unsized` for dynamically sized types.
    pub layout: ShapeLayout,

    /// Function pointers to perform various operations.
    pub vtable: &'static ValueVTable,

    /// Kind-specific description of the type's structure.
    pub def: Def,

    /// Name of the type without generic parameters, like `Vec` or `Point`.
    pub type_identifier: &'static str,

    /// Generic parameters of the type, in declaration order.
    pub type_params: &'static [TypeParam],

    /// Doc comment lines.
    pub doc: &'static [&'static str],

    /// Container attributes.
    pub attributes: &'static [ShapeAttribute],

    /// Name used to tag this type in foreign representations, if any.
    pub type_tag: Option<&'static str>,

    /// The wrapped type, for newtypes and transparent wrappers.
    pub inner: Option<fn() -> &'static Shape>,
}

/// Layout of a shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeLayout {
    /// `Sized` type
    Sized(Layout),
    /// `!Sized` type
    Unsized,
}

/// Tried to get the `Layout` of an unsized type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnsizedError;

impl fmt::Display for UnsizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("type is unsized")
    }
}

impl core::error::Error for UnsizedError {}

impl ShapeLayout {
    /// `Layout` if this type is `Sized`
    #[inline]
    pub const fn sized_layout(self) -> Result<Layout, UnsizedError> {
        match self {
            ShapeLayout::Sized(layout) => Ok(layout),
            ShapeLayout::Unsized => Err(UnsizedError),
        }
    }
}

/// A generic parameter of a shape
#[derive(Clone, Copy, Debug)]
pub struct TypeParam {
    /// Parameter name, such as `T`
    pub name: &'static str,
    /// Shape the parameter was instantiated with
    pub shape: &'static Shape,
}

/// A container attribute
#[derive(Clone, Copy, Debug)]
pub enum ShapeAttribute {
    /// Marshal as the single inner field
    Transparent,
    /// Never marshal fields of this type
    SkipSerializing,
    /// Skip fields of this type whose value satisfies the predicate
    SkipSerializingIf(SkipSerializingIfFn),
    /// A free-form `key = value` attribute, like `js_enum_tag = "kind"`
    Arbitrary(&'static str),
}

impl Shape {
    /// Start building a shape for a sized type
    pub const fn builder_for_sized<T: 'static>() -> ShapeBuilder {
        ShapeBuilder::new(ConstTypeId::of::<T>(), ShapeLayout::Sized(Layout::new::<T>()))
    }

    /// Start building a shape for an unsized type
    pub const fn builder_for_unsized<T: ?Sized + 'static>() -> ShapeBuilder {
        ShapeBuilder::new(ConstTypeId::of::<T>(), ShapeLayout::Unsized)
    }

    /// Whether this shape describes `T`
    #[inline]
    pub fn is_type<T: ?Sized + 'static>(&self) -> bool {
        self.id == ConstTypeId::of::<T>()
    }

    /// Whether the type occupies no memory
    #[inline]
    pub fn is_zst(&self) -> bool {
        matches!(self.layout, ShapeLayout::Sized(layout) if layout.size() == 0)
    }

    /// Whether the shape is erased in favor of its single field
    pub fn is_transparent(&self) -> bool {
        self.attributes
            .iter()
            .any(|attr| matches!(attr, ShapeAttribute::Transparent))
            || self.arbitrary_attributes().any(|attr| attr == "transparent")
    }

    /// The free-form attributes, trimmed
    pub fn arbitrary_attributes(&self) -> impl Iterator<Item = &'static str> {
        self.attributes.iter().filter_map(|attr| match attr {
            ShapeAttribute::Arbitrary(s) => Some(s.trim()),
            _ => None,
        })
    }

    /// Whether the type carries a drop-in-place function
    #[inline]
    pub fn needs_drop(&self) -> bool {
        self.vtable.drop_in_place.is_some()
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Shape {}

impl core::hash::Hash for Shape {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.def {
            Def::Array(array) => return write!(f, "[{}; {}]", array.t, array.n),
            Def::Slice(slice) => return write!(f, "[{}]", slice.t),
            Def::Struct(sd) if sd.kind == StructKind::Tuple => {
                f.write_str("(")?;
                for (i, param) in self.type_params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", param.shape)?;
                }
                return f.write_str(")");
            }
            _ => {}
        }
        f.write_str(self.type_identifier)?;
        if let Some((first, rest)) = self.type_params.split_first() {
            write!(f, "<{}", first.shape)?;
            for param in rest {
                write!(f, ", {}", param.shape)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("type", &format_args!("{self}"))
            .field("layout", &self.layout)
            .field("def", &self.def.kind())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Shape`]
pub struct ShapeBuilder {
    id: ConstTypeId,
    layout: ShapeLayout,
    vtable: Option<&'static ValueVTable>,
    def: Option<Def>,
    type_identifier: Option<&'static str>,
    type_params: &'static [TypeParam],
    doc: &'static [&'static str],
    attributes: &'static [ShapeAttribute],
    type_tag: Option<&'static str>,
    inner: Option<fn() -> &'static Shape>,
}

impl ShapeBuilder {
    const fn new(id: ConstTypeId, layout: ShapeLayout) -> Self {
        Self {
            id,
            layout,
            vtable: None,
            def: None,
            type_identifier: None,
            type_params: &[],
            doc: &[],
            attributes: &[],
            type_tag: None,
            inner: None,
        }
    }

    /// Sets the behavior table
    pub const fn vtable(mut self, vtable: &'static ValueVTable) -> Self {
        self.vtable = Some(vtable);
        self
    }

    /// Sets the structural definition
    pub const fn def(mut self, def: Def) -> Self {
        self.def = Some(def);
        self
    }

    /// Sets the type name
    pub const fn type_identifier(mut self, type_identifier: &'static str) -> Self {
        self.type_identifier = Some(type_identifier);
        self
    }

    /// Sets the generic parameters
    pub const fn type_params(mut self, type_params: &'static [TypeParam]) -> Self {
        self.type_params = type_params;
        self
    }

    /// Sets the doc comment lines
    pub const fn doc(mut self, doc: &'static [&'static str]) -> Self {
        self.doc = doc;
        self
    }

    /// Sets the container attributes
    pub const fn attributes(mut self, attributes: &'static [ShapeAttribute]) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets the foreign type tag
    pub const fn type_tag(mut self, type_tag: &'static str) -> Self {
        self.type_tag = Some(type_tag);
        self
    }

    /// Sets the wrapped type
    pub const fn inner(mut self, inner: fn() -> &'static Shape) -> Self {
        self.inner = Some(inner);
        self
    }

    /// Builds the shape
    ///
    /// # Panics
    ///
    /// Panics (at compile time, when used in a const) if the vtable, the
    /// definition or the type identifier is missing.
    pub const fn build(self) -> Shape {
        let Some(vtable) = self.vtable else {
            panic!("shape is missing a vtable")
        };
        let Some(def) = self.def else {
            panic!("shape is missing a def")
        };
        let Some(type_identifier) = self.type_identifier else {
            panic!("shape is missing a type identifier")
        };
        Shape {
            id: self.id,
            layout: self.layout,
            vtable,
            def,
            type_identifier,
            type_params: self.type_params,
            doc: self.doc,
            attributes: self.attributes,
            type_tag: self.type_tag,
            inner: self.inner,
        }
    }
}
