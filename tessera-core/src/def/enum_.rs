use crate::StructDef;

/// Fields for enum types
///
/// Only enums with an explicit primitive representation (`#[repr(u8)]` and
/// friends) can be described: their discriminant sits at offset zero and
/// each variant's payload is laid out like a `#[repr(C)]` struct starting
/// with the discriminant.
#[derive(Clone, Copy, Debug)]
pub struct EnumDef {
    /// representation of the enum's discriminant
    pub repr: EnumRepr,
    /// all variants for this enum
    pub variants: &'static [Variant],
}

impl EnumDef {
    /// Construct an `EnumDef`
    pub const fn new(repr: EnumRepr, variants: &'static [Variant]) -> Self {
        Self { repr, variants }
    }

    /// Whether no variant carries a payload
    pub fn is_unit_only(&self) -> bool {
        self.variants.iter().all(|v| v.data.fields.is_empty())
    }

    /// Look up a variant by name
    pub fn variant_named(&self, name: &str) -> Option<&'static Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Look up a variant by discriminant
    pub fn variant_with_discriminant(&self, discriminant: i64) -> Option<&'static Variant> {
        self.variants.iter().find(|v| v.discriminant == discriminant)
    }
}

/// Describes a variant of an enum
#[derive(Clone, Copy, Debug)]
pub struct Variant {
    /// Name of the variant, e.g. `Foo` for `Enum::Foo`
    pub name: &'static str,

    /// Discriminant value
    pub discriminant: i64,

    /// Fields contained by the variant, with offsets from the start of the enum
    pub data: StructDef,

    /// Doc comment for the variant
    pub doc: &'static [&'static str],
}

impl Variant {
    /// A variant without payload
    pub const fn unit(name: &'static str, discriminant: i64) -> Self {
        Self {
            name,
            discriminant,
            data: StructDef::UNIT,
            doc: &[],
        }
    }

    /// A variant with the given payload
    pub const fn with_data(name: &'static str, discriminant: i64, data: StructDef) -> Self {
        Self {
            name,
            discriminant,
            data,
            doc: &[],
        }
    }
}

/// Primitive representation of an enum's discriminant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnumRepr {
    /// u8 representation (#[repr(u8)])
    U8,
    /// u16 representation (#[repr(u16)])
    U16,
    /// u32 representation (#[repr(u32)])
    U32,
    /// u64 representation (#[repr(u64)])
    U64,
    /// usize representation (#[repr(usize)])
    USize,
    /// i8 representation (#[repr(i8)])
    I8,
    /// i16 representation (#[repr(i16)])
    I16,
    /// i32 representation (#[repr(i32)])
    I32,
    /// i64 representation (#[repr(i64)])
    I64,
    /// isize representation (#[repr(isize)])
    ISize,
}

impl EnumRepr {
    /// Size of the discriminant in bytes
    pub const fn size(self) -> usize {
        match self {
            EnumRepr::U8 | EnumRepr::I8 => 1,
            EnumRepr::U16 | EnumRepr::I16 => 2,
            EnumRepr::U32 | EnumRepr::I32 => 4,
            EnumRepr::U64 | EnumRepr::I64 => 8,
            EnumRepr::USize | EnumRepr::ISize => core::mem::size_of::<usize>(),
        }
    }
}
