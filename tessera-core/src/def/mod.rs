//! Structural definitions, one per kind of type.

mod enum_;
mod list;
mod map;
mod option;
mod pointer;
mod scalar;
mod struct_;

pub use enum_::*;
pub use list::*;
pub use map::*;
pub use option::*;
pub use pointer::*;
pub use scalar::*;
pub use struct_::*;

/// The structural category of a [`crate::Shape`], with the data needed to
/// work with values of that category.
#[derive(Clone, Copy, Debug)]
pub enum Def {
    /// Primitive leaf values: numbers, booleans, strings, addresses
    Scalar(ScalarType),
    /// Growable sequences like `Vec<T>`
    List(ListDef),
    /// Fixed-size arrays `[T; N]`
    Array(ArrayDef),
    /// Slices `[T]`, only reachable through a pointer
    Slice(SliceDef),
    /// Associative containers like `HashMap<K, V>`
    Map(MapDef),
    /// Unique-item collections like `HashSet<T>`
    Set(SetDef),
    /// `Option<T>`
    Option(OptionDef),
    /// `Box`, `Rc`, `Arc`, `RefCell` and friends
    SmartPointer(SmartPointerDef),
    /// Structs, tuple structs, unit structs and tuples
    Struct(StructDef),
    /// Enums with an explicit primitive representation
    Enum(EnumDef),
}

/// Fieldless mirror of [`Def`], for diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DefKind {
    /// cf. [`Def::Scalar`]
    Scalar,
    /// cf. [`Def::List`]
    List,
    /// cf. [`Def::Array`]
    Array,
    /// cf. [`Def::Slice`]
    Slice,
    /// cf. [`Def::Map`]
    Map,
    /// cf. [`Def::Set`]
    Set,
    /// cf. [`Def::Option`]
    Option,
    /// cf. [`Def::SmartPointer`]
    SmartPointer,
    /// cf. [`Def::Struct`]
    Struct,
    /// cf. [`Def::Enum`]
    Enum,
}

impl Def {
    /// The category, without its data
    pub const fn kind(&self) -> DefKind {
        match self {
            Def::Scalar(_) => DefKind::Scalar,
            Def::List(_) => DefKind::List,
            Def::Array(_) => DefKind::Array,
            Def::Slice(_) => DefKind::Slice,
            Def::Map(_) => DefKind::Map,
            Def::Set(_) => DefKind::Set,
            Def::Option(_) => DefKind::Option,
            Def::SmartPointer(_) => DefKind::SmartPointer,
            Def::Struct(_) => DefKind::Struct,
            Def::Enum(_) => DefKind::Enum,
        }
    }
}

impl core::fmt::Display for DefKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            DefKind::Scalar => "scalar",
            DefKind::List => "list",
            DefKind::Array => "array",
            DefKind::Slice => "slice",
            DefKind::Map => "map",
            DefKind::Set => "set",
            DefKind::Option => "option",
            DefKind::SmartPointer => "smart pointer",
            DefKind::Struct => "struct",
            DefKind::Enum => "enum",
        })
    }
}
