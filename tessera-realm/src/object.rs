use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::{BigInt, MapKey, Value, ValueKind};

/// Handle to an object in a [`crate::Realm`].
///
/// Handles are arena indices: equal handles name the same object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    /// The handle with the given index. Runtimes other than [`crate::Realm`]
    /// use it to number the objects they hand out.
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Position of the object in its realm
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An object stored in a realm
#[derive(Clone, Debug)]
pub struct HeapObject {
    /// What sort of object this is, with its contents
    pub kind: ObjectKind,
    /// Object consulted for properties this one lacks
    pub prototype: Option<ObjectId>,
}

/// Contents of an object
#[derive(Clone, Debug)]
pub enum ObjectKind {
    /// A property bag, keys in insertion order
    Ordinary(IndexMap<Rc<str>, Value>),
    /// An ordered array
    Array(Vec<Value>),
    /// A typed array
    TypedArray(TypedArray),
    /// A `Map`, entries in insertion order
    Map(IndexMap<MapKey, Value>),
    /// A `Set`, items in insertion order
    Set(IndexSet<MapKey>),
}

impl ObjectKind {
    /// The kind of value an object of this sort is
    pub fn value_kind(&self) -> ValueKind {
        match self {
            ObjectKind::Ordinary(_) => ValueKind::Object,
            ObjectKind::Array(_) => ValueKind::Array,
            ObjectKind::TypedArray(array) => ValueKind::TypedArray(array.kind()),
            ObjectKind::Map(_) => ValueKind::Map,
            ObjectKind::Set(_) => ValueKind::Set,
        }
    }
}

macro_rules! typed_arrays {
    ($($variant:ident($elem:ty) => $name:literal, $to_value:expr;)+) => {
        /// Element type of a typed array
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum TypedArrayKind {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl TypedArrayKind {
            /// Constructor name, like `Uint8Array`
            pub const fn name(self) -> &'static str {
                match self {
                    $(TypedArrayKind::$variant => $name,)+
                }
            }
        }

        /// Contiguous, homogeneous numeric storage
        #[derive(Clone, Debug, PartialEq)]
        pub enum TypedArray {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant(Vec<$elem>),
            )+
        }

        impl TypedArray {
            /// The element type
            pub fn kind(&self) -> TypedArrayKind {
                match self {
                    $(TypedArray::$variant(_) => TypedArrayKind::$variant,)+
                }
            }

            /// Number of elements
            pub fn len(&self) -> usize {
                match self {
                    $(TypedArray::$variant(items) => items.len(),)+
                }
            }

            /// Whether there are no elements
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// The element at `index`, as the runtime would read it
            pub fn get(&self, index: usize) -> Option<Value> {
                match self {
                    $(TypedArray::$variant(items) => items.get(index).copied().map($to_value),)+
                }
            }
        }

        $(
            impl From<Vec<$elem>> for TypedArray {
                fn from(items: Vec<$elem>) -> Self {
                    TypedArray::$variant(items)
                }
            }
        )+
    };
}

typed_arrays! {
    Uint8(u8) => "Uint8Array", |n| Value::Number(n as f64);
    Int8(i8) => "Int8Array", |n| Value::Number(n as f64);
    Uint16(u16) => "Uint16Array", |n| Value::Number(n as f64);
    Int16(i16) => "Int16Array", |n| Value::Number(n as f64);
    Uint32(u32) => "Uint32Array", |n| Value::Number(n as f64);
    Int32(i32) => "Int32Array", |n| Value::Number(n as f64);
    Float32(f32) => "Float32Array", |n| Value::Number(n as f64);
    Float64(f64) => "Float64Array", Value::Number;
    BigUint64(u64) => "BigUint64Array", |n| Value::BigInt(BigInt::from(n));
    BigInt64(i64) => "BigInt64Array", |n| Value::BigInt(BigInt::from(n));
}
