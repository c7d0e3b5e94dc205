use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;

use crate::{ObjectId, TypedArrayKind};

/// A value of the dynamic runtime
///
/// Primitives are stored inline; objects are handles into a [`crate::Realm`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// `true` or `false`
    Bool(bool),
    /// A double-precision number
    Number(f64),
    /// An arbitrary-sign integer of up to 128 bits of magnitude
    BigInt(BigInt),
    /// An immutable string
    String(Rc<str>),
    /// A handle to an object in the realm
    Object(ObjectId),
}

impl Value {
    /// `null` or `undefined`
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// The object handle, if this is an object
    #[inline]
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// The string, if this is a string
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The number, if this is a number
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether both values are the same object, or equal primitives under
    /// SameValueZero
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
            _ => self == other,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::BigInt(n)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Object(id)
    }
}

/// An integer with a sign and up to 128 bits of magnitude.
///
/// Wide enough for every Rust integer type; zero is never negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BigInt {
    negative: bool,
    magnitude: u128,
}

impl BigInt {
    /// `0n`
    pub const ZERO: BigInt = BigInt {
        negative: false,
        magnitude: 0,
    };

    /// Build from sign and magnitude
    pub const fn new(negative: bool, magnitude: u128) -> Self {
        Self {
            negative: negative && magnitude != 0,
            magnitude,
        }
    }

    /// Whether the value is below zero
    #[inline]
    pub const fn is_negative(self) -> bool {
        self.negative
    }

    /// Absolute value
    #[inline]
    pub const fn magnitude(self) -> u128 {
        self.magnitude
    }

    /// The value as an `i128`, if it fits
    pub fn to_i128(self) -> Option<i128> {
        if self.negative {
            if self.magnitude <= i128::MIN.unsigned_abs() {
                Some((self.magnitude as i128).wrapping_neg())
            } else {
                None
            }
        } else {
            i128::try_from(self.magnitude).ok()
        }
    }

    /// The value as a `u128`, if it is not negative
    pub fn to_u128(self) -> Option<u128> {
        (!self.negative).then_some(self.magnitude)
    }
}

impl From<i128> for BigInt {
    fn from(n: i128) -> Self {
        BigInt::new(n < 0, n.unsigned_abs())
    }
}

impl From<u128> for BigInt {
    fn from(n: u128) -> Self {
        BigInt::new(false, n)
    }
}

impl From<i64> for BigInt {
    fn from(n: i64) -> Self {
        BigInt::from(n as i128)
    }
}

impl From<u64> for BigInt {
    fn from(n: u64) -> Self {
        BigInt::from(n as u128)
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        write!(f, "{}", self.magnitude)
    }
}

/// The runtime type of a value, as far as marshalling cares
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// booleans
    Bool,
    /// numbers
    Number,
    /// bigints
    BigInt,
    /// strings
    String,
    /// ordinary objects
    Object,
    /// arrays
    Array,
    /// typed arrays of some element type
    TypedArray(TypedArrayKind),
    /// `Map` objects
    Map,
    /// `Set` objects
    Set,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Undefined => f.write_str("undefined"),
            ValueKind::Null => f.write_str("null"),
            ValueKind::Bool => f.write_str("boolean"),
            ValueKind::Number => f.write_str("number"),
            ValueKind::BigInt => f.write_str("bigint"),
            ValueKind::String => f.write_str("string"),
            ValueKind::Object => f.write_str("object"),
            ValueKind::Array => f.write_str("array"),
            ValueKind::TypedArray(kind) => f.write_str(kind.name()),
            ValueKind::Map => f.write_str("Map"),
            ValueKind::Set => f.write_str("Set"),
        }
    }
}
