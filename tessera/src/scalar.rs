//! Conversions between scalar shapes and primitive dynamic values.
//!
//! Integers up to 32 bits and floats become numbers; wider integers become
//! bigints. On the way back, any integral number or bigint is accepted as
//! long as it fits the target type.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use tessera_core::{Def, PtrUninit, ScalarType, Shape, Shaped};
use tessera_realm::{BigInt, Runtime, TypedArray, Value};
use tessera_reflect::{Peek, PeekListLike, ReflectError};

use crate::ErrorKind;

/// 2^128, one past the largest magnitude an integer target can hold
const U128_END: f64 = 340_282_366_920_938_463_463_374_607_431_768_211_456.0;
/// -2^127
const I128_MIN: f64 = -170_141_183_460_469_231_731_687_303_715_884_105_728.0;

pub(crate) fn marshal(peek: Peek<'_>, scalar: ScalarType) -> Result<Value, ErrorKind> {
    let value = match scalar {
        ScalarType::Unit => Value::Null,
        ScalarType::Bool => Value::Bool(*peek.get::<bool>()?),
        ScalarType::Char => Value::from(peek.get::<char>()?.to_string()),
        ScalarType::String => Value::from(peek.get::<String>()?.as_str()),
        ScalarType::U8 => Value::Number((*peek.get::<u8>()?).into()),
        ScalarType::U16 => Value::Number((*peek.get::<u16>()?).into()),
        ScalarType::U32 => Value::Number((*peek.get::<u32>()?).into()),
        ScalarType::I8 => Value::Number((*peek.get::<i8>()?).into()),
        ScalarType::I16 => Value::Number((*peek.get::<i16>()?).into()),
        ScalarType::I32 => Value::Number((*peek.get::<i32>()?).into()),
        ScalarType::F32 => Value::Number((*peek.get::<f32>()?).into()),
        ScalarType::F64 => Value::Number(*peek.get::<f64>()?),
        ScalarType::U64 => BigInt::from(*peek.get::<u64>()?).into(),
        ScalarType::U128 => BigInt::from(*peek.get::<u128>()?).into(),
        ScalarType::USize => BigInt::from(*peek.get::<usize>()? as u64).into(),
        ScalarType::I64 => BigInt::from(*peek.get::<i64>()?).into(),
        ScalarType::I128 => BigInt::from(*peek.get::<i128>()?).into(),
        ScalarType::ISize => BigInt::from(*peek.get::<isize>()? as i64).into(),
        scalar if scalar.is_textual() => Value::from(peek.to_string()),
        _ => {
            return Err(ErrorKind::UnsupportedType {
                shape: peek.shape(),
                reason: "no dynamic representation for this scalar",
            });
        }
    };
    Ok(value)
}

/// Collects a numeric sequence into a typed array, or `None` if its items
/// have no typed array counterpart.
pub(crate) fn typed_array(list: &PeekListLike<'_>) -> Option<Result<TypedArray, ReflectError>> {
    fn collect<T: Shaped + Copy>(list: &PeekListLike<'_>) -> Result<Vec<T>, ReflectError> {
        list.iter().map(|item| item.get::<T>().copied()).collect()
    }

    let Def::Scalar(scalar) = list.item_shape().def else {
        return None;
    };
    let array = match scalar {
        ScalarType::U8 => collect::<u8>(list).map(TypedArray::from),
        ScalarType::I8 => collect::<i8>(list).map(TypedArray::from),
        ScalarType::U16 => collect::<u16>(list).map(TypedArray::from),
        ScalarType::I16 => collect::<i16>(list).map(TypedArray::from),
        ScalarType::U32 => collect::<u32>(list).map(TypedArray::from),
        ScalarType::I32 => collect::<i32>(list).map(TypedArray::from),
        ScalarType::F32 => collect::<f32>(list).map(TypedArray::from),
        ScalarType::F64 => collect::<f64>(list).map(TypedArray::from),
        ScalarType::U64 => collect::<u64>(list).map(TypedArray::from),
        ScalarType::I64 => collect::<i64>(list).map(TypedArray::from),
        _ => return None,
    };
    Some(array)
}

/// An integer read from a dynamic value, before narrowing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Wide {
    Unsigned(u128),
    Signed(i128),
}

fn read_integer(realm: &dyn Runtime, shape: &'static Shape, value: &Value) -> Result<Wide, ErrorKind> {
    let overflow = || ErrorKind::IntOverflow {
        shape,
        value: realm.inspect(value),
    };
    match value {
        Value::Number(n) if n.is_nan() || (n.is_finite() && n.fract() != 0.0) => {
            Err(ErrorKind::ShapeMismatch {
                shape,
                expected: "an integer",
                found: realm.kind_of(value),
            })
        }
        Value::Number(n) if *n >= U128_END || *n < I128_MIN => Err(overflow()),
        Value::Number(n) if *n >= 0.0 => Ok(Wide::Unsigned(*n as u128)),
        Value::Number(n) => Ok(Wide::Signed(*n as i128)),
        Value::BigInt(n) if n.is_negative() => n.to_i128().map(Wide::Signed).ok_or_else(overflow),
        Value::BigInt(n) => Ok(Wide::Unsigned(n.magnitude())),
        _ => Err(ErrorKind::ShapeMismatch {
            shape,
            expected: "a number or a bigint",
            found: realm.kind_of(value),
        }),
    }
}

macro_rules! narrow {
    ($realm:expr, $shape:expr, $value:expr, $dst:expr, $ty:ty) => {{
        let narrowed = match read_integer($realm, $shape, $value)? {
            Wide::Unsigned(n) => <$ty>::try_from(n).ok(),
            Wide::Signed(n) => <$ty>::try_from(n).ok(),
        };
        let n = narrowed.ok_or_else(|| ErrorKind::IntOverflow {
            shape: $shape,
            value: $realm.inspect($value),
        })?;
        unsafe { $dst.put::<$ty>(n) };
    }};
}

/// Writes the scalar `value` converts to into `dst`.
///
/// # Safety
///
/// `dst` must be storage for a value of `shape`, whose definition is
/// `Def::Scalar(scalar)`.
pub(crate) unsafe fn unmarshal(
    realm: &dyn Runtime,
    value: &Value,
    shape: &'static Shape,
    scalar: ScalarType,
    dst: PtrUninit<'_>,
) -> Result<(), ErrorKind> {
    let mismatch = |expected: &'static str| ErrorKind::ShapeMismatch {
        shape,
        expected,
        found: realm.kind_of(value),
    };
    match (scalar, value) {
        (ScalarType::Unit, v) if v.is_nullish() => unsafe {
            dst.put(());
        },
        (ScalarType::Unit, _) => return Err(mismatch("null")),
        (ScalarType::Bool, Value::Bool(b)) => unsafe {
            dst.put(*b);
        },
        (ScalarType::Bool, _) => return Err(mismatch("a boolean")),
        (ScalarType::String, Value::String(s)) => unsafe {
            dst.put(String::from(&**s));
        },
        (ScalarType::String, _) => return Err(mismatch("a string")),
        (ScalarType::Char, Value::String(s)) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => unsafe {
                    dst.put(c);
                },
                _ => return Err(mismatch("a single-character string")),
            }
        }
        (ScalarType::Char, _) => return Err(mismatch("a single-character string")),
        (ScalarType::F32, Value::Number(n)) => unsafe {
            dst.put(*n as f32);
        },
        (ScalarType::F64, Value::Number(n)) => unsafe {
            dst.put(*n);
        },
        (ScalarType::F32 | ScalarType::F64, _) => return Err(mismatch("a number")),
        (ScalarType::U8, v) => narrow!(realm, shape, v, dst, u8),
        (ScalarType::U16, v) => narrow!(realm, shape, v, dst, u16),
        (ScalarType::U32, v) => narrow!(realm, shape, v, dst, u32),
        (ScalarType::U64, v) => narrow!(realm, shape, v, dst, u64),
        (ScalarType::U128, v) => narrow!(realm, shape, v, dst, u128),
        (ScalarType::USize, v) => narrow!(realm, shape, v, dst, usize),
        (ScalarType::I8, v) => narrow!(realm, shape, v, dst, i8),
        (ScalarType::I16, v) => narrow!(realm, shape, v, dst, i16),
        (ScalarType::I32, v) => narrow!(realm, shape, v, dst, i32),
        (ScalarType::I64, v) => narrow!(realm, shape, v, dst, i64),
        (ScalarType::I128, v) => narrow!(realm, shape, v, dst, i128),
        (ScalarType::ISize, v) => narrow!(realm, shape, v, dst, isize),
        (scalar, Value::String(s)) if scalar.is_textual() => {
            let parse = shape.vtable.parse.ok_or(ErrorKind::UnsupportedType {
                shape,
                reason: "textual scalar without a parse function",
            })?;
            unsafe { parse(s, dst) }.map_err(|_| mismatch("a valid address string"))?;
        }
        (scalar, _) if scalar.is_textual() => return Err(mismatch("a string")),
        _ => {
            return Err(ErrorKind::UnsupportedType {
                shape,
                reason: "no dynamic representation for this scalar",
            });
        }
    }
    Ok(())
}

/// Checks that a dynamic map key or set item has a native counterpart:
/// objects, `NaN` and fractional numbers do not.
pub(crate) fn check_key(realm: &dyn Runtime, shape: &'static Shape, key: &Value) -> Result<(), ErrorKind> {
    let valid = match key {
        Value::Object(_) | Value::Undefined => false,
        Value::Number(n) => n.is_finite() && n.fract() == 0.0,
        _ => true,
    };
    if valid {
        Ok(())
    } else {
        Err(ErrorKind::InvalidMapKey {
            shape,
            key: realm.inspect(key),
        })
    }
}
