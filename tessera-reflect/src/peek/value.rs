use core::fmt;
use core::ptr::NonNull;

use tessera_core::{Def, DefKind, PtrConst, ScalarType, Shape, Shaped};

use crate::{
    PeekEnum, PeekListLike, PeekMap, PeekOption, PeekSet, PeekSmartPointer, PeekStruct,
    ReflectError,
};

/// Identifies a value by where it lives and what type it is.
///
/// A struct and its first field share an address, so the type is part of
/// the key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId {
    pub(crate) shape: &'static Shape,
    pub(crate) ptr: *const u8,
}

impl ValueId {
    /// The address of the value
    #[inline]
    pub fn addr(&self) -> usize {
        self.ptr as usize
    }

    /// The shape of the value
    #[inline]
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.shape, self.ptr)
    }
}

impl fmt::Debug for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A read-only view into a value with runtime type information.
///
/// If the value is a struct, you can read its fields; if it's an enum, you
/// can find the active variant; if it's a scalar, you can get it back as a
/// concrete type.
#[derive(Clone, Copy)]
pub struct Peek<'mem> {
    pub(crate) data: PtrConst<'mem>,
    pub(crate) shape: &'static Shape,
}

impl<'mem> Peek<'mem> {
    /// Returns a read-only view over a `T` value.
    pub fn new<T: Shaped>(t: &'mem T) -> Self {
        Self {
            data: PtrConst::new(NonNull::from(t)),
            shape: T::SHAPE,
        }
    }

    /// Returns a read-only view over a value given its shape, trusting you
    /// that those two match.
    ///
    /// # Safety
    ///
    /// `data` must point to an initialized value of `shape`, valid for `'mem`.
    #[inline]
    pub unsafe fn unchecked_new(data: PtrConst<'mem>, shape: &'static Shape) -> Self {
        Self { data, shape }
    }

    /// The underlying pointer
    #[inline]
    pub fn data(&self) -> PtrConst<'mem> {
        self.data
    }

    /// The shape of the value
    #[inline]
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    /// Address and type of the value
    #[inline]
    pub fn id(&self) -> ValueId {
        ValueId {
            shape: self.shape,
            ptr: self.data.as_byte_ptr(),
        }
    }

    /// Gets the value as a `T`, if its shape is `T`'s.
    pub fn get<T: Shaped>(&self) -> Result<&'mem T, ReflectError> {
        if self.shape.id != T::SHAPE.id {
            return Err(ReflectError::WrongShape {
                expected: T::SHAPE,
                actual: self.shape,
            });
        }
        Ok(unsafe { self.data.get::<T>() })
    }

    /// The scalar type, if this is a scalar
    #[inline]
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self.shape.def {
            Def::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    fn was_not_a(&self, expected: DefKind) -> ReflectError {
        ReflectError::WasNotA {
            expected,
            actual: self.shape,
        }
    }

    /// View as a struct, tuple struct or tuple
    pub fn into_struct(self) -> Result<PeekStruct<'mem>, ReflectError> {
        match self.shape.def {
            Def::Struct(def) => Ok(PeekStruct { value: self, def }),
            _ => Err(self.was_not_a(DefKind::Struct)),
        }
    }

    /// View as an enum
    pub fn into_enum(self) -> Result<PeekEnum<'mem>, ReflectError> {
        match self.shape.def {
            Def::Enum(def) => Ok(PeekEnum { value: self, def }),
            _ => Err(self.was_not_a(DefKind::Enum)),
        }
    }

    /// View as a list, array or slice
    pub fn into_list_like(self) -> Result<PeekListLike<'mem>, ReflectError> {
        PeekListLike::new(self).ok_or_else(|| self.was_not_a(DefKind::List))
    }

    /// View as a map
    pub fn into_map(self) -> Result<PeekMap<'mem>, ReflectError> {
        match self.shape.def {
            Def::Map(def) => Ok(PeekMap { value: self, def }),
            _ => Err(self.was_not_a(DefKind::Map)),
        }
    }

    /// View as a set
    pub fn into_set(self) -> Result<PeekSet<'mem>, ReflectError> {
        match self.shape.def {
            Def::Set(def) => Ok(PeekSet { value: self, def }),
            _ => Err(self.was_not_a(DefKind::Set)),
        }
    }

    /// View as an option
    pub fn into_option(self) -> Result<PeekOption<'mem>, ReflectError> {
        match self.shape.def {
            Def::Option(def) => Ok(PeekOption { value: self, def }),
            _ => Err(self.was_not_a(DefKind::Option)),
        }
    }

    /// View as a smart pointer
    pub fn into_smart_pointer(self) -> Result<PeekSmartPointer<'mem>, ReflectError> {
        match self.shape.def {
            Def::SmartPointer(def) => Ok(PeekSmartPointer { value: self, def }),
            _ => Err(self.was_not_a(DefKind::SmartPointer)),
        }
    }

    /// The value behind a transparent wrapper: its single field.
    pub fn innermost_field(self) -> Option<Peek<'mem>> {
        let Def::Struct(def) = self.shape.def else {
            return None;
        };
        let [field] = def.fields else {
            return None;
        };
        Some(unsafe { Peek::unchecked_new(self.data.field(field.offset), field.shape()) })
    }

    /// Runs the shape's invariant check. Shapes without one always pass.
    pub fn invariants_hold(&self) -> bool {
        match self.shape.vtable.invariants {
            Some(check) => unsafe { check(self.data) },
            None => true,
        }
    }
}

impl fmt::Display for Peek<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shape.vtable.display {
            Some(display) => unsafe { display(self.data, f) },
            None => write!(f, "⟨{}⟩", self.shape),
        }
    }
}

impl fmt::Debug for Peek<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shape.vtable.debug {
            Some(debug) => unsafe { debug(self.data, f) },
            None => write!(f, "⟨{}⟩", self.shape),
        }
    }
}
