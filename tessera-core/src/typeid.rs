use core::any::TypeId;
use core::fmt;
use core::hash::{Hash, Hasher};

/// [`TypeId`] equivalent that can be stored in const contexts.
///
/// [`TypeId::of`] is not callable in const, but a pointer to it is, so the
/// id is computed on first comparison instead.
#[derive(Clone, Copy)]
pub struct ConstTypeId {
    type_id_fn: fn() -> TypeId,
}

impl ConstTypeId {
    /// Create a [`ConstTypeId`] for a type.
    #[must_use]
    pub const fn of<T: ?Sized + 'static>() -> Self {
        ConstTypeId {
            type_id_fn: TypeId::of::<T>,
        }
    }

    /// Get the underlying [`TypeId`].
    #[inline]
    pub fn get(self) -> TypeId {
        (self.type_id_fn)()
    }
}

impl fmt::Debug for ConstTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.get(), f)
    }
}

impl PartialEq for ConstTypeId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl PartialEq<TypeId> for ConstTypeId {
    #[inline]
    fn eq(&self, other: &TypeId) -> bool {
        self.get() == *other
    }
}

impl Eq for ConstTypeId {}

impl Hash for ConstTypeId {
    // The same type may be reached through distinct function pointers
    // (one per codegen unit), so hash what they return.
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.get().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_for_same_type() {
        assert_eq!(ConstTypeId::of::<u32>(), ConstTypeId::of::<u32>());
        assert_ne!(ConstTypeId::of::<u32>(), ConstTypeId::of::<i32>());
        assert_eq!(ConstTypeId::of::<[u8]>(), TypeId::of::<[u8]>());
    }
}
