use tessera_core::{KnownPointer, SmartPointerDef};

use crate::{Peek, ReflectError};

/// Lets you read through a smart pointer
#[derive(Clone, Copy)]
pub struct PeekSmartPointer<'mem> {
    pub(crate) value: Peek<'mem>,
    pub(crate) def: SmartPointerDef,
}

impl core::fmt::Debug for PeekSmartPointer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeekSmartPointer")
            .field("shape", &self.value.shape)
            .field("known", &self.def.known)
            .finish_non_exhaustive()
    }
}

impl<'mem> PeekSmartPointer<'mem> {
    /// The pointer definition
    #[inline]
    pub fn def(&self) -> &SmartPointerDef {
        &self.def
    }

    /// Which standard pointer this is, if any
    #[inline]
    pub fn known(&self) -> Option<KnownPointer> {
        self.def.known
    }

    /// Reads through the pointer.
    pub fn borrow_inner(&self) -> Result<Peek<'mem>, ReflectError> {
        let shape = self.value.shape;
        let (Some(borrow), Some(pointee)) = (self.def.vtable.borrow_fn, self.def.pointee) else {
            return Err(ReflectError::MissingVTableEntry {
                shape,
                entry: "borrow_fn",
            });
        };
        let inner =
            unsafe { borrow(self.value.data) }.ok_or(ReflectError::BorrowConflict { shape })?;
        Ok(unsafe { Peek::unchecked_new(inner, pointee) })
    }
}
