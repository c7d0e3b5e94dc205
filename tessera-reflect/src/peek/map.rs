use tessera_core::{MapDef, PtrMut};

use crate::Peek;

/// Iterator over the entries of a [`PeekMap`]
///
/// Owns the type-erased iterator state and releases it when dropped.
pub struct PeekMapIter<'mem> {
    def: MapDef,
    iter: PtrMut<'mem>,
}

impl<'mem> Iterator for PeekMapIter<'mem> {
    type Item = (Peek<'mem>, Peek<'mem>);

    fn next(&mut self) -> Option<Self::Item> {
        unsafe {
            let (key, value) = (self.def.vtable.iter_vtable.next)(self.iter)?;
            Some((
                Peek::unchecked_new(key, self.def.k()),
                Peek::unchecked_new(value, self.def.v()),
            ))
        }
    }
}

impl Drop for PeekMapIter<'_> {
    fn drop(&mut self) {
        unsafe { (self.def.vtable.iter_vtable.dealloc)(self.iter) }
    }
}

/// Lets you read from a map
#[derive(Clone, Copy)]
pub struct PeekMap<'mem> {
    pub(crate) value: Peek<'mem>,
    pub(crate) def: MapDef,
}

impl core::fmt::Debug for PeekMap<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeekMap")
            .field("shape", &self.value.shape)
            .finish_non_exhaustive()
    }
}

impl<'mem> PeekMap<'mem> {
    /// The map definition
    #[inline]
    pub fn def(&self) -> &MapDef {
        &self.def
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        unsafe { (self.def.vtable.len)(self.value.data) }
    }

    /// Whether the map has no entries
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in the map's own iteration order
    pub fn iter(&self) -> PeekMapIter<'mem> {
        let iter = unsafe { (self.def.vtable.iter_vtable.init_with_value)(self.value.data) };
        PeekMapIter {
            def: self.def,
            iter,
        }
    }
}
