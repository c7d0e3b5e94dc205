use tessera_core::{PtrMut, SetDef};

use crate::Peek;

/// Iterator over the items of a [`PeekSet`]
pub struct PeekSetIter<'mem> {
    def: SetDef,
    iter: PtrMut<'mem>,
}

impl<'mem> Iterator for PeekSetIter<'mem> {
    type Item = Peek<'mem>;

    fn next(&mut self) -> Option<Self::Item> {
        unsafe {
            let item = (self.def.vtable.iter_vtable.next)(self.iter)?;
            Some(Peek::unchecked_new(item, self.def.t()))
        }
    }
}

impl Drop for PeekSetIter<'_> {
    fn drop(&mut self) {
        unsafe { (self.def.vtable.iter_vtable.dealloc)(self.iter) }
    }
}

/// Lets you read from a set
#[derive(Clone, Copy)]
pub struct PeekSet<'mem> {
    pub(crate) value: Peek<'mem>,
    pub(crate) def: SetDef,
}

impl core::fmt::Debug for PeekSet<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeekSet")
            .field("shape", &self.value.shape)
            .finish_non_exhaustive()
    }
}

impl<'mem> PeekSet<'mem> {
    /// Number of items
    pub fn len(&self) -> usize {
        unsafe { (self.def.vtable.len)(self.value.data) }
    }

    /// Whether the set is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items in the set's own iteration order
    pub fn iter(&self) -> PeekSetIter<'mem> {
        let iter = unsafe { (self.def.vtable.iter_vtable.init_with_value)(self.value.data) };
        PeekSetIter {
            def: self.def,
            iter,
        }
    }
}
