use tessera_core::OptionDef;

use crate::Peek;

/// Lets you read from an option
#[derive(Clone, Copy)]
pub struct PeekOption<'mem> {
    pub(crate) value: Peek<'mem>,
    pub(crate) def: OptionDef,
}

impl core::fmt::Debug for PeekOption<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeekOption")
            .field("shape", &self.value.shape)
            .field("is_some", &self.is_some())
            .finish()
    }
}

impl<'mem> PeekOption<'mem> {
    /// Whether the option holds a value
    #[inline]
    pub fn is_some(&self) -> bool {
        unsafe { (self.def.vtable.is_some)(self.value.data) }
    }

    /// The held value, if any
    pub fn value(&self) -> Option<Peek<'mem>> {
        unsafe {
            let inner = (self.def.vtable.get_value)(self.value.data)?;
            Some(Peek::unchecked_new(inner, self.def.t()))
        }
    }
}
