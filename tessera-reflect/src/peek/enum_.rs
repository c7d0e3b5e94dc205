use tessera_core::{EnumDef, EnumRepr, Field, Variant};

use crate::{Peek, ReflectError, peek::struct_::project, read_discriminant};

/// Lets you read from an enum
#[derive(Clone, Copy)]
pub struct PeekEnum<'mem> {
    pub(crate) value: Peek<'mem>,
    pub(crate) def: EnumDef,
}

impl core::fmt::Debug for PeekEnum<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeekEnum")
            .field("shape", &self.value.shape)
            .finish_non_exhaustive()
    }
}

impl<'mem> PeekEnum<'mem> {
    /// The enum definition
    #[inline]
    pub fn def(&self) -> &EnumDef {
        &self.def
    }

    /// Representation of the discriminant
    #[inline]
    pub fn repr(&self) -> EnumRepr {
        self.def.repr
    }

    /// The discriminant stored in memory
    pub fn discriminant(&self) -> i64 {
        unsafe { read_discriminant(self.value.data, self.def.repr) }
    }

    /// The variant the value currently holds
    pub fn active_variant(&self) -> Result<&'static Variant, ReflectError> {
        let discriminant = self.discriminant();
        self.def
            .variant_with_discriminant(discriminant)
            .ok_or(ReflectError::NoSuchVariant {
                shape: self.value.shape,
                discriminant,
            })
    }

    /// Payload fields of the active variant, in declaration order
    pub fn fields(
        &self,
    ) -> Result<impl Iterator<Item = (&'static Field, Peek<'mem>)> + use<'mem>, ReflectError> {
        let variant = self.active_variant()?;
        let value = self.value;
        Ok(variant
            .data
            .fields
            .iter()
            .map(move |field| (field, project(value, field))))
    }
}
