use tessera_core::{Field, StructDef, StructKind};

use crate::Peek;

/// Lets you read from a struct, tuple struct or tuple
#[derive(Clone, Copy)]
pub struct PeekStruct<'mem> {
    pub(crate) value: Peek<'mem>,
    pub(crate) def: StructDef,
}

impl core::fmt::Debug for PeekStruct<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeekStruct")
            .field("shape", &self.value.shape)
            .finish_non_exhaustive()
    }
}

impl<'mem> PeekStruct<'mem> {
    /// The struct definition
    #[inline]
    pub fn def(&self) -> &StructDef {
        &self.def
    }

    /// The struct as a plain value
    #[inline]
    pub fn value(&self) -> Peek<'mem> {
        self.value
    }

    /// What sort of struct this is
    #[inline]
    pub fn kind(&self) -> StructKind {
        self.def.kind
    }

    /// Number of fields
    #[inline]
    pub fn field_count(&self) -> usize {
        self.def.fields.len()
    }

    /// The field at `index`, in declaration order
    pub fn field(&self, index: usize) -> Option<Peek<'mem>> {
        let field = self.def.fields.get(index)?;
        Some(project(self.value, field))
    }

    /// The field called `name`
    pub fn field_by_name(&self, name: &str) -> Option<Peek<'mem>> {
        let field = self.def.field(name)?;
        Some(project(self.value, field))
    }

    /// All fields with their values, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&'static Field, Peek<'mem>)> + use<'mem> {
        let value = self.value;
        self.def
            .fields
            .iter()
            .map(move |field| (field, project(value, field)))
    }
}

/// Projects `field` out of a struct or enum payload starting at `base`
pub(crate) fn project<'mem>(base: Peek<'mem>, field: &'static Field) -> Peek<'mem> {
    unsafe { Peek::unchecked_new(base.data.field(field.offset), field.shape()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{Def, Shape, Shaped, ValueVTable, field};

    #[allow(dead_code)]
    struct Session {
        user: String,
        token: Option<String>,
        retries: u8,
    }

    unsafe impl Shaped for Session {
        const SHAPE: &'static Shape = &const {
            Shape::builder_for_sized::<Self>()
                .type_identifier("Session")
                .vtable(&const { ValueVTable::builder::<Self>().build() })
                .def(Def::Struct(StructDef::new(
                    StructKind::Struct,
                    &const {
                        [
                            field!(Session, user: String),
                            field!(Session, token: Option<String>),
                            field!(Session, retries: u8),
                        ]
                    },
                )))
                .build()
        };
    }

    #[test]
    fn fields_project_at_their_offsets() {
        let session = Session {
            user: "ada".into(),
            token: None,
            retries: 3,
        };
        let peek = Peek::new(&session).into_struct().unwrap();
        let names: Vec<_> = peek.fields().map(|(f, _)| f.name).collect();
        assert_eq!(names, ["user", "token", "retries"]);
        assert_eq!(
            peek.field_by_name("user").unwrap().get::<String>().unwrap(),
            "ada"
        );
        assert_eq!(*peek.field(2).unwrap().get::<u8>().unwrap(), 3);
        assert!(!peek.field(1).unwrap().into_option().unwrap().is_some());
        assert!(peek.field(3).is_none());
    }
}
