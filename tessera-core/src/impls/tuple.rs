use crate::{Def, Field, Shape, Shaped, StructDef, StructKind, TypeParam, ValueVTable};

macro_rules! impl_tuple {
    ($($ty:ident . $idx:tt),+) => {
        unsafe impl<$($ty: Shaped),+> Shaped for ($($ty,)+) {
            const SHAPE: &'static Shape = &const {
                Shape::builder_for_sized::<Self>()
                    .type_identifier("(…)")
                    .type_params(&const {
                        [$(TypeParam {
                            name: stringify!($ty),
                            shape: $ty::SHAPE,
                        }),+]
                    })
                    .vtable(&const { ValueVTable::builder::<Self>().build() })
                    .def(Def::Struct(StructDef::new(
                        StructKind::Tuple,
                        &const {
                            [$(Field {
                                name: stringify!($idx),
                                shape: || $ty::SHAPE,
                                offset: core::mem::offset_of!(Self, $idx),
                                attributes: &[],
                                doc: &[],
                            }),+]
                        },
                    )))
                    .build()
            };
        }
    };
}

impl_tuple!(A.0, B.1);
impl_tuple!(A.0, B.1, C.2);
impl_tuple!(A.0, B.1, C.2, D.3);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_fields_are_positional() {
        let Def::Struct(sd) = <(u8, String, bool)>::SHAPE.def else {
            panic!("expected a struct")
        };
        assert!(sd.is_positional());
        let names: Vec<_> = sd.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["0", "1", "2"]);
        assert!(sd.fields[1].shape().is_type::<String>());
        assert_eq!(<(u8, String, bool)>::SHAPE.to_string(), "(u8, String, bool)");
    }
}
