use crate::{Def, OptionDef, OptionVTable, PtrConst, Shape, Shaped, TypeParam, ValueVTable};

unsafe impl<T: Shaped> Shaped for Option<T> {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Option")
            .type_params(&const {
                [TypeParam {
                    name: "T",
                    shape: T::SHAPE,
                }]
            })
            .vtable(&const { ValueVTable::builder::<Self>().with_default().build() })
            .def(Def::Option(OptionDef {
                vtable: &const {
                    OptionVTable {
                        is_some: |option| unsafe { option.get::<Self>().is_some() },
                        get_value: |option| unsafe {
                            option.get::<Self>().as_ref().map(PtrConst::from_ref)
                        },
                        init_some: |option, value| unsafe { option.put(Some(value.read::<T>())) },
                        init_none: |option| unsafe { option.put(<Option<T>>::None) },
                    }
                },
                t: T::SHAPE,
            }))
            .inner(|| T::SHAPE)
            .build()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_through_the_option() {
        let Def::Option(def) = Option::<u32>::SHAPE.def else {
            panic!("expected an option")
        };
        let some = Some(5u32);
        let none = None::<u32>;
        unsafe {
            assert!((def.vtable.is_some)(PtrConst::from_ref(&some)));
            assert!(!(def.vtable.is_some)(PtrConst::from_ref(&none)));
            let inner = (def.vtable.get_value)(PtrConst::from_ref(&some)).unwrap();
            assert_eq!(*inner.get::<u32>(), 5);
        }
        assert_eq!(Option::<String>::SHAPE.to_string(), "Option<String>");
    }
}
