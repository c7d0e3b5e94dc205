use alloc::vec::Vec;
use core::ptr::NonNull;

use crate::{
    ArrayDef, Def, ListDef, ListVTable, PtrConst, Shape, Shaped, SliceDef, TypeParam, ValueVTable,
};

unsafe impl<T: Shaped> Shaped for Vec<T> {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Vec")
            .type_params(&const {
                [TypeParam {
                    name: "T",
                    shape: T::SHAPE,
                }]
            })
            .vtable(&const { ValueVTable::builder::<Self>().with_default().build() })
            .def(Def::List(ListDef::new(
                &const {
                    ListVTable {
                        init_in_place_with_capacity: |data, capacity| unsafe {
                            data.put(Self::with_capacity(capacity))
                        },
                        push: |list, item| unsafe {
                            let item = item.read::<T>();
                            list.as_mut::<Self>().push(item);
                        },
                        len: |list| unsafe { list.get::<Self>().len() },
                        get: |list, index| unsafe {
                            let vec = list.get::<Self>();
                            vec.get(index).map(PtrConst::from_ref)
                        },
                        as_ptr: Some(|list| unsafe {
                            let vec = list.get::<Self>();
                            PtrConst::new(NonNull::new_unchecked(vec.as_ptr() as *mut T))
                        }),
                    }
                },
                T::SHAPE,
            )))
            .build()
    };
}

unsafe impl<T: Shaped, const N: usize> Shaped for [T; N] {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("[T; N]")
            .type_params(&const {
                [TypeParam {
                    name: "T",
                    shape: T::SHAPE,
                }]
            })
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Array(ArrayDef { t: T::SHAPE, n: N }))
            .build()
    };
}

unsafe impl<T: Shaped> Shaped for [T] {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_unsized::<Self>()
            .type_identifier("[T]")
            .type_params(&const {
                [TypeParam {
                    name: "T",
                    shape: T::SHAPE,
                }]
            })
            .vtable(&ValueVTable::EMPTY)
            .def(Def::Slice(SliceDef { t: T::SHAPE }))
            .build()
    };
}
