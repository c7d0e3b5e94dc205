use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::mem::MaybeUninit;
use core::ptr::NonNull;

use crate::{
    Def, KnownPointer, PointerFlags, PtrConst, PtrMut, PtrUninit, Shape, Shaped,
    SliceBuilderVTable, SmartPointerDef, SmartPointerVTable, TypeParam, ValueVTable,
};

/// Slice builder shared by every `P<[T]>` that can be built from a `Vec<T>`.
const fn slice_builder<T, P: From<Vec<T>>>() -> SliceBuilderVTable {
    fn new_fn<T>() -> PtrMut<'static> {
        let raw = Box::into_raw(Box::new(Vec::<T>::new()));
        PtrMut::new(unsafe { NonNull::new_unchecked(raw) })
    }

    unsafe fn push_fn<T>(builder: PtrMut<'static>, item: PtrMut<'_>) {
        unsafe {
            let value = item.read::<T>();
            builder.as_mut::<Vec<T>>().push(value);
        }
    }

    unsafe fn convert_into_fn<'ptr, T, P: From<Vec<T>>>(
        builder: PtrMut<'static>,
        this: PtrUninit<'ptr>,
    ) -> PtrMut<'ptr> {
        unsafe {
            let vec = Box::from_raw(builder.as_mut_byte_ptr() as *mut Vec<T>);
            this.put(P::from(*vec))
        }
    }

    unsafe fn free_fn<T>(builder: PtrMut<'static>) {
        unsafe { drop(Box::from_raw(builder.as_mut_byte_ptr() as *mut Vec<T>)) }
    }

    SliceBuilderVTable {
        new_fn: new_fn::<T>,
        push_fn: push_fn::<T>,
        convert_into_fn: convert_into_fn::<T, P>,
        free_fn: free_fn::<T>,
    }
}

unsafe impl<T: Shaped> Shaped for Box<T> {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Box")
            .type_params(&const {
                [TypeParam {
                    name: "T",
                    shape: T::SHAPE,
                }]
            })
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::SmartPointer(SmartPointerDef {
                vtable: &const {
                    SmartPointerVTable {
                        borrow_fn: Some(|this| unsafe {
                            Some(PtrConst::from_ref(&**this.get::<Box<T>>()))
                        }),
                        new_into_fn: Some(|this, value| unsafe {
                            this.put(Box::new(value.read::<T>()))
                        }),
                        new_uninit_fn: Some(|| {
                            let raw = Box::into_raw(Box::<T>::new_uninit());
                            PtrUninit::new(unsafe { NonNull::new_unchecked(raw) })
                        }),
                        assume_init_into_fn: Some(|pointee, this| unsafe {
                            this.put(Box::from_raw(pointee.as_mut_byte_ptr() as *mut T))
                        }),
                        share_into_fn: None,
                        free_uninit_fn: Some(|pointee| unsafe {
                            drop(Box::from_raw(
                                pointee.as_mut_byte_ptr() as *mut MaybeUninit<T>
                            ))
                        }),
                        slice_builder_vtable: None,
                    }
                },
                pointee: Some(T::SHAPE),
                flags: PointerFlags::empty(),
                known: Some(KnownPointer::Box),
            }))
            .inner(|| T::SHAPE)
            .build()
    };
}

unsafe impl<T: Shaped> Shaped for Box<[T]> {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Box")
            .type_params(&const {
                [TypeParam {
                    name: "T",
                    shape: <[T]>::SHAPE,
                }]
            })
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::SmartPointer(SmartPointerDef {
                vtable: &const {
                    SmartPointerVTable {
                        borrow_fn: Some(|this| unsafe {
                            Some(PtrConst::from_slice(&**this.get::<Box<[T]>>()))
                        }),
                        slice_builder_vtable: Some(&const { slice_builder::<T, Box<[T]>>() }),
                        ..SmartPointerVTable::EMPTY
                    }
                },
                pointee: Some(<[T]>::SHAPE),
                flags: PointerFlags::empty(),
                known: Some(KnownPointer::Box),
            }))
            .build()
    };
}

macro_rules! impl_shared_pointer {
    ($ptr:ident, $name:literal, $known:ident, $flags:expr) => {
        unsafe impl<T: Shaped> Shaped for $ptr<T> {
            const SHAPE: &'static Shape = &const {
                Shape::builder_for_sized::<Self>()
                    .type_identifier($name)
                    .type_params(&const {
                        [TypeParam {
                            name: "T",
                            shape: T::SHAPE,
                        }]
                    })
                    .vtable(&const { ValueVTable::builder::<Self>().with_clone().build() })
                    .def(Def::SmartPointer(SmartPointerDef {
                        vtable: &const {
                            SmartPointerVTable {
                                borrow_fn: Some(|this| unsafe {
                                    Some(PtrConst::from_ref(&**this.get::<$ptr<T>>()))
                                }),
                                new_into_fn: Some(|this, value| unsafe {
                                    this.put($ptr::new(value.read::<T>()))
                                }),
                                new_uninit_fn: Some(|| {
                                    let raw = $ptr::into_raw($ptr::<T>::new_uninit());
                                    PtrUninit::new(unsafe {
                                        NonNull::new_unchecked(raw as *mut MaybeUninit<T>)
                                    })
                                }),
                                assume_init_into_fn: Some(|pointee, this| unsafe {
                                    this.put($ptr::from_raw(pointee.as_byte_ptr() as *const T))
                                }),
                                share_into_fn: Some(|pointee, this| unsafe {
                                    let raw = pointee.as_byte_ptr() as *const T;
                                    $ptr::increment_strong_count(raw);
                                    this.put($ptr::from_raw(raw))
                                }),
                                free_uninit_fn: Some(|pointee| unsafe {
                                    drop($ptr::from_raw(
                                        pointee.as_byte_ptr() as *const MaybeUninit<T>
                                    ))
                                }),
                                slice_builder_vtable: None,
                            }
                        },
                        pointee: Some(T::SHAPE),
                        flags: $flags,
                        known: Some(KnownPointer::$known),
                    }))
                    .inner(|| T::SHAPE)
                    .build()
            };
        }

        unsafe impl<T: Shaped> Shaped for $ptr<[T]> {
            const SHAPE: &'static Shape = &const {
                Shape::builder_for_sized::<Self>()
                    .type_identifier($name)
                    .type_params(&const {
                        [TypeParam {
                            name: "T",
                            shape: <[T]>::SHAPE,
                        }]
                    })
                    .vtable(&const { ValueVTable::builder::<Self>().with_clone().build() })
                    .def(Def::SmartPointer(SmartPointerDef {
                        vtable: &const {
                            SmartPointerVTable {
                                borrow_fn: Some(|this| unsafe {
                                    Some(PtrConst::from_slice(&**this.get::<$ptr<[T]>>()))
                                }),
                                share_into_fn: Some(|pointee, this| unsafe {
                                    let raw = core::ptr::slice_from_raw_parts(
                                        pointee.as_byte_ptr() as *const T,
                                        pointee.len(),
                                    );
                                    $ptr::increment_strong_count(raw);
                                    this.put($ptr::from_raw(raw))
                                }),
                                slice_builder_vtable: Some(&const { slice_builder::<T, $ptr<[T]>>() }),
                                ..SmartPointerVTable::EMPTY
                            }
                        },
                        pointee: Some(<[T]>::SHAPE),
                        flags: $flags,
                        known: Some(KnownPointer::$known),
                    }))
                    .build()
            };
        }
    };
}

impl_shared_pointer!(Rc, "Rc", Rc, PointerFlags::SHARED);
impl_shared_pointer!(
    Arc,
    "Arc",
    Arc,
    PointerFlags::SHARED.union(PointerFlags::ATOMIC)
);

unsafe impl<T: Shaped> Shaped for RefCell<T> {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("RefCell")
            .type_params(&const {
                [TypeParam {
                    name: "T",
                    shape: T::SHAPE,
                }]
            })
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::SmartPointer(SmartPointerDef {
                vtable: &const {
                    SmartPointerVTable {
                        // A mutable borrow may be live; refuse to read through it.
                        borrow_fn: Some(|this| unsafe {
                            let cell = this.get::<RefCell<T>>();
                            cell.try_borrow_unguarded().ok().map(PtrConst::from_ref)
                        }),
                        new_into_fn: Some(|this, value| unsafe {
                            this.put(RefCell::new(value.read::<T>()))
                        }),
                        ..SmartPointerVTable::EMPTY
                    }
                },
                pointee: Some(T::SHAPE),
                flags: PointerFlags::INLINE,
                known: Some(KnownPointer::RefCell),
            }))
            .inner(|| T::SHAPE)
            .build()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer_def(shape: &'static Shape) -> SmartPointerDef {
        match shape.def {
            Def::SmartPointer(def) => def,
            _ => panic!("{shape} is not a smart pointer"),
        }
    }

    #[test]
    fn reserve_share_then_finish_an_rc() {
        let def = pointer_def(Rc::<String>::SHAPE);
        let vt = def.vtable;
        let pointee = (vt.new_uninit_fn.unwrap())();

        let mut early = MaybeUninit::<Rc<String>>::uninit();
        let mut finished = MaybeUninit::<Rc<String>>::uninit();
        unsafe {
            // a back-reference taken before the pointee exists
            (vt.share_into_fn.unwrap())(
                PtrConst::from_raw(pointee.as_byte_ptr()),
                PtrUninit::new(NonNull::from(&mut early).cast::<Rc<String>>()),
            );
            pointee.put(String::from("shared"));
            (vt.assume_init_into_fn.unwrap())(
                pointee,
                PtrUninit::new(NonNull::from(&mut finished).cast::<Rc<String>>()),
            );
            let early = early.assume_init();
            let finished = finished.assume_init();
            assert!(Rc::ptr_eq(&early, &finished));
            assert_eq!(Rc::strong_count(&finished), 2);
            assert_eq!(*early, "shared");
        }
    }

    #[test]
    fn aborted_reservation_is_released() {
        let def = pointer_def(Arc::<Vec<u8>>::SHAPE);
        let vt = def.vtable;
        assert!(def.is_shared());
        let pointee = (vt.new_uninit_fn.unwrap())();
        unsafe { (vt.free_uninit_fn.unwrap())(pointee) };
    }

    #[test]
    fn slice_builder_makes_an_rc_slice() {
        let def = pointer_def(Rc::<[u32]>::SHAPE);
        let builder_vt = def.vtable.slice_builder_vtable.unwrap();
        let builder = (builder_vt.new_fn)();
        for n in [1u32, 2, 3] {
            let mut item = MaybeUninit::new(n);
            unsafe { (builder_vt.push_fn)(builder, PtrMut::new(NonNull::from(&mut item).cast::<u32>())) };
        }
        let mut out = MaybeUninit::<Rc<[u32]>>::uninit();
        unsafe {
            (builder_vt.convert_into_fn)(builder, PtrUninit::new(NonNull::from(&mut out).cast::<Rc<[u32]>>()));
            let rc = out.assume_init();
            assert_eq!(&*rc, &[1, 2, 3]);

            let borrowed = (def.vtable.borrow_fn.unwrap())(PtrConst::from_ref(&rc)).unwrap();
            assert_eq!(borrowed.len(), 3);
        }
    }

    #[test]
    fn refcell_refuses_to_borrow_while_mutably_borrowed() {
        let def = pointer_def(RefCell::<u8>::SHAPE);
        assert!(def.is_inline());
        let cell = RefCell::new(9u8);
        let borrow = def.vtable.borrow_fn.unwrap();
        unsafe {
            assert_eq!(*borrow(PtrConst::from_ref(&cell)).unwrap().get::<u8>(), 9);
            let _guard = cell.borrow_mut();
            assert!(borrow(PtrConst::from_ref(&cell)).is_none());
        }
    }
}
