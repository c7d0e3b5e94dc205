use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet, btree_map, btree_set};
use core::hash::{BuildHasher, Hash};
use core::ptr::NonNull;
use std::collections::{HashMap, HashSet, hash_map, hash_set};

use crate::{
    Def, MapDef, MapIterVTable, MapVTable, PtrConst, PtrMut, SetDef, SetIterVTable, SetVTable,
    Shape, Shaped, TypeParam, ValueVTable,
};

fn boxed_iter<I>(iter: I) -> PtrMut<'static> {
    PtrMut::new(unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(iter))) })
}

unsafe impl<K, V, S> Shaped for HashMap<K, V, S>
where
    K: Shaped + Eq + Hash,
    V: Shaped,
    S: BuildHasher + Default + 'static,
{
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("HashMap")
            .type_params(&const {
                [
                    TypeParam {
                        name: "K",
                        shape: K::SHAPE,
                    },
                    TypeParam {
                        name: "V",
                        shape: V::SHAPE,
                    },
                ]
            })
            .vtable(&const { ValueVTable::builder::<Self>().with_default().build() })
            .def(Def::Map(MapDef::new(
                &const {
                    MapVTable {
                        init_in_place_with_capacity: |map, capacity| unsafe {
                            map.put(Self::with_capacity_and_hasher(capacity, S::default()))
                        },
                        insert: |map, key, value| unsafe {
                            let key = key.read::<K>();
                            let value = value.read::<V>();
                            map.as_mut::<Self>().insert(key, value);
                        },
                        len: |map| unsafe { map.get::<Self>().len() },
                        iter_vtable: MapIterVTable {
                            init_with_value: |map| unsafe {
                                let iter: hash_map::Iter<'_, K, V> = map.get::<Self>().iter();
                                boxed_iter(iter)
                            },
                            next: |iter| unsafe {
                                let iter = iter.as_mut::<hash_map::Iter<'_, K, V>>();
                                iter.next()
                                    .map(|(k, v)| (PtrConst::from_ref(k), PtrConst::from_ref(v)))
                            },
                            dealloc: |iter| unsafe {
                                drop(Box::from_raw(
                                    iter.as_mut_byte_ptr() as *mut hash_map::Iter<'_, K, V>
                                ))
                            },
                        },
                    }
                },
                K::SHAPE,
                V::SHAPE,
            )))
            .build()
    };
}

unsafe impl<K, V> Shaped for BTreeMap<K, V>
where
    K: Shaped + Ord,
    V: Shaped,
{
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("BTreeMap")
            .type_params(&const {
                [
                    TypeParam {
                        name: "K",
                        shape: K::SHAPE,
                    },
                    TypeParam {
                        name: "V",
                        shape: V::SHAPE,
                    },
                ]
            })
            .vtable(&const { ValueVTable::builder::<Self>().with_default().build() })
            .def(Def::Map(MapDef::new(
                &const {
                    MapVTable {
                        init_in_place_with_capacity: |map, _capacity| unsafe { map.put(Self::new()) },
                        insert: |map, key, value| unsafe {
                            let key = key.read::<K>();
                            let value = value.read::<V>();
                            map.as_mut::<Self>().insert(key, value);
                        },
                        len: |map| unsafe { map.get::<Self>().len() },
                        iter_vtable: MapIterVTable {
                            init_with_value: |map| unsafe {
                                let iter: btree_map::Iter<'_, K, V> = map.get::<Self>().iter();
                                boxed_iter(iter)
                            },
                            next: |iter| unsafe {
                                let iter = iter.as_mut::<btree_map::Iter<'_, K, V>>();
                                iter.next()
                                    .map(|(k, v)| (PtrConst::from_ref(k), PtrConst::from_ref(v)))
                            },
                            dealloc: |iter| unsafe {
                                drop(Box::from_raw(
                                    iter.as_mut_byte_ptr() as *mut btree_map::Iter<'_, K, V>
                                ))
                            },
                        },
                    }
                },
                K::SHAPE,
                V::SHAPE,
            )))
            .build()
    };
}

unsafe impl<T, S> Shaped for HashSet<T, S>
where
    T: Shaped + Eq + Hash,
    S: BuildHasher + Default + 'static,
{
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("HashSet")
            .type_params(&const {
                [TypeParam {
                    name: "T",
                    shape: T::SHAPE,
                }]
            })
            .vtable(&const { ValueVTable::builder::<Self>().with_default().build() })
            .def(Def::Set(SetDef::new(
                &const {
                    SetVTable {
                        init_in_place_with_capacity: |set, capacity| unsafe {
                            set.put(Self::with_capacity_and_hasher(capacity, S::default()))
                        },
                        insert: |set, item| unsafe {
                            let item = item.read::<T>();
                            set.as_mut::<Self>().insert(item)
                        },
                        len: |set| unsafe { set.get::<Self>().len() },
                        iter_vtable: SetIterVTable {
                            init_with_value: |set| unsafe {
                                let iter: hash_set::Iter<'_, T> = set.get::<Self>().iter();
                                boxed_iter(iter)
                            },
                            next: |iter| unsafe {
                                let iter = iter.as_mut::<hash_set::Iter<'_, T>>();
                                iter.next().map(PtrConst::from_ref)
                            },
                            dealloc: |iter| unsafe {
                                drop(Box::from_raw(
                                    iter.as_mut_byte_ptr() as *mut hash_set::Iter<'_, T>
                                ))
                            },
                        },
                    }
                },
                T::SHAPE,
            )))
            .build()
    };
}

unsafe impl<T> Shaped for BTreeSet<T>
where
    T: Shaped + Ord,
{
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("BTreeSet")
            .type_params(&const {
                [TypeParam {
                    name: "T",
                    shape: T::SHAPE,
                }]
            })
            .vtable(&const { ValueVTable::builder::<Self>().with_default().build() })
            .def(Def::Set(SetDef::new(
                &const {
                    SetVTable {
                        init_in_place_with_capacity: |set, _capacity| unsafe { set.put(Self::new()) },
                        insert: |set, item| unsafe {
                            let item = item.read::<T>();
                            set.as_mut::<Self>().insert(item)
                        },
                        len: |set| unsafe { set.get::<Self>().len() },
                        iter_vtable: SetIterVTable {
                            init_with_value: |set| unsafe {
                                let iter: btree_set::Iter<'_, T> = set.get::<Self>().iter();
                                boxed_iter(iter)
                            },
                            next: |iter| unsafe {
                                let iter = iter.as_mut::<btree_set::Iter<'_, T>>();
                                iter.next().map(PtrConst::from_ref)
                            },
                            dealloc: |iter| unsafe {
                                drop(Box::from_raw(
                                    iter.as_mut_byte_ptr() as *mut btree_set::Iter<'_, T>
                                ))
                            },
                        },
                    }
                },
                T::SHAPE,
            )))
            .build()
    };
}
