use crate::{PtrConst, PtrMut, PtrUninit, Shape};

/// Fields for map types
#[derive(Clone, Copy, Debug)]
pub struct MapDef {
    /// vtable for interacting with the map
    pub vtable: &'static MapVTable,
    /// shape of the keys in the map
    pub k: &'static Shape,
    /// shape of the values in the map
    pub v: &'static Shape,
}

impl MapDef {
    /// Construct a `MapDef` from its vtable and key/value shapes.
    pub const fn new(vtable: &'static MapVTable, k: &'static Shape, v: &'static Shape) -> Self {
        Self { vtable, k, v }
    }

    /// Returns the shape of the keys of the map
    pub const fn k(&self) -> &'static Shape {
        self.k
    }

    /// Returns the shape of the values of the map
    pub const fn v(&self) -> &'static Shape {
        self.v
    }
}

/// Initialize a map in place with a given capacity
///
/// # Safety
///
/// The `map` parameter must point to uninitialized memory of sufficient size.
pub type MapInitInPlaceWithCapacityFn =
    for<'mem> unsafe fn(map: PtrUninit<'mem>, capacity: usize) -> PtrMut<'mem>;

/// Insert a key-value pair, moving both out of their locations. A previous
/// value under an equal key is dropped.
///
/// # Safety
///
/// `map` must be initialized; `key` and `value` must be initialized values
/// of the key and value shapes that the caller will not use again.
pub type MapInsertFn =
    for<'map, 'key, 'value> unsafe fn(map: PtrMut<'map>, key: PtrMut<'key>, value: PtrMut<'value>);

/// Get the number of entries in the map
///
/// # Safety
///
/// The `map` parameter must point to aligned, initialized memory of the correct type.
pub type MapLenFn = for<'map> unsafe fn(map: PtrConst<'map>) -> usize;

/// Virtual table for a `Map<K, V>`
#[derive(Clone, Copy, Debug)]
pub struct MapVTable {
    /// cf. [`MapInitInPlaceWithCapacityFn`]
    pub init_in_place_with_capacity: MapInitInPlaceWithCapacityFn,
    /// cf. [`MapInsertFn`]
    pub insert: MapInsertFn,
    /// cf. [`MapLenFn`]
    pub len: MapLenFn,
    /// Virtual table for map iterators
    pub iter_vtable: MapIterVTable,
}

/// Virtual table for an iterator over `(key, value)` pairs
#[derive(Clone, Copy, Debug)]
pub struct MapIterVTable {
    /// Allocate iterator state for the map at `map`
    pub init_with_value: for<'a> unsafe fn(map: PtrConst<'a>) -> PtrMut<'a>,
    /// Advance the iterator
    pub next: for<'a> unsafe fn(iter: PtrMut<'a>) -> Option<(PtrConst<'a>, PtrConst<'a>)>,
    /// Free the iterator state
    pub dealloc: for<'a> unsafe fn(iter: PtrMut<'a>),
}

/// Fields for set types
#[derive(Clone, Copy, Debug)]
pub struct SetDef {
    /// vtable for interacting with the set
    pub vtable: &'static SetVTable,
    /// shape of the items in the set
    pub t: &'static Shape,
}

impl SetDef {
    /// Construct a `SetDef` from its vtable and item shape.
    pub const fn new(vtable: &'static SetVTable, t: &'static Shape) -> Self {
        Self { vtable, t }
    }

    /// Returns the shape of the items in the set
    pub const fn t(&self) -> &'static Shape {
        self.t
    }
}

/// Insert an item, moving it out of `item`. Returns `false` if an equal
/// item was already present (the new one is dropped).
///
/// # Safety
///
/// `set` must be initialized; `item` must be an initialized value of the
/// item shape that the caller will not use again.
pub type SetInsertFn = for<'set, 'item> unsafe fn(set: PtrMut<'set>, item: PtrMut<'item>) -> bool;

/// Virtual table for a `Set<T>`
#[derive(Clone, Copy, Debug)]
pub struct SetVTable {
    /// Initialize a set in place with a given capacity
    pub init_in_place_with_capacity:
        for<'mem> unsafe fn(set: PtrUninit<'mem>, capacity: usize) -> PtrMut<'mem>,
    /// cf. [`SetInsertFn`]
    pub insert: SetInsertFn,
    /// Get the number of items in the set
    pub len: for<'set> unsafe fn(set: PtrConst<'set>) -> usize,
    /// Virtual table for set iterators
    pub iter_vtable: SetIterVTable,
}

/// Virtual table for an iterator over set items
#[derive(Clone, Copy, Debug)]
pub struct SetIterVTable {
    /// Allocate iterator state for the set at `set`
    pub init_with_value: for<'a> unsafe fn(set: PtrConst<'a>) -> PtrMut<'a>,
    /// Advance the iterator
    pub next: for<'a> unsafe fn(iter: PtrMut<'a>) -> Option<PtrConst<'a>>,
    /// Free the iterator state
    pub dealloc: for<'a> unsafe fn(iter: PtrMut<'a>),
}
