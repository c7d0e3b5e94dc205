use crate::{PtrConst, PtrMut, PtrUninit, Shape};

/// Fields for list types
#[derive(Clone, Copy, Debug)]
pub struct ListDef {
    /// vtable for interacting with the list
    pub vtable: &'static ListVTable,
    /// shape of the items in the list
    pub t: &'static Shape,
}

impl ListDef {
    /// Construct a `ListDef` from its vtable and element shape.
    pub const fn new(vtable: &'static ListVTable, t: &'static Shape) -> Self {
        Self { vtable, t }
    }

    /// Returns the shape of the items in the list
    pub const fn t(&self) -> &'static Shape {
        self.t
    }
}

/// Initialize a list in place with a given capacity
///
/// # Safety
///
/// The `list` parameter must point to uninitialized memory of sufficient size.
pub type ListInitInPlaceWithCapacityFn =
    for<'mem> unsafe fn(list: PtrUninit<'mem>, capacity: usize) -> PtrMut<'mem>;

/// Push an item to the list, moving it out of `item`
///
/// # Safety
///
/// `list` must point to an initialized list of the right shape, `item` to an
/// initialized element that the caller will neither read nor drop again.
pub type ListPushFn = for<'list, 'item> unsafe fn(list: PtrMut<'list>, item: PtrMut<'item>);

/// Get the number of items in the list
///
/// # Safety
///
/// The `list` parameter must point to aligned, initialized memory of the correct type.
pub type ListLenFn = for<'list> unsafe fn(list: PtrConst<'list>) -> usize;

/// Get a pointer to the item at the given index, or `None` if out of bounds
///
/// # Safety
///
/// The `list` parameter must point to aligned, initialized memory of the correct type.
pub type ListGetFn = for<'list> unsafe fn(list: PtrConst<'list>, index: usize) -> Option<PtrConst<'list>>;

/// Get a pointer to the first element of contiguous list storage
///
/// # Safety
///
/// The `list` parameter must point to aligned, initialized memory of the correct type.
pub type ListAsPtrFn = for<'list> unsafe fn(list: PtrConst<'list>) -> PtrConst<'list>;

/// Virtual table for a list-like type (like `Vec<T>`)
#[derive(Clone, Copy, Debug)]
pub struct ListVTable {
    /// cf. [`ListInitInPlaceWithCapacityFn`]
    pub init_in_place_with_capacity: ListInitInPlaceWithCapacityFn,
    /// cf. [`ListPushFn`]
    pub push: ListPushFn,
    /// cf. [`ListLenFn`]
    pub len: ListLenFn,
    /// cf. [`ListGetFn`]
    pub get: ListGetFn,
    /// cf. [`ListAsPtrFn`]; only set for contiguous storage
    pub as_ptr: Option<ListAsPtrFn>,
}

/// Fields for fixed-size array types
#[derive(Clone, Copy, Debug)]
pub struct ArrayDef {
    /// shape of the items in the array
    pub t: &'static Shape,
    /// number of items
    pub n: usize,
}

impl ArrayDef {
    /// Returns the shape of the items in the array
    pub const fn t(&self) -> &'static Shape {
        self.t
    }
}

/// Fields for slice types. The length lives in the pointer to the slice.
#[derive(Clone, Copy, Debug)]
pub struct SliceDef {
    /// shape of the items in the slice
    pub t: &'static Shape,
}

impl SliceDef {
    /// Returns the shape of the items in the slice
    pub const fn t(&self) -> &'static Shape {
        self.t
    }
}
