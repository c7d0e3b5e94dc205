use crate::{PtrConst, PtrMut, PtrUninit, Shape};

/// Describes a smart pointer: a vtable to read through it and build it,
/// and the shape of the value it points to.
#[derive(Clone, Copy, Debug)]
pub struct SmartPointerDef {
    /// vtable for interacting with the pointer
    pub vtable: &'static SmartPointerVTable,

    /// shape of the pointee, if not opaque
    pub pointee: Option<&'static Shape>,

    /// Flags representing various characteristics of the pointer
    pub flags: PointerFlags,

    /// An optional field to identify the kind of pointer
    pub known: Option<KnownPointer>,
}

impl SmartPointerDef {
    /// Returns shape of the pointee, if not opaque
    pub const fn pointee(&self) -> Option<&'static Shape> {
        self.pointee
    }

    /// Whether several pointers may own the same pointee (`Rc`, `Arc`)
    pub const fn is_shared(&self) -> bool {
        self.flags.contains(PointerFlags::SHARED)
    }

    /// Whether the pointee lives inside the pointer itself (`RefCell`)
    pub const fn is_inline(&self) -> bool {
        self.flags.contains(PointerFlags::INLINE)
    }
}

bitflags::bitflags! {
    /// Flags to represent various characteristics of pointers
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PointerFlags: u8 {
        /// Clones alias one pointee (like `std::rc::Rc`)
        const SHARED = 1 << 0;
        /// Reference counts are atomic (like `std::sync::Arc`)
        const ATOMIC = 1 << 1;
        /// The pointee is stored inline (like `core::cell::RefCell`)
        const INLINE = 1 << 2;
    }
}

/// Known kinds of smart pointers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KnownPointer {
    /// `Box<T>`
    Box,
    /// `Rc<T>`
    Rc,
    /// `Arc<T>`
    Arc,
    /// `RefCell<T>`
    RefCell,
}

/// Borrows the pointee. Returns `None` if it cannot be read right now (a
/// `RefCell` that is mutably borrowed).
///
/// # Safety
///
/// `this` must point to an initialized pointer of the right shape.
pub type BorrowFn = for<'ptr> unsafe fn(this: PtrConst<'ptr>) -> Option<PtrConst<'ptr>>;

/// Builds a pointer around an owned pointee, moving it out of `value`.
///
/// # Safety
///
/// `this` must be uninitialized storage for the pointer; `value` must be an
/// initialized pointee that the caller will not use again.
pub type NewIntoFn =
    for<'ptr, 'value> unsafe fn(this: PtrUninit<'ptr>, value: PtrMut<'value>) -> PtrMut<'ptr>;

/// Allocates storage for a pointee that does not exist yet.
///
/// The allocation is owned by the caller, who must eventually hand it to
/// [`AssumeInitIntoFn`] or [`FreeUninitFn`].
pub type NewUninitFn = fn() -> PtrUninit<'static>;

/// Wraps storage returned by [`NewUninitFn`], once its pointee is
/// initialized, into a pointer. The allocation's ownership moves into
/// `this`.
///
/// # Safety
///
/// `pointee` must come from this pointer's [`NewUninitFn`] and hold an
/// initialized value; `this` must be uninitialized storage for the pointer.
pub type AssumeInitIntoFn =
    for<'ptr> unsafe fn(pointee: PtrUninit<'static>, this: PtrUninit<'ptr>) -> PtrMut<'ptr>;

/// Writes a new strong reference to an existing shared pointee into `this`.
/// The pointee may still be uninitialized, in which case the new pointer
/// must not be read until it is.
///
/// # Safety
///
/// `pointee` must be the pointee of a live allocation of this pointer kind
/// (including storage from [`NewUninitFn`]); `this` must be uninitialized
/// storage for the pointer.
pub type ShareIntoFn =
    for<'pointee, 'ptr> unsafe fn(pointee: PtrConst<'pointee>, this: PtrUninit<'ptr>) -> PtrMut<'ptr>;

/// Releases storage returned by [`NewUninitFn`] whose pointee was never
/// initialized. For shared pointers, the memory is only freed once every
/// reference created by [`ShareIntoFn`] is gone too.
///
/// # Safety
///
/// `pointee` must come from this pointer's [`NewUninitFn`], must not hold a
/// value, and must not be used again.
pub type FreeUninitFn = unsafe fn(pointee: PtrUninit<'static>);

/// Functions for interacting with a smart pointer
#[derive(Clone, Copy, Debug, Default)]
pub struct SmartPointerVTable {
    /// cf. [`BorrowFn`]
    pub borrow_fn: Option<BorrowFn>,
    /// cf. [`NewIntoFn`]
    pub new_into_fn: Option<NewIntoFn>,
    /// cf. [`NewUninitFn`]
    pub new_uninit_fn: Option<NewUninitFn>,
    /// cf. [`AssumeInitIntoFn`]
    pub assume_init_into_fn: Option<AssumeInitIntoFn>,
    /// cf. [`ShareIntoFn`]
    pub share_into_fn: Option<ShareIntoFn>,
    /// cf. [`FreeUninitFn`]
    pub free_uninit_fn: Option<FreeUninitFn>,
    /// Builds pointers to slices, cf. [`SliceBuilderVTable`]
    pub slice_builder_vtable: Option<&'static SliceBuilderVTable>,
}

impl SmartPointerVTable {
    /// A vtable with every slot empty
    pub const EMPTY: SmartPointerVTable = SmartPointerVTable {
        borrow_fn: None,
        new_into_fn: None,
        new_uninit_fn: None,
        assume_init_into_fn: None,
        share_into_fn: None,
        free_uninit_fn: None,
        slice_builder_vtable: None,
    };
}

/// Functions for building a pointer to `[T]` one item at a time
///
/// The builder is an opaque heap allocation; every builder created with
/// `new_fn` must be consumed by `convert_into_fn` or released by `free_fn`.
#[derive(Clone, Copy, Debug)]
pub struct SliceBuilderVTable {
    /// Create an empty builder
    pub new_fn: fn() -> PtrMut<'static>,
    /// Push an item, moving it out of `item`
    pub push_fn: for<'item> unsafe fn(builder: PtrMut<'static>, item: PtrMut<'item>),
    /// Consume the builder and write the finished pointer into `this`
    pub convert_into_fn: for<'ptr> unsafe fn(builder: PtrMut<'static>, this: PtrUninit<'ptr>) -> PtrMut<'ptr>,
    /// Drop the builder and the items pushed so far
    pub free_fn: unsafe fn(builder: PtrMut<'static>),
}
