//! Opaque pointers
//!
//! Type-erased pointers used to read and write reflected values. A pointer
//! is either thin or carries the element count of the slice it points to.

use core::{fmt, marker::PhantomData, ptr::NonNull};

/// Data pointer plus slice length (zero for sized pointees).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct Ptr {
    ptr: NonNull<u8>,
    len: usize,
}

impl Ptr {
    #[inline]
    const fn thin(ptr: NonNull<u8>) -> Self {
        Self { ptr, len: 0 }
    }

    #[inline]
    const fn offset(self, offset: usize) -> Self {
        Self {
            ptr: unsafe { self.ptr.byte_add(offset) },
            len: 0,
        }
    }
}

impl fmt::Debug for Ptr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len == 0 {
            fmt::Debug::fmt(&self.ptr, f)
        } else {
            write!(f, "{:?}[..{}]", self.ptr, self.len)
        }
    }
}

/// A pointer to uninitialized memory, valid for writes of the shape it was
/// allocated for.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PtrUninit<'mem>(Ptr, PhantomData<&'mem mut ()>);

/// An immutable pointer to an initialized value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PtrConst<'mem>(Ptr, PhantomData<&'mem ()>);

/// A mutable pointer to an initialized value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PtrMut<'mem>(Ptr, PhantomData<&'mem mut ()>);

impl fmt::Debug for PtrUninit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PtrUninit({:?})", self.0)
    }
}

impl fmt::Debug for PtrConst<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PtrConst({:?})", self.0)
    }
}

impl fmt::Debug for PtrMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PtrMut({:?})", self.0)
    }
}

impl<'mem> PtrUninit<'mem> {
    /// Create a new opaque pointer from a typed pointer
    #[inline]
    pub const fn new<T>(ptr: NonNull<T>) -> Self {
        Self(Ptr::thin(ptr.cast()), PhantomData)
    }

    /// Create a new opaque pointer from a raw byte pointer
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null and valid for writes for `'mem`.
    #[inline]
    pub const unsafe fn from_raw(ptr: *mut u8) -> Self {
        Self(
            Ptr::thin(unsafe { NonNull::new_unchecked(ptr) }),
            PhantomData,
        )
    }

    /// A dangling, well-aligned pointer, the only valid location for a zero-sized value
    #[inline]
    pub const fn dangling<T>() -> Self {
        Self::new(NonNull::<T>::dangling())
    }

    /// Get the raw byte pointer
    #[inline]
    pub const fn as_mut_byte_ptr(self) -> *mut u8 {
        self.0.ptr.as_ptr()
    }

    /// Get the raw byte pointer as a const pointer
    #[inline]
    pub const fn as_byte_ptr(self) -> *const u8 {
        self.0.ptr.as_ptr()
    }

    /// Write a value to this location and convert to an initialized pointer
    ///
    /// # Safety
    ///
    /// The pointer must be properly aligned for `T` and point to allocated
    /// memory that can be safely written to.
    #[inline]
    pub unsafe fn put<T>(self, value: T) -> PtrMut<'mem> {
        unsafe {
            core::ptr::write(self.as_mut_byte_ptr() as *mut T, value);
            self.assume_init()
        }
    }

    /// Assumes the pointer is initialized and returns a [`PtrMut`]
    ///
    /// # Safety
    ///
    /// The pointer must actually be pointing to initialized memory of the
    /// correct type.
    #[inline]
    pub const unsafe fn assume_init(self) -> PtrMut<'mem> {
        PtrMut(self.0, PhantomData)
    }

    /// Returns a pointer to the field at `offset`
    ///
    /// # Safety
    ///
    /// `offset` must stay within the allocation this pointer refers to.
    #[inline]
    pub const unsafe fn field_uninit_at(self, offset: usize) -> PtrUninit<'mem> {
        PtrUninit(self.0.offset(offset), PhantomData)
    }

    /// Move `size` bytes from `src` into this location.
    ///
    /// # Safety
    ///
    /// `src` must hold an initialized value of the same shape, `size` must
    /// be that shape's size, and the source must not be used (or dropped)
    /// afterwards.
    #[inline]
    pub unsafe fn copy_from(self, src: PtrConst<'_>, size: usize) -> PtrMut<'mem> {
        unsafe {
            core::ptr::copy_nonoverlapping(src.as_byte_ptr(), self.as_mut_byte_ptr(), size);
            self.assume_init()
        }
    }
}

impl<'mem> PtrConst<'mem> {
    /// Create a new opaque pointer from a typed pointer
    #[inline]
    pub const fn new<T>(ptr: NonNull<T>) -> Self {
        Self(Ptr::thin(ptr.cast()), PhantomData)
    }

    /// Create a new opaque pointer from a reference
    #[inline]
    pub const fn from_ref<T>(r: &'mem T) -> Self {
        Self::new(unsafe { NonNull::new_unchecked(r as *const T as *mut T) })
    }

    /// Create a pointer to the first element of a slice, remembering its length
    #[inline]
    pub const fn from_slice<T>(slice: &'mem [T]) -> Self {
        let ptr = unsafe { NonNull::new_unchecked(slice.as_ptr() as *mut u8) };
        Self(
            Ptr {
                ptr,
                len: slice.len(),
            },
            PhantomData,
        )
    }

    /// Create a new opaque pointer from a raw byte pointer
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null and point to a value valid for `'mem`.
    #[inline]
    pub const unsafe fn from_raw(ptr: *const u8) -> Self {
        Self(
            Ptr::thin(unsafe { NonNull::new_unchecked(ptr as *mut u8) }),
            PhantomData,
        )
    }

    /// Get the raw byte pointer
    #[inline]
    pub const fn as_byte_ptr(self) -> *const u8 {
        self.0.ptr.as_ptr()
    }

    /// The element count when this points to a slice
    #[inline]
    pub const fn len(self) -> usize {
        self.0.len
    }

    /// Whether this points to an empty slice (or to a sized value)
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0.len == 0
    }

    /// Borrows the underlying value as `T`
    ///
    /// # Safety
    ///
    /// `T` must be the actual type of the value pointed to.
    #[inline]
    pub const unsafe fn get<T>(self) -> &'mem T {
        unsafe { &*(self.as_byte_ptr() as *const T) }
    }

    /// Borrows the underlying slice as `[T]`
    ///
    /// # Safety
    ///
    /// The pointer must have been created from a `[T]`.
    #[inline]
    pub const unsafe fn get_slice<T>(self) -> &'mem [T] {
        unsafe { core::slice::from_raw_parts(self.as_byte_ptr() as *const T, self.0.len) }
    }

    /// Returns a pointer to the field at `offset`
    ///
    /// # Safety
    ///
    /// `offset` must stay within the value this pointer refers to.
    #[inline]
    pub const unsafe fn field(self, offset: usize) -> PtrConst<'mem> {
        PtrConst(self.0.offset(offset), PhantomData)
    }
}

impl<'mem> PtrMut<'mem> {
    /// Create a new opaque pointer from a typed pointer
    #[inline]
    pub const fn new<T>(ptr: NonNull<T>) -> Self {
        Self(Ptr::thin(ptr.cast()), PhantomData)
    }

    /// Create a new opaque pointer from a mutable reference
    #[inline]
    pub const fn from_mut<T>(r: &'mem mut T) -> Self {
        Self::new(unsafe { NonNull::new_unchecked(r as *mut T) })
    }

    /// Get the raw byte pointer
    #[inline]
    pub const fn as_mut_byte_ptr(self) -> *mut u8 {
        self.0.ptr.as_ptr()
    }

    /// Get the raw byte pointer as a const pointer
    #[inline]
    pub const fn as_byte_ptr(self) -> *const u8 {
        self.0.ptr.as_ptr()
    }

    /// Downgrade to an immutable pointer
    #[inline]
    pub const fn as_const(self) -> PtrConst<'mem> {
        PtrConst(self.0, PhantomData)
    }

    /// Treat the location as uninitialized again
    ///
    /// # Safety
    ///
    /// The value must have been moved out or dropped already.
    #[inline]
    pub const unsafe fn as_uninit(self) -> PtrUninit<'mem> {
        PtrUninit(self.0, PhantomData)
    }

    /// Borrows the underlying value as `T`
    ///
    /// # Safety
    ///
    /// `T` must be the actual type of the value pointed to.
    #[inline]
    pub const unsafe fn get<T>(self) -> &'mem T {
        unsafe { &*(self.as_byte_ptr() as *const T) }
    }

    /// Mutably borrows the underlying value as `T`
    ///
    /// # Safety
    ///
    /// `T` must be the actual type of the value pointed to, and no other
    /// reference to it may be live.
    #[inline]
    pub const unsafe fn as_mut<T>(self) -> &'mem mut T {
        unsafe { &mut *(self.as_mut_byte_ptr() as *mut T) }
    }

    /// Moves the value out, leaving the location uninitialized
    ///
    /// # Safety
    ///
    /// `T` must be the actual type of the value pointed to, and the location
    /// must not be read or dropped again as a `T`.
    #[inline]
    pub const unsafe fn read<T>(self) -> T {
        unsafe { core::ptr::read(self.as_byte_ptr() as *const T) }
    }

    /// Drops the value in place
    ///
    /// # Safety
    ///
    /// `T` must be the actual type of the value pointed to.
    #[inline]
    pub unsafe fn drop_in_place<T>(self) -> PtrUninit<'mem> {
        unsafe {
            core::ptr::drop_in_place(self.as_mut_byte_ptr() as *mut T);
            self.as_uninit()
        }
    }

    /// Returns a pointer to the field at `offset`
    ///
    /// # Safety
    ///
    /// `offset` must stay within the value this pointer refers to.
    #[inline]
    pub const unsafe fn field(self, offset: usize) -> PtrMut<'mem> {
        PtrMut(self.0.offset(offset), PhantomData)
    }
}

impl<'mem> From<PtrMut<'mem>> for PtrConst<'mem> {
    #[inline]
    fn from(value: PtrMut<'mem>) -> Self {
        value.as_const()
    }
}
