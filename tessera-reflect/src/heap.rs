use alloc::alloc::{alloc, dealloc};
use core::alloc::Layout;
use core::ptr::NonNull;

use tessera_core::{PtrConst, PtrMut, PtrUninit, Shape};

use crate::ReflectError;

/// Heap storage for a single value of some shape.
///
/// The slot starts out uninitialized. Once the caller has written a value
/// and called [`HeapSlot::assume_init`], dropping the slot drops the value;
/// the allocation is freed either way. Moving the value out (by reading it
/// into a collection, say) must be followed by [`HeapSlot::mark_moved`].
pub struct HeapSlot {
    ptr: NonNull<u8>,
    layout: Layout,
    shape: &'static Shape,
    initialized: bool,
}

impl HeapSlot {
    /// Allocate storage for one `shape`
    pub fn alloc(shape: &'static Shape) -> Result<Self, ReflectError> {
        let layout = shape
            .layout
            .sized_layout()
            .map_err(|_| ReflectError::Unsized { shape })?;
        let ptr = if layout.size() == 0 {
            // zero-sized values need an aligned, non-null address and nothing else
            NonNull::new(layout.align() as *mut u8)
        } else {
            NonNull::new(unsafe { alloc(layout) })
        }
        .ok_or(ReflectError::AllocationFailed { shape })?;
        Ok(Self {
            ptr,
            layout,
            shape,
            initialized: false,
        })
    }

    /// The shape this slot was allocated for
    #[inline]
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    /// Whether the slot holds a value
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Where to write the value
    #[inline]
    pub fn as_uninit(&self) -> PtrUninit<'static> {
        PtrUninit::new(self.ptr)
    }

    /// The value, for reading
    #[inline]
    pub fn as_const(&self) -> PtrConst<'static> {
        PtrConst::new(self.ptr)
    }

    /// The value, for moving it out
    #[inline]
    pub fn as_mut(&self) -> PtrMut<'static> {
        PtrMut::new(self.ptr)
    }

    /// Record that a value has been written.
    ///
    /// # Safety
    ///
    /// The slot must hold a fully initialized value of its shape.
    #[inline]
    pub unsafe fn assume_init(&mut self) {
        self.initialized = true;
    }

    /// Record that the value was moved out with a bitwise read, so it must
    /// not be dropped here.
    ///
    /// # Safety
    ///
    /// The value must have been read out, or never written.
    #[inline]
    pub unsafe fn mark_moved(&mut self) {
        self.initialized = false;
    }

    /// Move the value out as a `T`.
    ///
    /// # Safety
    ///
    /// The slot must be initialized and its shape must be `T`'s.
    pub unsafe fn take<T>(mut self) -> T {
        let value = unsafe { self.as_mut().read::<T>() };
        self.initialized = false;
        value
    }
}

impl Drop for HeapSlot {
    fn drop(&mut self) {
        if self.initialized {
            if let Some(drop_fn) = self.shape.vtable.drop_in_place {
                unsafe { drop_fn(self.as_mut()) };
            }
        }
        if self.layout.size() != 0 {
            unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
        }
    }
}

impl core::fmt::Debug for HeapSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeapSlot")
            .field("shape", &self.shape)
            .field("initialized", &self.initialized)
            .finish()
    }
}
