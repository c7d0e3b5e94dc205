use crate::{PtrConst, PtrMut, PtrUninit, Shape};

/// Describes an `Option<T>`, including a vtable to query and alter its
/// state, and the inner shape.
#[derive(Clone, Copy, Debug)]
pub struct OptionDef {
    /// vtable for interacting with the option
    pub vtable: &'static OptionVTable,
    /// shape of the inner type of the option
    pub t: &'static Shape,
}

impl OptionDef {
    /// Returns the inner shape of the option
    pub const fn t(&self) -> &'static Shape {
        self.t
    }
}

/// Check if an option contains a value
///
/// # Safety
///
/// The `option` parameter must point to aligned, initialized memory of the correct type.
pub type OptionIsSomeFn = for<'option> unsafe fn(option: PtrConst<'option>) -> bool;

/// Get the value contained in an option, if present
///
/// # Safety
///
/// The `option` parameter must point to aligned, initialized memory of the correct type.
pub type OptionGetValueFn =
    for<'option> unsafe fn(option: PtrConst<'option>) -> Option<PtrConst<'option>>;

/// Initialize an option with `Some(value)`, moving `value` in
///
/// # Safety
///
/// `option` must be uninitialized storage for the option; `value` must be an
/// initialized `T` that the caller will not use again.
pub type OptionInitSomeFn =
    for<'option, 'value> unsafe fn(option: PtrUninit<'option>, value: PtrMut<'value>) -> PtrMut<'option>;

/// Initialize an option with `None`
///
/// # Safety
///
/// The `option` parameter must point to uninitialized memory of sufficient size.
pub type OptionInitNoneFn = for<'option> unsafe fn(option: PtrUninit<'option>) -> PtrMut<'option>;

/// Virtual table for `Option<T>`
#[derive(Clone, Copy, Debug)]
pub struct OptionVTable {
    /// cf. [`OptionIsSomeFn`]
    pub is_some: OptionIsSomeFn,
    /// cf. [`OptionGetValueFn`]
    pub get_value: OptionGetValueFn,
    /// cf. [`OptionInitSomeFn`]
    pub init_some: OptionInitSomeFn,
    /// cf. [`OptionInitNoneFn`]
    pub init_none: OptionInitNoneFn,
}
