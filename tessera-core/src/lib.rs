#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![doc = include_str!("../README.md")]

extern crate alloc;

// Opaque pointer utilities
mod ptr;
pub use ptr::*;

mod typeid;
pub use typeid::*;

mod shape;
pub use shape::*;

mod vtable;
pub use vtable::*;

mod def;
pub use def::*;

// Shapes for standard library types
mod impls;

/// Allows querying the [`Shape`] of a type, which in turn lets us inspect any fields, build a value of
/// this type progressively, etc.
///
/// # Safety
///
/// If you implement this wrong, all the safe abstractions in `tessera-reflect`
/// and the marshalling engine will be unsound. The layout, offsets and
/// vtable functions of `SHAPE` must describe `Self` exactly.
pub unsafe trait Shaped: 'static {
    /// The shape of this type
    const SHAPE: &'static Shape;
}
