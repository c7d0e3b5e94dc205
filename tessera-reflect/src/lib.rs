#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod error;
pub use error::*;

mod peek;
pub use peek::*;

mod heap;
pub use heap::*;

mod discriminant;
pub use discriminant::*;
