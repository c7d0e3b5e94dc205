#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod value;
pub use value::*;

mod object;
pub use object::*;

mod key;
pub use key::*;

mod realm;
pub use realm::*;

mod inspect;

mod runtime;
pub use runtime::*;
