//! Read-only views over reflected values

mod value;
pub use value::*;

mod struct_;
pub use struct_::*;

mod enum_;
pub use enum_::*;

mod list_like;
pub use list_like::*;

mod map;
pub use map::*;

mod set;
pub use set::*;

mod option;
pub use option::*;

mod smart_pointer;
pub use smart_pointer::*;
