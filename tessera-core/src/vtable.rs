//! Per-shape behavior table.
//!
//! Every slot is optional: a shape only exposes the operations its type
//! actually implements.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::str::FromStr;

use crate::{PtrConst, PtrMut, PtrUninit};

/// Drops the value in place, leaving the memory uninitialized.
pub type DropInPlaceFn = for<'mem> unsafe fn(value: PtrMut<'mem>) -> PtrUninit<'mem>;

/// Writes the type's default value into uninitialized memory.
pub type DefaultInPlaceFn = for<'mem> unsafe fn(target: PtrUninit<'mem>) -> PtrMut<'mem>;

/// Clones `source` into uninitialized `target`.
pub type CloneIntoFn =
    for<'src, 'dst> unsafe fn(source: PtrConst<'src>, target: PtrUninit<'dst>) -> PtrMut<'dst>;

/// Compares two values of the same shape for equality.
pub type PartialEqFn = for<'a, 'b> unsafe fn(left: PtrConst<'a>, right: PtrConst<'b>) -> bool;

/// Compares two values of the same shape.
pub type PartialOrdFn =
    for<'a, 'b> unsafe fn(left: PtrConst<'a>, right: PtrConst<'b>) -> Option<Ordering>;

/// Feeds the value into a hasher.
pub type HashFn = for<'a> unsafe fn(value: PtrConst<'a>, hasher: &mut dyn Hasher);

/// Formats the value, either with `Display` or `Debug`.
pub type FormatFn = for<'a> unsafe fn(value: PtrConst<'a>, f: &mut fmt::Formatter<'_>) -> fmt::Result;

/// Returns `false` if the value breaks one of its type's invariants.
pub type InvariantsFn = for<'a> unsafe fn(value: PtrConst<'a>) -> bool;

/// Parses a string into uninitialized memory.
pub type ParseFn =
    for<'mem> unsafe fn(s: &str, target: PtrUninit<'mem>) -> Result<PtrMut<'mem>, ParseError>;

/// A string could not be parsed into a value of the target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    /// Rust type name of the target
    pub expected: &'static str,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not parse a {}", self.expected)
    }
}

impl core::error::Error for ParseError {}

/// Behavior table of a shape
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueVTable {
    /// cf. [`DropInPlaceFn`]; `None` for types without drop glue
    pub drop_in_place: Option<DropInPlaceFn>,
    /// cf. [`DefaultInPlaceFn`]
    pub default_in_place: Option<DefaultInPlaceFn>,
    /// cf. [`CloneIntoFn`]
    pub clone_into: Option<CloneIntoFn>,
    /// cf. [`PartialEqFn`]
    pub partial_eq: Option<PartialEqFn>,
    /// cf. [`PartialOrdFn`]
    pub partial_ord: Option<PartialOrdFn>,
    /// cf. [`HashFn`]
    pub hash: Option<HashFn>,
    /// `Display` formatting
    pub display: Option<FormatFn>,
    /// `Debug` formatting
    pub debug: Option<FormatFn>,
    /// cf. [`InvariantsFn`]
    pub invariants: Option<InvariantsFn>,
    /// cf. [`ParseFn`]
    pub parse: Option<ParseFn>,
}

impl ValueVTable {
    /// A vtable with every slot empty, for types that are only ever handled
    /// through a pointer
    pub const EMPTY: ValueVTable = ValueVTable {
        drop_in_place: None,
        default_in_place: None,
        clone_into: None,
        partial_eq: None,
        partial_ord: None,
        hash: None,
        display: None,
        debug: None,
        invariants: None,
        parse: None,
    };

    /// Start a vtable for `T`. Drop glue is filled in when `T` needs it.
    pub const fn builder<T>() -> ValueVTableBuilder<T> {
        let mut vtable = Self::EMPTY;
        if core::mem::needs_drop::<T>() {
            vtable.drop_in_place = Some(drop_in_place::<T>);
        }
        ValueVTableBuilder {
            vtable,
            _phantom: PhantomData,
        }
    }
}

/// Builds a [`ValueVTable`] from the traits `T` implements.
pub struct ValueVTableBuilder<T> {
    vtable: ValueVTable,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> ValueVTableBuilder<T> {
    /// Fill the default slot from `T: Default`
    pub const fn with_default(mut self) -> Self
    where
        T: Default,
    {
        self.vtable.default_in_place = Some(default_in_place::<T>);
        self
    }

    /// Fill the clone slot from `T: Clone`
    pub const fn with_clone(mut self) -> Self
    where
        T: Clone,
    {
        self.vtable.clone_into = Some(clone_into::<T>);
        self
    }

    /// Fill the equality slot from `T: PartialEq`
    pub const fn with_partial_eq(mut self) -> Self
    where
        T: PartialEq,
    {
        self.vtable.partial_eq = Some(partial_eq::<T>);
        self
    }

    /// Fill the ordering slot from `T: PartialOrd`
    pub const fn with_partial_ord(mut self) -> Self
    where
        T: PartialOrd,
    {
        self.vtable.partial_ord = Some(partial_ord::<T>);
        self
    }

    /// Fill the hash slot from `T: Hash`
    pub const fn with_hash(mut self) -> Self
    where
        T: Hash,
    {
        self.vtable.hash = Some(hash::<T>);
        self
    }

    /// Fill the display slot from `T: Display`
    pub const fn with_display(mut self) -> Self
    where
        T: fmt::Display,
    {
        self.vtable.display = Some(display::<T>);
        self
    }

    /// Fill the debug slot from `T: Debug`
    pub const fn with_debug(mut self) -> Self
    where
        T: fmt::Debug,
    {
        self.vtable.debug = Some(debug::<T>);
        self
    }

    /// Fill the parse slot from `T: FromStr`
    pub const fn with_parse(mut self) -> Self
    where
        T: FromStr,
    {
        self.vtable.parse = Some(parse::<T>);
        self
    }

    /// Set the invariant check
    pub const fn invariants(mut self, f: InvariantsFn) -> Self {
        self.vtable.invariants = Some(f);
        self
    }

    /// Finish the vtable
    pub const fn build(self) -> ValueVTable {
        self.vtable
    }
}

unsafe fn drop_in_place<T>(value: PtrMut<'_>) -> PtrUninit<'_> {
    unsafe { value.drop_in_place::<T>() }
}

unsafe fn default_in_place<T: Default>(target: PtrUninit<'_>) -> PtrMut<'_> {
    unsafe { target.put(T::default()) }
}

unsafe fn clone_into<'dst, T: Clone>(source: PtrConst<'_>, target: PtrUninit<'dst>) -> PtrMut<'dst> {
    unsafe { target.put(source.get::<T>().clone()) }
}

unsafe fn partial_eq<T: PartialEq>(left: PtrConst<'_>, right: PtrConst<'_>) -> bool {
    unsafe { left.get::<T>() == right.get::<T>() }
}

unsafe fn partial_ord<T: PartialOrd>(left: PtrConst<'_>, right: PtrConst<'_>) -> Option<Ordering> {
    unsafe { left.get::<T>().partial_cmp(right.get::<T>()) }
}

unsafe fn hash<T: Hash>(value: PtrConst<'_>, mut hasher: &mut dyn Hasher) {
    unsafe { value.get::<T>() }.hash(&mut hasher)
}

unsafe fn display<T: fmt::Display>(value: PtrConst<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(unsafe { value.get::<T>() }, f)
}

unsafe fn debug<T: fmt::Debug>(value: PtrConst<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(unsafe { value.get::<T>() }, f)
}

unsafe fn parse<'mem, T: FromStr>(s: &str, target: PtrUninit<'mem>) -> Result<PtrMut<'mem>, ParseError> {
    match s.parse::<T>() {
        Ok(value) => Ok(unsafe { target.put(value) }),
        Err(_) => Err(ParseError {
            expected: core::any::type_name::<T>(),
        }),
    }
}
