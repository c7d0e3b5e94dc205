use tessera_core::{DefKind, Shape};

/// Errors that can occur when reflecting on values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectError {
    /// Tried to get the wrong type out of a value, e.g. `.get::<u64>()` on a
    /// `String`.
    WrongShape {
        /// The shape that was asked for
        expected: &'static Shape,
        /// The shape of the value
        actual: &'static Shape,
    },

    /// Tried to project a value into a kind it is not, e.g. a struct view of
    /// a `Vec`.
    WasNotA {
        /// The kind that was asked for
        expected: DefKind,
        /// The shape of the value
        actual: &'static Shape,
    },

    /// An enum value holds a discriminant that none of its variants declare.
    NoSuchVariant {
        /// The enum's shape
        shape: &'static Shape,
        /// The discriminant found in memory
        discriminant: i64,
    },

    /// The operation needs a sized type.
    Unsized {
        /// The unsized shape
        shape: &'static Shape,
    },

    /// The shape's vtable lacks a function the operation needs.
    MissingVTableEntry {
        /// The shape whose vtable is incomplete
        shape: &'static Shape,
        /// Which function is missing
        entry: &'static str,
    },

    /// The pointee cannot be read right now (a mutably borrowed `RefCell`).
    BorrowConflict {
        /// The pointer's shape
        shape: &'static Shape,
    },

    /// Allocating storage for a value failed.
    AllocationFailed {
        /// The shape that was being allocated
        shape: &'static Shape,
    },
}

impl core::fmt::Display for ReflectError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReflectError::WrongShape { expected, actual } => {
                write!(f, "Wrong shape: expected {expected}, but got {actual}")
            }
            ReflectError::WasNotA { expected, actual } => {
                write!(f, "Was not a {expected}: {actual} is a {}", actual.def.kind())
            }
            ReflectError::NoSuchVariant {
                shape,
                discriminant,
            } => write!(f, "{shape} has no variant with discriminant {discriminant}"),
            ReflectError::Unsized { shape } => write!(f, "{shape} is unsized"),
            ReflectError::MissingVTableEntry { shape, entry } => {
                write!(f, "{shape} does not provide `{entry}`")
            }
            ReflectError::BorrowConflict { shape } => {
                write!(f, "{shape} is mutably borrowed and cannot be read")
            }
            ReflectError::AllocationFailed { shape } => {
                write!(f, "could not allocate storage for {shape}")
            }
        }
    }
}

impl core::error::Error for ReflectError {}
