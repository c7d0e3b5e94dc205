use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use tessera_core::Shape;
use tessera_realm::{RealmError, ValueKind};
use tessera_reflect::ReflectError;

/// A step on the way from the root value to the one that failed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// A struct field or object property
    Field(&'static str),
    /// A list, array or tuple position
    Index(usize),
    /// The key of the n-th map entry
    MapKey(usize),
    /// The value of the n-th map entry
    MapValue(usize),
}

/// Where an error happened, as a sequence of steps from the root
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The root itself
    pub fn root() -> Self {
        Self::default()
    }

    /// The steps, outermost first
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Whether this is the root
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }
}

impl FromIterator<PathSegment> for FieldPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::MapKey(index) => write!(f, "[key #{index}]")?,
                PathSegment::MapValue(index) => write!(f, "[value #{index}]")?,
            }
        }
        Ok(())
    }
}

/// Which guard tripped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limit {
    /// Nesting depth
    Depth(usize),
    /// Total number of visited nodes
    Nodes(usize),
}

/// What went wrong
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    /// The dynamic value's runtime type does not fit the target shape
    ShapeMismatch {
        /// Target shape
        shape: &'static Shape,
        /// What would have fit
        expected: &'static str,
        /// What was found
        found: ValueKind,
    },

    /// A field without a default is absent from the object
    MissingRequiredField {
        /// The struct or enum
        shape: &'static Shape,
        /// The absent field
        field: &'static str,
    },

    /// A map key or set item cannot be represented natively
    InvalidMapKey {
        /// The map or set shape
        shape: &'static Shape,
        /// The offending key, rendered
        key: String,
    },

    /// A value was built but fails its type's invariant check
    InvariantViolation {
        /// The checked shape
        shape: &'static Shape,
    },

    /// The engine has no rule for this shape
    UnsupportedType {
        /// The shape
        shape: &'static Shape,
        /// Why
        reason: &'static str,
    },

    /// The input exceeds a configured size guard
    GraphTooLarge {
        /// The guard
        limit: Limit,
    },

    /// A registered constructor hook reported failure
    CustomConstructorFailure {
        /// The shape the hook is registered for
        shape: &'static Shape,
        /// The hook's message
        message: String,
    },

    /// Identity bookkeeping is inconsistent. This is a bug, not bad input.
    IdentityConflict {
        /// What collided
        detail: String,
    },

    /// An integer does not fit the target type
    IntOverflow {
        /// Target shape
        shape: &'static Shape,
        /// The value, rendered
        value: String,
    },

    /// A variant field has the same name as the enum tag property
    ClobberedTypeTag {
        /// The enum
        shape: &'static Shape,
        /// The tag name
        tag: &'static str,
    },

    /// A free-form attribute could not be understood
    InvalidAttribute {
        /// Where it was declared
        shape: &'static Shape,
        /// The attribute text
        attribute: &'static str,
    },

    /// Low-level access to a native value failed
    Reflect(ReflectError),

    /// An object handle was misused
    Realm(RealmError),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ShapeMismatch {
                shape,
                expected,
                found,
            } => {
                let found = found.to_string();
                let article = match found.chars().next() {
                    Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
                    _ => "a",
                };
                write!(f, "cannot turn {article} {found} into {shape}: expected {expected}")
            }
            ErrorKind::MissingRequiredField { shape, field } => {
                write!(f, "missing required field `{field}` of {shape}")
            }
            ErrorKind::InvalidMapKey { shape, key } => {
                write!(f, "{key} cannot be used as a key of {shape}")
            }
            ErrorKind::InvariantViolation { shape } => {
                write!(f, "invariants of {shape} do not hold")
            }
            ErrorKind::UnsupportedType { shape, reason } => {
                write!(f, "unsupported type {shape}: {reason}")
            }
            ErrorKind::GraphTooLarge {
                limit: Limit::Depth(max),
            } => write!(f, "value graph is nested deeper than {max} levels"),
            ErrorKind::GraphTooLarge {
                limit: Limit::Nodes(max),
            } => write!(f, "value graph has more than {max} nodes"),
            ErrorKind::CustomConstructorFailure { shape, message } => {
                write!(f, "constructor for {shape} failed: {message}")
            }
            ErrorKind::IdentityConflict { detail } => {
                write!(f, "identity map conflict (this is a bug): {detail}")
            }
            ErrorKind::IntOverflow { shape, value } => {
                write!(f, "{value} is out of range for {shape}")
            }
            ErrorKind::ClobberedTypeTag { shape, tag } => {
                write!(f, "a variant field of {shape} is named `{tag}`, like the tag property")
            }
            ErrorKind::InvalidAttribute { shape, attribute } => {
                write!(f, "invalid attribute `{attribute}` on {shape}")
            }
            ErrorKind::Reflect(err) => write!(f, "{err}"),
            ErrorKind::Realm(err) => write!(f, "{err}"),
        }
    }
}

impl From<ReflectError> for ErrorKind {
    fn from(err: ReflectError) -> Self {
        ErrorKind::Reflect(err)
    }
}

impl From<RealmError> for ErrorKind {
    fn from(err: RealmError) -> Self {
        ErrorKind::Realm(err)
    }
}

/// A marshalling failure, with the path to the value that caused it
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    /// What went wrong
    pub kind: ErrorKind,
    /// Where it went wrong
    pub path: FieldPath,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, path: FieldPath) -> Self {
        Self { kind, path }
    }

    /// Whether this reports a bug in the engine rather than bad input.
    /// Callers should not try to recover from fatal errors.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::IdentityConflict { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "at {}: {}", self.path, self.kind)
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Reflect(err) => Some(err),
            ErrorKind::Realm(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Shaped;

    #[test]
    fn paths_render_like_rust_expressions() {
        let path: FieldPath = [
            PathSegment::Field("outer"),
            PathSegment::Field("items"),
            PathSegment::Index(3),
            PathSegment::Field("name"),
        ]
        .into_iter()
        .collect();
        let err = Error::new(
            ErrorKind::ShapeMismatch {
                shape: String::SHAPE,
                expected: "a string",
                found: ValueKind::Number,
            },
            path,
        );
        assert_eq!(
            err.to_string(),
            "at outer.items[3].name: cannot turn a number into String: expected a string"
        );
        assert!(!err.is_fatal());
    }
}
