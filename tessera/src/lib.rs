#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![doc = include_str!("../README.md")]

extern crate alloc;

use core::mem::MaybeUninit;
use core::ptr::NonNull;

use tessera_core::{PtrUninit, Shape, Shaped};
use tessera_realm::{Runtime, Value};
use tessera_reflect::Peek;
use tracing::debug;

mod attrs;
pub use attrs::*;

mod constructors;
pub use constructors::*;

mod error;
pub use error::*;

mod identity;
pub use identity::*;

mod options;
pub use options::*;

mod scalar;

mod marshal;
use marshal::MarshalEngine;

mod unmarshal;
use unmarshal::UnmarshalEngine;

/// Converts values in both directions, with optional constructor hooks and
/// size guards.
///
/// A `Marshaller` is cheap to build and holds no per-call state: identity
/// maps live only for the duration of one call.
#[derive(Clone, Copy, Debug, Default)]
pub struct Marshaller<'c> {
    registry: Option<&'c ConstructorRegistry>,
    options: Options,
}

impl<'c> Marshaller<'c> {
    /// A marshaller with default options and no hooks
    pub fn new() -> Self {
        Self::default()
    }

    /// Consult `registry` for every node
    pub fn with_registry(mut self, registry: &'c ConstructorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replace the size guards
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Converts `value` into a dynamic value allocated in `realm`.
    ///
    /// Values reachable more than once (through `Rc`, `Arc`, or a cycle)
    /// become a single object referenced from every place they appear.
    pub fn marshal<T: Shaped>(&self, realm: &mut impl Runtime, value: &T) -> Result<Value, Error> {
        self.marshal_peek(realm, Peek::new(value))
    }

    /// Like [`Marshaller::marshal`], for a value only known by its shape
    pub fn marshal_peek(&self, realm: &mut impl Runtime, peek: Peek<'_>) -> Result<Value, Error> {
        debug!("marshalling {}", peek.shape());
        MarshalEngine::new(realm, self.registry, self.options).run(peek)
    }

    /// Builds a `T` out of a dynamic value.
    ///
    /// Objects reached more than once as the same `Rc`/`Arc` type become one
    /// shared allocation, which may be cyclic.
    pub fn unmarshal<T: Shaped>(&self, realm: &impl Runtime, value: &Value) -> Result<T, Error> {
        let mut slot = MaybeUninit::<T>::uninit();
        let dst = PtrUninit::new(NonNull::from(&mut slot).cast::<T>());
        unsafe {
            self.unmarshal_into(realm, value, T::SHAPE, dst)?;
            Ok(slot.assume_init())
        }
    }

    /// Writes the value of `shape` converted from `value` into `dst`.
    ///
    /// On error `dst` is left uninitialized: everything built so far has
    /// been dropped and every temporary freed.
    ///
    /// # Safety
    ///
    /// `dst` must be valid for writes of a value of `shape`, and `shape` must
    /// describe its type exactly.
    pub unsafe fn unmarshal_into(
        &self,
        realm: &impl Runtime,
        value: &Value,
        shape: &'static Shape,
        dst: PtrUninit<'_>,
    ) -> Result<(), Error> {
        debug!("unmarshalling {shape} from {}", realm.kind_of(value));
        unsafe { UnmarshalEngine::new(realm, self.registry, self.options).run(shape, value, dst) }
    }
}

/// Converts `value` into a dynamic value with default options
pub fn marshal<T: Shaped>(realm: &mut impl Runtime, value: &T) -> Result<Value, Error> {
    Marshaller::new().marshal(realm, value)
}

/// Builds a `T` out of a dynamic value with default options
pub fn unmarshal<T: Shaped>(realm: &impl Runtime, value: &Value) -> Result<T, Error> {
    Marshaller::new().unmarshal(realm, value)
}
