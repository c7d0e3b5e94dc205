//! Per-type overrides of the default marshalling rules.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;
use std::collections::HashMap;

use tessera_core::{ConstTypeId, PtrUninit, Shaped};
use tessera_realm::{ObjectId, Runtime, Value};
use tessera_reflect::Peek;

/// What a marshal hook produced
#[derive(Clone, Debug, PartialEq)]
pub enum Constructed {
    /// The finished dynamic value
    Complete(Value),
    /// An object (ordinary, array, map or set) that default marshalling
    /// fills in, as if it had created it itself
    Shell(ObjectId),
}

/// A constructor hook failed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookError(pub String);

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::error::Error for HookError {}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self(message.into())
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// Turns a native value into a dynamic one
pub type MarshalHook = Box<dyn Fn(&mut dyn Runtime, Peek<'_>) -> Result<Constructed, HookError>>;

/// Writes a native value built from a dynamic one into `dst`.
///
/// On `Ok`, `dst` must hold a fully initialized value of the registered
/// type; on `Err`, it must be left uninitialized.
pub type UnmarshalHook = Box<dyn Fn(&dyn Runtime, &Value, PtrUninit<'_>) -> Result<(), HookError>>;

/// The hooks registered for one type. Either may be absent.
#[derive(Default)]
pub struct Constructor {
    /// Replaces native → dynamic conversion
    pub marshal: Option<MarshalHook>,
    /// Replaces dynamic → native conversion
    pub unmarshal: Option<UnmarshalHook>,
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("marshal", &self.marshal.is_some())
            .field("unmarshal", &self.unmarshal.is_some())
            .finish()
    }
}

/// Hooks keyed by type, consulted for every node before the default rules.
///
/// Owned by the caller and handed to [`crate::Marshaller::with_registry`].
///
/// A marshal hook that returns the same object for two distinct native
/// values breaks identity tracking; the engine reports that as a fatal
/// [`crate::ErrorKind::IdentityConflict`].
#[derive(Debug, Default)]
pub struct ConstructorRegistry {
    entries: HashMap<ConstTypeId, Constructor>,
}

impl ConstructorRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers raw hooks for a type, replacing any previous ones.
    ///
    /// # Safety
    ///
    /// The unmarshal hook receives storage for a value of the type `type_id`
    /// names and must uphold the contract of [`UnmarshalHook`].
    pub unsafe fn register_constructor(&mut self, type_id: ConstTypeId, constructor: Constructor) {
        self.entries.insert(type_id, constructor);
    }

    /// The hooks for a type
    pub fn get(&self, type_id: ConstTypeId) -> Option<&Constructor> {
        self.entries.get(&type_id)
    }

    /// Whether no hook is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry<T: Shaped>(&mut self) -> &mut Constructor {
        self.entries.entry(T::SHAPE.id).or_default()
    }

    /// Marshal every `T` with `f`
    pub fn marshal_with<T, F>(&mut self, f: F) -> &mut Self
    where
        T: Shaped,
        F: Fn(&mut dyn Runtime, &T) -> Result<Value, HookError> + 'static,
    {
        self.entry::<T>().marshal = Some(Box::new(move |realm: &mut dyn Runtime, peek: Peek<'_>| {
            let value = peek.get::<T>().map_err(|err| HookError(err.to_string()))?;
            f(realm, value).map(Constructed::Complete)
        }));
        self
    }

    /// Unmarshal every `T` with `f`
    pub fn unmarshal_with<T, F>(&mut self, f: F) -> &mut Self
    where
        T: Shaped,
        F: Fn(&dyn Runtime, &Value) -> Result<T, HookError> + 'static,
    {
        self.entry::<T>().unmarshal = Some(Box::new(
            move |realm: &dyn Runtime, value: &Value, dst: PtrUninit<'_>| {
                let native = f(realm, value)?;
                unsafe { dst.put(native) };
                Ok(())
            },
        ));
        self
    }

    /// Marshal every `T` into a fresh object inheriting from `prototype`,
    /// then fill it in with the default rules
    pub fn with_prototype<T: Shaped>(&mut self, prototype: ObjectId) -> &mut Self {
        self.entry::<T>().marshal = Some(Box::new(move |realm: &mut dyn Runtime, _peek: Peek<'_>| {
            realm
                .create_object_with_prototype(prototype)
                .map(Constructed::Shell)
                .map_err(|err| HookError(err.to_string()))
        }));
        self
    }
}
