use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::{HeapObject, MapKey, ObjectId, ObjectKind, TypedArray, Value, ValueKind};

/// Misuse of an object handle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RealmError {
    /// The handle does not name an object of this realm
    UnknownObject(ObjectId),
    /// The object is not of the sort the operation needs
    WrongKind {
        /// The object
        object: ObjectId,
        /// What the operation needs
        expected: ValueKind,
        /// What the object is
        found: ValueKind,
    },
}

impl fmt::Display for RealmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealmError::UnknownObject(id) => write!(f, "object {id} does not exist"),
            RealmError::WrongKind {
                object,
                expected,
                found,
            } => write!(f, "object {object} is a {found}, expected a {expected}"),
        }
    }
}

impl core::error::Error for RealmError {}

/// An arena of objects
///
/// Objects are never freed individually; the whole realm is dropped at once.
#[derive(Clone, Debug, Default)]
pub struct Realm {
    objects: Vec<HeapObject>,
}

impl Realm {
    /// An empty realm
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects allocated so far
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no object was allocated yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn alloc(&mut self, kind: ObjectKind, prototype: Option<ObjectId>) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(HeapObject { kind, prototype });
        id
    }

    /// A new, empty ordinary object
    pub fn create_object(&mut self) -> ObjectId {
        self.alloc(ObjectKind::Ordinary(IndexMap::new()), None)
    }

    /// A new, empty ordinary object inheriting from `prototype`
    pub fn create_object_with_prototype(
        &mut self,
        prototype: ObjectId,
    ) -> Result<ObjectId, RealmError> {
        self.object(prototype)?;
        Ok(self.alloc(ObjectKind::Ordinary(IndexMap::new()), Some(prototype)))
    }

    /// A new array holding `items`
    pub fn create_array(&mut self, items: Vec<Value>) -> ObjectId {
        self.alloc(ObjectKind::Array(items), None)
    }

    /// A new typed array
    pub fn create_typed_array(&mut self, array: impl Into<TypedArray>) -> ObjectId {
        self.alloc(ObjectKind::TypedArray(array.into()), None)
    }

    /// A new, empty `Map`
    pub fn create_map(&mut self) -> ObjectId {
        self.alloc(ObjectKind::Map(IndexMap::new()), None)
    }

    /// A new, empty `Set`
    pub fn create_set(&mut self) -> ObjectId {
        self.alloc(ObjectKind::Set(IndexSet::new()), None)
    }

    /// Look up an object
    pub fn object(&self, id: ObjectId) -> Result<&HeapObject, RealmError> {
        self.objects.get(id.0).ok_or(RealmError::UnknownObject(id))
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut HeapObject, RealmError> {
        self.objects.get_mut(id.0).ok_or(RealmError::UnknownObject(id))
    }

    /// The runtime type of a value. Dangling handles report as plain objects.
    pub fn kind_of(&self, value: &Value) -> ValueKind {
        match value {
            Value::Undefined => ValueKind::Undefined,
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::BigInt(_) => ValueKind::BigInt,
            Value::String(_) => ValueKind::String,
            Value::Object(id) => self
                .object(*id)
                .map(|object| object.kind.value_kind())
                .unwrap_or(ValueKind::Object),
        }
    }

    /// The prototype of an object
    pub fn prototype_of(&self, id: ObjectId) -> Result<Option<ObjectId>, RealmError> {
        Ok(self.object(id)?.prototype)
    }

    fn wrong_kind(&self, object: ObjectId, expected: ValueKind) -> RealmError {
        match self.object(object) {
            Ok(o) => RealmError::WrongKind {
                object,
                expected,
                found: o.kind.value_kind(),
            },
            Err(e) => e,
        }
    }

    /// Reads a property, walking the prototype chain. Only ordinary objects
    /// carry properties.
    pub fn get(&self, id: ObjectId, key: &str) -> Result<Option<Value>, RealmError> {
        let mut current = Some(id);
        while let Some(id) = current {
            let object = self.object(id)?;
            if let ObjectKind::Ordinary(props) = &object.kind {
                if let Some(value) = props.get(key) {
                    return Ok(Some(value.clone()));
                }
            }
            current = object.prototype;
        }
        Ok(None)
    }

    /// Own properties of an ordinary object, in insertion order
    pub fn own_entries(&self, id: ObjectId) -> Result<Vec<(Rc<str>, Value)>, RealmError> {
        match &self.object(id)?.kind {
            ObjectKind::Ordinary(props) => Ok(props
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()),
            _ => Err(self.wrong_kind(id, ValueKind::Object)),
        }
    }

    /// Sets an own property of an ordinary object
    pub fn set_property(
        &mut self,
        id: ObjectId,
        key: impl Into<Rc<str>>,
        value: Value,
    ) -> Result<(), RealmError> {
        match &mut self.object_mut(id)?.kind {
            ObjectKind::Ordinary(props) => {
                props.insert(key.into(), value);
                Ok(())
            }
            _ => Err(self.wrong_kind(id, ValueKind::Object)),
        }
    }

    /// Sets an element of an array, growing it with `undefined` as needed.
    /// On an ordinary object, sets the property named by the index.
    pub fn set_index(&mut self, id: ObjectId, index: usize, value: Value) -> Result<(), RealmError> {
        match &mut self.object_mut(id)?.kind {
            ObjectKind::Array(items) => {
                if items.len() <= index {
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
                Ok(())
            }
            ObjectKind::Ordinary(props) => {
                props.insert(Rc::from(index.to_string()), value);
                Ok(())
            }
            _ => Err(self.wrong_kind(id, ValueKind::Array)),
        }
    }

    /// Elements of an array
    pub fn elements(&self, id: ObjectId) -> Result<&[Value], RealmError> {
        match &self.object(id)?.kind {
            ObjectKind::Array(items) => Ok(items),
            _ => Err(self.wrong_kind(id, ValueKind::Array)),
        }
    }

    /// The contents of a typed array
    pub fn typed_array(&self, id: ObjectId) -> Result<&TypedArray, RealmError> {
        match &self.object(id)?.kind {
            ObjectKind::TypedArray(array) => Ok(array),
            _ => Err(self.wrong_kind(id, ValueKind::Array)),
        }
    }

    /// Inserts or replaces a `Map` entry
    pub fn map_insert(&mut self, id: ObjectId, key: Value, value: Value) -> Result<(), RealmError> {
        match &mut self.object_mut(id)?.kind {
            ObjectKind::Map(entries) => {
                entries.insert(MapKey(key), value);
                Ok(())
            }
            _ => Err(self.wrong_kind(id, ValueKind::Map)),
        }
    }

    /// Entries of a `Map`, in insertion order
    pub fn map_entries(&self, id: ObjectId) -> Result<Vec<(Value, Value)>, RealmError> {
        match &self.object(id)?.kind {
            ObjectKind::Map(entries) => Ok(entries
                .iter()
                .map(|(k, v)| (k.0.clone(), v.clone()))
                .collect()),
            _ => Err(self.wrong_kind(id, ValueKind::Map)),
        }
    }

    /// Adds an item to a `Set`; returns whether it was new
    pub fn set_add(&mut self, id: ObjectId, item: Value) -> Result<bool, RealmError> {
        match &mut self.object_mut(id)?.kind {
            ObjectKind::Set(items) => Ok(items.insert(MapKey(item))),
            _ => Err(self.wrong_kind(id, ValueKind::Set)),
        }
    }

    /// Items of a `Set`, in insertion order
    pub fn set_items(&self, id: ObjectId) -> Result<Vec<Value>, RealmError> {
        match &self.object(id)?.kind {
            ObjectKind::Set(items) => Ok(items.iter().map(|k| k.0.clone()).collect()),
            _ => Err(self.wrong_kind(id, ValueKind::Set)),
        }
    }
}
