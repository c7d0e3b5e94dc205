use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use crate::{ObjectId, Realm, RealmError, TypedArray, Value, ValueKind};

/// The value surface of a dynamic runtime: building and reading primitives,
/// ordinary objects, arrays, typed arrays, maps and sets.
///
/// Primitives travel inline in [`Value`]; objects travel as [`ObjectId`]
/// handles the runtime hands out. A runtime must give the same object the
/// same handle, and distinct objects distinct handles, for as long as a
/// conversion runs: handle equality is object identity.
///
/// [`Realm`] is the in-process implementation. An embedder wraps its engine
/// (keeping, for instance, a table of engine handles indexed by
/// [`ObjectId::from_index`]) to marshal straight into it.
pub trait Runtime {
    /// The runtime type of a value
    fn kind_of(&self, value: &Value) -> ValueKind;

    /// Renders a value on one line, for error messages
    fn inspect(&self, value: &Value) -> String;

    /// A new, empty ordinary object
    fn create_object(&mut self) -> ObjectId;

    /// A new, empty ordinary object inheriting from `prototype`
    fn create_object_with_prototype(&mut self, prototype: ObjectId)
    -> Result<ObjectId, RealmError>;

    /// A new array holding `items`
    fn create_array(&mut self, items: Vec<Value>) -> ObjectId;

    /// A new typed array
    fn create_typed_array(&mut self, array: TypedArray) -> ObjectId;

    /// A new, empty `Map`
    fn create_map(&mut self) -> ObjectId;

    /// A new, empty `Set`
    fn create_set(&mut self) -> ObjectId;

    /// Reads a property, walking the prototype chain
    fn get(&self, object: ObjectId, key: &str) -> Result<Option<Value>, RealmError>;

    /// Own properties of an ordinary object, in insertion order
    fn own_entries(&self, object: ObjectId) -> Result<Vec<(Rc<str>, Value)>, RealmError>;

    /// Sets an own property of an ordinary object
    fn set_property(&mut self, object: ObjectId, key: Rc<str>, value: Value)
    -> Result<(), RealmError>;

    /// Sets an element of an array
    fn set_index(&mut self, object: ObjectId, index: usize, value: Value)
    -> Result<(), RealmError>;

    /// Elements of an array
    fn elements(&self, object: ObjectId) -> Result<Cow<'_, [Value]>, RealmError>;

    /// The contents of a typed array
    fn typed_array(&self, object: ObjectId) -> Result<Cow<'_, TypedArray>, RealmError>;

    /// Inserts or replaces a `Map` entry
    fn map_insert(&mut self, object: ObjectId, key: Value, value: Value)
    -> Result<(), RealmError>;

    /// Entries of a `Map`, in insertion order
    fn map_entries(&self, object: ObjectId) -> Result<Vec<(Value, Value)>, RealmError>;

    /// Adds an item to a `Set`; returns whether it was new
    fn set_add(&mut self, object: ObjectId, item: Value) -> Result<bool, RealmError>;

    /// Items of a `Set`, in insertion order
    fn set_items(&self, object: ObjectId) -> Result<Vec<Value>, RealmError>;
}

impl Runtime for Realm {
    fn kind_of(&self, value: &Value) -> ValueKind {
        Realm::kind_of(self, value)
    }

    fn inspect(&self, value: &Value) -> String {
        Realm::inspect(self, value)
    }

    fn create_object(&mut self) -> ObjectId {
        Realm::create_object(self)
    }

    fn create_object_with_prototype(
        &mut self,
        prototype: ObjectId,
    ) -> Result<ObjectId, RealmError> {
        Realm::create_object_with_prototype(self, prototype)
    }

    fn create_array(&mut self, items: Vec<Value>) -> ObjectId {
        Realm::create_array(self, items)
    }

    fn create_typed_array(&mut self, array: TypedArray) -> ObjectId {
        Realm::create_typed_array(self, array)
    }

    fn create_map(&mut self) -> ObjectId {
        Realm::create_map(self)
    }

    fn create_set(&mut self) -> ObjectId {
        Realm::create_set(self)
    }

    fn get(&self, object: ObjectId, key: &str) -> Result<Option<Value>, RealmError> {
        Realm::get(self, object, key)
    }

    fn own_entries(&self, object: ObjectId) -> Result<Vec<(Rc<str>, Value)>, RealmError> {
        Realm::own_entries(self, object)
    }

    fn set_property(
        &mut self,
        object: ObjectId,
        key: Rc<str>,
        value: Value,
    ) -> Result<(), RealmError> {
        Realm::set_property(self, object, key, value)
    }

    fn set_index(&mut self, object: ObjectId, index: usize, value: Value) -> Result<(), RealmError> {
        Realm::set_index(self, object, index, value)
    }

    fn elements(&self, object: ObjectId) -> Result<Cow<'_, [Value]>, RealmError> {
        Realm::elements(self, object).map(Cow::Borrowed)
    }

    fn typed_array(&self, object: ObjectId) -> Result<Cow<'_, TypedArray>, RealmError> {
        Realm::typed_array(self, object).map(Cow::Borrowed)
    }

    fn map_insert(&mut self, object: ObjectId, key: Value, value: Value) -> Result<(), RealmError> {
        Realm::map_insert(self, object, key, value)
    }

    fn map_entries(&self, object: ObjectId) -> Result<Vec<(Value, Value)>, RealmError> {
        Realm::map_entries(self, object)
    }

    fn set_add(&mut self, object: ObjectId, item: Value) -> Result<bool, RealmError> {
        Realm::set_add(self, object, item)
    }

    fn set_items(&self, object: ObjectId) -> Result<Vec<Value>, RealmError> {
        Realm::set_items(self, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(runtime: &mut dyn Runtime) -> Value {
        let point = runtime.create_object();
        runtime
            .set_property(point, Rc::from("x"), Value::Number(1.0))
            .unwrap();
        let list = runtime.create_array(vec![Value::Object(point), Value::Object(point)]);
        Value::Object(list)
    }

    #[test]
    fn realms_work_behind_the_trait() {
        let mut realm = Realm::new();
        let list = build(&mut realm);
        let runtime: &dyn Runtime = &realm;
        assert_eq!(runtime.kind_of(&list), ValueKind::Array);
        let items = runtime.elements(list.as_object().unwrap()).unwrap();
        assert_eq!(items[0], items[1]);
        assert_eq!(runtime.inspect(&list), "[ { x: 1 }, { x: 1 } ]");
        assert!(matches!(items, Cow::Borrowed(_)));
    }
}
