//! Native → dynamic conversion.
//!
//! The traversal runs off an explicit task stack, so deeply nested values
//! do not grow the call stack. Every object is created, registered and
//! written to its destination before its children are visited: a child
//! that refers back to an ancestor finds it in the identity map.

use alloc::rc::Rc;
use alloc::vec::Vec;

use tessera_core::{Def, Field, ShapeLayout, Shape, StructKind};
use tessera_realm::{ObjectId, Runtime, Value, ValueKind};
use tessera_reflect::{Peek, ValueId};
use tracing::{debug, trace, warn};

use crate::attrs::{AttributeResolver, TagRepr, should_skip};
use crate::{
    Constructed, ConstructorRegistry, Error, ErrorKind, FieldPath, IdentityMap, Limit, Options,
    PathSegment, scalar,
};

/// Where a marshalled value goes
enum Dest {
    /// A scratch slot, read back by a later task
    Slot(usize),
    Property(ObjectId, Rc<str>),
    Element(ObjectId, usize),
    SetItem(ObjectId),
}

enum Task<'mem> {
    Visit {
        peek: Peek<'mem>,
        typed_array: bool,
        dest: Dest,
        depth: usize,
        segment: Option<PathSegment>,
    },
    /// Copy the properties of the object in `slot` into `into`
    Merge {
        slot: usize,
        into: ObjectId,
        shape: &'static Shape,
        depth: usize,
        segment: PathSegment,
    },
    /// Insert the key and value found in two slots into a map
    Entry {
        map: ObjectId,
        shape: &'static Shape,
        key: usize,
        value: usize,
        depth: usize,
    },
}

/// A value about to be built, after wrappers were stripped
struct Node<'mem> {
    peek: Peek<'mem>,
    id: Option<ValueId>,
    shell: Option<ObjectId>,
    dest: Dest,
    depth: usize,
}

pub(crate) struct MarshalEngine<'r, 'c, R: Runtime> {
    realm: &'r mut R,
    registry: Option<&'c ConstructorRegistry>,
    options: Options,
    attrs: AttributeResolver,
    identity: IdentityMap<ValueId, ObjectId>,
    path: FieldPath,
    slots: Vec<Value>,
    nodes: usize,
}

impl<'r, 'c, R: Runtime> MarshalEngine<'r, 'c, R> {
    pub(crate) fn new(
        realm: &'r mut R,
        registry: Option<&'c ConstructorRegistry>,
        options: Options,
    ) -> Self {
        Self {
            realm,
            registry,
            options,
            attrs: AttributeResolver::new(),
            identity: IdentityMap::new(),
            path: FieldPath::root(),
            slots: Vec::new(),
            nodes: 0,
        }
    }

    pub(crate) fn run(mut self, root: Peek<'_>) -> Result<Value, Error> {
        let result = self.slot();
        let mut stack = vec![Task::Visit {
            peek: root,
            typed_array: false,
            dest: Dest::Slot(result),
            depth: 0,
            segment: None,
        }];

        while let Some(task) = stack.pop() {
            let outcome = match task {
                Task::Visit {
                    peek,
                    typed_array,
                    dest,
                    depth,
                    segment,
                } => {
                    self.enter(depth, segment);
                    self.visit(&mut stack, peek, typed_array, dest, depth)
                }
                Task::Merge {
                    slot,
                    into,
                    shape,
                    depth,
                    segment,
                } => {
                    self.enter(depth, Some(segment));
                    self.merge(slot, into, shape)
                }
                Task::Entry {
                    map,
                    shape,
                    key,
                    value,
                    depth,
                } => {
                    // the map's own path, not that of its last key or value
                    self.path.truncate(depth);
                    self.insert_entry(map, shape, key, value)
                }
            };
            outcome.map_err(|kind| Error::new(kind, self.path.clone()))?;
        }

        debug!(
            nodes = self.nodes,
            objects = self.identity.len(),
            "marshalled {}",
            root.shape()
        );
        Ok(self.take(result))
    }

    fn enter(&mut self, depth: usize, segment: Option<PathSegment>) {
        self.path.truncate(depth.saturating_sub(1));
        if let Some(segment) = segment {
            self.path.push(segment);
        }
    }

    fn slot(&mut self) -> usize {
        self.slots.push(Value::Undefined);
        self.slots.len() - 1
    }

    fn take(&mut self, slot: usize) -> Value {
        self.slots
            .get_mut(slot)
            .map(|slot| core::mem::replace(slot, Value::Undefined))
            .unwrap_or(Value::Undefined)
    }

    fn write(&mut self, dest: Dest, value: Value) -> Result<(), ErrorKind> {
        match dest {
            Dest::Slot(slot) => {
                if let Some(slot) = self.slots.get_mut(slot) {
                    *slot = value;
                }
            }
            Dest::Property(object, key) => self.realm.set_property(object, key, value)?,
            Dest::Element(object, index) => self.realm.set_index(object, index, value)?,
            Dest::SetItem(object) => {
                self.realm.set_add(object, value)?;
            }
        }
        Ok(())
    }

    /// Registers a freshly made object and stores it at its destination
    fn created(&mut self, node: Node<'_>, object: ObjectId) -> Result<(), ErrorKind> {
        if let Some(id) = node.id {
            self.identity.register(id, object)?;
        }
        self.write(node.dest, Value::Object(object))
    }

    fn visit<'mem>(
        &mut self,
        stack: &mut Vec<Task<'mem>>,
        mut peek: Peek<'mem>,
        typed_array: bool,
        mut dest: Dest,
        depth: usize,
    ) -> Result<(), ErrorKind> {
        if depth > self.options.max_depth {
            return Err(ErrorKind::GraphTooLarge {
                limit: Limit::Depth(self.options.max_depth),
            });
        }
        self.nodes += 1;
        if self.nodes > self.options.max_nodes {
            return Err(ErrorKind::GraphTooLarge {
                limit: Limit::Nodes(self.options.max_nodes),
            });
        }

        loop {
            let shape = peek.shape();
            trace!("marshal {shape} at {}", self.path);

            let id = identity_key(peek);
            if let Some(object) = id.and_then(|id| self.identity.lookup_native(&id)) {
                return self.write(dest, Value::Object(object));
            }

            let mut shell = None;
            let hook = self
                .registry
                .and_then(|registry| registry.get(shape.id))
                .and_then(|constructor| constructor.marshal.as_ref());
            if let Some(hook) = hook {
                let realm: &mut dyn Runtime = &mut *self.realm;
                let constructed =
                    hook(realm, peek).map_err(|err| ErrorKind::CustomConstructorFailure {
                        shape,
                        message: err.0,
                    })?;
                match constructed {
                    Constructed::Complete(value) => {
                        if let (Some(id), Value::Object(object)) = (id, &value) {
                            self.identity.register(id, *object)?;
                        }
                        return self.write(dest, value);
                    }
                    Constructed::Shell(object) => shell = Some(object),
                }
            }

            let node = Node {
                peek,
                id,
                shell,
                dest,
                depth,
            };
            let inner = match shape.def {
                Def::Option(_) => match peek.into_option()?.value() {
                    Some(inner) => inner,
                    None => return self.write(node.dest, Value::Null),
                },
                Def::SmartPointer(_) => peek.into_smart_pointer()?.borrow_inner()?,
                Def::Struct(_) if self.attrs.container(shape)?.transparent => {
                    peek.innermost_field().ok_or(ErrorKind::UnsupportedType {
                        shape,
                        reason: "a transparent struct needs exactly one field",
                    })?
                }
                Def::Scalar(scalar) => {
                    no_shell(&node, "scalars cannot be built into a shell")?;
                    let value = scalar::marshal(peek, scalar)?;
                    return self.write(node.dest, value);
                }
                Def::List(_) | Def::Array(_) | Def::Slice(_) => {
                    return self.sequence(stack, node, typed_array);
                }
                Def::Map(_) => return self.map(stack, node),
                Def::Set(_) => return self.set(stack, node),
                Def::Struct(_) => return self.structure(stack, node),
                Def::Enum(_) => return self.enumeration(stack, node),
            };
            no_shell(&node, "a shell was returned for a value that marshals as its content")?;
            peek = inner;
            dest = node.dest;
        }
    }

    fn sequence<'mem>(
        &mut self,
        stack: &mut Vec<Task<'mem>>,
        node: Node<'mem>,
        typed_array: bool,
    ) -> Result<(), ErrorKind> {
        let shape = node.peek.shape();
        let list = node.peek.into_list_like()?;
        if typed_array && node.shell.is_none() {
            match scalar::typed_array(&list) {
                Some(array) => {
                    let object = self.realm.create_typed_array(array?);
                    return self.created(node, object);
                }
                None => warn!(
                    "{shape} is marked `typed_array`, but {} has no typed array; using a plain array",
                    list.item_shape()
                ),
            }
        }

        let object = match node.shell {
            Some(object) => object,
            None => self.realm.create_array(Vec::with_capacity(list.len())),
        };
        let depth = node.depth;
        self.created(node, object)?;
        let items: Vec<_> = list.iter().collect();
        for (index, item) in items.into_iter().enumerate().rev() {
            stack.push(Task::Visit {
                peek: item,
                typed_array: false,
                dest: Dest::Element(object, index),
                depth: depth + 1,
                segment: Some(PathSegment::Index(index)),
            });
        }
        Ok(())
    }

    fn map<'mem>(&mut self, stack: &mut Vec<Task<'mem>>, node: Node<'mem>) -> Result<(), ErrorKind> {
        let shape = node.peek.shape();
        let map = node.peek.into_map()?;
        let object = match node.shell {
            Some(object) => object,
            None => self.realm.create_map(),
        };
        let depth = node.depth;
        self.created(node, object)?;

        let entries: Vec<_> = map.iter().collect();
        for (index, (key, value)) in entries.into_iter().enumerate().rev() {
            let key_slot = self.slot();
            let value_slot = self.slot();
            stack.push(Task::Entry {
                map: object,
                shape,
                key: key_slot,
                value: value_slot,
                depth,
            });
            stack.push(Task::Visit {
                peek: value,
                typed_array: false,
                dest: Dest::Slot(value_slot),
                depth: depth + 1,
                segment: Some(PathSegment::MapValue(index)),
            });
            stack.push(Task::Visit {
                peek: key,
                typed_array: false,
                dest: Dest::Slot(key_slot),
                depth: depth + 1,
                segment: Some(PathSegment::MapKey(index)),
            });
        }
        Ok(())
    }

    fn set<'mem>(&mut self, stack: &mut Vec<Task<'mem>>, node: Node<'mem>) -> Result<(), ErrorKind> {
        let set = node.peek.into_set()?;
        let object = match node.shell {
            Some(object) => object,
            None => self.realm.create_set(),
        };
        let depth = node.depth;
        self.created(node, object)?;

        let items: Vec<_> = set.iter().collect();
        for (index, item) in items.into_iter().enumerate().rev() {
            stack.push(Task::Visit {
                peek: item,
                typed_array: false,
                dest: Dest::SetItem(object),
                depth: depth + 1,
                segment: Some(PathSegment::Index(index)),
            });
        }
        Ok(())
    }

    fn structure<'mem>(
        &mut self,
        stack: &mut Vec<Task<'mem>>,
        node: Node<'mem>,
    ) -> Result<(), ErrorKind> {
        let shape = node.peek.shape();
        let peek = node.peek.into_struct()?;
        let depth = node.depth;

        if peek.kind() == StructKind::Unit {
            return match node.shell {
                Some(object) => self.created(node, object),
                None => self.write(node.dest, Value::Null),
            };
        }

        let fields: Vec<_> = peek.fields().collect();
        if peek.def().is_positional() {
            let object = match node.shell {
                Some(object) => object,
                None => self.realm.create_array(Vec::with_capacity(fields.len())),
            };
            self.created(node, object)?;
            for (index, (field, value)) in fields.into_iter().enumerate().rev() {
                let attrs = self.attrs.field(shape, field)?;
                stack.push(Task::Visit {
                    peek: value,
                    typed_array: attrs.typed_array,
                    dest: Dest::Element(object, index),
                    depth: depth + 1,
                    segment: Some(PathSegment::Index(index)),
                });
            }
            return Ok(());
        }

        let object = match node.shell {
            Some(object) => object,
            None => self.realm.create_object(),
        };
        self.created(node, object)?;
        self.push_fields(stack, shape, object, fields, depth)
    }

    fn enumeration<'mem>(
        &mut self,
        stack: &mut Vec<Task<'mem>>,
        node: Node<'mem>,
    ) -> Result<(), ErrorKind> {
        let shape = node.peek.shape();
        let peek = node.peek.into_enum()?;
        let variant = peek.active_variant()?;
        let attrs = self.attrs.container(shape)?;
        let tag = match attrs.repr {
            TagRepr::String => Value::from(variant.name),
            TagRepr::Number => Value::Number(variant.discriminant as f64),
        };

        if peek.def().is_unit_only() && node.shell.is_none() {
            return self.write(node.dest, tag);
        }
        if variant.data.field(attrs.tag).is_some() {
            return Err(ErrorKind::ClobberedTypeTag {
                shape,
                tag: attrs.tag,
            });
        }

        let object = match node.shell {
            Some(object) => object,
            None => self.realm.create_object(),
        };
        let depth = node.depth;
        self.created(node, object)?;
        self.realm.set_property(object, Rc::from(attrs.tag), tag)?;
        let fields: Vec<_> = peek.fields()?.collect();
        self.push_fields(stack, shape, object, fields, depth)
    }

    /// Schedules named fields, in declaration order, as properties of
    /// `object`
    fn push_fields<'mem>(
        &mut self,
        stack: &mut Vec<Task<'mem>>,
        owner: &'static Shape,
        object: ObjectId,
        fields: Vec<(&'static Field, Peek<'mem>)>,
        depth: usize,
    ) -> Result<(), ErrorKind> {
        for (field, value) in fields.into_iter().rev() {
            let attrs = self.attrs.field(owner, field)?;
            if should_skip(field, &attrs, value) {
                continue;
            }
            if attrs.flatten {
                let slot = self.slot();
                stack.push(Task::Merge {
                    slot,
                    into: object,
                    shape: value.shape(),
                    depth: depth + 1,
                    segment: PathSegment::Field(field.name),
                });
                stack.push(Task::Visit {
                    peek: value,
                    typed_array: attrs.typed_array,
                    dest: Dest::Slot(slot),
                    depth: depth + 1,
                    segment: Some(PathSegment::Field(field.name)),
                });
            } else {
                stack.push(Task::Visit {
                    peek: value,
                    typed_array: attrs.typed_array,
                    dest: Dest::Property(object, Rc::from(field.name)),
                    depth: depth + 1,
                    segment: Some(PathSegment::Field(field.name)),
                });
            }
        }
        Ok(())
    }

    /// Copies the properties of a flattened field's value into its parent
    fn merge(&mut self, slot: usize, into: ObjectId, shape: &'static Shape) -> Result<(), ErrorKind> {
        let value = self.take(slot);
        let found = self.realm.kind_of(&value);
        let mismatch = |found| ErrorKind::ShapeMismatch {
            shape,
            expected: "an object",
            found,
        };
        let source = match value {
            Value::Object(source) => source,
            value if value.is_nullish() => return Ok(()),
            _ => return Err(mismatch(found)),
        };

        let entries: Vec<(Rc<str>, Value)> = match found {
            ValueKind::Object => self.realm.own_entries(source)?,
            ValueKind::Map => {
                let mut entries = Vec::new();
                for (key, value) in self.realm.map_entries(source)? {
                    match key {
                        Value::String(key) => entries.push((key, value)),
                        key => return Err(mismatch(self.realm.kind_of(&key))),
                    }
                }
                entries
            }
            _ => return Err(mismatch(found)),
        };
        for (key, value) in entries {
            self.realm.set_property(into, key, value)?;
        }
        Ok(())
    }

    fn insert_entry(
        &mut self,
        map: ObjectId,
        shape: &'static Shape,
        key: usize,
        value: usize,
    ) -> Result<(), ErrorKind> {
        let key = self.take(key);
        let value = self.take(value);
        if self.realm.kind_of(&Value::Object(map)) != ValueKind::Object {
            self.realm.map_insert(map, key, value)?;
            return Ok(());
        }
        // a shell object standing in for a map holds string keys only
        match key {
            Value::String(key) => self.realm.set_property(map, key, value)?,
            key => {
                return Err(ErrorKind::ShapeMismatch {
                    shape,
                    expected: "string keys for an object",
                    found: self.realm.kind_of(&key),
                });
            }
        }
        Ok(())
    }
}

/// Identity of a value that occupies memory of its own. Zero-sized values
/// and empty slices may share addresses, so they are never tracked.
fn identity_key(peek: Peek<'_>) -> Option<ValueId> {
    let shape = peek.shape();
    let occupies_memory = match (shape.layout, shape.def) {
        (ShapeLayout::Sized(layout), _) => layout.size() != 0,
        (ShapeLayout::Unsized, Def::Slice(def)) => !peek.data().is_empty() && !def.t.is_zst(),
        (ShapeLayout::Unsized, _) => false,
    };
    occupies_memory.then(|| peek.id())
}

fn no_shell(node: &Node<'_>, reason: &'static str) -> Result<(), ErrorKind> {
    match node.shell {
        Some(_) => Err(ErrorKind::UnsupportedType {
            shape: node.peek.shape(),
            reason,
        }),
        None => Ok(()),
    }
}
