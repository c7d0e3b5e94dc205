//! Dynamic → native conversion.
//!
//! Values are built in place on an explicit stack of frames. A frame knows
//! where its value goes, whether it owns that storage, and how far it got,
//! so a failure anywhere unwinds the stack dropping exactly what was
//! initialized and releasing every temporary.

use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use std::collections::HashSet;

use tessera_core::{
    ArrayDef, AssumeInitIntoFn, ConstTypeId, Def, EnumDef, Field, FreeUninitFn, ListDef, MapDef,
    NewIntoFn, OptionDef, PtrConst, PtrMut, PtrUninit, ScalarType, SetDef, Shape,
    SliceBuilderVTable, SmartPointerDef, StructDef, StructKind,
};
use tessera_realm::{ObjectId, Runtime, Value, ValueKind};
use tessera_reflect::{HeapSlot, ReflectError, write_discriminant};
use tracing::{debug, trace};

use crate::attrs::{AttributeResolver, DefaultSource, TagRepr};
use crate::{
    ConstructorRegistry, Error, ErrorKind, FieldPath, IdentityMap, Limit, Options, PathSegment,
    scalar,
};

/// Who frees a frame's storage
enum Owner {
    /// Storage inside the parent's value
    Borrowed,
    /// A temporary the parent moves the value out of
    Owned(HeapSlot),
}

/// Where fields are read from
enum FieldSource {
    /// Properties of an ordinary object
    Object(ObjectId),
    /// Elements of an array, for positional structs
    Elements(Vec<Value>),
}

struct FieldsState {
    /// Declares the fields, and their attributes
    container: &'static Shape,
    list: &'static [Field],
    source: FieldSource,
    /// Fields before this one are initialized
    next: usize,
}

enum State {
    Start,
    Fields(FieldsState),
    Transparent {
        field: &'static Field,
        done: bool,
    },
    List {
        def: ListDef,
        items: Vec<Value>,
        next: usize,
    },
    Array {
        def: ArrayDef,
        stride: usize,
        items: Vec<Value>,
        next: usize,
    },
    Map {
        def: MapDef,
        entries: Vec<(Value, Value)>,
        next: usize,
        key: Option<HeapSlot>,
    },
    Set {
        def: SetDef,
        items: Vec<Value>,
        next: usize,
    },
    Option {
        def: OptionDef,
    },
    /// Waiting for a pointee built in a temporary
    Wrap {
        new_into: NewIntoFn,
    },
    /// Building a pointee in storage reserved by the pointer
    Reserved {
        storage: PtrUninit<'static>,
        assume_init_into: AssumeInitIntoFn,
        free_uninit: FreeUninitFn,
    },
    Slice {
        pointer: SmartPointerDef,
        builder: PtrMut<'static>,
        vtable: &'static SliceBuilderVTable,
        item: &'static Shape,
        items: Vec<Value>,
        next: usize,
    },
    /// The destination holds a complete value
    Done,
}

struct Frame<'mem> {
    shape: &'static Shape,
    dst: PtrUninit<'mem>,
    owner: Owner,
    value: Value,
    segment: Option<PathSegment>,
    /// Set when the parent's object is offered again to a flattened field:
    /// the keys that the enclosing fields (and tag) already claim
    reoffer: Option<Rc<[&'static str]>>,
    /// Object marked as being built by this frame
    tracks: Option<ObjectId>,
    state: State,
}

struct Context<'r, 'c, 'mem, R: Runtime> {
    realm: &'r R,
    registry: Option<&'c ConstructorRegistry>,
    attrs: AttributeResolver,
    /// Pointees of shared pointers, by the object and pointer type they
    /// were built from
    identity: IdentityMap<PtrConst<'mem>, (ObjectId, ConstTypeId)>,
    /// Objects whose native value is still being built
    in_progress: HashSet<ObjectId>,
}

pub(crate) struct UnmarshalEngine<'r, 'c, 'mem, R: Runtime> {
    frames: Vec<Frame<'mem>>,
    ctx: Context<'r, 'c, 'mem, R>,
    options: Options,
    nodes: usize,
}

impl<'r, 'c, 'mem, R: Runtime> UnmarshalEngine<'r, 'c, 'mem, R> {
    pub(crate) fn new(
        realm: &'r R,
        registry: Option<&'c ConstructorRegistry>,
        options: Options,
    ) -> Self {
        Self {
            frames: Vec::new(),
            ctx: Context {
                realm,
                registry,
                attrs: AttributeResolver::new(),
                identity: IdentityMap::new(),
                in_progress: HashSet::new(),
            },
            options,
            nodes: 0,
        }
    }

    /// Writes the native value of `shape` converted from `value` into `dst`.
    /// On error, `dst` is left uninitialized.
    ///
    /// # Safety
    ///
    /// `dst` must be valid for writes of a value of `shape`.
    pub(crate) unsafe fn run(
        mut self,
        shape: &'static Shape,
        value: &Value,
        dst: PtrUninit<'mem>,
    ) -> Result<(), Error> {
        let root = Frame::new(shape, dst, Owner::Borrowed, value.clone(), None);
        if let Err((kind, root)) = self.push(root) {
            return Err(self.fail(kind, root.segment));
        }

        loop {
            let Some(top) = self.frames.last_mut() else {
                break;
            };
            if matches!(top.state, State::Done) {
                let Some(child) = self.frames.pop() else {
                    break;
                };
                if let Some(object) = child.tracks {
                    self.ctx.in_progress.remove(&object);
                }
                match self.frames.last_mut() {
                    Some(parent) => unsafe { parent.accept(child) },
                    None => break,
                }
                continue;
            }

            match unsafe { top.step(&mut self.ctx) } {
                Ok(None) => {}
                Ok(Some(child)) => {
                    if let Err((kind, child)) = self.push(child) {
                        return Err(self.fail(kind, child.segment));
                    }
                }
                Err(kind) => return Err(self.fail(kind, None)),
            }
        }

        debug!(
            nodes = self.nodes,
            shared = self.ctx.identity.len(),
            "unmarshalled {shape}"
        );
        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn push(&mut self, frame: Frame<'mem>) -> Result<(), (ErrorKind, Frame<'mem>)> {
        if self.frames.len() > self.options.max_depth {
            let limit = Limit::Depth(self.options.max_depth);
            return Err((ErrorKind::GraphTooLarge { limit }, frame));
        }
        self.nodes += 1;
        if self.nodes > self.options.max_nodes {
            let limit = Limit::Nodes(self.options.max_nodes);
            return Err((ErrorKind::GraphTooLarge { limit }, frame));
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Unwinds every frame, innermost first, and reports `kind`
    fn fail(&mut self, kind: ErrorKind, pending: Option<PathSegment>) -> Error {
        let path: FieldPath = self
            .frames
            .iter()
            .filter_map(|frame| frame.segment.clone())
            .chain(pending)
            .collect();
        debug!("unmarshal failed at {path}: {kind}");
        while let Some(frame) = self.frames.pop() {
            unsafe { frame.rollback() };
        }
        Error::new(kind, path)
    }
}

impl<'mem> Frame<'mem> {
    fn new(
        shape: &'static Shape,
        dst: PtrUninit<'mem>,
        owner: Owner,
        value: Value,
        segment: Option<PathSegment>,
    ) -> Self {
        Self {
            shape,
            dst,
            owner,
            value,
            segment,
            reoffer: None,
            tracks: None,
            state: State::Start,
        }
    }

    /// A frame building a value of `shape` in a fresh temporary
    fn temporary(
        shape: &'static Shape,
        value: Value,
        segment: Option<PathSegment>,
    ) -> Result<Self, ErrorKind> {
        let slot = HeapSlot::alloc(shape)?;
        let dst = slot.as_uninit();
        Ok(Self::new(shape, dst, Owner::Owned(slot), value, segment))
    }

    /// Takes the temporary of a finished frame, for the parent to move the
    /// value out of
    fn into_slot(self) -> Option<HeapSlot> {
        match self.owner {
            Owner::Owned(slot) => Some(slot),
            Owner::Borrowed => None,
        }
    }

    fn mismatch<R: Runtime>(&self, ctx: &Context<'_, '_, '_, R>, expected: &'static str) -> ErrorKind {
        ErrorKind::ShapeMismatch {
            shape: self.shape,
            expected,
            found: ctx.realm.kind_of(&self.value),
        }
    }

    /// Marks the object as being built here, so that a cycle leading back
    /// to it is caught instead of followed forever
    fn track<R: Runtime>(&mut self, ctx: &mut Context<'_, '_, '_, R>) -> Result<(), ErrorKind> {
        let Some(object) = self.value.as_object() else {
            return Ok(());
        };
        if self.reoffer.is_some() {
            return Ok(());
        }
        if !ctx.in_progress.insert(object) {
            return Err(ErrorKind::UnsupportedType {
                shape: self.shape,
                reason: "cyclic reference into a value that is not behind a shared pointer",
            });
        }
        self.tracks = Some(object);
        Ok(())
    }

    /// Whether an enclosing field of a re-offered object owns `key`
    fn claims(&self, key: &str) -> bool {
        self.reoffer
            .as_ref()
            .is_some_and(|claimed| claimed.iter().any(|name| *name == key))
    }

    /// Whether a re-offered object holds nothing beyond the keys the
    /// enclosing fields claim. A flattened `None` marshals to no keys at all.
    fn offers_nothing<R: Runtime>(&self, ctx: &Context<'_, '_, '_, R>) -> Result<bool, ErrorKind> {
        let (Some(_), Some(object)) = (&self.reoffer, self.value.as_object()) else {
            return Ok(false);
        };
        if ctx.realm.kind_of(&self.value) != ValueKind::Object {
            return Ok(false);
        }
        let entries = ctx.realm.own_entries(object)?;
        Ok(entries.iter().all(|(key, _)| self.claims(key)))
    }

    /// A child building from the same value as this frame, inheriting
    /// its re-offer
    fn same_value(&self, mut child: Frame<'mem>) -> Frame<'mem> {
        child.reoffer = self.reoffer.clone();
        child
    }

    /// Runs the invariant check of a value whose parts are all written
    unsafe fn finish(&mut self) -> Result<Option<Frame<'mem>>, ErrorKind> {
        if let Some(invariants) = self.shape.vtable.invariants {
            let value = unsafe { self.dst.assume_init() }.as_const();
            if !unsafe { invariants(value) } {
                return Err(ErrorKind::InvariantViolation { shape: self.shape });
            }
        }
        self.state = State::Done;
        Ok(None)
    }

    /// Advances by one step, possibly returning a child frame to run next
    unsafe fn step<R: Runtime>(
        &mut self,
        ctx: &mut Context<'_, '_, 'mem, R>,
    ) -> Result<Option<Frame<'mem>>, ErrorKind> {
        let shape = self.shape;
        match &mut self.state {
            State::Start => unsafe { self.begin(ctx) },
            State::Fields(fields) => {
                let (list, next) = (fields.list, fields.next);
                let Some(field) = list.get(next) else {
                    return unsafe { self.finish() };
                };
                let attrs = ctx.attrs.field(fields.container, field)?;
                let field_shape = field.shape();
                let dst = unsafe { self.dst.field_uninit_at(field.offset) };

                let (value, segment) = match &fields.source {
                    FieldSource::Object(object) if attrs.flatten => {
                        let claimed =
                            ctx.claimed_keys(fields.container, list, self.reoffer.as_deref())?;
                        let mut child = Frame::new(
                            field_shape,
                            dst,
                            Owner::Borrowed,
                            Value::Object(*object),
                            Some(PathSegment::Field(field.name)),
                        );
                        child.reoffer = Some(claimed);
                        return Ok(Some(child));
                    }
                    FieldSource::Object(object) => (
                        ctx.realm.get(*object, field.name)?.unwrap_or(Value::Undefined),
                        PathSegment::Field(field.name),
                    ),
                    FieldSource::Elements(items) => (
                        items.get(next).cloned().unwrap_or(Value::Undefined),
                        PathSegment::Index(next),
                    ),
                };

                if !matches!(value, Value::Undefined) {
                    return Ok(Some(Frame::new(
                        field_shape,
                        dst,
                        Owner::Borrowed,
                        value,
                        Some(segment),
                    )));
                }
                let default = match attrs.default {
                    Some(DefaultSource::Custom(default)) => default,
                    Some(DefaultSource::TypeDefault) => field_shape
                        .vtable
                        .default_in_place
                        .ok_or(ErrorKind::InvalidAttribute {
                            shape: fields.container,
                            attribute: "default",
                        })?,
                    None => {
                        return Err(ErrorKind::MissingRequiredField {
                            shape: fields.container,
                            field: field.name,
                        });
                    }
                };
                trace!("default for {}.{}", fields.container, field.name);
                unsafe { default(dst) };
                fields.next += 1;
                Ok(None)
            }
            State::Transparent { done: true, .. } => unsafe { self.finish() },
            State::List { def, items, next } => match items.get(*next) {
                Some(item) => Frame::temporary(def.t, item.clone(), Some(PathSegment::Index(*next)))
                    .map(Some),
                None => {
                    self.state = State::Done;
                    Ok(None)
                }
            },
            State::Array {
                def,
                stride,
                items,
                next,
            } => match items.get(*next) {
                Some(item) => Ok(Some(Frame::new(
                    def.t,
                    unsafe { self.dst.field_uninit_at(*next * *stride) },
                    Owner::Borrowed,
                    item.clone(),
                    Some(PathSegment::Index(*next)),
                ))),
                None => {
                    self.state = State::Done;
                    Ok(None)
                }
            },
            State::Map {
                def,
                entries,
                next,
                key,
            } => {
                let Some((key_value, value)) = entries.get(*next) else {
                    self.state = State::Done;
                    return Ok(None);
                };
                match key {
                    None => {
                        scalar::check_key(ctx.realm, shape, key_value)?;
                        Frame::temporary(
                            def.k,
                            key_value.clone(),
                            Some(PathSegment::MapKey(*next)),
                        )
                        .map(Some)
                    }
                    Some(_) => Frame::temporary(
                        def.v,
                        value.clone(),
                        Some(PathSegment::MapValue(*next)),
                    )
                    .map(Some),
                }
            }
            State::Set { def, items, next } => {
                let Some(item) = items.get(*next) else {
                    self.state = State::Done;
                    return Ok(None);
                };
                if matches!(def.t.def, Def::Scalar(_)) {
                    scalar::check_key(ctx.realm, shape, item)?;
                }
                Frame::temporary(def.t, item.clone(), Some(PathSegment::Index(*next))).map(Some)
            }
            State::Slice {
                pointer,
                builder,
                vtable,
                item,
                items,
                next,
            } => {
                if let Some(value) = items.get(*next) {
                    return Frame::temporary(*item, value.clone(), Some(PathSegment::Index(*next)))
                        .map(Some);
                }
                let (pointer, builder, convert_into) = (*pointer, *builder, vtable.convert_into_fn);
                let built = unsafe { convert_into(builder, self.dst) };
                self.state = State::Done;
                if let (true, Some(object)) = (pointer.is_shared(), self.value.as_object()) {
                    let pointee = unsafe { borrow_pointee(shape, pointer, built.as_const()) }?;
                    ctx.register_shared(object, shape, pointee)?;
                }
                Ok(None)
            }
            State::Transparent { .. }
            | State::Option { .. }
            | State::Wrap { .. }
            | State::Reserved { .. }
            | State::Done => Err(ErrorKind::IdentityConflict {
                detail: format!("{shape} resumed before its child completed"),
            }),
        }
    }

    /// Takes in a finished child, moving its value where it belongs
    unsafe fn accept(&mut self, child: Frame<'mem>) {
        let item = unsafe { child.dst.assume_init() };
        let slot = child.into_slot();
        match &mut self.state {
            State::Fields(fields) => fields.next += 1,
            State::Transparent { done, .. } => *done = true,
            State::Array { next, .. } => *next += 1,
            State::List { def, next, .. } => {
                unsafe { (def.vtable.push)(self.dst.assume_init(), item) };
                *next += 1;
            }
            State::Set { def, next, .. } => {
                unsafe { (def.vtable.insert)(self.dst.assume_init(), item) };
                *next += 1;
            }
            State::Slice { builder, vtable, next, .. } => {
                unsafe { (vtable.push_fn)(*builder, item) };
                *next += 1;
            }
            State::Map { def, next, key, .. } => match key.take() {
                None => {
                    // the key waits for its value; dropping it must drop the key
                    if let Some(mut slot) = slot {
                        unsafe { slot.assume_init() };
                        *key = Some(slot);
                    }
                    return;
                }
                Some(mut key_slot) => {
                    unsafe {
                        (def.vtable.insert)(self.dst.assume_init(), key_slot.as_mut(), item);
                        key_slot.mark_moved();
                    }
                    *next += 1;
                }
            },
            State::Option { def } => {
                let init_some = def.vtable.init_some;
                unsafe { init_some(self.dst, item) };
                self.state = State::Done;
            }
            State::Wrap { new_into } => {
                let new_into = *new_into;
                unsafe { new_into(self.dst, item) };
                self.state = State::Done;
            }
            State::Reserved {
                storage,
                assume_init_into,
                ..
            } => {
                let (storage, assume_init_into) = (*storage, *assume_init_into);
                unsafe { assume_init_into(storage, self.dst) };
                self.state = State::Done;
            }
            State::Start | State::Done => {}
        }
        // the value was moved out; the temporary only needs freeing
        drop(slot);
    }

    unsafe fn begin<R: Runtime>(
        &mut self,
        ctx: &mut Context<'_, '_, 'mem, R>,
    ) -> Result<Option<Frame<'mem>>, ErrorKind> {
        let shape = self.shape;
        trace!(
            "unmarshal {shape} from {}",
            ctx.realm.kind_of(&self.value)
        );

        // a re-offered object is the parent's, not the pointee's
        let shared = match (shape.def, self.value.as_object()) {
            (Def::SmartPointer(def), Some(object)) if def.is_shared() && self.reoffer.is_none() => {
                Some((def, object))
            }
            _ => None,
        };
        if let Some((def, object)) = shared {
            if let Some(pointee) = ctx.identity.lookup_dynamic(&(object, shape.id)) {
                let share_into = def
                    .vtable
                    .share_into_fn
                    .ok_or(ReflectError::MissingVTableEntry {
                        shape,
                        entry: "share_into_fn",
                    })?;
                unsafe { share_into(pointee, self.dst) };
                self.state = State::Done;
                return Ok(None);
            }
        }

        let hook = ctx
            .registry
            .and_then(|registry| registry.get(shape.id))
            .and_then(|constructor| constructor.unmarshal.as_ref());
        if let Some(hook) = hook {
            let realm: &dyn Runtime = ctx.realm;
            hook(realm, &self.value, self.dst).map_err(|err| {
                ErrorKind::CustomConstructorFailure {
                    shape,
                    message: err.0,
                }
            })?;
            self.state = State::Done;
            if let Some((def, object)) = shared {
                let this = unsafe { self.dst.assume_init() }.as_const();
                let pointee = unsafe { borrow_pointee(shape, def, this) }?;
                ctx.register_shared(object, shape, pointee)?;
            }
            return Ok(None);
        }

        match shape.def {
            Def::Scalar(scalar) => {
                unsafe { scalar::unmarshal(ctx.realm, &self.value, shape, scalar, self.dst) }?;
                self.state = State::Done;
                Ok(None)
            }
            Def::Option(def) => {
                if self.value.is_nullish() || self.offers_nothing(ctx)? {
                    unsafe { (def.vtable.init_none)(self.dst) };
                    self.state = State::Done;
                    return Ok(None);
                }
                let child = self.same_value(Frame::temporary(def.t, self.value.clone(), None)?);
                self.state = State::Option { def };
                Ok(Some(child))
            }
            Def::SmartPointer(def) => self.begin_pointer(ctx, def),
            Def::Struct(def) => unsafe { self.begin_struct(ctx, def) },
            Def::Enum(def) => unsafe { self.begin_enum(ctx, def) },
            Def::List(def) => {
                let items = ctx.sequence(shape, &self.value, false)?;
                self.track(ctx)?;
                unsafe { (def.vtable.init_in_place_with_capacity)(self.dst, items.len()) };
                self.state = State::List {
                    def,
                    items,
                    next: 0,
                };
                Ok(None)
            }
            Def::Array(def) => {
                let items = ctx.sequence(shape, &self.value, false)?;
                if items.len() != def.n {
                    return Err(self.mismatch(ctx, "an array of matching length"));
                }
                let stride = def
                    .t
                    .layout
                    .sized_layout()
                    .map_err(|_| ReflectError::Unsized { shape: def.t })?
                    .size();
                self.track(ctx)?;
                self.state = State::Array {
                    def,
                    stride,
                    items,
                    next: 0,
                };
                Ok(None)
            }
            Def::Slice(_) => Err(ErrorKind::UnsupportedType {
                shape,
                reason: "slices can only be built behind a pointer",
            }),
            Def::Map(def) => {
                match def.k.def {
                    Def::Scalar(key) if !key.is_float() => {}
                    _ => {
                        return Err(ErrorKind::UnsupportedType {
                            shape,
                            reason: "map keys must be integers, strings or other non-float scalars",
                        });
                    }
                }
                let found = ctx.realm.kind_of(&self.value);
                let entries = match (found, self.value.as_object()) {
                    (ValueKind::Map, Some(object)) => ctx.realm.map_entries(object)?,
                    (ValueKind::Object, Some(object))
                        if matches!(def.k.def, Def::Scalar(ScalarType::String)) =>
                    {
                        ctx.realm
                            .own_entries(object)?
                            .into_iter()
                            .filter(|(key, _)| !self.claims(key))
                            .map(|(key, value)| (Value::String(key), value))
                            .collect()
                    }
                    _ => return Err(self.mismatch(ctx, "a Map")),
                };
                self.track(ctx)?;
                unsafe { (def.vtable.init_in_place_with_capacity)(self.dst, entries.len()) };
                self.state = State::Map {
                    def,
                    entries,
                    next: 0,
                    key: None,
                };
                Ok(None)
            }
            Def::Set(def) => {
                let items = ctx.sequence(shape, &self.value, true)?;
                self.track(ctx)?;
                unsafe { (def.vtable.init_in_place_with_capacity)(self.dst, items.len()) };
                self.state = State::Set {
                    def,
                    items,
                    next: 0,
                };
                Ok(None)
            }
        }
    }

    fn begin_pointer<R: Runtime>(
        &mut self,
        ctx: &mut Context<'_, '_, 'mem, R>,
        def: SmartPointerDef,
    ) -> Result<Option<Frame<'mem>>, ErrorKind> {
        let shape = self.shape;
        let vtable = def.vtable;
        let pointee = def.pointee.ok_or(ErrorKind::UnsupportedType {
            shape,
            reason: "the pointee is opaque",
        })?;

        if let Def::Slice(slice) = pointee.def {
            let builder_vtable = vtable.slice_builder_vtable.ok_or(ErrorKind::UnsupportedType {
                shape,
                reason: "this pointer cannot be built from items",
            })?;
            let items = ctx.sequence(shape, &self.value, false)?;
            self.track(ctx)?;
            self.state = State::Slice {
                pointer: def,
                builder: (builder_vtable.new_fn)(),
                vtable: builder_vtable,
                item: slice.t,
                items,
                next: 0,
            };
            return Ok(None);
        }

        if !def.is_inline() {
            if let (Some(new_uninit), Some(assume_init_into), Some(free_uninit)) = (
                vtable.new_uninit_fn,
                vtable.assume_init_into_fn,
                vtable.free_uninit_fn,
            ) {
                let storage = new_uninit();
                self.state = State::Reserved {
                    storage,
                    assume_init_into,
                    free_uninit,
                };
                // registered before the pointee is built, so that cycles
                // back to this object share the reservation
                let shared = def.is_shared() && self.reoffer.is_none();
                if let (true, Some(object)) = (shared, self.value.as_object()) {
                    let reserved = unsafe { PtrConst::from_raw(storage.as_byte_ptr()) };
                    ctx.register_shared(object, shape, reserved)?;
                }
                return Ok(Some(self.same_value(Frame::new(
                    pointee,
                    storage,
                    Owner::Borrowed,
                    self.value.clone(),
                    None,
                ))));
            }
        }

        let new_into = vtable.new_into_fn.ok_or(ErrorKind::UnsupportedType {
            shape,
            reason: "this pointer cannot be constructed",
        })?;
        let child = self.same_value(Frame::temporary(pointee, self.value.clone(), None)?);
        self.state = State::Wrap { new_into };
        Ok(Some(child))
    }

    unsafe fn begin_struct<R: Runtime>(
        &mut self,
        ctx: &mut Context<'_, '_, 'mem, R>,
        def: StructDef,
    ) -> Result<Option<Frame<'mem>>, ErrorKind> {
        let shape = self.shape;
        if ctx.attrs.container(shape)?.transparent {
            let [field] = def.fields else {
                return Err(ErrorKind::UnsupportedType {
                    shape,
                    reason: "a transparent struct needs exactly one field",
                });
            };
            self.state = State::Transparent { field, done: false };
            return Ok(Some(self.same_value(Frame::new(
                field.shape(),
                unsafe { self.dst.field_uninit_at(field.offset) },
                Owner::Borrowed,
                self.value.clone(),
                None,
            ))));
        }

        let found = ctx.realm.kind_of(&self.value);
        if def.kind == StructKind::Unit {
            if !self.value.is_nullish() && found != ValueKind::Object {
                return Err(self.mismatch(ctx, "null"));
            }
            return unsafe { self.finish() };
        }

        let source = match (found, self.value.as_object()) {
            (ValueKind::Array, Some(object)) if def.is_positional() => {
                let items = ctx.realm.elements(object)?;
                if items.len() != def.fields.len() {
                    return Err(self.mismatch(ctx, "an array of matching length"));
                }
                FieldSource::Elements(items.into_owned())
            }
            (ValueKind::Object, Some(object)) if !def.is_positional() => {
                FieldSource::Object(object)
            }
            _ if def.is_positional() => return Err(self.mismatch(ctx, "an array")),
            _ => return Err(self.mismatch(ctx, "an object")),
        };
        self.track(ctx)?;
        self.state = State::Fields(FieldsState {
            container: shape,
            list: def.fields,
            source,
            next: 0,
        });
        Ok(None)
    }

    unsafe fn begin_enum<R: Runtime>(
        &mut self,
        ctx: &mut Context<'_, '_, 'mem, R>,
        def: EnumDef,
    ) -> Result<Option<Frame<'mem>>, ErrorKind> {
        let shape = self.shape;
        let attrs = ctx.attrs.container(shape)?;

        let object = match self.value.as_object() {
            Some(object) if !def.is_unit_only() => {
                if ctx.realm.kind_of(&self.value) != ValueKind::Object {
                    return Err(self.mismatch(ctx, "an object"));
                }
                Some(object)
            }
            _ => None,
        };
        let tag = match object {
            Some(object) => ctx
                .realm
                .get(object, attrs.tag)?
                .ok_or(ErrorKind::MissingRequiredField {
                    shape,
                    field: attrs.tag,
                })?,
            // all-unit enums are the tag itself; so are unit variants given bare
            None => self.value.clone(),
        };

        let variant = match (attrs.repr, &tag) {
            (TagRepr::String, Value::String(name)) => def.variant_named(name),
            (TagRepr::Number, Value::Number(n)) if n.fract() == 0.0 => {
                def.variant_with_discriminant(*n as i64)
            }
            _ => None,
        };
        let Some(variant) = variant else {
            return Err(ErrorKind::ShapeMismatch {
                shape,
                expected: match attrs.repr {
                    TagRepr::String => "a variant name",
                    TagRepr::Number => "a variant discriminant",
                },
                found: ctx.realm.kind_of(&tag),
            });
        };
        if object.is_none() && !variant.data.fields.is_empty() {
            return Err(self.mismatch(ctx, "an object"));
        }
        if variant.data.field(attrs.tag).is_some() {
            return Err(ErrorKind::ClobberedTypeTag {
                shape,
                tag: attrs.tag,
            });
        }

        self.track(ctx)?;
        unsafe { write_discriminant(self.dst, def.repr, variant.discriminant) };
        self.state = State::Fields(FieldsState {
            container: shape,
            list: variant.data.fields,
            source: match object {
                Some(object) => FieldSource::Object(object),
                None => FieldSource::Elements(Vec::new()),
            },
            next: 0,
        });
        Ok(None)
    }

    /// Drops whatever this frame initialized and releases what it reserved
    unsafe fn rollback(self) {
        let dst = self.dst;
        match self.state {
            State::Start | State::Option { .. } | State::Wrap { .. } => {}
            State::Fields(fields) => {
                for field in &fields.list[..fields.next] {
                    unsafe { drop_value(field.shape(), dst.field_uninit_at(field.offset)) };
                }
            }
            State::Transparent { field, done } => {
                if done {
                    unsafe { drop_value(field.shape(), dst.field_uninit_at(field.offset)) };
                }
            }
            State::Array {
                def, stride, next, ..
            } => {
                for index in 0..next {
                    unsafe { drop_value(def.t, dst.field_uninit_at(index * stride)) };
                }
            }
            // collections own what was inserted so far; a pending key is
            // dropped with its slot
            State::List { .. } | State::Map { .. } | State::Set { .. } | State::Done => unsafe {
                drop_value(self.shape, dst)
            },
            State::Slice {
                builder, vtable, ..
            } => unsafe { (vtable.free_fn)(builder) },
            State::Reserved {
                storage,
                free_uninit,
                ..
            } => unsafe { free_uninit(storage) },
        }
    }
}

impl<'mem, R: Runtime> Context<'_, '_, 'mem, R> {
    /// Items of an array or typed array, or of a `Set` when `sets` holds
    fn sequence(
        &self,
        shape: &'static Shape,
        value: &Value,
        sets: bool,
    ) -> Result<Vec<Value>, ErrorKind> {
        let found = self.realm.kind_of(value);
        match (found, value.as_object()) {
            (ValueKind::Array, Some(object)) => Ok(self.realm.elements(object)?.into_owned()),
            (ValueKind::TypedArray(_), Some(object)) => {
                let array = self.realm.typed_array(object)?;
                Ok((0..array.len()).filter_map(|index| array.get(index)).collect())
            }
            (ValueKind::Set, Some(object)) if sets => Ok(self.realm.set_items(object)?),
            _ => Err(ErrorKind::ShapeMismatch {
                shape,
                expected: if sets { "a Set or an array" } else { "an array" },
                found,
            }),
        }
    }

    /// Keys a flattened field of `container` must leave to its siblings:
    /// the names of the fields that are not flattened, the tag property of
    /// an enum, and whatever an enclosing flatten already claimed
    fn claimed_keys(
        &mut self,
        container: &'static Shape,
        fields: &'static [Field],
        inherited: Option<&[&'static str]>,
    ) -> Result<Rc<[&'static str]>, ErrorKind> {
        let mut claimed: Vec<&'static str> = inherited.map(<[_]>::to_vec).unwrap_or_default();
        if let Def::Enum(_) = container.def {
            claimed.push(self.attrs.container(container)?.tag);
        }
        for field in fields {
            if !self.attrs.field(container, field)?.flatten {
                claimed.push(field.name);
            }
        }
        Ok(claimed.into())
    }

    /// Lets later references to `object` as a `shape` share `pointee`
    fn register_shared(
        &mut self,
        object: ObjectId,
        shape: &'static Shape,
        pointee: PtrConst<'mem>,
    ) -> Result<(), ErrorKind> {
        trace!(?object, "sharing {shape}");
        self.identity.register(pointee, (object, shape.id))
    }
}

/// # Safety
///
/// `this` must point to an initialized pointer of `shape`.
unsafe fn borrow_pointee<'mem>(
    shape: &'static Shape,
    def: SmartPointerDef,
    this: PtrConst<'mem>,
) -> Result<PtrConst<'mem>, ErrorKind> {
    let borrow = def.vtable.borrow_fn.ok_or(ReflectError::MissingVTableEntry {
        shape,
        entry: "borrow_fn",
    })?;
    Ok(unsafe { borrow(this) }.ok_or(ReflectError::BorrowConflict { shape })?)
}

unsafe fn drop_value(shape: &'static Shape, ptr: PtrUninit<'_>) {
    if let Some(drop_in_place) = shape.vtable.drop_in_place {
        unsafe { drop_in_place(ptr.assume_init()) };
    }
}
