//! Types shared by the integration tests, with hand-written shapes.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tessera_core::{
    Def, EnumDef, EnumRepr, Field, FieldAttribute, PtrConst, Shape, ShapeAttribute, Shaped,
    StructDef, StructKind, ValueVTable, Variant, field,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

unsafe impl Shaped for Point {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Point")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const { [field!(Point, x: i32), field!(Point, y: i32)] },
            )))
            .build()
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(u8)]
pub enum Color {
    Red,
    Green,
    Blue,
}

unsafe impl Shaped for Color {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Color")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Enum(EnumDef::new(
                EnumRepr::U8,
                &const {
                    [
                        Variant::unit("Red", 0),
                        Variant::unit("Green", 1),
                        Variant::unit("Blue", 2),
                    ]
                },
            )))
            .build()
    };
}

/// Unit-only, tagged by discriminant
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(u8)]
pub enum Level {
    Low = 1,
    High = 5,
}

unsafe impl Shaped for Level {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Level")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .attributes(&const { [ShapeAttribute::Arbitrary("js_enum_repr = \"number\"")] })
            .def(Def::Enum(EnumDef::new(
                EnumRepr::U8,
                &const { [Variant::unit("Low", 1), Variant::unit("High", 5)] },
            )))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum Figure {
    Dot { x: i32, y: i32 } = 0,
    Circle { r: f64 } = 1,
    Segment(i32, i32) = 2,
    Empty = 3,
}

#[repr(C)]
struct FigureDot {
    tag: u8,
    x: i32,
    y: i32,
}

#[repr(C)]
struct FigureCircle {
    tag: u8,
    r: f64,
}

#[repr(C)]
struct FigureSegment(u8, i32, i32);

unsafe impl Shaped for Figure {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Figure")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Enum(EnumDef::new(
                EnumRepr::U8,
                &const {
                    [
                        Variant::with_data(
                            "Dot",
                            0,
                            StructDef::new(
                                StructKind::Struct,
                                &const {
                                    [field!(FigureDot, x: i32), field!(FigureDot, y: i32)]
                                },
                            ),
                        ),
                        Variant::with_data(
                            "Circle",
                            1,
                            StructDef::new(
                                StructKind::Struct,
                                &const { [field!(FigureCircle, r: f64)] },
                            ),
                        ),
                        Variant::with_data(
                            "Segment",
                            2,
                            StructDef::new(
                                StructKind::TupleStruct,
                                &const {
                                    [
                                        Field {
                                            name: "0",
                                            shape: || i32::SHAPE,
                                            offset: core::mem::offset_of!(FigureSegment, 1),
                                            attributes: &[],
                                            doc: &[],
                                        },
                                        Field {
                                            name: "1",
                                            shape: || i32::SHAPE,
                                            offset: core::mem::offset_of!(FigureSegment, 2),
                                            attributes: &[],
                                            doc: &[],
                                        },
                                    ]
                                },
                            ),
                        ),
                        Variant::unit("Empty", 3),
                    ]
                },
            )))
            .build()
    };
}

/// Data-carrying, tagged by `kind` with discriminants
#[derive(Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum Event {
    Click { x: i32 } = 7,
    Close = 9,
}

#[repr(C)]
struct EventClick {
    tag: u8,
    x: i32,
}

unsafe impl Shaped for Event {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Event")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .attributes(&const {
                [
                    ShapeAttribute::Arbitrary("js_enum_tag = \"kind\""),
                    ShapeAttribute::Arbitrary("js_enum_repr = \"number\""),
                ]
            })
            .def(Def::Enum(EnumDef::new(
                EnumRepr::U8,
                &const {
                    [
                        Variant::with_data(
                            "Click",
                            7,
                            StructDef::new(
                                StructKind::Struct,
                                &const { [field!(EventClick, x: i32)] },
                            ),
                        ),
                        Variant::unit("Close", 9),
                    ]
                },
            )))
            .build()
    };
}

/// A variant field named like the tag property
#[derive(Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum Clash {
    Labeled { r#type: String },
    Plain,
}

#[repr(C)]
struct ClashLabeled {
    tag: u8,
    r#type: String,
}

unsafe impl Shaped for Clash {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Clash")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Enum(EnumDef::new(
                EnumRepr::U8,
                &const {
                    [
                        Variant::with_data(
                            "Labeled",
                            0,
                            StructDef::new(
                                StructKind::Struct,
                                &const {
                                    [Field {
                                        name: "type",
                                        shape: || String::SHAPE,
                                        offset: core::mem::offset_of!(ClashLabeled, r#type),
                                        attributes: &[],
                                        doc: &[],
                                    }]
                                },
                            ),
                        ),
                        Variant::unit("Plain", 1),
                    ]
                },
            )))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct Meta {
    pub id: u32,
    pub tags: Vec<String>,
}

unsafe impl Shaped for Meta {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Meta")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const { [field!(Meta, id: u32), field!(Meta, tags: Vec<String>)] },
            )))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub name: String,
    pub meta: Meta,
}

unsafe impl Shaped for Record {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Record")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(Record, name: String),
                        field!(Record, meta: Meta, FieldAttribute::Flatten),
                    ]
                },
            )))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct OptionalMeta {
    pub name: String,
    pub meta: Option<Meta>,
}

unsafe impl Shaped for OptionalMeta {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("OptionalMeta")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(OptionalMeta, name: String),
                        field!(OptionalMeta, meta: Option<Meta>, FieldAttribute::Flatten),
                    ]
                },
            )))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoxedMeta {
    pub name: String,
    pub meta: Box<Meta>,
}

unsafe impl Shaped for BoxedMeta {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("BoxedMeta")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(BoxedMeta, name: String),
                        field!(BoxedMeta, meta: Box<Meta>, FieldAttribute::Flatten),
                    ]
                },
            )))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct SharedMeta {
    pub name: String,
    pub meta: Rc<Meta>,
}

unsafe impl Shaped for SharedMeta {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("SharedMeta")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(SharedMeta, name: String),
                        field!(SharedMeta, meta: Rc<Meta>, FieldAttribute::Flatten),
                    ]
                },
            )))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct Extras {
    pub name: String,
    pub extra: BTreeMap<String, u32>,
}

unsafe impl Shaped for Extras {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Extras")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(Extras, name: String),
                        field!(Extras, extra: BTreeMap<String, u32>, FieldAttribute::Flatten),
                    ]
                },
            )))
            .build()
    };
}

/// Flattens a struct that itself flattens a map
#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    pub title: String,
    pub extras: Extras,
}

unsafe impl Shaped for Sheet {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Sheet")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(Sheet, title: String),
                        field!(Sheet, extras: Extras, FieldAttribute::Flatten),
                    ]
                },
            )))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub name: String,
    pub retries: u32,
    pub verbose: bool,
    pub level: Option<Level>,
}

unsafe fn is_zero(value: PtrConst<'_>) -> bool {
    unsafe { *value.get::<u32>() == 0 }
}

unsafe impl Shaped for Config {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Config")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(Config, name: String),
                        field!(
                            Config,
                            retries: u32,
                            FieldAttribute::SkipSerializingIf(is_zero),
                            FieldAttribute::Default(None)
                        ),
                        field!(Config, verbose: bool, FieldAttribute::Arbitrary("default")),
                        field!(Config, level: Option<Level>),
                    ]
                },
            )))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub words: Vec<u16>,
    pub names: Vec<String>,
}

unsafe impl Shaped for Blob {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Blob")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(Blob, bytes: Vec<u8>, FieldAttribute::TypedArray),
                        field!(Blob, words: Vec<u16>),
                        field!(Blob, names: Vec<String>, FieldAttribute::Arbitrary("typed_array")),
                    ]
                },
            )))
            .build()
    };
}

#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub next: Option<Rc<RefCell<Node>>>,
}

unsafe impl Shaped for Node {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Node")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(Node, name: String),
                        field!(Node, next: Option<Rc<RefCell<Node>>>),
                    ]
                },
            )))
            .build()
    };
}

/// A node that owns its successor, so it cannot be cyclic
#[derive(Debug)]
pub struct Chain {
    pub name: String,
    pub next: Option<Box<Chain>>,
}

unsafe impl Shaped for Chain {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Chain")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(Chain, name: String),
                        field!(Chain, next: Option<Box<Chain>>),
                    ]
                },
            )))
            .build()
    };
}

#[derive(Debug)]
pub struct Pair {
    pub left: Rc<Point>,
    pub right: Rc<Point>,
}

unsafe impl Shaped for Pair {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Pair")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const { [field!(Pair, left: Rc<Point>), field!(Pair, right: Rc<Point>)] },
            )))
            .build()
    };
}

thread_local! {
    static DROPPED: Cell<usize> = const { Cell::new(0) };
}

/// Number of [`Tracked`] values dropped on this thread so far
pub fn dropped() -> usize {
    DROPPED.with(Cell::get)
}

#[derive(Debug, PartialEq)]
pub struct Tracked {
    pub id: u32,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        DROPPED.with(|dropped| dropped.set(dropped.get() + 1));
    }
}

unsafe impl Shaped for Tracked {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Tracked")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const { [field!(Tracked, id: u32)] },
            )))
            .build()
    };
}

#[derive(Debug)]
pub struct Batch {
    pub first: Tracked,
    pub items: Vec<Tracked>,
    pub by_name: BTreeMap<String, Tracked>,
    pub shared: Rc<Tracked>,
    pub pair: [Tracked; 2],
    pub count: u8,
}

unsafe impl Shaped for Batch {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Batch")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(Batch, first: Tracked),
                        field!(Batch, items: Vec<Tracked>),
                        field!(Batch, by_name: BTreeMap<String, Tracked>),
                        field!(Batch, shared: Rc<Tracked>),
                        field!(Batch, pair: [Tracked; 2]),
                        field!(Batch, count: u8),
                    ]
                },
            )))
            .build()
    };
}

/// A percentage, never above 100
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Percent(pub u8);

unsafe fn at_most_100(value: PtrConst<'_>) -> bool {
    unsafe { value.get::<Percent>().0 <= 100 }
}

unsafe impl Shaped for Percent {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Percent")
            .vtable(&const { ValueVTable::builder::<Self>().invariants(at_most_100).build() })
            .attributes(&const { [ShapeAttribute::Transparent] })
            .def(Def::Struct(StructDef::new(
                StructKind::TupleStruct,
                &const { [field!(Percent, 0: u8)] },
            )))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub name: String,
    pub qty: u32,
}

unsafe impl Shaped for Item {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Item")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const { [field!(Item, name: String), field!(Item, qty: u32)] },
            )))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct Inventory {
    pub owner: String,
    pub items: Vec<Item>,
    pub discount: Percent,
}

unsafe impl Shaped for Inventory {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Inventory")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(Inventory, owner: String),
                        field!(Inventory, items: Vec<Item>),
                        field!(Inventory, discount: Percent),
                    ]
                },
            )))
            .build()
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker;

unsafe impl Shaped for Marker {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Marker")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::UNIT))
            .build()
    };
}

/// A tuple struct, marshalled as an array
#[derive(Clone, Debug, PartialEq)]
pub struct Span(pub u32, pub u32);

unsafe impl Shaped for Span {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Span")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::TupleStruct,
                &const { [field!(Span, 0: u32), field!(Span, 1: u32)] },
            )))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    pub stock: BTreeMap<String, u32>,
    pub ids: BTreeSet<u16>,
    pub by_id: BTreeMap<u64, String>,
}

unsafe impl Shaped for Catalog {
    const SHAPE: &'static Shape = &const {
        Shape::builder_for_sized::<Self>()
            .type_identifier("Catalog")
            .vtable(&const { ValueVTable::builder::<Self>().build() })
            .def(Def::Struct(StructDef::new(
                StructKind::Struct,
                &const {
                    [
                        field!(Catalog, stock: BTreeMap<String, u32>),
                        field!(Catalog, ids: BTreeSet<u16>),
                        field!(Catalog, by_id: BTreeMap<u64, String>),
                    ]
                },
            )))
            .build()
    };
}
