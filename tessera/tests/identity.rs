mod fixtures;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use fixtures::*;
use tessera::{ConstructorRegistry, ErrorKind, Marshaller, marshal, unmarshal};
use tessera_realm::{Realm, Value};

fn point(realm: &mut Realm, x: f64, y: f64) -> Value {
    let id = realm.create_object();
    realm.set_property(id, "x", Value::Number(x)).unwrap();
    realm.set_property(id, "y", Value::Number(y)).unwrap();
    Value::Object(id)
}

#[tessera_testhelpers::test]
fn shared_pointers_marshal_to_one_object() {
    let mut realm = Realm::new();
    let p = Rc::new(Point { x: 1, y: 2 });
    let pair = Pair {
        left: p.clone(),
        right: p,
    };
    let value = marshal(&mut realm, &pair).unwrap();
    insta::assert_snapshot!(
        realm.inspect(&value),
        @"{ left: { x: 1, y: 2 }, right: { x: 1, y: 2 } }"
    );

    let object = value.as_object().unwrap();
    let left = realm.get(object, "left").unwrap().unwrap();
    let right = realm.get(object, "right").unwrap().unwrap();
    assert_eq!(left, right);

    // equal but distinct values stay distinct
    let pair = Pair {
        left: Rc::new(Point { x: 1, y: 2 }),
        right: Rc::new(Point { x: 1, y: 2 }),
    };
    let value = marshal(&mut realm, &pair).unwrap();
    let object = value.as_object().unwrap();
    assert_ne!(
        realm.get(object, "left").unwrap(),
        realm.get(object, "right").unwrap()
    );
}

#[tessera_testhelpers::test]
fn shared_objects_unmarshal_to_one_allocation() {
    let mut realm = Realm::new();
    let shared = point(&mut realm, 3.0, 4.0);
    let other = point(&mut realm, 3.0, 4.0);
    let list = Value::Object(realm.create_array(vec![shared.clone(), shared.clone(), other]));

    let points: Vec<Rc<Point>> = unmarshal(&realm, &list).unwrap();
    assert!(Rc::ptr_eq(&points[0], &points[1]));
    assert!(!Rc::ptr_eq(&points[0], &points[2]));
    assert_eq!(Rc::strong_count(&points[0]), 2);

    let points: Vec<Arc<Point>> = unmarshal(&realm, &list).unwrap();
    assert!(Arc::ptr_eq(&points[0], &points[1]));

    // without a shared pointer, each reference gets its own copy
    let points: Vec<Point> = unmarshal(&realm, &list).unwrap();
    assert_eq!(points, vec![Point { x: 3, y: 4 }; 3]);
}

#[tessera_testhelpers::test]
fn shared_slices() {
    let mut realm = Realm::new();
    let bytes: Rc<[u8]> = Rc::from(vec![1, 2]);
    let value = marshal(&mut realm, &(bytes.clone(), bytes)).unwrap();
    insta::assert_snapshot!(realm.inspect(&value), @"[ [ 1, 2 ], [ 1, 2 ] ]");

    let (a, b): (Rc<[u8]>, Rc<[u8]>) = unmarshal(&realm, &value).unwrap();
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(&*a, &[1, 2]);
}

fn ring() -> Rc<RefCell<Node>> {
    let a = Rc::new(RefCell::new(Node {
        name: "a".into(),
        next: None,
    }));
    let b = Rc::new(RefCell::new(Node {
        name: "b".into(),
        next: Some(a.clone()),
    }));
    a.borrow_mut().next = Some(b);
    a
}

fn unlink(node: &Rc<RefCell<Node>>) {
    let next = node.borrow_mut().next.take();
    if let Some(next) = next {
        next.borrow_mut().next = None;
    }
}

#[tessera_testhelpers::test]
fn cycles_round_trip() {
    let mut realm = Realm::new();
    let a = ring();
    let value = marshal(&mut realm, &a).unwrap();
    unlink(&a);
    insta::assert_snapshot!(
        realm.inspect(&value),
        @"{ name: 'a', next: { name: 'b', next: [Circular] } }"
    );

    let back: Rc<RefCell<Node>> = unmarshal(&realm, &value).unwrap();
    let b = back.borrow().next.clone().unwrap();
    assert_eq!(b.borrow().name, "b");
    let again = b.borrow().next.clone().unwrap();
    assert!(Rc::ptr_eq(&back, &again));
    drop((b, again));
    unlink(&back);
    assert_eq!(Rc::strong_count(&back), 1);
}

#[tessera_testhelpers::test]
fn self_references() {
    let mut realm = Realm::new();
    let node = realm.create_object();
    realm.set_property(node, "name", "me".into()).unwrap();
    realm.set_property(node, "next", Value::Object(node)).unwrap();

    let me: Rc<RefCell<Node>> = unmarshal(&realm, &Value::Object(node)).unwrap();
    let next = me.borrow().next.clone().unwrap();
    assert!(Rc::ptr_eq(&me, &next));
    drop(next);
    unlink(&me);
}

#[tessera_testhelpers::test]
fn cycles_need_a_shared_pointer() {
    let mut realm = Realm::new();
    let node = realm.create_object();
    realm.set_property(node, "name", "a".into()).unwrap();
    realm.set_property(node, "next", Value::Object(node)).unwrap();

    let err = unmarshal::<Chain>(&realm, &Value::Object(node)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "at next: unsupported type Chain: cyclic reference into a value that is not behind a shared pointer"
    );

    let chain = Chain {
        name: "a".into(),
        next: Some(Box::new(Chain {
            name: "b".into(),
            next: None,
        })),
    };
    let value = marshal(&mut realm, &chain).unwrap();
    insta::assert_snapshot!(
        realm.inspect(&value),
        @"{ name: 'a', next: { name: 'b', next: null } }"
    );
    let back: Chain = unmarshal(&realm, &value).unwrap();
    assert_eq!(back.next.unwrap().name, "b");
}

#[tessera_testhelpers::test]
fn hooks_replace_the_default_rules() {
    let mut registry = ConstructorRegistry::new();
    registry
        .marshal_with::<Point, _>(|_realm, p| Ok(format!("{},{}", p.x, p.y).into()))
        .unmarshal_with::<Point, _>(|_realm, value| {
            let text = value.as_str().ok_or("not a string")?;
            let (x, y) = text.split_once(',').ok_or("no comma")?;
            let coord = |s: &str| s.parse::<i32>().map_err(|err| err.to_string());
            Ok(Point {
                x: coord(x)?,
                y: coord(y)?,
            })
        });
    let marshaller = Marshaller::new().with_registry(&registry);

    let mut realm = Realm::new();
    let points = vec![Point { x: 1, y: 2 }, Point { x: -3, y: 0 }];
    let value = marshaller.marshal(&mut realm, &points).unwrap();
    insta::assert_snapshot!(realm.inspect(&value), @"[ '1,2', '-3,0' ]");
    assert_eq!(marshaller.unmarshal::<Vec<Point>>(&realm, &value).unwrap(), points);

    let bad = Value::Object(realm.create_array(vec!["1,2".into(), Value::Number(5.0)]));
    let err = marshaller.unmarshal::<Vec<Point>>(&realm, &bad).unwrap_err();
    assert_eq!(
        err.to_string(),
        "at [1]: constructor for Point failed: not a string"
    );
    assert!(matches!(err.kind, ErrorKind::CustomConstructorFailure { .. }));
}

#[tessera_testhelpers::test]
fn hook_results_keep_their_identity() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut registry = ConstructorRegistry::new();
    registry.marshal_with::<Point, _>(move |realm, p| {
        counter.set(counter.get() + 1);
        let list = realm.create_array(vec![Value::Number(p.x.into()), Value::Number(p.y.into())]);
        Ok(Value::Object(list))
    });

    let mut realm = Realm::new();
    let p = Rc::new(Point { x: 5, y: 6 });
    let pair = Pair {
        left: p.clone(),
        right: p,
    };
    let value = Marshaller::new()
        .with_registry(&registry)
        .marshal(&mut realm, &pair)
        .unwrap();
    insta::assert_snapshot!(realm.inspect(&value), @"{ left: [ 5, 6 ], right: [ 5, 6 ] }");
    assert_eq!(calls.get(), 1);
}

#[tessera_testhelpers::test]
fn prototypes() {
    let mut realm = Realm::new();
    let proto = realm.create_object();
    realm.set_property(proto, "kind", "point".into()).unwrap();

    let mut registry = ConstructorRegistry::new();
    registry.with_prototype::<Point>(proto);

    let value = Marshaller::new()
        .with_registry(&registry)
        .marshal(&mut realm, &Point { x: 1, y: 2 })
        .unwrap();
    insta::assert_snapshot!(realm.inspect(&value), @"{ x: 1, y: 2 }");

    let object = value.as_object().unwrap();
    assert_eq!(realm.prototype_of(object).unwrap(), Some(proto));
    assert_eq!(realm.get(object, "kind").unwrap(), Some("point".into()));

    // the default rules still read such objects back
    assert_eq!(
        unmarshal::<Point>(&realm, &value).unwrap(),
        Point { x: 1, y: 2 }
    );
}

#[tessera_testhelpers::test]
fn shells_are_only_for_containers() {
    let mut realm = Realm::new();
    let proto = realm.create_object();
    let mut registry = ConstructorRegistry::new();
    registry.with_prototype::<u32>(proto);

    let err = Marshaller::new()
        .with_registry(&registry)
        .marshal(&mut realm, &Item {
            name: "x".into(),
            qty: 1,
        })
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "at qty: unsupported type u32: scalars cannot be built into a shell"
    );
}
