mod fixtures;

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use fixtures::*;
use tessera::{ErrorKind, Marshaller, Options, PathSegment, marshal, unmarshal};
use tessera_core::Shaped;
use tessera_realm::{BigInt, Realm, TypedArray, Value};

/// An ordinary object with the given properties
fn object(realm: &mut Realm, props: &[(&str, Value)]) -> Value {
    let id = realm.create_object();
    for (key, value) in props {
        realm.set_property(id, *key, value.clone()).unwrap();
    }
    Value::Object(id)
}

fn round_trip<T: Shaped + PartialEq + core::fmt::Debug>(value: T) {
    let mut realm = Realm::new();
    let dynamic = marshal(&mut realm, &value).unwrap();
    let back: T = unmarshal(&realm, &dynamic).unwrap();
    assert_eq!(back, value, "through {}", realm.inspect(&dynamic));
}

#[tessera_testhelpers::test]
fn values_survive_a_round_trip() {
    round_trip(Point { x: -1, y: 7 });
    round_trip(Span(1, 2));
    round_trip(Marker);
    round_trip((3u8, String::from("three")));
    round_trip(vec![Color::Red, Color::Blue]);
    round_trip([Level::High, Level::Low]);
    round_trip(Figure::Dot { x: 1, y: 2 });
    round_trip(Figure::Circle { r: 0.25 });
    round_trip(Figure::Segment(-4, 4));
    round_trip(Figure::Empty);
    round_trip(Event::Click { x: 9 });
    round_trip(Event::Close);
    round_trip(Some(Some(Point { x: 0, y: 0 })));
    round_trip((u64::MAX, i128::MIN, -5i64));
    round_trip(Record {
        name: "r".into(),
        meta: Meta {
            id: 2,
            tags: vec!["x".into(), "y".into()],
        },
    });
    round_trip(Blob {
        bytes: vec![0, 255],
        words: vec![1, 2],
        names: vec![],
    });
    round_trip(Catalog {
        stock: BTreeMap::from([("nuts".to_string(), 40)]),
        ids: BTreeSet::from([3, 1, 2]),
        by_id: BTreeMap::from([(1 << 40, "big".to_string())]),
    });
    round_trip(Inventory {
        owner: "bo".into(),
        items: vec![Item {
            name: "nail".into(),
            qty: 100,
        }],
        discount: Percent(10),
    });
}

#[tessera_testhelpers::test]
fn integers_must_fit() {
    let realm = Realm::new();
    assert_eq!(unmarshal::<u8>(&realm, &Value::Number(255.0)).unwrap(), 255);
    assert_eq!(unmarshal::<i64>(&realm, &Value::Number(-2.0)).unwrap(), -2);
    assert_eq!(
        unmarshal::<u64>(&realm, &Value::BigInt(BigInt::from(u64::MAX))).unwrap(),
        u64::MAX
    );

    let err = unmarshal::<u8>(&realm, &Value::Number(300.0)).unwrap_err();
    assert_eq!(err.to_string(), "300 is out of range for u8");
    let err = unmarshal::<u32>(&realm, &Value::Number(-1.0)).unwrap_err();
    assert_eq!(err.to_string(), "-1 is out of range for u32");
    let err = unmarshal::<i8>(&realm, &Value::BigInt(BigInt::from(128i64))).unwrap_err();
    assert_eq!(err.to_string(), "128n is out of range for i8");
    let err = unmarshal::<u32>(&realm, &Value::Number(1.5)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot turn a number into u32: expected an integer"
    );
}

#[tessera_testhelpers::test]
fn errors_point_at_the_offending_value() {
    let mut realm = Realm::new();
    let bolt = object(
        &mut realm,
        &[("name", "bolt".into()), ("qty", Value::Number(1.0))],
    );
    let broken = object(
        &mut realm,
        &[("name", Value::Number(3.0)), ("qty", Value::Number(1.0))],
    );
    let items = Value::Object(realm.create_array(vec![bolt, broken]));
    let inventory = object(
        &mut realm,
        &[
            ("owner", "ana".into()),
            ("items", items),
            ("discount", Value::Number(5.0)),
        ],
    );

    let err = unmarshal::<Inventory>(&realm, &inventory).unwrap_err();
    assert_eq!(
        err.to_string(),
        "at items[1].name: cannot turn a number into String: expected a string"
    );
    assert_eq!(
        err.path.segments(),
        &[
            PathSegment::Field("items"),
            PathSegment::Index(1),
            PathSegment::Field("name"),
        ]
    );
}

#[tessera_testhelpers::test]
fn invariants_are_checked() {
    let mut realm = Realm::new();
    let items = Value::Object(realm.create_array(vec![]));
    let inventory = object(
        &mut realm,
        &[
            ("owner", "ana".into()),
            ("items", items),
            ("discount", Value::Number(150.0)),
        ],
    );
    let err = unmarshal::<Inventory>(&realm, &inventory).unwrap_err();
    assert_eq!(err.to_string(), "at discount: invariants of Percent do not hold");

    assert_eq!(
        unmarshal::<Percent>(&realm, &Value::Number(100.0)).unwrap(),
        Percent(100)
    );
}

#[tessera_testhelpers::test]
fn missing_fields_and_defaults() {
    let mut realm = Realm::new();

    let config = object(&mut realm, &[("name", "x".into()), ("level", Value::Null)]);
    assert_eq!(
        unmarshal::<Config>(&realm, &config).unwrap(),
        Config {
            name: "x".into(),
            retries: 0,
            verbose: false,
            level: None,
        }
    );

    // `undefined` counts as absent
    let config = object(
        &mut realm,
        &[
            ("name", "x".into()),
            ("retries", Value::Undefined),
            ("level", Value::Number(1.0)),
        ],
    );
    assert_eq!(
        unmarshal::<Config>(&realm, &config).unwrap().level,
        Some(Level::Low)
    );

    let config = object(&mut realm, &[("name", "x".into())]);
    let err = unmarshal::<Config>(&realm, &config).unwrap_err();
    assert_eq!(err.to_string(), "missing required field `level` of Config");
    assert!(err.path.is_root());

    let point = object(&mut realm, &[("x", Value::Number(1.0))]);
    let err = unmarshal::<Point>(&realm, &point).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::MissingRequiredField { field: "y", .. }
    ));
}

#[tessera_testhelpers::test]
fn flattened_fields_read_from_the_parent() {
    let mut realm = Realm::new();
    let tags = Value::Object(realm.create_array(vec!["t".into()]));
    let record = object(
        &mut realm,
        &[
            ("name", "n".into()),
            ("id", Value::Number(8.0)),
            ("tags", tags),
        ],
    );
    assert_eq!(
        unmarshal::<Record>(&realm, &record).unwrap(),
        Record {
            name: "n".into(),
            meta: Meta {
                id: 8,
                tags: vec!["t".into()],
            },
        }
    );

    let record = object(&mut realm, &[("name", "n".into()), ("id", Value::Number(8.0))]);
    let err = unmarshal::<Record>(&realm, &record).unwrap_err();
    assert_eq!(err.to_string(), "at meta: missing required field `tags` of Meta");
}

#[tessera_testhelpers::test]
fn flattened_wrappers_round_trip() {
    let meta = || Meta {
        id: 1,
        tags: vec!["t".into()],
    };
    round_trip(OptionalMeta {
        name: "a".into(),
        meta: Some(meta()),
    });
    round_trip(OptionalMeta {
        name: "a".into(),
        meta: None,
    });
    round_trip(BoxedMeta {
        name: "a".into(),
        meta: Box::new(meta()),
    });
    round_trip(SharedMeta {
        name: "a".into(),
        meta: Rc::new(meta()),
    });
}

#[tessera_testhelpers::test]
fn flattened_maps_leave_sibling_keys_alone() {
    round_trip(Extras {
        name: "x".into(),
        extra: BTreeMap::from([("a".to_string(), 1)]),
    });
    round_trip(Extras {
        name: "x".into(),
        extra: BTreeMap::new(),
    });
    // keys claimed by an enclosing struct stay out of a nested flatten too
    round_trip(Sheet {
        title: "t".into(),
        extras: Extras {
            name: "x".into(),
            extra: BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]),
        },
    });

    let mut realm = Realm::new();
    let extras = object(
        &mut realm,
        &[("name", "x".into()), ("size", "big".into())],
    );
    let err = unmarshal::<Extras>(&realm, &extras).unwrap_err();
    assert_eq!(
        err.to_string(),
        "at extra[value #0]: cannot turn a string into u32: expected a number or a bigint"
    );
}

#[tessera_testhelpers::test]
fn enum_tags() {
    let mut realm = Realm::new();
    assert_eq!(unmarshal::<Color>(&realm, &"Blue".into()).unwrap(), Color::Blue);
    assert_eq!(
        unmarshal::<Level>(&realm, &Value::Number(5.0)).unwrap(),
        Level::High
    );

    let err = unmarshal::<Color>(&realm, &"Purple".into()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot turn a string into Color: expected a variant name"
    );
    let err = unmarshal::<Level>(&realm, &"High".into()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot turn a string into Level: expected a variant discriminant"
    );

    // unit variants of data-carrying enums may be given bare
    assert_eq!(unmarshal::<Figure>(&realm, &"Empty".into()).unwrap(), Figure::Empty);
    let err = unmarshal::<Figure>(&realm, &"Dot".into()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot turn a string into Figure: expected an object"
    );

    let untagged = object(&mut realm, &[("x", Value::Number(1.0))]);
    let err = unmarshal::<Figure>(&realm, &untagged).unwrap_err();
    assert_eq!(err.to_string(), "missing required field `type` of Figure");

    let circle = object(&mut realm, &[("type", "Circle".into())]);
    let err = unmarshal::<Figure>(&realm, &circle).unwrap_err();
    assert_eq!(err.to_string(), "missing required field `r` of Figure");

    let click = object(
        &mut realm,
        &[("kind", Value::Number(7.0)), ("x", Value::Number(-3.0))],
    );
    assert_eq!(
        unmarshal::<Event>(&realm, &click).unwrap(),
        Event::Click { x: -3 }
    );

    let clash = object(
        &mut realm,
        &[("type", "Labeled".into())],
    );
    let err = unmarshal::<Clash>(&realm, &clash).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ClobberedTypeTag { tag: "type", .. }));
}

#[tessera_testhelpers::test]
fn shapes_must_match() {
    let mut realm = Realm::new();
    let short = Value::Object(realm.create_array(vec![Value::Number(1.0)]));

    let err = unmarshal::<Span>(&realm, &short).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot turn an array into Span: expected an array of matching length"
    );
    let err = unmarshal::<[u8; 2]>(&realm, &short).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot turn an array into [u8; 2]: expected an array of matching length"
    );
    let err = unmarshal::<Point>(&realm, &short).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot turn an array into Point: expected an object"
    );
    let err = unmarshal::<Marker>(&realm, &Value::Number(5.0)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot turn a number into Marker: expected null"
    );
    let err = unmarshal::<char>(&realm, &"ab".into()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot turn a string into char: expected a single-character string"
    );
    assert_eq!(unmarshal::<Option<u8>>(&realm, &Value::Undefined).unwrap(), None);
}

#[tessera_testhelpers::test]
fn maps_sets_and_typed_arrays() {
    let mut realm = Realm::new();

    // string-keyed maps accept ordinary objects
    let stock = object(
        &mut realm,
        &[("apples", Value::Number(3.0)), ("pears", Value::Number(0.0))],
    );
    let ids = realm.create_set();
    realm.set_add(ids, Value::Number(4.0)).unwrap();
    let by_id = realm.create_map();
    realm
        .map_insert(by_id, Value::Number(9.0), "nine".into())
        .unwrap();
    let catalog = object(
        &mut realm,
        &[
            ("stock", stock),
            ("ids", Value::Object(ids)),
            ("by_id", Value::Object(by_id)),
        ],
    );
    assert_eq!(
        unmarshal::<Catalog>(&realm, &catalog).unwrap(),
        Catalog {
            stock: BTreeMap::from([("apples".to_string(), 3), ("pears".to_string(), 0)]),
            ids: BTreeSet::from([4]),
            by_id: BTreeMap::from([(9, "nine".to_string())]),
        }
    );

    // sets may also come from arrays
    let array = Value::Object(realm.create_array(vec![Value::Number(2.0), Value::Number(2.0)]));
    assert_eq!(
        unmarshal::<BTreeSet<u16>>(&realm, &array).unwrap(),
        BTreeSet::from([2])
    );

    let bytes = Value::Object(realm.create_typed_array(TypedArray::Uint8(vec![5, 6])));
    assert_eq!(unmarshal::<Vec<u32>>(&realm, &bytes).unwrap(), vec![5, 6]);
}

#[tessera_testhelpers::test]
fn invalid_map_keys() {
    let mut realm = Realm::new();
    let map = realm.create_map();
    realm.map_insert(map, Value::Number(f64::NAN), "nan".into()).unwrap();
    let err = unmarshal::<BTreeMap<u64, String>>(&realm, &Value::Object(map)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "NaN cannot be used as a key of BTreeMap<u64, String>"
    );

    let map = realm.create_map();
    let key = realm.create_object();
    realm.map_insert(map, Value::Object(key), "obj".into()).unwrap();
    let err = unmarshal::<BTreeMap<String, String>>(&realm, &Value::Object(map)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidMapKey { ref key, .. } if key == "{}"));

    let set = realm.create_set();
    realm.set_add(set, Value::Number(0.5)).unwrap();
    let err = unmarshal::<BTreeSet<u8>>(&realm, &Value::Object(set)).unwrap_err();
    assert_eq!(err.to_string(), "0.5 cannot be used as a key of BTreeSet<u8>");

    let err = unmarshal::<BTreeMap<(u8, u8), u8>>(&realm, &Value::Object(map)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnsupportedType { .. }));
}

#[tessera_testhelpers::test]
fn depth_is_limited() {
    let mut realm = Realm::new();
    let innermost = Value::Object(realm.create_array(vec![Value::Number(1.0)]));
    let middle = Value::Object(realm.create_array(vec![innermost]));
    let outer = Value::Object(realm.create_array(vec![middle]));

    let err = Marshaller::new()
        .with_options(Options::new().max_depth(2))
        .unmarshal::<Vec<Vec<Vec<u8>>>>(&realm, &outer)
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::GraphTooLarge { .. }));

    let err = Marshaller::new()
        .with_options(Options::new().max_nodes(3))
        .unmarshal::<Vec<Vec<Vec<u8>>>>(&realm, &outer)
        .unwrap_err();
    assert_eq!(err.kind.to_string(), "value graph has more than 3 nodes");

    let nested = Marshaller::new()
        .unmarshal::<Vec<Vec<Vec<u8>>>>(&realm, &outer)
        .unwrap();
    assert_eq!(nested, vec![vec![vec![1]]]);
}
