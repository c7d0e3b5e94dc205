use tessera_realm::{BigInt, Realm, Value};

#[tessera_testhelpers::test]
fn nested_structures() {
    let mut realm = Realm::new();
    let tags = realm.create_set();
    realm.set_add(tags, "a".into()).unwrap();
    realm.set_add(tags, "a".into()).unwrap();
    realm.set_add(tags, Value::BigInt(BigInt::from(-7i64))).unwrap();

    let scores = realm.create_map();
    realm
        .map_insert(scores, Value::Number(1.0), Value::Bool(false))
        .unwrap();

    let list = realm.create_array(vec![Value::Null, Value::Undefined]);

    let root = realm.create_object();
    realm.set_property(root, "type", "Point".into()).unwrap();
    realm.set_property(root, "tags", Value::Object(tags)).unwrap();
    realm.set_property(root, "scores", Value::Object(scores)).unwrap();
    realm.set_property(root, "list", Value::Object(list)).unwrap();
    realm.set_property(root, "odd key", "it's".into()).unwrap();

    insta::assert_snapshot!(
        realm.inspect(&Value::Object(root)),
        @"{ type: 'Point', tags: Set(2) { 'a', -7n }, scores: Map(1) { 1 => false }, list: [ null, undefined ], 'odd key': 'it\\'s' }"
    );
}

#[tessera_testhelpers::test]
fn cycles_and_shared_references() {
    let mut realm = Realm::new();
    let node = realm.create_object();
    let leaf = realm.create_array(vec![]);
    realm.set_property(node, "self", Value::Object(node)).unwrap();
    realm.set_property(node, "a", Value::Object(leaf)).unwrap();
    realm.set_property(node, "b", Value::Object(leaf)).unwrap();

    insta::assert_snapshot!(
        realm.inspect(&Value::Object(node)),
        @"{ self: [Circular], a: [], b: [] }"
    );
}
