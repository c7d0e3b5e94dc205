use divan::{Bencher, black_box};
use std::collections::BTreeMap;
use tessera_realm::Realm;

#[path = "../tests/fixtures/mod.rs"]
mod fixtures;
use fixtures::*;

fn main() {
    divan::main();
}

fn inventory(items: usize) -> Inventory {
    Inventory {
        owner: "bench".into(),
        items: (0..items)
            .map(|i| Item {
                name: format!("item-{i}"),
                qty: i as u32,
            })
            .collect(),
        discount: Percent(15),
    }
}

fn catalog(entries: usize) -> Catalog {
    Catalog {
        stock: (0..entries).map(|i| (format!("sku-{i}"), i as u32)).collect(),
        ids: (0..entries).map(|i| i as u16).collect(),
        by_id: BTreeMap::new(),
    }
}

// --- Wide values --------------------------------------------------------------------------

#[divan::bench(args = [16, 256, 4096])]
fn marshal_wide(bencher: Bencher, items: usize) {
    let value = inventory(items);
    bencher.bench_local(|| {
        let mut realm = Realm::new();
        black_box(tessera::marshal(&mut realm, black_box(&value)).unwrap());
    });
}

#[divan::bench(args = [16, 256, 4096])]
fn unmarshal_wide(bencher: Bencher, items: usize) {
    let mut realm = Realm::new();
    let value = tessera::marshal(&mut realm, &inventory(items)).unwrap();
    bencher.bench_local(|| {
        black_box(tessera::unmarshal::<Inventory>(&realm, black_box(&value)).unwrap());
    });
}

#[divan::bench(args = [16, 256, 4096])]
fn round_trip_maps(bencher: Bencher, entries: usize) {
    let value = catalog(entries);
    bencher.bench_local(|| {
        let mut realm = Realm::new();
        let dynamic = tessera::marshal(&mut realm, black_box(&value)).unwrap();
        black_box(tessera::unmarshal::<Catalog>(&realm, &dynamic).unwrap());
    });
}

// --- Nested values ------------------------------------------------------------------------

fn chain(depth: usize) -> Chain {
    let mut chain = Chain {
        name: "leaf".into(),
        next: None,
    };
    for i in 0..depth {
        chain = Chain {
            name: format!("link-{i}"),
            next: Some(Box::new(chain)),
        };
    }
    chain
}

#[divan::bench(args = [8, 128, 400])]
fn marshal_nested(bencher: Bencher, depth: usize) {
    let value = chain(depth);
    bencher.bench_local(|| {
        let mut realm = Realm::new();
        black_box(tessera::marshal(&mut realm, black_box(&value)).unwrap());
    });
}

#[divan::bench(args = [8, 128, 400])]
fn unmarshal_nested(bencher: Bencher, depth: usize) {
    let mut realm = Realm::new();
    let value = tessera::marshal(&mut realm, &chain(depth)).unwrap();
    bencher.bench_local(|| {
        black_box(tessera::unmarshal::<Chain>(&realm, black_box(&value)).unwrap());
    });
}
