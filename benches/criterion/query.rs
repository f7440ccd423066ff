use std::iter::repeat_with;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ember::{DescriptorOrdering, ObjectSchema, PropertyType, ReadContext, Schema, DB};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const NAME: usize = 0;
const AGE: usize = 1;

fn populate(rows: usize) -> DB {
    let person = ObjectSchema::builder("Person")
        .property("name", PropertyType::String)
        .nullable("age", PropertyType::Int)
        .build()
        .unwrap();
    let mut db = DB::open(Schema::new([person]).unwrap()).unwrap();
    let mut txn = db.begin_write().unwrap();
    for _ in 0..rows {
        let person = txn.create_object("Person").unwrap();
        let name: String = repeat_with(fastrand::alphanumeric).take(16).collect();
        person.set(&mut txn, NAME, name).unwrap();
        let age = (fastrand::u8(..) % 10 != 0).then(|| fastrand::i64(0..100));
        person.set(&mut txn, AGE, age).unwrap();
    }
    txn.commit();
    db
}

fn count(c: &mut Criterion) {
    let mut group = c.benchmark_group("count");

    for rows in [1_000, 100_000] {
        let db = populate(rows);
        let snapshot = db.snapshot();

        group.bench_with_input(BenchmarkId::new("age_range", rows), &rows, |b, _| {
            let mut query = snapshot.query("Person").unwrap();
            query.greater(AGE, 25i64).unwrap();
            query.less_equal(AGE, 60i64).unwrap();
            b.iter(|| query.count(&snapshot).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("name_like", rows), &rows, |b, _| {
            let mut query = snapshot.query("Person").unwrap();
            query.string_like(NAME, "a*?z*", false).unwrap();
            b.iter(|| query.count(&snapshot).unwrap());
        });
    }
    group.finish();
}

fn sorted_results(c: &mut Criterion) {
    let mut group = c.benchmark_group("results");

    for rows in [1_000, 100_000] {
        let db = populate(rows);
        let snapshot = db.snapshot();
        let ordering = DescriptorOrdering::new().sort(AGE, true).limit(100);

        group.bench_with_input(BenchmarkId::new("sort_limit", rows), &rows, |b, _| {
            b.iter(|| {
                let mut query = snapshot.query("Person").unwrap();
                query.null_not_equal(AGE).unwrap();
                let results = query.create_results(&snapshot, &ordering).unwrap();
                results.len().unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, count, sorted_results);
criterion_main!(benches);
