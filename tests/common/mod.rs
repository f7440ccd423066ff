//! Shared fixtures for integration tests.
#![allow(dead_code)]

use ember::{Object, ObjectSchema, PropertyType, ReadContext, Schema, WriteTransaction, DB};

pub const ID: usize = 0;
pub const NAME: usize = 1;
pub const AGE: usize = 2;
pub const DOG: usize = 3;
pub const DOGS: usize = 4;
pub const NICKNAME: usize = 5;
pub const VERIFIED: usize = 6;

pub const DOG_NAME: usize = 0;

/// Installs a fmt subscriber honouring `RUST_LOG`; safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn schema() -> Schema {
    let person = ObjectSchema::builder("Person")
        .property("id", PropertyType::Int)
        .property("name", PropertyType::String)
        .nullable("age", PropertyType::Int)
        .link("dog", "Dog")
        .list("dogs", "Dog")
        .nullable("nickname", PropertyType::String)
        .property("verified", PropertyType::Bool)
        .build()
        .expect("person schema");
    let dog = ObjectSchema::builder("Dog")
        .property("name", PropertyType::String)
        .build()
        .expect("dog schema");
    Schema::new([person, dog]).expect("schema")
}

pub fn open() -> DB {
    init_tracing();
    DB::open(schema()).expect("open db")
}

pub fn add_person(
    txn: &mut WriteTransaction<'_>,
    id: i64,
    name: &str,
    age: Option<i64>,
) -> Object {
    let person = txn.create_object("Person").expect("create person");
    person.set(txn, ID, id).expect("id");
    person.set(txn, NAME, name).expect("name");
    person.set(txn, AGE, age).expect("age");
    person
}

pub fn add_dog(txn: &mut WriteTransaction<'_>, name: &str) -> Object {
    let dog = txn.create_object("Dog").expect("create dog");
    dog.set(txn, DOG_NAME, name).expect("dog name");
    dog
}

/// Ann (30), Bo (20) and Cy (40) with ids 1, 2 and 3.
pub fn people() -> DB {
    let mut db = open();
    let mut txn = db.begin_write().expect("writable");
    add_person(&mut txn, 1, "Ann", Some(30));
    add_person(&mut txn, 2, "Bo", Some(20));
    add_person(&mut txn, 3, "Cy", Some(40));
    txn.commit();
    db
}

pub fn ids(results: &ember::Results) -> Vec<i64> {
    (0..results.len().expect("len"))
        .map(|index| match results.get_value(index, ID).expect("id") {
            ember::ScalarValue::Int(id) => id,
            other => panic!("unexpected id {other}"),
        })
        .collect()
}

pub fn dog_names(ctx: &impl ReadContext, list: &ember::LinkList) -> Vec<String> {
    (0..list.size(ctx).expect("size"))
        .map(|index| {
            let dog = list.get(ctx, index).expect("in range");
            dog.get(ctx, DOG_NAME)
                .expect("name")
                .as_str()
                .expect("string")
                .to_owned()
        })
        .collect()
}
