#![deny(missing_docs)]

//! Embedded, in-memory object store with composable predicate queries.
//!
//! Object types are declared up front as a [`Schema`]. Data is read through
//! [`Snapshot`]s and written through a single [`WriteTransaction`] at a time.
//! [`Query`] builds predicates property by property (typed comparisons, text
//! matching, link tests, `not`/`or`/grouping) and either counts matches or
//! freezes into lazily evaluated [`Results`]. [`LinkList`] proxies the ordered
//! link lists stored on objects.
//!
//! ```
//! use ember::{DescriptorOrdering, ObjectSchema, PropertyType, ReadContext, Schema, DB};
//!
//! let person = ObjectSchema::builder("Person")
//!     .property("name", PropertyType::String)
//!     .property("age", PropertyType::Int)
//!     .build()?;
//! let mut db = DB::open(Schema::new([person])?)?;
//!
//! let mut txn = db.begin_write()?;
//! for (name, age) in [("Ann", 30), ("Bo", 20), ("Cy", 40)] {
//!     let object = txn.create_object("Person")?;
//!     object.set(&mut txn, 0, name)?;
//!     object.set(&mut txn, 1, age as i64)?;
//! }
//! txn.commit();
//!
//! let snapshot = db.snapshot();
//! let mut query = snapshot.query("Person")?;
//! query.greater(1, 25i64)?;
//! assert_eq!(query.count(&snapshot)?, 2);
//!
//! let results = query.create_results(&snapshot, &DescriptorOrdering::new().sort(1, true))?;
//! assert_eq!(results.get_value(0, 0)?.as_str(), Some("Ann"));
//! # Ok::<(), ember::EmberError>(())
//! ```

mod observability;

mod db;
mod error;
mod list;
mod mvcc;
mod object;
mod option;
mod query;
mod results;
mod schema;
mod snapshot;
mod table;
mod transaction;
mod value;

pub use ember_predicate::{
    ComparisonOp, Decimal, ObjKey, ObjectId, Predicate, ScalarKind, ScalarValue, Timestamp,
};

pub use crate::{
    db::{Group, DB},
    error::{EmberError, ErrorKind, Result},
    list::LinkList,
    mvcc::{CommitClock, Version},
    object::Object,
    option::{DbOption, DEFAULT_DB_NAME},
    query::{Descriptor, DescriptorOrdering, Query, SortKey},
    results::Results,
    schema::{ColumnResolver, ObjectSchema, ObjectSchemaBuilder, Property, PropertyType, Schema},
    snapshot::{ReadContext, Snapshot},
    table::{Cell, Table},
    transaction::WriteTransaction,
    value::PrimitiveValue,
};
