//! Database handle and the committed table group.

use std::{collections::BTreeMap, sync::Arc};

use ember_predicate::ObjKey;

use crate::{
    error::{EmberError, Result},
    mvcc::{CommitClock, Version},
    observability::{log_debug, log_info},
    option::DbOption,
    schema::Schema,
    snapshot::Snapshot,
    table::Table,
    transaction::WriteTransaction,
};

/// All tables of one database state.
///
/// Tables are shared between states and copied on first write, so taking a
/// snapshot or starting a transaction never copies rows.
#[derive(Clone, Debug, Default)]
pub struct Group {
    schema: Arc<Schema>,
    tables: BTreeMap<Arc<str>, Arc<Table>>,
}

impl Group {
    pub(crate) fn new(schema: Arc<Schema>) -> Self {
        let tables = schema
            .objects()
            .map(|object| (object.name_arc(), Arc::new(Table::new(Arc::clone(object)))))
            .collect();
        Self { schema, tables }
    }

    /// Schema every table in the group was built from.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Looks up the table storing `object_type`.
    pub fn table(&self, object_type: &str) -> Result<&Table> {
        self.tables
            .get(object_type)
            .map(Arc::as_ref)
            .ok_or_else(|| EmberError::ObjectTypeNotFound(object_type.to_owned()))
    }

    pub(crate) fn table_mut(&mut self, object_type: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(object_type)
            .map(Arc::make_mut)
            .ok_or_else(|| EmberError::ObjectTypeNotFound(object_type.to_owned()))
    }

    /// Removes an object and every link pointing at it.
    pub(crate) fn remove_object(&mut self, object_type: &str, key: ObjKey) -> Result<()> {
        let table = self.table_mut(object_type)?;
        if !table.remove_object(key) {
            return Err(EmberError::ObjectNotFound {
                object_type: table.schema().name_arc(),
                key,
            });
        }
        for table in self.tables.values_mut() {
            let links_here = table
                .schema()
                .properties()
                .iter()
                .any(|property| property.object_type() == Some(object_type));
            if links_here {
                let removed = Arc::make_mut(table).unlink(object_type, key);
                if removed > 0 {
                    log_debug!(
                        component = "db",
                        event = "links_removed",
                        object_type = object_type,
                        key = %key,
                        source_table = table.schema().name(),
                        removed,
                    );
                }
            }
        }
        Ok(())
    }
}

/// Handle to one in-memory database.
///
/// Readers work on [`Snapshot`]s; writers go through a single
/// [`WriteTransaction`] at a time, enforced by `begin_write(&mut self)`.
#[derive(Debug)]
pub struct DB {
    option: DbOption,
    committed: Arc<Group>,
    clock: CommitClock,
    version: Version,
}

impl DB {
    /// Opens an empty database with one table per object type in the schema.
    pub fn open(option: impl Into<DbOption>) -> Result<Self> {
        let option = option.into();
        let group = Group::new(Arc::new(option.schema.clone()));
        log_info!(
            component = "db",
            event = "db_opened",
            name = option.display_name(),
            object_types = group.tables.len(),
            schema_version = option.schema_version,
            read_only = option.read_only,
        );
        Ok(Self {
            option,
            committed: Arc::new(group),
            clock: CommitClock::default(),
            version: Version::MIN,
        })
    }

    /// Display name the database was opened with.
    pub fn name(&self) -> &str {
        &self.option.name
    }

    /// Schema of the database.
    pub fn schema(&self) -> &Schema {
        &self.option.schema
    }

    /// Schema version recorded in the [`DbOption`].
    pub fn schema_version(&self) -> u64 {
        self.option.schema_version
    }

    /// True when opened read-only.
    pub fn is_read_only(&self) -> bool {
        self.option.read_only
    }

    /// Version of the most recent commit.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Captures the committed state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(Arc::clone(&self.committed), self.version)
    }

    /// Starts the only write transaction this handle can have open.
    pub fn begin_write(&mut self) -> Result<WriteTransaction<'_>> {
        if self.option.read_only {
            log_debug!(
                component = "db",
                event = "write_rejected",
                name = self.option.display_name(),
            );
            return Err(EmberError::ReadOnly(self.option.name.clone()));
        }
        let working = Arc::clone(&self.committed);
        let base = self.version;
        log_debug!(
            component = "transaction",
            event = "transaction_begun",
            base_version = %base,
        );
        Ok(WriteTransaction::new(self, working, base))
    }

    pub(crate) fn committed(&self) -> &Arc<Group> {
        &self.committed
    }

    pub(crate) fn publish(&mut self, group: Arc<Group>) -> Version {
        let version = self.clock.next();
        self.committed = group;
        self.version = version;
        version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        schema::{ObjectSchema, PropertyType},
        snapshot::ReadContext,
    };

    fn schema() -> Schema {
        Schema::new([
            ObjectSchema::builder("Person")
                .property("name", PropertyType::String)
                .link("dog", "Dog")
                .list("dogs", "Dog")
                .build()
                .expect("person"),
            ObjectSchema::builder("Dog")
                .property("name", PropertyType::String)
                .build()
                .expect("dog"),
        ])
        .expect("schema")
    }

    #[test]
    fn commits_advance_the_version() {
        let mut db = DB::open(schema()).expect("open");
        assert_eq!(db.version(), Version::MIN);

        let mut txn = db.begin_write().expect("writable");
        txn.create_object("Dog").expect("dog");
        let version = txn.commit();
        assert_eq!(version, Version::new(1));
        assert_eq!(db.version(), version);
        assert_eq!(db.snapshot().group().table("Dog").expect("table").len(), 1);
    }

    #[test]
    fn snapshots_do_not_see_later_commits() {
        let mut db = DB::open(schema()).expect("open");
        let before = db.snapshot();
        let mut txn = db.begin_write().expect("writable");
        txn.create_object("Dog").expect("dog");
        txn.commit();

        assert!(before.group().table("Dog").expect("table").is_empty());
        assert_eq!(before.version(), Version::MIN);
    }

    #[test]
    fn dropped_transactions_roll_back() {
        let mut db = DB::open(schema()).expect("open");
        {
            let mut txn = db.begin_write().expect("writable");
            txn.create_object("Dog").expect("dog");
        }
        assert!(db.snapshot().group().table("Dog").expect("table").is_empty());
        assert_eq!(db.version(), Version::MIN);
    }

    #[test]
    fn read_only_databases_reject_writes() {
        let mut db = DB::open(DbOption::from(schema()).read_only(true)).expect("open");
        let err = db.begin_write().expect_err("read only");
        assert_eq!(err.kind(), ErrorKind::Transaction);
    }

    #[test]
    fn removing_an_object_clears_links_to_it() {
        let mut db = DB::open(schema()).expect("open");
        let mut txn = db.begin_write().expect("writable");
        let dog = txn.create_object("Dog").expect("dog");
        let person = txn.create_object("Person").expect("person");
        person.set_link(&mut txn, 1, &dog).expect("link");
        person
            .link_list(&txn, 2)
            .expect("list")
            .append(&mut txn, &dog)
            .expect("append");

        txn.remove_object(&dog).expect("remove");
        assert!(person.get_link(&txn, 1).expect("link").is_none());
        assert_eq!(person.link_list(&txn, 2).expect("list").size(&txn).expect("size"), 0);
        assert!(txn.remove_object(&dog).is_err());
    }
}
