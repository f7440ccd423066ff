use std::sync::Arc;

use ember_predicate::ObjKey;

use crate::{
    db::Group,
    error::{EmberError, Result},
    list::LinkList,
    mvcc::Version,
    object::Object,
    query::Query,
    schema::Schema,
};

/// Immutable view of the database as of one commit.
///
/// Cloning is cheap; clones share the underlying tables.
#[derive(Clone, Debug)]
pub struct Snapshot {
    group: Arc<Group>,
    version: Version,
    committed: bool,
}

impl Snapshot {
    pub(crate) fn new(group: Arc<Group>, version: Version) -> Self {
        Self {
            group,
            version,
            committed: true,
        }
    }

    /// Pins the working state of a transaction that diverged from `base`.
    pub(crate) fn uncommitted(group: Arc<Group>, base: Version) -> Self {
        Self {
            group,
            version: base,
            committed: false,
        }
    }

    /// False when the snapshot holds changes no commit has published.
    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

/// Anything queries and accessors can read from: a [`Snapshot`] or an open
/// [`WriteTransaction`](crate::WriteTransaction).
pub trait ReadContext {
    /// Tables visible to this context.
    fn group(&self) -> &Group;

    /// Version the visible state was committed under.
    fn version(&self) -> Version;

    /// Pins the visible state so it outlives this context.
    fn snapshot(&self) -> Snapshot;

    /// Schema of the visible tables.
    fn schema(&self) -> &Schema {
        self.group().schema()
    }

    /// Starts an empty query over `object_type`.
    fn query(&self, object_type: &str) -> Result<Query> {
        let schema = self.schema().object(object_type)?;
        Ok(Query::new(Arc::clone(schema)))
    }

    /// Returns a reference to an existing object.
    fn object(&self, object_type: &str, key: ObjKey) -> Result<Object> {
        let table = self.group().table(object_type)?;
        if !table.contains(key) {
            return Err(EmberError::ObjectNotFound {
                object_type: table.schema().name_arc(),
                key,
            });
        }
        Ok(Object::new(Arc::clone(table.schema()), key))
    }

    /// Attaches a proxy to the link list `property_index` of `owner`.
    fn link_list(&self, owner: &Object, property_index: usize) -> Result<LinkList>
    where
        Self: Sized,
    {
        owner.link_list(self, property_index)
    }
}

impl ReadContext for Snapshot {
    fn group(&self) -> &Group {
        &self.group
    }

    fn version(&self) -> Version {
        self.version
    }

    fn snapshot(&self) -> Snapshot {
        self.clone()
    }
}
