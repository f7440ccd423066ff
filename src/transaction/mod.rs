//! Single-writer transactions over a private copy of the committed state.

use std::sync::Arc;

use crate::{
    db::{Group, DB},
    error::Result,
    mvcc::Version,
    object::Object,
    observability::{log_debug, log_info, log_warn},
    snapshot::{ReadContext, Snapshot},
    table::Table,
};

/// Open write transaction.
///
/// Changes stay private until [`WriteTransaction::commit`]. Dropping the
/// transaction, or calling [`WriteTransaction::rollback`], discards them.
#[derive(Debug)]
pub struct WriteTransaction<'db> {
    db: &'db mut DB,
    working: Arc<Group>,
    base: Version,
    finished: bool,
}

impl<'db> WriteTransaction<'db> {
    pub(crate) fn new(db: &'db mut DB, working: Arc<Group>, base: Version) -> Self {
        Self {
            db,
            working,
            base,
            finished: false,
        }
    }

    pub(crate) fn table_mut(&mut self, object_type: &str) -> Result<&mut Table> {
        Arc::make_mut(&mut self.working).table_mut(object_type)
    }

    /// Creates an object of `object_type` holding default values.
    pub fn create_object(&mut self, object_type: &str) -> Result<Object> {
        let table = self.table_mut(object_type)?;
        let key = table.create_object()?;
        let schema = Arc::clone(table.schema());
        log_debug!(
            component = "transaction",
            event = "object_created",
            object_type = object_type,
            key = %key,
        );
        Ok(Object::new(schema, key))
    }

    /// Removes `object`, nullifying links and dropping list entries that
    /// point at it.
    pub fn remove_object(&mut self, object: &Object) -> Result<()> {
        Arc::make_mut(&mut self.working).remove_object(object.object_type(), object.key())?;
        log_debug!(
            component = "transaction",
            event = "object_removed",
            object_type = object.object_type(),
            key = %object.key(),
        );
        Ok(())
    }

    /// True once the working state diverged from the committed one.
    pub fn is_dirty(&self) -> bool {
        !Arc::ptr_eq(&self.working, self.db.committed())
    }

    /// Publishes the changes and returns the version they were committed
    /// under.
    pub fn commit(mut self) -> Version {
        self.finished = true;
        let group = std::mem::take(&mut self.working);
        let version = self.db.publish(group);
        log_info!(
            component = "transaction",
            event = "transaction_committed",
            base_version = %self.base,
            version = %version,
        );
        version
    }

    /// Discards the changes.
    pub fn rollback(mut self) {
        self.finished = true;
        log_debug!(
            component = "transaction",
            event = "transaction_rolled_back",
            base_version = %self.base,
            explicit = true,
        );
    }
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if !self.is_dirty() {
            log_debug!(
                component = "transaction",
                event = "transaction_rolled_back",
                base_version = %self.base,
                explicit = false,
            );
        } else {
            log_warn!(
                component = "transaction",
                event = "transaction_rolled_back",
                base_version = %self.base,
                explicit = false,
                reason = "dropped with uncommitted changes",
            );
        }
    }
}

impl ReadContext for WriteTransaction<'_> {
    fn group(&self) -> &Group {
        &self.working
    }

    fn version(&self) -> Version {
        self.base
    }

    fn snapshot(&self) -> Snapshot {
        let group = Arc::clone(&self.working);
        if self.is_dirty() {
            Snapshot::uncommitted(group, self.base)
        } else {
            Snapshot::new(group, self.base)
        }
    }
}
