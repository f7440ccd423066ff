//! Proxy over a link list owned by one object.
//!
//! Every positional operation checks `index < size` before touching storage,
//! so a failed call leaves the list exactly as it was.

use std::sync::Arc;

use ember_predicate::ObjKey;

use crate::{
    error::{EmberError, Result},
    object::{check_target, Object},
    observability::log_debug,
    schema::{ColumnResolver, ObjectSchema},
    snapshot::ReadContext,
    transaction::WriteTransaction,
};

/// Handle to the link list stored in one column of one object.
///
/// The handle owns no list data; dropping it, or calling
/// [`LinkList::destroy`], leaves the stored list untouched.
#[derive(Clone, Debug)]
pub struct LinkList {
    owner: Object,
    property_index: usize,
    target: Arc<ObjectSchema>,
}

impl LinkList {
    pub(crate) fn new(owner: Object, property_index: usize, target: Arc<ObjectSchema>) -> Self {
        Self {
            owner,
            property_index,
            target,
        }
    }

    /// Object that owns the list.
    pub fn owner(&self) -> &Object {
        &self.owner
    }

    /// Index of the list property on the owner.
    pub fn property_index(&self) -> usize {
        self.property_index
    }

    /// Object type of the list elements.
    pub fn target_type(&self) -> &str {
        self.target.name()
    }

    fn items<'c>(&self, ctx: &'c impl ReadContext) -> Result<&'c [ObjKey]> {
        ctx.group()
            .table(self.owner.object_type())?
            .list(self.owner.key(), self.property_index)
    }

    fn items_mut<'t>(&self, txn: &'t mut WriteTransaction<'_>) -> Result<&'t mut Vec<ObjKey>> {
        txn.table_mut(self.owner.object_type())?
            .list_mut(self.owner.key(), self.property_index)
    }

    fn element(&self, key: ObjKey) -> Object {
        Object::new(Arc::clone(&self.target), key)
    }

    fn check_target(&self, txn: &WriteTransaction<'_>, target: &Object) -> Result<()> {
        let property = self.owner.schema().resolve(self.property_index)?;
        check_target(txn, property, target)
    }

    /// Number of entries.
    pub fn size(&self, ctx: &impl ReadContext) -> Result<usize> {
        Ok(self.items(ctx)?.len())
    }

    /// Adds `target` at the end.
    pub fn append(&self, txn: &mut WriteTransaction<'_>, target: &Object) -> Result<()> {
        self.check_target(txn, target)?;
        let items = self.items_mut(txn)?;
        items.push(target.key());
        let size = items.len();
        self.log_mutation("link_list_append", size);
        Ok(())
    }

    /// Inserts `target` before `index`.
    ///
    /// `index` must be an existing position; inserting at `size()` is not
    /// allowed, use [`LinkList::append`] for that.
    pub fn insert(
        &self,
        txn: &mut WriteTransaction<'_>,
        index: usize,
        target: &Object,
    ) -> Result<()> {
        let size = self.size(&*txn)?;
        if index >= size {
            return Err(EmberError::out_of_range("Insert into link list", index, size));
        }
        self.check_target(txn, target)?;
        self.items_mut(txn)?.insert(index, target.key());
        self.log_mutation("link_list_insert", size + 1);
        Ok(())
    }

    /// Returns a fresh reference to the object at `index`.
    pub fn get(&self, ctx: &impl ReadContext, index: usize) -> Result<Object> {
        let items = self.items(ctx)?;
        items
            .get(index)
            .map(|key| self.element(*key))
            .ok_or_else(|| EmberError::out_of_range("Get from link list", index, items.len()))
    }

    /// First position at or after `start_from` holding `target`.
    pub fn find(
        &self,
        ctx: &impl ReadContext,
        target: &Object,
        start_from: usize,
    ) -> Result<Option<usize>> {
        if target.object_type() != self.target_type() {
            return Ok(None);
        }
        let items = self.items(ctx)?;
        let key = target.key();
        Ok(items
            .iter()
            .enumerate()
            .skip(start_from)
            .find_map(|(index, item)| (*item == key).then_some(index)))
    }

    /// Removes the entry at `index`, shifting later entries down.
    pub fn erase(&self, txn: &mut WriteTransaction<'_>, index: usize) -> Result<()> {
        let size = self.size(&*txn)?;
        if index >= size {
            return Err(EmberError::out_of_range("Erase item in link list", index, size));
        }
        self.items_mut(txn)?.remove(index);
        self.log_mutation("link_list_erase", size - 1);
        Ok(())
    }

    /// Removes every entry. The referenced objects are not deleted.
    pub fn clear(&self, txn: &mut WriteTransaction<'_>) -> Result<()> {
        self.items_mut(txn)?.clear();
        self.log_mutation("link_list_clear", 0);
        Ok(())
    }

    /// Releases the handle. The stored list is kept.
    pub fn destroy(self) {}

    fn log_mutation(&self, event: &'static str, size: usize) {
        log_debug!(
            component = "link_list",
            event = event,
            owner = %self.owner,
            property_index = self.property_index,
            size,
        );
    }
}
