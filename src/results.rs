//! Lazily materialized query results.

use std::sync::Arc;

use ember_predicate::{ObjKey, Predicate, RowSet, ScalarValue};
use once_cell::sync::OnceCell;

use crate::{
    db::DB,
    error::{EmberError, Result},
    mvcc::Version,
    object::Object,
    observability::log_debug,
    query::DescriptorOrdering,
    schema::ObjectSchema,
    snapshot::{ReadContext, Snapshot},
    table::TableEvaluator,
};

/// Objects matching a frozen predicate, shaped by a [`DescriptorOrdering`].
///
/// Results keep the snapshot they were created from alive, so later commits
/// never change them. Rows are computed on first access and cached.
#[derive(Debug)]
pub struct Results {
    snapshot: Snapshot,
    schema: Arc<ObjectSchema>,
    predicate: Predicate,
    ordering: DescriptorOrdering,
    rows: OnceCell<Vec<ObjKey>>,
}

impl Results {
    pub(crate) fn new(
        snapshot: Snapshot,
        schema: Arc<ObjectSchema>,
        predicate: Predicate,
        ordering: DescriptorOrdering,
    ) -> Self {
        Self {
            snapshot,
            schema,
            predicate,
            ordering,
            rows: OnceCell::new(),
        }
    }

    fn rows(&self) -> Result<&[ObjKey]> {
        self.rows
            .get_or_try_init(|| self.materialize())
            .map(Vec::as_slice)
    }

    fn materialize(&self) -> Result<Vec<ObjKey>> {
        let table = self.snapshot.group().table(self.schema.name())?;
        let matches = self.predicate.accept(&mut TableEvaluator::new(table))?;
        let rows = matches.iter().map(ObjKey::new).collect();
        let rows = self.ordering.apply(table, rows)?;
        log_debug!(
            component = "results",
            event = "results_materialized",
            object_type = self.schema.name(),
            predicate = %self.predicate,
            version = %self.snapshot.version(),
            matches = matches.len(),
            rows = rows.len(),
        );
        Ok(rows)
    }

    /// Object type of the rows.
    pub fn object_type(&self) -> &str {
        self.schema.name()
    }

    /// Predicate the results were frozen with.
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Sort, distinct and limit steps applied to the matches.
    pub fn ordering(&self) -> &DescriptorOrdering {
        &self.ordering
    }

    /// State the results were computed against.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Version of the snapshot the results read.
    pub fn version(&self) -> Version {
        self.snapshot.version()
    }

    /// Whether these results reflect the state `db` has committed.
    ///
    /// Results created from uncommitted transaction state are never current.
    pub fn is_current(&self, db: &DB) -> bool {
        self.snapshot.is_committed() && db.version() == self.version()
    }

    /// Number of rows; materializes on first call.
    pub fn len(&self) -> Result<usize> {
        Ok(self.rows()?.len())
    }

    /// True when nothing matched.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.rows()?.is_empty())
    }

    /// Keys of the result rows, in result order.
    pub fn keys(&self) -> Result<&[ObjKey]> {
        self.rows()
    }

    /// Returns a reference to the object at `index`.
    pub fn get(&self, index: usize) -> Result<Object> {
        let rows = self.rows()?;
        rows.get(index)
            .map(|key| Object::new(Arc::clone(&self.schema), *key))
            .ok_or_else(|| EmberError::out_of_range("Get from results", index, rows.len()))
    }

    /// Reads one property of the object at `index`.
    pub fn get_value(&self, index: usize, property_index: usize) -> Result<ScalarValue> {
        let object = self.get(index)?;
        object.get(&self.snapshot, property_index)
    }

    /// Objects in result order.
    pub fn iter(&self) -> Result<impl Iterator<Item = Object> + '_> {
        let rows = self.rows()?;
        Ok(rows
            .iter()
            .map(move |key| Object::new(Arc::clone(&self.schema), *key)))
    }
}
