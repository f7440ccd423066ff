//! In-memory row storage for one object type.

mod evaluate;

use std::{collections::BTreeMap, sync::Arc};

use ember_predicate::{BitmapRowSet, ObjKey, RowId, ScalarValue};

pub(crate) use self::evaluate::TableEvaluator;
use crate::{
    error::{EmberError, Result},
    schema::{ColumnResolver, ObjectSchema, Property, PropertyType},
};

/// Contents of one column of one row.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    /// Scalar or single-link cell.
    Value(ScalarValue),
    /// Link-list cell.
    List(Vec<ObjKey>),
}

impl Cell {
    fn default_for(property: &Property) -> Self {
        match property.property_type() {
            PropertyType::List => Cell::List(Vec::new()),
            _ => Cell::Value(property.default_value()),
        }
    }

    pub(crate) fn as_value(&self) -> Option<&ScalarValue> {
        match self {
            Cell::Value(value) => Some(value),
            Cell::List(_) => None,
        }
    }
}

/// Rows of one object type, keyed by [`ObjKey`].
///
/// Keys are handed out in ascending order and never reused within a table.
#[derive(Clone, Debug)]
pub struct Table {
    schema: Arc<ObjectSchema>,
    rows: BTreeMap<ObjKey, Vec<Cell>>,
    next_key: Option<RowId>,
}

impl Table {
    pub(crate) fn new(schema: Arc<ObjectSchema>) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_key: Some(0),
        }
    }

    /// Schema of the stored object type.
    pub fn schema(&self) -> &Arc<ObjectSchema> {
        &self.schema
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no objects.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether `key` names a live object.
    pub fn contains(&self, key: ObjKey) -> bool {
        self.rows.contains_key(&key)
    }

    /// Keys of all live rows in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = ObjKey> + '_ {
        self.rows.keys().copied()
    }

    pub(crate) fn universe(&self) -> BitmapRowSet {
        self.keys().map(ObjKey::get).collect()
    }

    pub(crate) fn create_object(&mut self) -> Result<ObjKey> {
        let raw = self
            .next_key
            .ok_or_else(|| EmberError::KeysExhausted(self.schema.name_arc()))?;
        self.next_key = raw.checked_add(1);
        let key = ObjKey::new(raw);
        let cells = self
            .schema
            .properties()
            .iter()
            .map(Cell::default_for)
            .collect();
        self.rows.insert(key, cells);
        Ok(key)
    }

    pub(crate) fn remove_object(&mut self, key: ObjKey) -> bool {
        self.rows.remove(&key).is_some()
    }

    pub(crate) fn cell(&self, key: ObjKey, column: usize) -> Option<&Cell> {
        self.rows.get(&key).and_then(|cells| cells.get(column))
    }

    fn row(&self, key: ObjKey) -> Result<&Vec<Cell>> {
        self.rows.get(&key).ok_or_else(|| self.not_found(key))
    }

    fn row_mut(&mut self, key: ObjKey) -> Result<&mut Vec<Cell>> {
        self.rows
            .get_mut(&key)
            .ok_or_else(|| EmberError::ObjectNotFound {
                object_type: self.schema.name_arc(),
                key,
            })
    }

    fn not_found(&self, key: ObjKey) -> EmberError {
        EmberError::ObjectNotFound {
            object_type: self.schema.name_arc(),
            key,
        }
    }

    /// Reads the scalar (or single-link) value at `property_index`.
    pub fn value(&self, key: ObjKey, property_index: usize) -> Result<&ScalarValue> {
        let property = self.schema.resolve(property_index)?;
        let row = self.row(key)?;
        match row.get(property.column()) {
            Some(Cell::Value(value)) => Ok(value),
            _ => Err(unsupported(property, "get")),
        }
    }

    /// Writes `value` after converting it to the column representation.
    pub(crate) fn set(
        &mut self,
        key: ObjKey,
        property_index: usize,
        value: ScalarValue,
    ) -> Result<()> {
        let property = self.schema.resolve(property_index)?;
        if property.property_type() == PropertyType::List {
            return Err(unsupported(property, "set"));
        }
        let value_kind = value.kind();
        let value = property.property_type().coerce(value).ok_or_else(|| {
            EmberError::TypeMismatch {
                property: Arc::clone(&property.name),
                property_type: property.property_type(),
                value_kind,
            }
        })?;
        if value.is_null() && !property.is_nullable() {
            return Err(EmberError::NotNullable {
                property: Arc::clone(&property.name),
            });
        }
        let column = property.column();
        let row = self.row_mut(key)?;
        row[column] = Cell::Value(value);
        Ok(())
    }

    /// Borrows the link list stored at `property_index`.
    pub fn list(&self, key: ObjKey, property_index: usize) -> Result<&[ObjKey]> {
        let property = self.schema.resolve(property_index)?;
        match self.row(key)?.get(property.column()) {
            Some(Cell::List(items)) => Ok(items),
            _ => Err(unsupported(property, "link list")),
        }
    }

    pub(crate) fn list_mut(
        &mut self,
        key: ObjKey,
        property_index: usize,
    ) -> Result<&mut Vec<ObjKey>> {
        let property = self.schema.resolve(property_index)?;
        if property.property_type() != PropertyType::List {
            return Err(unsupported(property, "link list"));
        }
        let column = property.column();
        match self.row_mut(key)?.get_mut(column) {
            Some(Cell::List(items)) => Ok(items),
            _ => Err(EmberError::Schema(format!(
                "row {key} has no list cell in column {column}"
            ))),
        }
    }

    /// Drops every reference to `target` held by link columns pointing at
    /// `target_type`. Returns the number of references removed.
    pub(crate) fn unlink(&mut self, target_type: &str, target: ObjKey) -> usize {
        let columns: Vec<usize> = self
            .schema
            .properties()
            .iter()
            .filter(|property| property.object_type() == Some(target_type))
            .map(Property::column)
            .collect();
        if columns.is_empty() {
            return 0;
        }
        let mut removed = 0;
        for cells in self.rows.values_mut() {
            for &column in &columns {
                match &mut cells[column] {
                    Cell::Value(value) if value.as_link() == Some(target) => {
                        *value = ScalarValue::Null;
                        removed += 1;
                    }
                    Cell::List(items) => {
                        let before = items.len();
                        items.retain(|item| *item != target);
                        removed += before - items.len();
                    }
                    Cell::Value(_) => {}
                }
            }
        }
        removed
    }
}

fn unsupported(property: &Property, operator: &'static str) -> EmberError {
    EmberError::UnsupportedOperator {
        property: Arc::clone(&property.name),
        property_type: property.property_type(),
        operator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn table() -> Table {
        let schema = ObjectSchema::builder("Person")
            .property("name", PropertyType::String)
            .nullable("age", PropertyType::Int)
            .link("best_friend", "Person")
            .list("friends", "Person")
            .build()
            .expect("valid schema");
        Table::new(Arc::new(schema))
    }

    #[test]
    fn new_rows_hold_default_values() {
        let mut table = table();
        let key = table.create_object().expect("key available");
        assert_eq!(
            table.value(key, 0).expect("name"),
            &ScalarValue::String(String::new())
        );
        assert_eq!(table.value(key, 1).expect("age"), &ScalarValue::Null);
        assert_eq!(table.value(key, 2).expect("link"), &ScalarValue::Null);
        assert!(table.list(key, 3).expect("list").is_empty());
    }

    #[test]
    fn keys_are_never_reused() {
        let mut table = table();
        let first = table.create_object().expect("key");
        assert!(table.remove_object(first));
        let second = table.create_object().expect("key");
        assert_ne!(first, second);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn writes_are_type_checked() {
        let mut table = table();
        let key = table.create_object().expect("key");

        let err = table
            .set(key, 0, ScalarValue::Int(3))
            .expect_err("int into string");
        assert_eq!(err.kind(), ErrorKind::Usage);

        let err = table
            .set(key, 0, ScalarValue::Null)
            .expect_err("name is required");
        assert!(matches!(err, EmberError::NotNullable { .. }));

        let err = table
            .set(key, 3, ScalarValue::Null)
            .expect_err("lists are not scalar");
        assert!(matches!(err, EmberError::UnsupportedOperator { .. }));

        table.set(key, 1, ScalarValue::Int(9)).expect("nullable int");
        table.set(key, 1, ScalarValue::Null).expect("back to null");
    }

    #[test]
    fn unlink_clears_links_and_list_entries() {
        let mut table = table();
        let a = table.create_object().expect("key");
        let b = table.create_object().expect("key");
        table.set(a, 2, ScalarValue::Link(b)).expect("link");
        table.list_mut(a, 3).expect("list").extend([b, a, b]);

        assert_eq!(table.unlink("Person", b), 3);
        assert_eq!(table.value(a, 2).expect("link"), &ScalarValue::Null);
        assert_eq!(table.list(a, 3).expect("list"), &[a]);
        assert_eq!(table.unlink("Dog", a), 0);
    }
}
