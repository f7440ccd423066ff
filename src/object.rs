//! Row references and typed property accessors.

use std::{fmt, sync::Arc};

use ember_predicate::{ObjKey, ScalarKind, ScalarValue};

use crate::{
    error::{EmberError, Result},
    list::LinkList,
    schema::{ColumnResolver, ObjectSchema, Property, PropertyType},
    snapshot::ReadContext,
    transaction::WriteTransaction,
};

/// Reference to one object (row) of a table.
///
/// A reference is a plain value: copies are independent and stay valid
/// handles even after the object is removed, at which point
/// [`Object::is_valid`] turns false and accessors fail with a resolution
/// error.
#[derive(Clone)]
pub struct Object {
    schema: Arc<ObjectSchema>,
    key: ObjKey,
}

impl Object {
    pub(crate) fn new(schema: Arc<ObjectSchema>, key: ObjKey) -> Self {
        Self { schema, key }
    }

    /// Row key.
    pub fn key(&self) -> ObjKey {
        self.key
    }

    /// Name of the object type this row belongs to.
    pub fn object_type(&self) -> &str {
        self.schema.name()
    }

    /// Schema of the object type.
    pub fn schema(&self) -> &Arc<ObjectSchema> {
        &self.schema
    }

    /// Whether the object still exists in `ctx`.
    pub fn is_valid(&self, ctx: &impl ReadContext) -> bool {
        ctx.group()
            .table(self.object_type())
            .is_ok_and(|table| table.contains(self.key))
    }

    /// Reads a scalar property.
    pub fn get(&self, ctx: &impl ReadContext, property_index: usize) -> Result<ScalarValue> {
        let table = ctx.group().table(self.object_type())?;
        table.value(self.key, property_index).cloned()
    }

    /// Writes a scalar property.
    ///
    /// The value must match the column type (numeric literals widen into
    /// float, double and decimal columns) and may only be null when the
    /// property is nullable. Links are written with [`Object::set_link`].
    pub fn set(
        &self,
        txn: &mut WriteTransaction<'_>,
        property_index: usize,
        value: impl Into<ScalarValue>,
    ) -> Result<()> {
        let property = self.schema.resolve(property_index)?;
        if property.property_type().is_link() {
            return Err(unsupported(property, "set"));
        }
        txn.table_mut(self.object_type())?
            .set(self.key, property_index, value.into())
    }

    /// Follows a single link; `None` when it is unset.
    pub fn get_link(
        &self,
        ctx: &impl ReadContext,
        property_index: usize,
    ) -> Result<Option<Object>> {
        let target_type = self.link_target(property_index, PropertyType::Object, "get link")?;
        let target = self.get(ctx, property_index)?;
        match target.as_link() {
            Some(key) => ctx.object(target_type, key).map(Some),
            None => Ok(None),
        }
    }

    /// Points a single link at `target`, which must exist and be of the
    /// declared target type.
    pub fn set_link(
        &self,
        txn: &mut WriteTransaction<'_>,
        property_index: usize,
        target: &Object,
    ) -> Result<()> {
        let property = self.link_property(property_index, PropertyType::Object, "set link")?;
        check_target(&*txn, property, target)?;
        txn.table_mut(self.object_type())?
            .set(self.key, property_index, ScalarValue::Link(target.key))
    }

    /// Unsets a single link.
    pub fn clear_link(&self, txn: &mut WriteTransaction<'_>, property_index: usize) -> Result<()> {
        self.link_property(property_index, PropertyType::Object, "clear link")?;
        txn.table_mut(self.object_type())?
            .set(self.key, property_index, ScalarValue::Null)
    }

    /// Attaches a proxy to the link list at `property_index`.
    pub fn link_list(&self, ctx: &impl ReadContext, property_index: usize) -> Result<LinkList> {
        let target_type = self.link_target(property_index, PropertyType::List, "link list")?;
        let target = Arc::clone(ctx.schema().object(target_type)?);
        // Fails early when the owner is gone.
        ctx.group()
            .table(self.object_type())?
            .list(self.key, property_index)?;
        Ok(LinkList::new(self.clone(), property_index, target))
    }

    fn link_property(
        &self,
        property_index: usize,
        expected: PropertyType,
        operator: &'static str,
    ) -> Result<&Property> {
        let property = self.schema.resolve(property_index)?;
        if property.property_type() != expected {
            return Err(unsupported(property, operator));
        }
        Ok(property)
    }

    fn link_target(
        &self,
        property_index: usize,
        expected: PropertyType,
        operator: &'static str,
    ) -> Result<&str> {
        let property = self.link_property(property_index, expected, operator)?;
        property
            .object_type()
            .ok_or_else(|| unsupported(property, operator))
    }
}

/// Checks that `target` exists and has the type `property` links to.
pub(crate) fn check_target(
    ctx: &impl ReadContext,
    property: &Property,
    target: &Object,
) -> Result<()> {
    if property.object_type() != Some(target.object_type()) {
        return Err(EmberError::TypeMismatch {
            property: Arc::clone(&property.name),
            property_type: property.property_type(),
            value_kind: ScalarKind::Link,
        });
    }
    if !target.is_valid(ctx) {
        return Err(EmberError::ObjectNotFound {
            object_type: target.schema.name_arc(),
            key: target.key,
        });
    }
    Ok(())
}

fn unsupported(property: &Property, operator: &'static str) -> EmberError {
    EmberError::UnsupportedOperator {
        property: Arc::clone(&property.name),
        property_type: property.property_type(),
        operator,
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.object_type() == other.object_type()
    }
}

impl Eq for Object {}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("object_type", &self.object_type())
            .field("key", &self.key)
            .finish()
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.object_type(), self.key)
    }
}
