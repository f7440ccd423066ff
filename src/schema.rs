//! Object schemas and property resolution.
//!
//! Every object type owns an ordered list of persisted properties. A property's
//! position in that list is both the index the query layer addresses it by and
//! the column its cells live in.

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    sync::Arc,
};

use ember_predicate::{ColumnRef, Decimal, ObjectId, ScalarKind, ScalarValue, Timestamp};

use crate::error::{EmberError, Result};

/// Declared type of a persisted property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// UTF-8 text.
    String,
    /// Opaque bytes.
    Binary,
    /// Point in time.
    Timestamp,
    /// 128-bit decimal.
    Decimal,
    /// 12-byte object id.
    ObjectId,
    /// Single link to another object.
    Object,
    /// Ordered list of links to other objects.
    List,
}

impl PropertyType {
    /// True for `Object` and `List` columns.
    #[must_use]
    pub fn is_link(self) -> bool {
        matches!(self, PropertyType::Object | PropertyType::List)
    }

    /// Kind of the values stored in a single cell of this type, if the column
    /// holds scalar cells.
    #[must_use]
    pub fn scalar_kind(self) -> Option<ScalarKind> {
        Some(match self {
            PropertyType::Bool => ScalarKind::Bool,
            PropertyType::Int => ScalarKind::Int,
            PropertyType::Float => ScalarKind::Float,
            PropertyType::Double => ScalarKind::Double,
            PropertyType::String => ScalarKind::String,
            PropertyType::Binary => ScalarKind::Binary,
            PropertyType::Timestamp => ScalarKind::Timestamp,
            PropertyType::Decimal => ScalarKind::Decimal,
            PropertyType::ObjectId => ScalarKind::ObjectId,
            PropertyType::Object => ScalarKind::Link,
            PropertyType::List => return None,
        })
    }

    /// Whether a literal of `kind` can be compared against this column.
    ///
    /// Int, float and double columns accept each other's literals; decimal
    /// columns also accept integers. Everything else needs an exact match.
    #[must_use]
    pub fn accepts(self, kind: ScalarKind) -> bool {
        match (self, kind) {
            (
                PropertyType::Int | PropertyType::Float | PropertyType::Double,
                ScalarKind::Int | ScalarKind::Float | ScalarKind::Double,
            ) => true,
            (PropertyType::Decimal, ScalarKind::Int) => true,
            (ty, kind) => ty.scalar_kind() == Some(kind),
        }
    }

    /// Converts `value` into the representation stored by this column.
    ///
    /// Returns `None` when the value cannot be stored here. Null passes
    /// through; nullability is checked by the caller.
    #[must_use]
    pub fn coerce(self, value: ScalarValue) -> Option<ScalarValue> {
        Some(match (self, value) {
            (_, ScalarValue::Null) => ScalarValue::Null,
            (PropertyType::Float, ScalarValue::Int(v)) => ScalarValue::Float(v as f32),
            (PropertyType::Float, ScalarValue::Double(v)) => ScalarValue::Float(v as f32),
            (PropertyType::Double, ScalarValue::Int(v)) => ScalarValue::Double(v as f64),
            (PropertyType::Double, ScalarValue::Float(v)) => ScalarValue::Double(f64::from(v)),
            (PropertyType::Decimal, ScalarValue::Int(v)) => ScalarValue::Decimal(Decimal::from(v)),
            (ty, value) if ty.scalar_kind() == Some(value.kind()) => value,
            _ => return None,
        })
    }

    /// Value a fresh object holds in a column of this type.
    #[must_use]
    pub fn default_value(self, nullable: bool) -> ScalarValue {
        if nullable {
            return ScalarValue::Null;
        }
        match self {
            PropertyType::Bool => ScalarValue::Bool(false),
            PropertyType::Int => ScalarValue::Int(0),
            PropertyType::Float => ScalarValue::Float(0.0),
            PropertyType::Double => ScalarValue::Double(0.0),
            PropertyType::String => ScalarValue::String(String::new()),
            PropertyType::Binary => ScalarValue::Binary(Vec::new()),
            PropertyType::Timestamp => ScalarValue::Timestamp(Timestamp::new(0, 0)),
            PropertyType::Decimal => ScalarValue::Decimal(Decimal::ZERO),
            PropertyType::ObjectId => ScalarValue::ObjectId(ObjectId::from_bytes([0; 12])),
            PropertyType::Object | PropertyType::List => ScalarValue::Null,
        }
    }

    /// Returns a textual representation of the type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::Bool => "bool",
            PropertyType::Int => "int",
            PropertyType::Float => "float",
            PropertyType::Double => "double",
            PropertyType::String => "string",
            PropertyType::Binary => "binary",
            PropertyType::Timestamp => "timestamp",
            PropertyType::Decimal => "decimal",
            PropertyType::ObjectId => "object id",
            PropertyType::Object => "object",
            PropertyType::List => "list",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted property of an object type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub(crate) name: Arc<str>,
    pub(crate) property_type: PropertyType,
    pub(crate) nullable: bool,
    pub(crate) object_type: Option<Arc<str>>,
    pub(crate) column: usize,
}

impl Property {
    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    /// Whether the property accepts null.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Target object type of a link or list property.
    pub fn object_type(&self) -> Option<&str> {
        self.object_type.as_deref()
    }

    /// Column the property is stored in.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Column reference used when this property appears in a predicate.
    pub fn column_ref(&self) -> ColumnRef {
        ColumnRef::new(self.column, Arc::clone(&self.name))
    }

    pub(crate) fn default_value(&self) -> ScalarValue {
        self.property_type.default_value(self.nullable)
    }
}

/// Maps property indices onto resolved columns.
pub trait ColumnResolver {
    /// Resolves `property_index` or fails with a resolution error.
    fn resolve(&self, property_index: usize) -> Result<&Property>;

    /// Resolves `property_index` straight to a predicate column.
    fn column(&self, property_index: usize) -> Result<ColumnRef> {
        self.resolve(property_index).map(Property::column_ref)
    }
}

/// Schema of one object type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSchema {
    name: Arc<str>,
    persisted_properties: Vec<Property>,
}

impl ObjectSchema {
    /// Starts declaring an object type called `name`.
    pub fn builder(name: impl Into<Arc<str>>) -> ObjectSchemaBuilder {
        ObjectSchemaBuilder {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Object type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Persisted properties in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.persisted_properties
    }

    /// Index of the property called `name`.
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.persisted_properties
            .iter()
            .position(|property| &*property.name == name)
    }
}

impl ColumnResolver for ObjectSchema {
    fn resolve(&self, property_index: usize) -> Result<&Property> {
        self.persisted_properties
            .get(property_index)
            .ok_or_else(|| EmberError::PropertyNotFound {
                object_type: self.name_arc(),
                index: property_index,
                count: self.persisted_properties.len(),
            })
    }
}

/// Builder for [`ObjectSchema`]; columns are assigned in declaration order.
#[derive(Clone, Debug)]
pub struct ObjectSchemaBuilder {
    name: Arc<str>,
    properties: Vec<Property>,
}

impl ObjectSchemaBuilder {
    /// Declares a required scalar property.
    pub fn property(self, name: impl Into<Arc<str>>, property_type: PropertyType) -> Self {
        self.push(name.into(), property_type, false, None)
    }

    /// Declares a nullable scalar property.
    pub fn nullable(self, name: impl Into<Arc<str>>, property_type: PropertyType) -> Self {
        self.push(name.into(), property_type, true, None)
    }

    /// Declares a single link to `target`. Links are always nullable.
    pub fn link(self, name: impl Into<Arc<str>>, target: impl Into<Arc<str>>) -> Self {
        self.push(name.into(), PropertyType::Object, true, Some(target.into()))
    }

    /// Declares a list of links to `target`.
    pub fn list(self, name: impl Into<Arc<str>>, target: impl Into<Arc<str>>) -> Self {
        self.push(name.into(), PropertyType::List, false, Some(target.into()))
    }

    fn push(
        mut self,
        name: Arc<str>,
        property_type: PropertyType,
        nullable: bool,
        object_type: Option<Arc<str>>,
    ) -> Self {
        let column = self.properties.len();
        self.properties.push(Property {
            name,
            property_type,
            nullable,
            object_type,
            column,
        });
        self
    }

    /// Finishes the declaration, rejecting duplicate property names.
    pub fn build(self) -> Result<ObjectSchema> {
        let mut seen = HashSet::with_capacity(self.properties.len());
        for property in &self.properties {
            if !seen.insert(Arc::clone(&property.name)) {
                return Err(EmberError::Schema(format!(
                    "'{}' declares property '{}' more than once",
                    self.name, property.name
                )));
            }
        }
        Ok(ObjectSchema {
            name: self.name,
            persisted_properties: self.properties,
        })
    }
}

/// Set of object types a database is opened with.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    objects: BTreeMap<Arc<str>, Arc<ObjectSchema>>,
}

impl Schema {
    /// Validates and collects `objects`.
    ///
    /// Object type names must be unique and every link must target a declared
    /// type.
    pub fn new(objects: impl IntoIterator<Item = ObjectSchema>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for object in objects {
            let name = object.name_arc();
            if map.insert(Arc::clone(&name), Arc::new(object)).is_some() {
                return Err(EmberError::Schema(format!(
                    "object type '{name}' is declared more than once"
                )));
            }
        }
        for object in map.values() {
            for property in object.properties() {
                if let Some(target) = &property.object_type {
                    if !map.contains_key(target) {
                        return Err(EmberError::Schema(format!(
                            "'{}.{}' links to undeclared object type '{target}'",
                            object.name, property.name
                        )));
                    }
                }
            }
        }
        Ok(Self { objects: map })
    }

    /// Looks up an object type by name.
    pub fn object(&self, name: &str) -> Result<&Arc<ObjectSchema>> {
        self.objects
            .get(name)
            .ok_or_else(|| EmberError::ObjectTypeNotFound(name.to_owned()))
    }

    /// Every object type in the schema.
    pub fn objects(&self) -> impl Iterator<Item = &Arc<ObjectSchema>> {
        self.objects.values()
    }

    /// Number of object types.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when the schema declares no object type.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
