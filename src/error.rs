//! Error type shared by the query layer, link lists and storage.

use std::sync::Arc;

use ember_predicate::{ObjKey, PredicateError, ScalarKind};

use crate::schema::PropertyType;

/// Result alias used across the crate.
pub type Result<T, E = EmberError> = std::result::Result<T, E>;

/// Stable classification of an [`EmberError`], suitable for mapping onto
/// host-side exception types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A property, object type or object could not be resolved.
    Resolution,
    /// The operation does not apply to the given value or column.
    Usage,
    /// An index fell outside `[0, size)`.
    OutOfRange,
    /// The predicate expression is not well formed.
    MalformedExpression,
    /// The operation is not allowed in the current transaction state.
    Transaction,
    /// The schema definition is invalid.
    Schema,
}

/// Error returned by every fallible Ember operation.
#[derive(Debug, thiserror::Error)]
pub enum EmberError {
    /// Property index outside the persisted-property list.
    #[error(
        "property index {index} is out of range for '{object_type}' ({count} persisted properties)"
    )]
    PropertyNotFound {
        /// Object type the index was resolved against.
        object_type: Arc<str>,
        /// Requested property index.
        index: usize,
        /// Number of persisted properties.
        count: usize,
    },
    /// Object type missing from the schema.
    #[error("object type '{0}' is not part of the schema")]
    ObjectTypeNotFound(String),
    /// Object key missing from its table.
    #[error("object {key} does not exist in '{object_type}'")]
    ObjectNotFound {
        /// Table that was searched.
        object_type: Arc<str>,
        /// Missing key.
        key: ObjKey,
    },
    /// Null literal handed to an operator that is not null-aware.
    #[error("comparing null values with '{operator}' is not supported; use null_equal/null_not_equal")]
    NullComparison {
        /// Offending operator.
        operator: &'static str,
    },
    /// Ordering operator applied to a boolean value.
    #[error("ordering comparison '{operator}' is not supported for bool values")]
    BoolOrdering {
        /// Offending operator.
        operator: &'static str,
    },
    /// Value kind incompatible with the column.
    #[error("property '{property}' of type {property_type} cannot be compared with or set to a {value_kind} value")]
    TypeMismatch {
        /// Property name.
        property: Arc<str>,
        /// Declared property type.
        property_type: PropertyType,
        /// Kind of the supplied value.
        value_kind: ScalarKind,
    },
    /// Operator not defined for the column type.
    #[error("'{operator}' is not supported for property '{property}' of type {property_type}")]
    UnsupportedOperator {
        /// Property name.
        property: Arc<str>,
        /// Declared property type.
        property_type: PropertyType,
        /// Offending operator.
        operator: &'static str,
    },
    /// Null written to a required property.
    #[error("property '{property}' is not nullable")]
    NotNullable {
        /// Property name.
        property: Arc<str>,
    },
    /// Builder call on a query that already produced results.
    #[error("query on '{object_type}' was frozen by create_results(); call reset() before modifying it")]
    QueryFrozen {
        /// Object type of the query.
        object_type: Arc<str>,
    },
    /// Index outside `[0, size)`.
    #[error("{operation}: index {index} is out of range (size {size})")]
    IndexOutOfRange {
        /// Operation that performed the check.
        operation: &'static str,
        /// Requested index.
        index: usize,
        /// Size at the time of the call.
        size: usize,
    },
    /// Table ran out of object keys.
    #[error("table '{0}' has no object keys left")]
    KeysExhausted(Arc<str>),
    /// Predicate composition failure.
    #[error("malformed query: {0}")]
    Predicate(#[from] PredicateError),
    /// Write attempted on a read-only database.
    #[error("database '{0}' is read-only")]
    ReadOnly(String),
    /// Invalid schema definition.
    #[error("invalid schema: {0}")]
    Schema(String),
}

impl EmberError {
    /// Returns the stable classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            EmberError::PropertyNotFound { .. }
            | EmberError::ObjectTypeNotFound(_)
            | EmberError::ObjectNotFound { .. } => ErrorKind::Resolution,
            EmberError::NullComparison { .. }
            | EmberError::BoolOrdering { .. }
            | EmberError::TypeMismatch { .. }
            | EmberError::UnsupportedOperator { .. }
            | EmberError::NotNullable { .. }
            | EmberError::QueryFrozen { .. }
            | EmberError::KeysExhausted(_)
            | EmberError::Predicate(PredicateError::Pattern(_)) => ErrorKind::Usage,
            EmberError::IndexOutOfRange { .. } => ErrorKind::OutOfRange,
            EmberError::Predicate(_) => ErrorKind::MalformedExpression,
            EmberError::ReadOnly(_) => ErrorKind::Transaction,
            EmberError::Schema(_) => ErrorKind::Schema,
        }
    }

    pub(crate) fn out_of_range(operation: &'static str, index: usize, size: usize) -> Self {
        EmberError::IndexOutOfRange {
            operation,
            index,
            size,
        }
    }
}
