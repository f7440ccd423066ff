#![deny(missing_docs)]
//! Ember predicate facade crate.
//!
//! Predicates are built incrementally against resolved columns and typed
//! literals, then frozen into an immutable tree that storage backends walk
//! with a [`PredicateVisitor`]. Null is a distinct literal: equality against
//! it is only expressed through explicit null leaves or `Null` literals.

mod core;

pub use core::{
    BitmapRowSet, ColumnRef, ComparisonOp, ObjKey, ObjectId, Predicate, PredicateBuilder,
    PredicateError, PredicateNode, PredicateVisitor, RowId, RowIdIter, RowSet, ScalarKind,
    ScalarValue, TextMatcher, TextOp, Timestamp,
};
pub use rust_decimal::Decimal;
