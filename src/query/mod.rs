//! Incremental query construction and evaluation.
//!
//! A [`Query`] resolves property indices against its object schema, checks
//! every operand before it reaches the predicate tree, and evaluates the
//! resulting [`Predicate`] against whatever [`ReadContext`] it is handed.

mod descriptor;

use std::sync::Arc;

use ember_predicate::{
    ComparisonOp, Predicate, PredicateBuilder, RowSet, ScalarKind, ScalarValue,
    TextMatcher, TextOp,
};

pub use self::descriptor::{Descriptor, DescriptorOrdering, SortKey};
use crate::{
    error::{EmberError, Result},
    object::{check_target, Object},
    observability::{log_debug, log_info},
    results::Results,
    schema::{ColumnResolver, ObjectSchema, Property, PropertyType},
    snapshot::ReadContext,
    table::TableEvaluator,
    value::PrimitiveValue,
};

/// Predicate under construction over one object type.
///
/// Conditions are ANDed until [`Query::or`] starts a new alternative;
/// [`Query::group_begin`]/[`Query::group_end`] scope `or` and `not`.
#[derive(Clone, Debug)]
pub struct Query {
    schema: Arc<ObjectSchema>,
    builder: PredicateBuilder,
    frozen: bool,
}

impl Query {
    pub(crate) fn new(schema: Arc<ObjectSchema>) -> Self {
        Self {
            schema,
            builder: PredicateBuilder::new(),
            frozen: false,
        }
    }

    /// Object type the query runs over.
    pub fn object_type(&self) -> &str {
        self.schema.name()
    }

    /// True once [`Query::create_results`] succeeded and until
    /// [`Query::reset`].
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.frozen {
            return Err(EmberError::QueryFrozen {
                object_type: self.schema.name_arc(),
            });
        }
        Ok(())
    }

    fn resolve(&self, property_index: usize) -> Result<&Property> {
        self.ensure_mutable()?;
        self.schema.resolve(property_index)
    }

    /// Appends `property op value`, dispatching on the value's kind.
    ///
    /// Null is rejected here; use [`Query::null_equal`] and
    /// [`Query::null_not_equal`] instead.
    pub fn compare(
        &mut self,
        op: ComparisonOp,
        property_index: usize,
        value: impl Into<PrimitiveValue>,
    ) -> Result<&mut Self> {
        self.ensure_mutable()?;
        let value = value.into();
        if !value.has_value() {
            log_debug!(
                component = "query",
                event = "comparison_rejected",
                reason = "null operand",
                operator = op.as_str(),
            );
            return Err(EmberError::NullComparison {
                operator: op.as_str(),
            });
        }
        let property = self.resolve(property_index)?;
        if matches!(value, PrimitiveValue::Bool(_)) && op.is_ordering() {
            log_debug!(
                component = "query",
                event = "comparison_rejected",
                reason = "bool ordering",
                operator = op.as_str(),
                property = property.name(),
            );
            return Err(EmberError::BoolOrdering {
                operator: op.as_str(),
            });
        }
        if property.property_type().is_link() {
            return Err(unsupported(property, op.as_str()));
        }
        let literal = ScalarValue::from(value);
        check_kind(property, literal.kind())?;
        let column = property.column_ref();
        self.builder.compare(column, op, literal);
        Ok(self)
    }

    /// Appends `property == value`.
    pub fn equal(
        &mut self,
        property_index: usize,
        value: impl Into<PrimitiveValue>,
    ) -> Result<&mut Self> {
        self.compare(ComparisonOp::Equal, property_index, value)
    }

    /// Appends `property != value`; null cells match.
    pub fn not_equal(
        &mut self,
        property_index: usize,
        value: impl Into<PrimitiveValue>,
    ) -> Result<&mut Self> {
        self.compare(ComparisonOp::NotEqual, property_index, value)
    }

    /// Appends `property < value`.
    pub fn less(
        &mut self,
        property_index: usize,
        value: impl Into<PrimitiveValue>,
    ) -> Result<&mut Self> {
        self.compare(ComparisonOp::LessThan, property_index, value)
    }

    /// Appends `property <= value`.
    pub fn less_equal(
        &mut self,
        property_index: usize,
        value: impl Into<PrimitiveValue>,
    ) -> Result<&mut Self> {
        self.compare(ComparisonOp::LessThanOrEqual, property_index, value)
    }

    /// Appends `property > value`.
    pub fn greater(
        &mut self,
        property_index: usize,
        value: impl Into<PrimitiveValue>,
    ) -> Result<&mut Self> {
        self.compare(ComparisonOp::GreaterThan, property_index, value)
    }

    /// Appends `property >= value`.
    pub fn greater_equal(
        &mut self,
        property_index: usize,
        value: impl Into<PrimitiveValue>,
    ) -> Result<&mut Self> {
        self.compare(ComparisonOp::GreaterThanOrEqual, property_index, value)
    }

    fn text(
        &mut self,
        op: TextOp,
        property_index: usize,
        value: &str,
        case_sensitive: bool,
    ) -> Result<&mut Self> {
        let property = self.resolve(property_index)?;
        check_kind(property, ScalarKind::String)?;
        if op == TextOp::Like {
            // Surface bad patterns now rather than at evaluation time.
            TextMatcher::new(op, value, case_sensitive)?;
        }
        let column = property.column_ref();
        self.builder.text(column, op, value, case_sensitive);
        Ok(self)
    }

    /// Matches whole strings.
    pub fn string_equal(
        &mut self,
        property_index: usize,
        value: &str,
        case_sensitive: bool,
    ) -> Result<&mut Self> {
        self.text(TextOp::Equal, property_index, value, case_sensitive)
    }

    /// Matches strings that differ; null cells match.
    pub fn string_not_equal(
        &mut self,
        property_index: usize,
        value: &str,
        case_sensitive: bool,
    ) -> Result<&mut Self> {
        self.text(TextOp::NotEqual, property_index, value, case_sensitive)
    }

    /// Matches strings containing `value`.
    pub fn string_contains(
        &mut self,
        property_index: usize,
        value: &str,
        case_sensitive: bool,
    ) -> Result<&mut Self> {
        self.text(TextOp::Contains, property_index, value, case_sensitive)
    }

    /// Matches strings starting with `value`.
    pub fn string_starts_with(
        &mut self,
        property_index: usize,
        value: &str,
        case_sensitive: bool,
    ) -> Result<&mut Self> {
        self.text(TextOp::BeginsWith, property_index, value, case_sensitive)
    }

    /// Matches strings ending with `value`.
    pub fn string_ends_with(
        &mut self,
        property_index: usize,
        value: &str,
        case_sensitive: bool,
    ) -> Result<&mut Self> {
        self.text(TextOp::EndsWith, property_index, value, case_sensitive)
    }

    /// `*` matches any run of characters, `?` exactly one.
    pub fn string_like(
        &mut self,
        property_index: usize,
        pattern: &str,
        case_sensitive: bool,
    ) -> Result<&mut Self> {
        self.text(TextOp::Like, property_index, pattern, case_sensitive)
    }

    fn binary(
        &mut self,
        op: ComparisonOp,
        property_index: usize,
        value: &[u8],
    ) -> Result<&mut Self> {
        let property = self.resolve(property_index)?;
        check_kind(property, ScalarKind::Binary)?;
        let column = property.column_ref();
        self.builder.compare(column, op, ScalarValue::Binary(value.to_vec()));
        Ok(self)
    }

    /// Matches binary payloads equal to `value`.
    pub fn binary_equal(&mut self, property_index: usize, value: &[u8]) -> Result<&mut Self> {
        self.binary(ComparisonOp::Equal, property_index, value)
    }

    /// Matches binary payloads other than `value`; null cells match.
    pub fn binary_not_equal(&mut self, property_index: usize, value: &[u8]) -> Result<&mut Self> {
        self.binary(ComparisonOp::NotEqual, property_index, value)
    }

    /// Matches objects whose link (or link list) at `property_index` points
    /// at `target`, which must exist in `ctx`.
    pub fn object_equal(
        &mut self,
        ctx: &impl ReadContext,
        property_index: usize,
        target: &Object,
    ) -> Result<&mut Self> {
        let property = self.resolve(property_index)?;
        if !property.property_type().is_link() {
            return Err(unsupported(property, "links to"));
        }
        check_target(ctx, property, target)?;
        let column = property.column_ref();
        self.builder.links_to(column, target.key());
        Ok(self)
    }

    /// Matches unset links on link columns and null values elsewhere.
    pub fn null_equal(&mut self, property_index: usize) -> Result<&mut Self> {
        self.null(property_index, false)
    }

    /// Matches set links on link columns and non-null values elsewhere.
    pub fn null_not_equal(&mut self, property_index: usize) -> Result<&mut Self> {
        self.null(property_index, true)
    }

    fn null(&mut self, property_index: usize, negated: bool) -> Result<&mut Self> {
        let property = self.resolve(property_index)?;
        let column = property.column_ref();
        match property.property_type() {
            PropertyType::Object => self.builder.link_is_null(column, negated),
            PropertyType::List => {
                let operator = if negated { "!= null" } else { "== null" };
                return Err(unsupported(property, operator));
            }
            _ => {
                let op = if negated {
                    ComparisonOp::NotEqual
                } else {
                    ComparisonOp::Equal
                };
                self.builder.compare(column, op, ScalarValue::Null);
            }
        }
        Ok(self)
    }

    /// Negates the next condition or group.
    pub fn not(&mut self) -> Result<&mut Self> {
        self.ensure_mutable()?;
        self.builder.not();
        Ok(self)
    }

    /// Starts a new alternative in the current group.
    pub fn or(&mut self) -> Result<&mut Self> {
        self.ensure_mutable()?;
        self.builder.or()?;
        Ok(self)
    }

    /// Opens a group; conditions inside it combine before joining the outer scope.
    pub fn group_begin(&mut self) -> Result<&mut Self> {
        self.ensure_mutable()?;
        self.builder.group_begin();
        Ok(self)
    }

    /// Closes the innermost group.
    pub fn group_end(&mut self) -> Result<&mut Self> {
        self.ensure_mutable()?;
        self.builder.group_end()?;
        Ok(self)
    }

    /// Drops every condition and unfreezes the query.
    pub fn reset(&mut self) -> &mut Self {
        self.builder.clear();
        self.frozen = false;
        self
    }

    /// The expression built so far.
    pub fn predicate(&self) -> Result<Predicate> {
        Ok(self.builder.build()?)
    }

    /// Number of objects in `ctx` matching the query.
    pub fn count(&self, ctx: &impl ReadContext) -> Result<usize> {
        let predicate = self.predicate()?;
        let table = ctx.group().table(self.object_type())?;
        let matches = predicate.accept(&mut TableEvaluator::new(table))?.len();
        log_debug!(
            component = "query",
            event = "query_counted",
            object_type = self.object_type(),
            predicate = %predicate,
            version = %ctx.version(),
            matches,
        );
        Ok(matches)
    }

    /// Freezes the query and binds it, with `ordering`, to the state visible
    /// in `ctx`.
    pub fn create_results(
        &mut self,
        ctx: &impl ReadContext,
        ordering: &DescriptorOrdering,
    ) -> Result<Results> {
        let predicate = self.predicate()?;
        ordering.validate(&self.schema)?;
        self.frozen = true;
        log_info!(
            component = "query",
            event = "results_created",
            object_type = self.object_type(),
            predicate = %predicate,
            descriptors = ordering.steps().len(),
            version = %ctx.version(),
        );
        Ok(Results::new(
            ctx.snapshot(),
            Arc::clone(&self.schema),
            predicate,
            ordering.clone(),
        ))
    }
}

fn check_kind(property: &Property, kind: ScalarKind) -> Result<()> {
    if property.property_type().accepts(kind) {
        return Ok(());
    }
    Err(EmberError::TypeMismatch {
        property: Arc::clone(&property.name),
        property_type: property.property_type(),
        value_kind: kind,
    })
}

fn unsupported(property: &Property, operator: &'static str) -> EmberError {
    EmberError::UnsupportedOperator {
        property: Arc::clone(&property.name),
        property_type: property.property_type(),
        operator,
    }
}
