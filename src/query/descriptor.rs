use std::{cmp::Ordering, collections::BTreeSet, sync::Arc};

use ember_predicate::{ObjKey, ScalarValue};

use crate::{
    error::{EmberError, Result},
    schema::{ColumnResolver, ObjectSchema, PropertyType},
    table::{Cell, Table},
};

/// One sort column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey {
    /// Property to sort by.
    pub property_index: usize,
    /// Sort direction.
    pub ascending: bool,
}

impl SortKey {
    /// Ascending key on `property_index`.
    pub fn ascending(property_index: usize) -> Self {
        Self {
            property_index,
            ascending: true,
        }
    }

    /// Descending key on `property_index`.
    pub fn descending(property_index: usize) -> Self {
        Self {
            property_index,
            ascending: false,
        }
    }
}

/// A single post-filter step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Descriptor {
    /// Stable sort by the given keys, most significant first. Nulls sort
    /// before every value when ascending.
    Sort(Vec<SortKey>),
    /// Keep the first row of every distinct value tuple.
    Distinct(Vec<usize>),
    /// Keep at most this many rows.
    Limit(usize),
}

/// Ordered list of [`Descriptor`]s applied to the matches of a query.
///
/// Steps run in the order they were added, so `sort` followed by `limit`
/// yields the top rows while `limit` followed by `sort` sorts an arbitrary
/// prefix.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DescriptorOrdering {
    steps: Vec<Descriptor>,
}

impl DescriptorOrdering {
    /// Creates an empty ordering that keeps the match order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorts by one property.
    pub fn sort(self, property_index: usize, ascending: bool) -> Self {
        self.sort_by([SortKey {
            property_index,
            ascending,
        }])
    }

    /// Sorts by several properties, most significant first.
    pub fn sort_by(mut self, keys: impl IntoIterator<Item = SortKey>) -> Self {
        self.steps.push(Descriptor::Sort(keys.into_iter().collect()));
        self
    }

    /// Keeps the first row of each distinct value tuple over `property_indices`.
    pub fn distinct(mut self, property_indices: impl IntoIterator<Item = usize>) -> Self {
        self.steps
            .push(Descriptor::Distinct(property_indices.into_iter().collect()));
        self
    }

    /// Keeps at most `limit` rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.steps.push(Descriptor::Limit(limit));
        self
    }

    /// True when no step was added.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps in the order they run.
    pub fn steps(&self) -> &[Descriptor] {
        &self.steps
    }

    /// Checks that every referenced property exists and can be ordered.
    pub(crate) fn validate(&self, schema: &ObjectSchema) -> Result<()> {
        for step in &self.steps {
            match step {
                Descriptor::Sort(keys) => {
                    for key in keys {
                        check_orderable(schema, key.property_index, "sort")?;
                    }
                }
                Descriptor::Distinct(indices) => {
                    for index in indices {
                        check_orderable(schema, *index, "distinct")?;
                    }
                }
                Descriptor::Limit(_) => {}
            }
        }
        Ok(())
    }

    /// Runs every step over `rows`, which hold keys of `table`.
    pub(crate) fn apply(&self, table: &Table, mut rows: Vec<ObjKey>) -> Result<Vec<ObjKey>> {
        let schema = Arc::clone(table.schema());
        for step in &self.steps {
            match step {
                Descriptor::Sort(keys) => {
                    let columns = keys
                        .iter()
                        .map(|key| {
                            let column = schema.resolve(key.property_index)?.column();
                            Ok((column, key.ascending))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    rows.sort_by(|lhs, rhs| {
                        columns
                            .iter()
                            .map(|&(column, ascending)| {
                                let ordering = total_order(
                                    value(table, *lhs, column),
                                    value(table, *rhs, column),
                                );
                                if ascending {
                                    ordering
                                } else {
                                    ordering.reverse()
                                }
                            })
                            .find(|ordering| ordering.is_ne())
                            .unwrap_or(Ordering::Equal)
                    });
                }
                Descriptor::Distinct(indices) => {
                    let columns = indices
                        .iter()
                        .map(|index| Ok(schema.resolve(*index)?.column()))
                        .collect::<Result<Vec<_>>>()?;
                    let mut seen = BTreeSet::new();
                    rows.retain(|key| {
                        let tuple = columns
                            .iter()
                            .map(|column| value(table, *key, *column).clone())
                            .collect();
                        seen.insert(DistinctKey(tuple))
                    });
                }
                Descriptor::Limit(limit) => rows.truncate(*limit),
            }
        }
        Ok(rows)
    }
}

fn check_orderable(
    schema: &ObjectSchema,
    property_index: usize,
    operator: &'static str,
) -> Result<()> {
    let property = schema.resolve(property_index)?;
    if property.property_type() == PropertyType::List {
        return Err(EmberError::UnsupportedOperator {
            property: Arc::clone(&property.name),
            property_type: property.property_type(),
            operator,
        });
    }
    Ok(())
}

fn value(table: &Table, key: ObjKey, column: usize) -> &ScalarValue {
    table
        .cell(key, column)
        .and_then(Cell::as_value)
        .unwrap_or(&ScalarValue::Null)
}

/// Ordering used by sort and distinct: null first, floats by
/// `total_cmp`, everything else by value.
fn total_order(lhs: &ScalarValue, rhs: &ScalarValue) -> Ordering {
    match (lhs, rhs) {
        (ScalarValue::Null, ScalarValue::Null) => Ordering::Equal,
        (ScalarValue::Null, _) => Ordering::Less,
        (_, ScalarValue::Null) => Ordering::Greater,
        (ScalarValue::Float(lhs), ScalarValue::Float(rhs)) => lhs.total_cmp(rhs),
        (ScalarValue::Double(lhs), ScalarValue::Double(rhs)) => lhs.total_cmp(rhs),
        (lhs, rhs) => lhs.compare(rhs).unwrap_or(Ordering::Equal),
    }
}

struct DistinctKey(Vec<ScalarValue>);

impl Ord for DistinctKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(lhs, rhs)| total_order(lhs, rhs))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| self.0.len().cmp(&other.0.len()))
    }
}

impl PartialOrd for DistinctKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DistinctKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for DistinctKey {}
