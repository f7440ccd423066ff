use std::sync::Arc;

use ember_predicate::{
    BitmapRowSet, ColumnRef, ObjKey, PredicateNode, PredicateVisitor, RowSet, ScalarValue,
    TextMatcher,
};

use super::{Cell, Table};
use crate::{
    error::{EmberError, Result},
    schema::{ColumnResolver, Property, PropertyType},
};

/// Folds a predicate into the set of matching rows of one table.
pub(crate) struct TableEvaluator<'a> {
    table: &'a Table,
    universe: BitmapRowSet,
}

impl<'a> TableEvaluator<'a> {
    pub(crate) fn new(table: &'a Table) -> Self {
        Self {
            table,
            universe: table.universe(),
        }
    }

    fn property(&self, column: &ColumnRef) -> Result<&'a Property> {
        let table: &'a Table = self.table;
        table.schema.resolve(column.index)
    }

    fn select<F>(&self, column: usize, keep: F) -> BitmapRowSet
    where
        F: Fn(&Cell) -> bool,
    {
        self.table
            .rows
            .iter()
            .filter(|(_, cells)| cells.get(column).is_some_and(&keep))
            .map(|(key, _)| key.get())
            .collect()
    }
}

fn reject(property: &Property, operator: &'static str) -> EmberError {
    EmberError::UnsupportedOperator {
        property: Arc::clone(&property.name),
        property_type: property.property_type(),
        operator,
    }
}

fn cell_value(cell: &Cell) -> &ScalarValue {
    cell.as_value().unwrap_or(&ScalarValue::Null)
}

impl PredicateVisitor for TableEvaluator<'_> {
    type Error = EmberError;
    type Value = BitmapRowSet;

    fn visit_leaf(&mut self, leaf: &PredicateNode) -> Result<Self::Value> {
        match leaf {
            PredicateNode::True => Ok(self.universe.clone()),
            PredicateNode::Compare { column, op, value } => {
                let property = self.property(column)?;
                if property.property_type().is_link() {
                    return Err(reject(property, op.as_str()));
                }
                Ok(self.select(property.column(), |cell| {
                    op.matches(cell_value(cell), value)
                }))
            }
            PredicateNode::Text {
                column,
                op,
                pattern,
                case_sensitive,
            } => {
                let property = self.property(column)?;
                if property.property_type() != PropertyType::String {
                    return Err(reject(property, op.as_str()));
                }
                let matcher = TextMatcher::new(*op, pattern, *case_sensitive)?;
                Ok(self.select(property.column(), |cell| {
                    matcher.matches(cell_value(cell).as_str())
                }))
            }
            PredicateNode::LinksTo { column, target } => {
                let property = self.property(column)?;
                let target: ObjKey = *target;
                match property.property_type() {
                    PropertyType::Object => Ok(self.select(property.column(), |cell| {
                        cell_value(cell).as_link() == Some(target)
                    })),
                    PropertyType::List => Ok(self.select(property.column(), |cell| {
                        matches!(cell, Cell::List(items) if items.contains(&target))
                    })),
                    _ => Err(reject(property, "links to")),
                }
            }
            PredicateNode::LinkIsNull { column, negated } => {
                let property = self.property(column)?;
                if property.property_type() != PropertyType::Object {
                    return Err(reject(property, "link is null"));
                }
                let negated = *negated;
                Ok(self.select(property.column(), |cell| {
                    cell_value(cell).is_null() != negated
                }))
            }
            branch @ (PredicateNode::Not(_) | PredicateNode::And(_) | PredicateNode::Or(_)) => {
                self.visit_node(branch)
            }
        }
    }

    fn combine_not(&mut self, child: Self::Value) -> Result<Self::Value> {
        Ok(self.universe.difference(&child))
    }

    fn combine_and(&mut self, children: Vec<Self::Value>) -> Result<Self::Value> {
        Ok(children
            .into_iter()
            .reduce(|acc, value| acc.intersect(&value))
            .unwrap_or_else(|| self.universe.clone()))
    }

    fn combine_or(&mut self, children: Vec<Self::Value>) -> Result<Self::Value> {
        Ok(children
            .into_iter()
            .reduce(|acc, value| acc.union(&value))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use ember_predicate::{ComparisonOp, Predicate, RowId, TextOp};

    use super::*;
    use crate::schema::ObjectSchema;

    fn people() -> Table {
        let schema = ObjectSchema::builder("Person")
            .property("name", PropertyType::String)
            .nullable("age", PropertyType::Int)
            .link("partner", "Person")
            .list("friends", "Person")
            .build()
            .expect("valid schema");
        let mut table = Table::new(Arc::new(schema));
        for (name, age) in [("Ann", Some(30i64)), ("Bo", None), ("Cy", Some(40))] {
            let key = table.create_object().expect("key");
            table.set(key, 0, ScalarValue::from(name)).expect("name");
            table.set(key, 1, ScalarValue::from(age)).expect("age");
        }
        table
            .set(ObjKey::new(0), 2, ScalarValue::Link(ObjKey::new(2)))
            .expect("partner");
        table
            .list_mut(ObjKey::new(1), 3)
            .expect("friends")
            .push(ObjKey::new(0));
        table
    }

    fn rows(table: &Table, node: PredicateNode) -> Result<Vec<RowId>> {
        let mut evaluator = TableEvaluator::new(table);
        let set = Predicate::from_node(node).accept(&mut evaluator)?;
        Ok(set.iter().collect())
    }

    fn column(table: &Table, index: usize) -> ColumnRef {
        table.schema().column(index).expect("column exists")
    }

    #[test]
    fn null_cells_only_match_inequality() {
        let table = people();
        let age = column(&table, 1);
        let positive = PredicateNode::Compare {
            column: age.clone(),
            op: ComparisonOp::GreaterThan,
            value: ScalarValue::Int(0),
        };
        assert_eq!(rows(&table, positive).expect("evaluates"), vec![0, 2]);

        let ne = PredicateNode::Compare {
            column: age.clone(),
            op: ComparisonOp::NotEqual,
            value: ScalarValue::Int(30),
        };
        assert_eq!(rows(&table, ne).expect("evaluates"), vec![1, 2]);

        let is_null = PredicateNode::Compare {
            column: age,
            op: ComparisonOp::Equal,
            value: ScalarValue::Null,
        };
        assert_eq!(rows(&table, is_null).expect("evaluates"), vec![1]);
    }

    #[test]
    fn link_leaves_cover_single_links_and_lists() {
        let table = people();
        let unset = PredicateNode::LinkIsNull {
            column: column(&table, 2),
            negated: false,
        };
        assert_eq!(rows(&table, unset).expect("evaluates"), vec![1, 2]);

        let to_cy = PredicateNode::LinksTo {
            column: column(&table, 2),
            target: ObjKey::new(2),
        };
        assert_eq!(rows(&table, to_cy).expect("evaluates"), vec![0]);

        let friend_of_ann = PredicateNode::LinksTo {
            column: column(&table, 3),
            target: ObjKey::new(0),
        };
        assert_eq!(rows(&table, friend_of_ann).expect("evaluates"), vec![1]);
    }

    #[test]
    fn text_leaf_on_numeric_column_is_rejected() {
        let table = people();
        let node = PredicateNode::Text {
            column: column(&table, 1),
            op: TextOp::Contains,
            pattern: "3".into(),
            case_sensitive: true,
        };
        assert!(matches!(
            rows(&table, node),
            Err(EmberError::UnsupportedOperator { .. })
        ));
    }
}
