//! Core predicate structures shared by the query layer and storage evaluators.

mod builder;
mod error;
mod node;
mod operand;
mod row_set;
mod text;
mod value;
mod visitor;

pub use builder::PredicateBuilder;
pub use error::PredicateError;
pub use node::{ComparisonOp, Predicate, PredicateNode};
pub use operand::ColumnRef;
pub use row_set::{BitmapRowSet, RowId, RowIdIter, RowSet};
pub use text::{TextMatcher, TextOp};
pub use value::{ObjKey, ObjectId, ScalarKind, ScalarValue, Timestamp};
pub use visitor::PredicateVisitor;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct SampleRow {
        id: RowId,
        age: ScalarValue,
        name: ScalarValue,
    }

    fn sample_rows() -> Vec<SampleRow> {
        vec![
            SampleRow {
                id: 0,
                age: ScalarValue::from(30i64),
                name: ScalarValue::from("Ann"),
            },
            SampleRow {
                id: 1,
                age: ScalarValue::from(20i64),
                name: ScalarValue::from("Bo"),
            },
            SampleRow {
                id: 2,
                age: ScalarValue::Null,
                name: ScalarValue::from("Cy"),
            },
            SampleRow {
                id: 3,
                age: ScalarValue::from(40i64),
                name: ScalarValue::Null,
            },
        ]
    }

    struct RowVisitor {
        rows: Vec<SampleRow>,
    }

    impl RowVisitor {
        fn cell<'a>(row: &'a SampleRow, column: &ColumnRef) -> &'a ScalarValue {
            match column.name.as_ref() {
                "age" => &row.age,
                _ => &row.name,
            }
        }

        fn universe(&self) -> BitmapRowSet {
            self.rows.iter().map(|row| row.id).collect()
        }

        fn select<F>(&self, keep: F) -> BitmapRowSet
        where
            F: Fn(&SampleRow) -> bool,
        {
            self.rows
                .iter()
                .filter(|row| keep(row))
                .map(|row| row.id)
                .collect()
        }
    }

    impl PredicateVisitor for RowVisitor {
        type Error = PredicateError;
        type Value = BitmapRowSet;

        fn visit_leaf(&mut self, leaf: &PredicateNode) -> Result<Self::Value, Self::Error> {
            Ok(match leaf {
                PredicateNode::True => self.universe(),
                PredicateNode::Compare { column, op, value } => {
                    self.select(|row| op.matches(Self::cell(row, column), value))
                }
                PredicateNode::Text {
                    column,
                    op,
                    pattern,
                    case_sensitive,
                } => {
                    let matcher = TextMatcher::new(*op, pattern, *case_sensitive)?;
                    self.select(|row| matcher.matches(Self::cell(row, column).as_str()))
                }
                _ => BitmapRowSet::new(),
            })
        }

        fn combine_not(&mut self, child: Self::Value) -> Result<Self::Value, Self::Error> {
            Ok(self.universe().difference(&child))
        }

        fn combine_and(&mut self, children: Vec<Self::Value>) -> Result<Self::Value, Self::Error> {
            Ok(children
                .into_iter()
                .reduce(|acc, value| acc.intersect(&value))
                .unwrap_or_else(|| self.universe()))
        }

        fn combine_or(&mut self, children: Vec<Self::Value>) -> Result<Self::Value, Self::Error> {
            Ok(children
                .into_iter()
                .reduce(|acc, value| acc.union(&value))
                .unwrap_or_default())
        }
    }

    fn evaluate(builder: &PredicateBuilder) -> Vec<RowId> {
        let predicate = builder.build().expect("well formed");
        let mut visitor = RowVisitor {
            rows: sample_rows(),
        };
        predicate
            .accept(&mut visitor)
            .expect("evaluates")
            .iter()
            .collect()
    }

    #[test]
    fn builder_and_visitor_agree_on_precedence() {
        let age = ColumnRef::new(0, "age");
        let name = ColumnRef::new(1, "name");

        let mut builder = PredicateBuilder::new();
        builder.compare(age.clone(), ComparisonOp::GreaterThan, ScalarValue::from(25i64));
        builder.or().expect("left side present");
        builder.text(name.clone(), TextOp::Equal, "bo", false);
        assert_eq!(evaluate(&builder), vec![0, 1, 3]);

        let mut negated = PredicateBuilder::new();
        negated.not();
        negated.group_begin();
        negated.compare(age.clone(), ComparisonOp::GreaterThan, ScalarValue::from(25i64));
        negated.or().expect("left side present");
        negated.compare(age, ComparisonOp::Equal, ScalarValue::Null);
        negated.group_end().expect("group open");
        assert_eq!(evaluate(&negated), vec![1]);
    }

    #[test]
    fn null_text_cells_fail_positive_matches() {
        let name = ColumnRef::new(1, "name");
        let mut builder = PredicateBuilder::new();
        builder.text(name, TextOp::Contains, "", true);
        assert_eq!(evaluate(&builder), vec![0, 1, 2]);
    }
}
