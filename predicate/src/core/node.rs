use std::{cmp::Ordering, fmt};

use super::{ColumnRef, ObjKey, PredicateVisitor, ScalarValue, TextOp};

/// Comparison operator used by scalar predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Equals (`==`).
    Equal,
    /// Not equals (`!=`).
    NotEqual,
    /// Less than (`<`).
    LessThan,
    /// Less than or equal to (`<=`).
    LessThanOrEqual,
    /// Greater than (`>`).
    GreaterThan,
    /// Greater than or equal to (`>=`).
    GreaterThanOrEqual,
}

impl ComparisonOp {
    /// Returns a textual representation of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "==",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
        }
    }

    /// Returns true for operators that need an ordering rather than equality.
    #[must_use]
    pub fn is_ordering(self) -> bool {
        !matches!(self, ComparisonOp::Equal | ComparisonOp::NotEqual)
    }

    /// Evaluates the operator against a comparison ordering.
    #[must_use]
    pub fn test_ordering(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equal => ordering == Ordering::Equal,
            ComparisonOp::NotEqual => ordering != Ordering::Equal,
            ComparisonOp::LessThan => ordering == Ordering::Less,
            ComparisonOp::LessThanOrEqual => ordering != Ordering::Greater,
            ComparisonOp::GreaterThan => ordering == Ordering::Greater,
            ComparisonOp::GreaterThanOrEqual => ordering != Ordering::Less,
        }
    }

    /// Tests a stored cell against a literal.
    ///
    /// Null behaves as a value of its own for equality: `== null` matches only
    /// null cells, `!= x` matches null cells. Ordering never matches null, and
    /// incomparable pairs (NaN) satisfy only `!=`.
    #[must_use]
    pub fn matches(self, stored: &ScalarValue, literal: &ScalarValue) -> bool {
        match (stored.is_null(), literal.is_null()) {
            (true, true) => self == ComparisonOp::Equal,
            (true, false) | (false, true) => self == ComparisonOp::NotEqual,
            (false, false) => match stored.compare(literal) {
                Some(ordering) => self.test_ordering(ordering),
                None => self == ComparisonOp::NotEqual,
            },
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recursive predicate node; leaf and branch variants coexist.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateNode {
    /// Always-true literal; matches all rows.
    True,
    /// Scalar comparison of a column against a literal (which may be `Null`
    /// for `==`/`!=`).
    Compare {
        /// Column under test.
        column: ColumnRef,
        /// Operator.
        op: ComparisonOp,
        /// Literal operand.
        value: ScalarValue,
    },
    /// Text comparison.
    Text {
        /// Column under test.
        column: ColumnRef,
        /// Operator.
        op: TextOp,
        /// Needle or LIKE pattern.
        pattern: String,
        /// False when both sides are case-folded before matching.
        case_sensitive: bool,
    },
    /// Link (or link list) column referencing a specific object.
    LinksTo {
        /// Link column under test.
        column: ColumnRef,
        /// Target object.
        target: ObjKey,
    },
    /// Link column with no target set.
    LinkIsNull {
        /// Link column under test.
        column: ColumnRef,
        /// True when matching links that are set.
        negated: bool,
    },
    /// Logical negation.
    Not(Box<Predicate>),
    /// Conjunction over multiple predicates.
    And(Vec<Predicate>),
    /// Disjunction over multiple predicates.
    Or(Vec<Predicate>),
}

impl PredicateNode {
    /// Returns true when the node has no child predicates.
    #[must_use]
    pub(crate) fn is_leaf(&self) -> bool {
        !matches!(
            self,
            PredicateNode::Not(_) | PredicateNode::And(_) | PredicateNode::Or(_)
        )
    }
}

/// Immutable boolean expression over the columns of one table.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    kind: PredicateNode,
}

impl Predicate {
    /// Predicate that matches every row.
    #[must_use]
    pub fn always() -> Self {
        Self::from_kind(PredicateNode::True)
    }

    /// Returns true for the match-everything predicate.
    #[must_use]
    pub fn is_always(&self) -> bool {
        matches!(self.kind, PredicateNode::True)
    }

    /// Returns a reference to the underlying node.
    #[must_use]
    pub fn kind(&self) -> &PredicateNode {
        &self.kind
    }

    /// Builds a conjunction from the supplied clauses, flattening nested
    /// conjunctions. An empty conjunction matches everything.
    #[must_use]
    pub fn and<I>(clauses: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        let mut acc = Vec::new();
        for clause in clauses {
            match clause.into_kind() {
                PredicateNode::And(mut nested) => acc.append(&mut nested),
                PredicateNode::True => {}
                other => acc.push(Predicate::from_kind(other)),
            }
        }

        match acc.len() {
            0 => Self::always(),
            1 => acc.pop().unwrap_or_else(Self::always),
            _ => Self::from_kind(PredicateNode::And(acc)),
        }
    }

    /// Builds a disjunction from the supplied clauses, flattening nested
    /// disjunctions.
    ///
    /// # Panics
    ///
    /// Panics if no clauses are provided.
    #[must_use]
    pub fn or<I>(clauses: I) -> Self
    where
        I: IntoIterator<Item = Predicate>,
    {
        let mut acc = Vec::new();
        for clause in clauses {
            match clause.into_kind() {
                PredicateNode::Or(mut nested) => acc.append(&mut nested),
                PredicateNode::True => return Self::always(),
                other => acc.push(Predicate::from_kind(other)),
            }
        }

        assert!(!acc.is_empty(), "Predicate::or requires at least one clause");

        if acc.len() == 1 {
            acc.pop().unwrap_or_else(Self::always)
        } else {
            Self::from_kind(PredicateNode::Or(acc))
        }
    }

    /// Wraps this predicate in a negation, cancelling a double negation.
    #[must_use]
    pub fn negate(self) -> Self {
        match self.kind {
            PredicateNode::Not(inner) => *inner,
            other => Self::from_kind(PredicateNode::Not(Box::new(Self::from_kind(other)))),
        }
    }

    /// Applies simple simplification rules to reduce nesting.
    #[must_use]
    pub fn simplify(self) -> Self {
        match self.kind {
            PredicateNode::Not(inner) => {
                let simplified_child = inner.simplify();
                match simplified_child.into_kind() {
                    PredicateNode::Not(grandchild) => *grandchild,
                    other => Self::from_kind(PredicateNode::Not(Box::new(Self::from_kind(other)))),
                }
            }
            PredicateNode::And(clauses) => {
                Predicate::and(clauses.into_iter().map(Predicate::simplify))
            }
            PredicateNode::Or(clauses) => {
                Predicate::or(clauses.into_iter().map(Predicate::simplify))
            }
            _ => self,
        }
    }

    /// Builds a predicate directly from a single node.
    #[must_use]
    pub fn from_node(node: PredicateNode) -> Self {
        Self::from_kind(node)
    }

    /// Accepts a visitor that walks the predicate tree bottom-up.
    pub fn accept<V>(&self, visitor: &mut V) -> Result<V::Value, V::Error>
    where
        V: PredicateVisitor + ?Sized,
    {
        visitor.visit_predicate(self)
    }

    pub(crate) fn from_kind(kind: PredicateNode) -> Self {
        Self { kind }
    }

    fn into_kind(self) -> PredicateNode {
        self.kind
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_leaf() || matches!(self.kind, PredicateNode::Not(_)) {
            write!(f, "{self}")
        } else {
            write!(f, "({self})")
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PredicateNode::True => f.write_str("TRUEPREDICATE"),
            PredicateNode::Compare { column, op, value } => write!(f, "{column} {op} {value}"),
            PredicateNode::Text {
                column,
                op,
                pattern,
                case_sensitive,
            } => {
                let fold = if *case_sensitive { "" } else { "[c]" };
                write!(f, "{column} {op}{fold} {pattern:?}")
            }
            PredicateNode::LinksTo { column, target } => write!(f, "{column} == {target}"),
            PredicateNode::LinkIsNull { column, negated } => {
                let state = if *negated { "SET" } else { "UNSET" };
                write!(f, "{column} IS {state}")
            }
            PredicateNode::Not(inner) => {
                f.write_str("NOT ")?;
                inner.fmt_operand(f)
            }
            PredicateNode::And(clauses) | PredicateNode::Or(clauses) => {
                let joiner = if matches!(self.kind, PredicateNode::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                for (idx, clause) in clauses.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(joiner)?;
                    }
                    clause.fmt_operand(f)?;
                }
                Ok(())
            }
        }
    }
}
