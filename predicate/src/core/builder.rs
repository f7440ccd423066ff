//! Incremental builder for composing predicate trees.
//!
//! Conditions appended to a scope are ANDed. `or()` closes the running
//! conjunction and starts a new alternative, so each scope is a disjunction of
//! conjunctions. `not()` opens a one-shot scope that negates the next
//! condition or group, and `group_begin()`/`group_end()` delimit explicit
//! scopes.

use super::{
    ColumnRef, ComparisonOp, ObjKey, Predicate, PredicateError, PredicateNode, ScalarValue, TextOp,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameKind {
    Root,
    Group,
    Not,
}

#[derive(Clone, Debug)]
struct Frame {
    kind: FrameKind,
    alternatives: Vec<Vec<Predicate>>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            alternatives: vec![Vec::new()],
        }
    }

    fn current(&mut self) -> &mut Vec<Predicate> {
        if self.alternatives.is_empty() {
            self.alternatives.push(Vec::new());
        }
        let last = self.alternatives.len() - 1;
        &mut self.alternatives[last]
    }

    fn is_empty(&self) -> bool {
        self.alternatives.iter().all(Vec::is_empty)
    }

    fn to_predicate(&self) -> Result<Predicate, PredicateError> {
        if self.alternatives.len() > 1 && self.alternatives.iter().any(Vec::is_empty) {
            return Err(PredicateError::OrWithoutRight);
        }
        let mut alternatives = self
            .alternatives
            .iter()
            .map(|clauses| Predicate::and(clauses.iter().cloned()));
        match self.alternatives.len() {
            0 | 1 => Ok(alternatives.next().unwrap_or_else(Predicate::always)),
            _ => Ok(Predicate::or(alternatives)),
        }
    }
}

/// Builder for composing predicates incrementally.
///
/// The builder is never consumed: [`PredicateBuilder::build`] snapshots the
/// expression so far and leaves the builder usable.
#[derive(Clone, Debug)]
pub struct PredicateBuilder {
    frames: Vec<Frame>,
}

impl PredicateBuilder {
    /// Creates an empty builder; an empty builder matches every row.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new(FrameKind::Root)],
        }
    }

    /// Returns true when no condition, combinator or group has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.len() == 1 && self.frames[0].is_empty()
    }

    /// Number of explicit groups currently open.
    #[must_use]
    pub fn open_groups(&self) -> usize {
        self.frames
            .iter()
            .filter(|frame| frame.kind == FrameKind::Group)
            .count()
    }

    /// Discards everything appended so far.
    pub fn clear(&mut self) {
        self.frames = vec![Frame::new(FrameKind::Root)];
    }

    /// Appends an already built predicate as a single condition.
    pub fn push(&mut self, predicate: Predicate) {
        let mut node = predicate;
        loop {
            let top = self.top();
            top.current().push(node);
            if top.kind != FrameKind::Not {
                return;
            }
            // A pending negation closes as soon as it holds one condition.
            let frame = self.frames.pop().unwrap_or_else(|| Frame::new(FrameKind::Root));
            node = Predicate::and(frame.alternatives.into_iter().flatten()).negate();
        }
    }

    /// Appends a scalar comparison.
    pub fn compare(&mut self, column: ColumnRef, op: ComparisonOp, value: ScalarValue) {
        self.push(Predicate::from_kind(PredicateNode::Compare {
            column,
            op,
            value,
        }));
    }

    /// Appends a text comparison.
    pub fn text(&mut self, column: ColumnRef, op: TextOp, pattern: &str, case_sensitive: bool) {
        self.push(Predicate::from_kind(PredicateNode::Text {
            column,
            op,
            pattern: pattern.to_owned(),
            case_sensitive,
        }));
    }

    /// Appends a "links to `target`" condition.
    pub fn links_to(&mut self, column: ColumnRef, target: ObjKey) {
        self.push(Predicate::from_kind(PredicateNode::LinksTo { column, target }));
    }

    /// Appends an "unset link" (or, when `negated`, "set link") condition.
    pub fn link_is_null(&mut self, column: ColumnRef, negated: bool) {
        self.push(Predicate::from_kind(PredicateNode::LinkIsNull { column, negated }));
    }

    /// Negates the next condition or group.
    pub fn not(&mut self) {
        self.frames.push(Frame::new(FrameKind::Not));
    }

    /// Starts a new alternative in the current scope.
    pub fn or(&mut self) -> Result<(), PredicateError> {
        let top = self.top();
        if top.current().is_empty() {
            return Err(PredicateError::OrWithoutLeft);
        }
        top.alternatives.push(Vec::new());
        Ok(())
    }

    /// Opens an explicit scope.
    pub fn group_begin(&mut self) {
        self.frames.push(Frame::new(FrameKind::Group));
    }

    /// Closes the innermost explicit scope and appends it as one condition.
    pub fn group_end(&mut self) -> Result<(), PredicateError> {
        match self.frames.last().map(|frame| frame.kind) {
            Some(FrameKind::Group) => {}
            Some(FrameKind::Not) => return Err(PredicateError::DanglingNot),
            Some(FrameKind::Root) | None => return Err(PredicateError::UnmatchedGroupEnd),
        }
        let predicate = self.top().to_predicate()?;
        self.frames.pop();
        self.push(predicate);
        Ok(())
    }

    /// Returns the expression built so far.
    ///
    /// Fails when a group is still open, a `not()` has nothing to negate, or an
    /// `or()` has no right-hand side.
    pub fn build(&self) -> Result<Predicate, PredicateError> {
        let open = self.open_groups();
        if open > 0 {
            return Err(PredicateError::UnclosedGroup { open });
        }
        if self.frames.len() > 1 {
            return Err(PredicateError::DanglingNot);
        }
        match self.frames.first() {
            Some(root) => Ok(root.to_predicate()?.simplify()),
            None => Ok(Predicate::always()),
        }
    }

    fn top(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::new(FrameKind::Root));
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

impl Default for PredicateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age() -> ColumnRef {
        ColumnRef::new(1, "age")
    }

    fn age_is(builder: &mut PredicateBuilder, value: i64) {
        builder.compare(age(), ComparisonOp::Equal, ScalarValue::from(value));
    }

    #[test]
    fn empty_builder_matches_everything() {
        let builder = PredicateBuilder::new();
        assert!(builder.is_empty());
        assert!(builder.build().expect("empty builds").is_always());
    }

    #[test]
    fn successive_conditions_are_anded() {
        let mut builder = PredicateBuilder::new();
        age_is(&mut builder, 1);
        age_is(&mut builder, 2);
        assert_eq!(
            builder.build().expect("builds").to_string(),
            "age == 1 AND age == 2"
        );
    }

    #[test]
    fn or_binds_looser_than_implicit_and() {
        let mut builder = PredicateBuilder::new();
        age_is(&mut builder, 1);
        age_is(&mut builder, 2);
        builder.or().expect("left side present");
        age_is(&mut builder, 3);
        assert_eq!(
            builder.build().expect("builds").to_string(),
            "(age == 1 AND age == 2) OR age == 3"
        );
    }

    #[test]
    fn groups_scope_or() {
        let mut builder = PredicateBuilder::new();
        age_is(&mut builder, 1);
        builder.group_begin();
        age_is(&mut builder, 2);
        builder.or().expect("left side present");
        age_is(&mut builder, 3);
        builder.group_end().expect("group open");
        assert_eq!(
            builder.build().expect("builds").to_string(),
            "age == 1 AND (age == 2 OR age == 3)"
        );
    }

    #[test]
    fn not_negates_only_the_next_condition() {
        let mut builder = PredicateBuilder::new();
        builder.not();
        age_is(&mut builder, 1);
        age_is(&mut builder, 2);
        assert_eq!(
            builder.build().expect("builds").to_string(),
            "NOT age == 1 AND age == 2"
        );
    }

    #[test]
    fn not_followed_by_group_negates_the_group() {
        let mut builder = PredicateBuilder::new();
        builder.not();
        builder.group_begin();
        age_is(&mut builder, 1);
        builder.or().expect("left side present");
        age_is(&mut builder, 2);
        builder.group_end().expect("group open");
        age_is(&mut builder, 3);
        assert_eq!(
            builder.build().expect("builds").to_string(),
            "NOT (age == 1 OR age == 2) AND age == 3"
        );
    }

    #[test]
    fn double_not_cancels() {
        let mut builder = PredicateBuilder::new();
        builder.not();
        builder.not();
        age_is(&mut builder, 1);
        assert_eq!(builder.build().expect("builds").to_string(), "age == 1");
    }

    #[test]
    fn unclosed_group_is_malformed() {
        let mut builder = PredicateBuilder::new();
        builder.group_begin();
        age_is(&mut builder, 1);
        assert!(matches!(
            builder.build(),
            Err(PredicateError::UnclosedGroup { open: 1 })
        ));
        builder.group_end().expect("group open");
        assert!(builder.build().is_ok());
    }

    #[test]
    fn unmatched_group_end_is_rejected() {
        let mut builder = PredicateBuilder::new();
        assert!(matches!(
            builder.group_end(),
            Err(PredicateError::UnmatchedGroupEnd)
        ));
    }

    #[test]
    fn dangling_not_is_rejected() {
        let mut builder = PredicateBuilder::new();
        builder.not();
        assert!(matches!(builder.build(), Err(PredicateError::DanglingNot)));

        let mut grouped = PredicateBuilder::new();
        grouped.group_begin();
        grouped.not();
        assert!(matches!(
            grouped.group_end(),
            Err(PredicateError::DanglingNot)
        ));
    }

    #[test]
    fn or_requires_both_sides() {
        let mut builder = PredicateBuilder::new();
        assert!(matches!(builder.or(), Err(PredicateError::OrWithoutLeft)));

        age_is(&mut builder, 1);
        builder.or().expect("left side present");
        assert!(matches!(
            builder.build(),
            Err(PredicateError::OrWithoutRight)
        ));
    }

    #[test]
    fn empty_group_matches_everything() {
        let mut builder = PredicateBuilder::new();
        builder.group_begin();
        builder.group_end().expect("group open");
        assert!(builder.build().expect("builds").is_always());
    }

    #[test]
    fn build_does_not_consume_and_clear_resets() {
        let mut builder = PredicateBuilder::new();
        age_is(&mut builder, 1);
        let first = builder.build().expect("builds");
        assert_eq!(builder.build().expect("builds again"), first);

        builder.clear();
        assert!(builder.is_empty());
    }
}
