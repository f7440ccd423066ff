use thiserror::Error;

/// Errors raised while composing or compiling a predicate.
#[derive(Debug, Error)]
pub enum PredicateError {
    /// `group_end` without an open group.
    #[error("group_end() called without a matching group_begin()")]
    UnmatchedGroupEnd,
    /// Groups still open when the predicate was requested.
    #[error("{open} group(s) still open; every group_begin() needs a group_end()")]
    UnclosedGroup {
        /// Number of groups left open.
        open: usize,
    },
    /// `not` with nothing to negate.
    #[error("not() must be followed by a condition or a group")]
    DanglingNot,
    /// `or` with no condition before it in the current scope.
    #[error("or() must follow a condition in the same group")]
    OrWithoutLeft,
    /// `or` with no condition after it in the current scope.
    #[error("or() must be followed by a condition in the same group")]
    OrWithoutRight,
    /// A LIKE pattern that failed to compile.
    #[error("invalid LIKE pattern: {0}")]
    Pattern(#[from] regex::Error),
}
