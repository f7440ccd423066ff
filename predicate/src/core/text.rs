use std::fmt;

use regex::{Regex, RegexBuilder};

use super::PredicateError;

/// Operator used by text predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextOp {
    /// Whole-value equality.
    Equal,
    /// Whole-value inequality; null values match.
    NotEqual,
    /// Substring match.
    Contains,
    /// Prefix match.
    BeginsWith,
    /// Suffix match.
    EndsWith,
    /// Wildcard match where `*` spans any run of characters and `?` exactly one.
    Like,
}

impl TextOp {
    /// Returns a textual representation of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TextOp::Equal => "==",
            TextOp::NotEqual => "!=",
            TextOp::Contains => "CONTAINS",
            TextOp::BeginsWith => "BEGINSWITH",
            TextOp::EndsWith => "ENDSWITH",
            TextOp::Like => "LIKE",
        }
    }
}

impl fmt::Display for TextOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled form of a text predicate, built once per evaluation.
#[derive(Clone, Debug)]
pub struct TextMatcher {
    op: TextOp,
    case_sensitive: bool,
    needle: String,
    pattern: Option<Regex>,
}

impl TextMatcher {
    /// Compiles `needle` for `op`.
    ///
    /// Case-insensitive matching folds both sides to lowercase.
    pub fn new(op: TextOp, needle: &str, case_sensitive: bool) -> Result<Self, PredicateError> {
        let pattern = match op {
            TextOp::Like => Some(
                RegexBuilder::new(&like_to_regex(needle))
                    .case_insensitive(!case_sensitive)
                    .build()?,
            ),
            _ => None,
        };
        let needle = if case_sensitive {
            needle.to_owned()
        } else {
            needle.to_lowercase()
        };
        Ok(Self {
            op,
            case_sensitive,
            needle,
            pattern,
        })
    }

    /// Tests a stored value; `None` stands for a null cell.
    #[must_use]
    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return self.op == TextOp::NotEqual;
        };
        if let Some(pattern) = &self.pattern {
            return pattern.is_match(value);
        }
        let folded;
        let haystack = if self.case_sensitive {
            value
        } else {
            folded = value.to_lowercase();
            folded.as_str()
        };
        let needle = self.needle.as_str();
        match self.op {
            TextOp::Equal => haystack == needle,
            TextOp::NotEqual => haystack != needle,
            TextOp::Contains => haystack.contains(needle),
            TextOp::BeginsWith => haystack.starts_with(needle),
            TextOp::EndsWith => haystack.ends_with(needle),
            TextOp::Like => false,
        }
    }
}

fn like_to_regex(pattern: &str) -> String {
    let mut body = String::with_capacity(pattern.len() + 8);
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '*' => body.push_str(".*"),
            '?' => body.push('.'),
            other => body.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    format!("^(?s:{body})$")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(op: TextOp, needle: &str, case_sensitive: bool) -> TextMatcher {
        TextMatcher::new(op, needle, case_sensitive).expect("pattern compiles")
    }

    #[test]
    fn case_folding_only_when_requested() {
        let exact = matcher(TextOp::Contains, "nn", true);
        assert!(exact.matches(Some("Ann")));
        assert!(!exact.matches(Some("ANN")));

        let folded = matcher(TextOp::Contains, "NN", false);
        assert!(folded.matches(Some("Ann")));
        assert!(folded.matches(Some("ANN")));
    }

    #[test]
    fn prefix_suffix_and_equality() {
        assert!(matcher(TextOp::BeginsWith, "An", true).matches(Some("Ann")));
        assert!(!matcher(TextOp::BeginsWith, "nn", true).matches(Some("Ann")));
        assert!(matcher(TextOp::EndsWith, "NN", false).matches(Some("Ann")));
        assert!(matcher(TextOp::Equal, "ann", false).matches(Some("Ann")));
        assert!(!matcher(TextOp::Equal, "ann", true).matches(Some("Ann")));
        assert!(matcher(TextOp::NotEqual, "ann", true).matches(Some("Ann")));
    }

    #[test]
    fn like_wildcards() {
        let like = matcher(TextOp::Like, "a?c*", true);
        assert!(like.matches(Some("abc")));
        assert!(like.matches(Some("abcdef")));
        assert!(!like.matches(Some("ac")));
        assert!(!like.matches(Some("Abc")));

        let folded = matcher(TextOp::Like, "a?c*", false);
        assert!(folded.matches(Some("ABCD")));
    }

    #[test]
    fn like_escapes_regex_metacharacters() {
        let like = matcher(TextOp::Like, "a.b+(c)", true);
        assert!(like.matches(Some("a.b+(c)")));
        assert!(!like.matches(Some("axbb(c)")));
    }

    #[test]
    fn null_cells_only_satisfy_not_equal() {
        assert!(!matcher(TextOp::Equal, "", true).matches(None));
        assert!(!matcher(TextOp::Like, "*", true).matches(None));
        assert!(matcher(TextOp::NotEqual, "x", true).matches(None));
    }
}
