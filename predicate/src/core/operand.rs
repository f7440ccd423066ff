use std::{fmt, sync::Arc};

/// Reference identifying a resolved column used inside predicates.
///
/// `index` is the physical column position within the table the predicate
/// runs against; `name` is carried for diagnostics only.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Physical column position.
    pub index: usize,
    /// Property name backing the column.
    pub name: Arc<str>,
}

impl ColumnRef {
    /// Creates a new column reference from a position and a name.
    #[must_use]
    pub fn new<N>(index: usize, name: N) -> Self
    where
        N: Into<Arc<str>>,
    {
        Self {
            index,
            name: name.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
