use crate::schema::Schema;

/// Name given to databases opened straight from a [`Schema`].
pub const DEFAULT_DB_NAME: &str = "default.ember";

/// Options used to open a [`DB`](crate::DB).
#[derive(Debug, Clone)]
pub struct DbOption {
    pub(crate) name: String,
    pub(crate) schema: Schema,
    pub(crate) schema_version: u64,
    pub(crate) read_only: bool,
}

impl From<Schema> for DbOption {
    fn from(schema: Schema) -> Self {
        DbOption {
            name: DEFAULT_DB_NAME.to_owned(),
            schema,
            schema_version: 0,
            read_only: false,
        }
    }
}

impl DbOption {
    /// Sets the display name used in logs and errors.
    pub fn name(self, name: impl Into<String>) -> Self {
        DbOption {
            name: name.into(),
            ..self
        }
    }

    /// Replaces the schema.
    pub fn schema(self, schema: Schema) -> Self {
        DbOption { schema, ..self }
    }

    /// Sets the schema version.
    pub fn schema_version(self, schema_version: u64) -> Self {
        DbOption {
            schema_version,
            ..self
        }
    }

    /// Opens the database read-only; `begin_write` then fails.
    pub fn read_only(self, read_only: bool) -> Self {
        DbOption { read_only, ..self }
    }
}

impl DbOption {
    pub(crate) fn display_name(&self) -> &str {
        &self.name
    }
}
