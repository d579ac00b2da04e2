//! SQL dialects and statement configuration for the bundled builders.

use collsync_core::{Error, Result, Value};

/// SQL dialect for generating dialect-specific SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// PostgreSQL dialect (uses $1, $2 placeholders)
    #[default]
    Postgres,
    /// SQLite dialect (uses ?1, ?2 placeholders)
    Sqlite,
    /// MySQL dialect (uses ? placeholders)
    Mysql,
}

impl Dialect {
    /// Generate a placeholder for the given parameter index (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Mysql => "?".to_string(),
        }
    }

    /// Quote an identifier for this dialect.
    ///
    /// Embedded quote characters are doubled:
    /// - For Postgres/SQLite: `"` becomes `""`
    /// - For MySQL: `` ` `` becomes ``` `` ```
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => {
                let escaped = name.replace('"', "\"\"");
                format!("\"{}\"", escaped)
            }
            Dialect::Mysql => {
                let escaped = name.replace('`', "``");
                format!("`{}`", escaped)
            }
        }
    }
}

/// Rendering options shared by the bundled statement builders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementConfig {
    /// Target dialect (placeholders and identifier quoting)
    pub dialect: Dialect,
    /// Emit bare identifiers instead of dialect-quoted ones
    pub unquoted_identifiers: bool,
    /// Optional schema (database, for MySQL) qualifying every table name
    pub schema: Option<String>,
}

impl StatementConfig {
    /// Create a configuration for the given dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    /// Enable or disable identifier quoting (enabled by default).
    pub fn quote_identifiers(mut self, quote: bool) -> Self {
        self.unquoted_identifiers = !quote;
        self
    }

    /// Qualify table names with a schema.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Render a column (or other unqualified) identifier.
    pub fn ident(&self, name: &str) -> String {
        if self.unquoted_identifiers {
            name.to_string()
        } else {
            self.dialect.quote_identifier(name)
        }
    }

    /// Render a table name, schema-qualified when configured.
    pub fn table(&self, name: &str) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", self.ident(schema), self.ident(name)),
            None => self.ident(name),
        }
    }
}

/// Collects bound values while a statement is rendered, handing out
/// placeholders in binding order.
#[derive(Debug)]
pub(crate) struct Binder {
    dialect: Dialect,
    params: Vec<Value>,
}

impl Binder {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    /// Bind a value and return its placeholder.
    pub(crate) fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        self.dialect.placeholder(self.params.len())
    }

    /// Render `col = ?` pairs joined with AND, binding each value.
    pub(crate) fn equalities(
        &mut self,
        config: &StatementConfig,
        columns: &[&str],
        values: &[Value],
    ) -> Result<String> {
        let pairs = self.columns(config, columns, values)?;
        Ok(pairs
            .into_iter()
            .map(|(col, placeholder)| format!("{} = {}", col, placeholder))
            .collect::<Vec<_>>()
            .join(" AND "))
    }

    /// Bind one value per column, returning `(quoted column, placeholder)`
    /// pairs in column order.
    ///
    /// A key with a missing or extra value would silently widen or narrow the
    /// rows a statement touches, so the arity must match exactly and be
    /// non-zero.
    pub(crate) fn columns(
        &mut self,
        config: &StatementConfig,
        columns: &[&str],
        values: &[Value],
    ) -> Result<Vec<(String, String)>> {
        if columns.is_empty() || columns.len() != values.len() {
            return Err(Error::config(format!(
                "key columns ({}) got {} value(s)",
                columns.join(", "),
                values.len()
            )));
        }
        Ok(columns
            .iter()
            .zip(values)
            .map(|(col, value)| (config.ident(col), self.bind(value.clone())))
            .collect())
    }

    pub(crate) fn into_params(self) -> Vec<Value> {
        self.params
    }
}
