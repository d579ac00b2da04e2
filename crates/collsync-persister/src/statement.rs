//! Statement requests and the statement-construction seam.

use collsync_core::{ManagedCollection, Result, Value};

/// A statement ready for the executor: SQL text plus bound parameters in
/// placeholder order. Built and discarded per execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Dialect-specific SQL text
    pub sql: String,
    /// Bound parameter values
    pub params: Vec<Value>,
}

impl Statement {
    /// Create a new statement.
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Builds the four statement kinds a collection persister needs.
///
/// Implemented once per storage layout/dialect and composed into a
/// [`CollectionPersister`](crate::CollectionPersister). The persister fixes when
/// each statement fires:
///
/// | Method | Fired by | Keyed by |
/// |---|---|---|
/// | `delete_statement` | `delete`, `recreate` | owner |
/// | `delete_row_statement` | `delete_rows` | owner + element |
/// | `insert_row_statement` | `insert_rows`, `recreate` | owner + element |
/// | `update_row_statement` | nothing | owner + element |
///
/// `update_row_statement` is reserved: a changed element is written as a
/// delete followed by an insert, so the persister never calls it. It stays on
/// the trait for layouts whose association rows carry non-key columns.
///
/// For a given collection the SQL text of a row statement is the same for
/// every element; only the bound parameters change. Builders render the text
/// per call, which keeps them stateless.
///
/// Every method fails with `Error::Config` when the owner or element key has
/// a different number of values than the layout has key columns. The
/// persister returns that error before executing the statement.
pub trait StatementBuilder {
    /// Remove every row belonging to the collection's owner.
    fn delete_statement<C: ManagedCollection>(&self, coll: &C) -> Result<Statement>;

    /// Remove the row linking the owner to one element.
    fn delete_row_statement<C: ManagedCollection>(
        &self,
        coll: &C,
        element: &C::Element,
    ) -> Result<Statement>;

    /// Add the row linking the owner to one element.
    fn insert_row_statement<C: ManagedCollection>(
        &self,
        coll: &C,
        element: &C::Element,
    ) -> Result<Statement>;

    /// Rewrite the non-key columns of one element's row, if it has any.
    fn update_row_statement<C: ManagedCollection>(
        &self,
        coll: &C,
        element: &C::Element,
    ) -> Result<Option<Statement>>;
}
