//! The collection persister.
//!
//! Applies the three collection-level writes (full delete, full recreate and
//! incremental update) through an [`Executor`], honoring the ownership side of
//! the collection's mapping:
//!
//! - Inverse-side collections never write. Every public operation checks the
//!   mapping on entry and returns an empty report for the inverse side.
//! - `update` removes rows before inserting them, so an element removed and
//!   another inserted under the same key in one flush never collide.
//! - Row loops run strictly one statement at a time, in diff order. The first
//!   failure is returned unchanged and later statements are not attempted;
//!   rolling back partial work belongs to the enclosing transaction.
//! - A key whose arity does not match the layout (for example an owner that
//!   has not been assigned its key yet) fails with `Error::Config` before the
//!   statement reaches the executor.

use crate::statement::{Statement, StatementBuilder};
use collsync_core::{Cx, Error, Executor, ManagedCollection, Outcome};

/// What a persister operation wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Number of statements executed.
    pub statements: usize,
    /// Sum of rows affected, as reported by the executor.
    pub rows_affected: u64,
}

impl SyncReport {
    fn record(&mut self, rows: u64) {
        self.statements += 1;
        self.rows_affected += rows;
    }

    fn merge(&mut self, other: SyncReport) {
        self.statements += other.statements;
        self.rows_affected += other.rows_affected;
    }

    /// Check whether nothing was executed.
    pub fn is_empty(&self) -> bool {
        self.statements == 0
    }
}

/// Synchronizes managed collections with storage.
///
/// # Example
///
/// ```ignore
/// let statements = LinkTableStatements::from_mapping(&HERO_POWERS, StatementConfig::default())?;
/// let persister = CollectionPersister::new(&tx, statements);
///
/// persister.update(&cx, &hero.powers).await?;
/// hero.powers.take_snapshot();
/// ```
#[derive(Debug)]
pub struct CollectionPersister<E, B> {
    executor: E,
    statements: B,
}

impl<E: Executor, B: StatementBuilder> CollectionPersister<E, B> {
    /// Create a persister over an executor and a statement builder.
    pub fn new(executor: E, statements: B) -> Self {
        Self {
            executor,
            statements,
        }
    }

    /// Get the executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Get the statement builder.
    pub fn statements(&self) -> &B {
        &self.statements
    }

    /// Consume the persister, returning its collaborators.
    pub fn into_parts(self) -> (E, B) {
        (self.executor, self.statements)
    }

    /// Delete every persisted row of the collection in a single statement.
    #[tracing::instrument(level = "debug", skip(self, cx, coll), fields(field = coll.mapping().field_name))]
    pub async fn delete<C: ManagedCollection>(
        &self,
        cx: &Cx,
        coll: &C,
    ) -> Outcome<SyncReport, Error> {
        if coll.mapping().is_inverse_side() {
            tracing::debug!("Skipping delete on inverse side");
            return Outcome::Ok(SyncReport::default());
        }

        let stmt = match self.statements.delete_statement(coll) {
            Ok(stmt) => stmt,
            Err(e) => return Outcome::Err(e),
        };
        let mut report = SyncReport::default();
        match self.run(cx, &stmt).await {
            Outcome::Ok(rows) => report.record(rows),
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        tracing::debug!(rows_affected = report.rows_affected, "Collection deleted");
        Outcome::Ok(report)
    }

    /// Apply the collection's insert and delete diffs: delete rows first,
    /// then insert rows.
    ///
    /// There is no row update pass. An element whose association changed is
    /// expected in both diffs as a removal and an addition.
    #[tracing::instrument(level = "debug", skip(self, cx, coll), fields(field = coll.mapping().field_name))]
    pub async fn update<C: ManagedCollection>(
        &self,
        cx: &Cx,
        coll: &C,
    ) -> Outcome<SyncReport, Error> {
        if coll.mapping().is_inverse_side() {
            tracing::debug!("Skipping update on inverse side");
            return Outcome::Ok(SyncReport::default());
        }

        let mut report = SyncReport::default();
        match self.delete_rows(cx, coll).await {
            Outcome::Ok(deleted) => report.merge(deleted),
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }
        match self.insert_rows(cx, coll).await {
            Outcome::Ok(inserted) => report.merge(inserted),
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        Outcome::Ok(report)
    }

    /// Execute one delete-row statement per element of the delete diff.
    ///
    /// Unlike the public write operations this does not consult the ownership
    /// side; `update` does that before calling it.
    #[tracing::instrument(level = "debug", skip(self, cx, coll), fields(field = coll.mapping().field_name))]
    pub async fn delete_rows<C: ManagedCollection>(
        &self,
        cx: &Cx,
        coll: &C,
    ) -> Outcome<SyncReport, Error> {
        let mut report = SyncReport::default();
        for element in coll.delete_diff() {
            let stmt = match self.statements.delete_row_statement(coll, element) {
                Ok(stmt) => stmt,
                Err(e) => return Outcome::Err(e),
            };
            match self.run(cx, &stmt).await {
                Outcome::Ok(rows) => report.record(rows),
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
        }

        tracing::debug!(deleted = report.statements, "Collection rows deleted");
        Outcome::Ok(report)
    }

    /// Execute one insert-row statement per element of the insert diff.
    #[tracing::instrument(level = "debug", skip(self, cx, coll), fields(field = coll.mapping().field_name))]
    pub async fn insert_rows<C: ManagedCollection>(
        &self,
        cx: &Cx,
        coll: &C,
    ) -> Outcome<SyncReport, Error> {
        let mut report = SyncReport::default();
        for element in coll.insert_diff() {
            let stmt = match self.statements.insert_row_statement(coll, element) {
                Ok(stmt) => stmt,
                Err(e) => return Outcome::Err(e),
            };
            match self.run(cx, &stmt).await {
                Outcome::Ok(rows) => report.record(rows),
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
        }

        tracing::debug!(inserted = report.statements, "Collection rows inserted");
        Outcome::Ok(report)
    }

    /// Rewrite the collection from scratch: one bulk delete, then one insert
    /// per current element. Diffs are ignored.
    #[tracing::instrument(level = "debug", skip(self, cx, coll), fields(field = coll.mapping().field_name))]
    pub async fn recreate<C: ManagedCollection>(
        &self,
        cx: &Cx,
        coll: &C,
    ) -> Outcome<SyncReport, Error> {
        if coll.mapping().is_inverse_side() {
            tracing::debug!("Skipping recreate on inverse side");
            return Outcome::Ok(SyncReport::default());
        }

        let mut report = SyncReport::default();
        let clear = match self.statements.delete_statement(coll) {
            Ok(stmt) => stmt,
            Err(e) => return Outcome::Err(e),
        };
        match self.run(cx, &clear).await {
            Outcome::Ok(rows) => report.record(rows),
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        for element in coll.elements() {
            let stmt = match self.statements.insert_row_statement(coll, element) {
                Ok(stmt) => stmt,
                Err(e) => return Outcome::Err(e),
            };
            match self.run(cx, &stmt).await {
                Outcome::Ok(rows) => report.record(rows),
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
        }

        tracing::debug!(statements = report.statements, "Collection recreated");
        Outcome::Ok(report)
    }

    async fn run(&self, cx: &Cx, stmt: &Statement) -> Outcome<u64, Error> {
        tracing::trace!(sql = %stmt.sql, params = stmt.params.len(), "Executing collection statement");
        self.executor.execute(cx, &stmt.sql, &stmt.params).await
    }
}
