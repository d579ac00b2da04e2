//! Collection persistence for collsync.
//!
//! `collsync-persister` writes changes made to a collection-valued relationship
//! back to storage. Given a [`ManagedCollection`](collsync_core::ManagedCollection)
//! that knows what was added and removed since the last flush, the
//! [`CollectionPersister`] issues the row-level statements that bring storage in
//! line with it.
//!
//! # Role In The Architecture
//!
//! - **Ownership gate**: only the owning side of a relationship writes; inverse-side
//!   collections are silently skipped.
//! - **Diff-and-apply**: `update` deletes removed rows, then inserts added rows.
//! - **Whole-collection writes**: `delete` removes everything in one statement,
//!   `recreate` clears and rewrites.
//! - **Statement seam**: [`StatementBuilder`] renders the SQL; the bundled
//!   [`LinkTableStatements`] and [`ForeignKeyStatements`] cover link-table and
//!   foreign-key layouts for PostgreSQL, SQLite and MySQL.
//!
//! The persister runs inside the caller's transaction and never commits, retries
//! or compensates. Errors from the executor are returned as-is.
//!
//! # Example
//!
//! ```ignore
//! let statements = LinkTableStatements::from_mapping(&HERO_POWERS, StatementConfig::default())?;
//! let persister = CollectionPersister::new(&tx, statements);
//!
//! hero.powers.add(fireball);
//! hero.powers.remove_by_key(&[Value::BigInt(7)]);
//! persister.update(&cx, &hero.powers).await?;
//! hero.powers.take_snapshot();
//! ```

pub mod dialect;
pub mod foreign_key;
pub mod link_table;
pub mod persister;
pub mod statement;

pub use dialect::{Dialect, StatementConfig};
pub use foreign_key::ForeignKeyStatements;
pub use link_table::LinkTableStatements;
pub use persister::{CollectionPersister, SyncReport};
pub use statement::{Statement, StatementBuilder};
