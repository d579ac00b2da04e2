//! Core types and traits for collsync.
//!
//! This crate provides the abstractions the collection persister is written against:
//!
//! - `Value` for bound statement parameters
//! - `Error` for storage and configuration failures
//! - `Executor` trait, the single I/O primitive (execute a statement, get rows affected)
//! - `CollectionMapping` relationship metadata (owning vs. inverse side, key layout)
//! - `ManagedCollection` trait and the snapshot-diffing `PersistentCollection`
//! - `Outcome` and `Cx` re-exported from asupersync for cancel-correct operations

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod collection;
pub mod error;
pub mod executor;
pub mod relationship;
pub mod value;

pub use collection::{CollectionElement, ManagedCollection, PersistentCollection};
pub use error::{
    ConfigError, ConnectionError, ConnectionErrorKind, Error, QueryError, QueryErrorKind, Result,
};
pub use executor::Executor;
pub use relationship::{CollectionMapping, LinkTableInfo, OwningSide, RelationshipKind};
pub use value::Value;
