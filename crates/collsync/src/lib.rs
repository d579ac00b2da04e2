//! collsync: collection synchronization for object-relational persistence.
//!
//! This facade re-exports the core types and the collection persister.
//!
//! ```ignore
//! use collsync::prelude::*;
//!
//! const HERO_POWERS: CollectionMapping =
//!     CollectionMapping::new("powers", "powers", RelationshipKind::ManyToMany)
//!         .link_table(LinkTableInfo::new("hero_powers", "hero_id", "power_id"));
//!
//! let persister = CollectionPersister::new(
//!     &tx,
//!     LinkTableStatements::from_mapping(&HERO_POWERS, StatementConfig::default())?,
//! );
//! persister.update(&cx, &hero.powers).await;
//! ```

pub use collsync_core::{
    CollectionElement, CollectionMapping, ConfigError, ConnectionError, ConnectionErrorKind, Cx,
    Error, Executor, LinkTableInfo, ManagedCollection, OwningSide, Outcome, PersistentCollection,
    QueryError, QueryErrorKind, RelationshipKind, Result, Value,
};
pub use collsync_persister::{
    CollectionPersister, Dialect, ForeignKeyStatements, LinkTableStatements, Statement,
    StatementBuilder, StatementConfig, SyncReport,
};

/// Common imports for working with managed collections.
pub mod prelude {
    pub use crate::{
        CollectionElement, CollectionMapping, CollectionPersister, Cx, Dialect, Error, Executor,
        ForeignKeyStatements, LinkTableInfo, LinkTableStatements, ManagedCollection, Outcome,
        PersistentCollection, RelationshipKind, StatementBuilder, StatementConfig, Value,
    };
}
