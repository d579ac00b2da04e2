//! Statements for many-to-many collections stored in a link table.
//!
//! Each collection element is one link-table row holding the owner key, the
//! element key and, optionally, extra association columns.

use crate::dialect::{Binder, StatementConfig};
use crate::statement::{Statement, StatementBuilder};
use collsync_core::{
    CollectionElement, CollectionMapping, Error, LinkTableInfo, ManagedCollection, RelationshipKind,
    Result,
};

/// Statement builder for link-table (many-to-many) collections.
#[derive(Debug, Clone)]
pub struct LinkTableStatements {
    link: LinkTableInfo,
    config: StatementConfig,
}

impl LinkTableStatements {
    /// Create a builder for the given link table.
    pub fn new(link: LinkTableInfo, config: StatementConfig) -> Self {
        Self { link, config }
    }

    /// Create a builder from an owning many-to-many mapping.
    ///
    /// For an inverse-side collection, build from the owning side's mapping;
    /// the persister never asks an inverse collection for statements.
    pub fn from_mapping(mapping: &CollectionMapping, config: StatementConfig) -> Result<Self> {
        if mapping.kind != RelationshipKind::ManyToMany {
            return Err(Error::config(format!(
                "collection '{}' is not many-to-many",
                mapping.field_name
            )));
        }
        let Some(link) = mapping.link_table else {
            return Err(Error::config(format!(
                "many-to-many collection '{}' has no link table",
                mapping.field_name
            )));
        };
        if link.local_cols().is_empty() || link.remote_cols().is_empty() {
            return Err(Error::config(format!(
                "link table '{}' must name local and remote columns",
                link.table_name
            )));
        }
        Ok(Self::new(link, config))
    }

    /// Get the link table metadata.
    pub fn link_table(&self) -> &LinkTableInfo {
        &self.link
    }

    /// Get the rendering configuration.
    pub fn config(&self) -> &StatementConfig {
        &self.config
    }

    fn row_filter<C: ManagedCollection>(
        &self,
        binder: &mut Binder,
        coll: &C,
        element: &C::Element,
    ) -> Result<String> {
        let owner = binder.equalities(&self.config, self.link.local_cols(), coll.owner_key())?;
        let remote = binder.equalities(
            &self.config,
            self.link.remote_cols(),
            &element.key_values(),
        )?;
        Ok(format!("{} AND {}", owner, remote))
    }
}

impl StatementBuilder for LinkTableStatements {
    fn delete_statement<C: ManagedCollection>(&self, coll: &C) -> Result<Statement> {
        let mut binder = Binder::new(self.config.dialect);
        let filter = binder.equalities(&self.config, self.link.local_cols(), coll.owner_key())?;
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.config.table(self.link.table_name),
            filter
        );
        Ok(Statement::new(sql, binder.into_params()))
    }

    fn delete_row_statement<C: ManagedCollection>(
        &self,
        coll: &C,
        element: &C::Element,
    ) -> Result<Statement> {
        let mut binder = Binder::new(self.config.dialect);
        let filter = self.row_filter(&mut binder, coll, element)?;
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.config.table(self.link.table_name),
            filter
        );
        Ok(Statement::new(sql, binder.into_params()))
    }

    fn insert_row_statement<C: ManagedCollection>(
        &self,
        coll: &C,
        element: &C::Element,
    ) -> Result<Statement> {
        let mut binder = Binder::new(self.config.dialect);
        let mut pairs = binder.columns(&self.config, self.link.local_cols(), coll.owner_key())?;
        pairs.extend(binder.columns(
            &self.config,
            self.link.remote_cols(),
            &element.key_values(),
        )?);
        for (col, value) in element.row_values() {
            pairs.push((self.config.ident(col), binder.bind(value)));
        }

        let (columns, placeholders): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.config.table(self.link.table_name),
            columns.join(", "),
            placeholders.join(", ")
        );
        Ok(Statement::new(sql, binder.into_params()))
    }

    fn update_row_statement<C: ManagedCollection>(
        &self,
        coll: &C,
        element: &C::Element,
    ) -> Result<Option<Statement>> {
        let extra = element.row_values();
        if extra.is_empty() {
            return Ok(None);
        }

        let mut binder = Binder::new(self.config.dialect);
        let assignments = extra
            .into_iter()
            .map(|(col, value)| format!("{} = {}", self.config.ident(col), binder.bind(value)))
            .collect::<Vec<_>>()
            .join(", ");
        let filter = self.row_filter(&mut binder, coll, element)?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.config.table(self.link.table_name),
            assignments,
            filter
        );
        Ok(Some(Statement::new(sql, binder.into_params())))
    }
}
