//! Statements for one-to-many collections tracked by a foreign-key column on
//! the element table.
//!
//! Elements are full entity rows owned by their own persister, so the
//! collection never inserts or deletes them. Adding an element points its
//! foreign key at the owner; removing it clears the foreign key.

use crate::dialect::{Binder, StatementConfig};
use crate::statement::{Statement, StatementBuilder};
use collsync_core::{
    CollectionElement, CollectionMapping, Error, ManagedCollection, RelationshipKind, Result,
};

/// Statement builder for foreign-key (one-to-many) collections.
#[derive(Debug, Clone)]
pub struct ForeignKeyStatements {
    element_table: &'static str,
    fk_columns: Vec<&'static str>,
    key_columns: Vec<&'static str>,
    config: StatementConfig,
}

impl ForeignKeyStatements {
    /// Create a builder from a one-to-many mapping.
    pub fn from_mapping(mapping: &CollectionMapping, config: StatementConfig) -> Result<Self> {
        if mapping.kind != RelationshipKind::OneToMany {
            return Err(Error::config(format!(
                "collection '{}' is not one-to-many",
                mapping.field_name
            )));
        }
        if mapping.element_table.is_empty()
            || mapping.fk_cols().is_empty()
            || mapping.element_key_cols().is_empty()
        {
            return Err(Error::config(format!(
                "one-to-many collection '{}' needs an element table, foreign-key and key columns",
                mapping.field_name
            )));
        }

        Ok(Self {
            element_table: mapping.element_table,
            fk_columns: mapping.fk_cols().to_vec(),
            key_columns: mapping.element_key_cols().to_vec(),
            config,
        })
    }

    /// Get the rendering configuration.
    pub fn config(&self) -> &StatementConfig {
        &self.config
    }

    fn clear_fk(&self) -> String {
        self.fk_columns
            .iter()
            .map(|col| format!("{} = NULL", self.config.ident(col)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl StatementBuilder for ForeignKeyStatements {
    fn delete_statement<C: ManagedCollection>(&self, coll: &C) -> Result<Statement> {
        let mut binder = Binder::new(self.config.dialect);
        let filter = binder.equalities(&self.config, &self.fk_columns, coll.owner_key())?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.config.table(self.element_table),
            self.clear_fk(),
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
        let owner = binder.equalities(&self.config, &self.fk_columns, coll.owner_key())?;
        let key = binder.equalities(&self.config, &self.key_columns, &element.key_values())?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {} AND {}",
            self.config.table(self.element_table),
            self.clear_fk(),
            owner,
            key
        );
        Ok(Statement::new(sql, binder.into_params()))
    }

    fn insert_row_statement<C: ManagedCollection>(
        &self,
        coll: &C,
        element: &C::Element,
    ) -> Result<Statement> {
        let mut binder = Binder::new(self.config.dialect);
        let assignments = binder
            .columns(&self.config, &self.fk_columns, coll.owner_key())?
            .into_iter()
            .map(|(col, placeholder)| format!("{} = {}", col, placeholder))
            .collect::<Vec<_>>()
            .join(", ");
        let key = binder.equalities(&self.config, &self.key_columns, &element.key_values())?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.config.table(self.element_table),
            assignments,
            key
        );
        Ok(Statement::new(sql, binder.into_params()))
    }

    // Element columns belong to the element's own persister.
    fn update_row_statement<C: ManagedCollection>(
        &self,
        _coll: &C,
        _element: &C::Element,
    ) -> Result<Option<Statement>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use collsync_core::{LinkTableInfo, PersistentCollection, Value};

    #[derive(Debug, Clone)]
    struct Hero {
        id: i64,
    }

    impl CollectionElement for Hero {
        fn key_values(&self) -> Vec<Value> {
            vec![Value::BigInt(self.id)]
        }
    }

    const TEAM_HEROES: CollectionMapping =
        CollectionMapping::new("heroes", "heroes", RelationshipKind::OneToMany)
            .fk_column("team_id")
            .element_key("id");

    fn team_heroes() -> PersistentCollection<Hero> {
        PersistentCollection::new(TEAM_HEROES, vec![Value::BigInt(5)])
    }

    fn builder() -> ForeignKeyStatements {
        ForeignKeyStatements::from_mapping(&TEAM_HEROES, StatementConfig::default()).unwrap()
    }

    #[test]
    fn test_delete_statement_detaches_all_children() {
        let stmt = builder().delete_statement(&team_heroes()).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE \"heroes\" SET \"team_id\" = NULL WHERE \"team_id\" = $1"
        );
        assert_eq!(stmt.params, vec![Value::BigInt(5)]);
    }

    #[test]
    fn test_delete_row_statement_detaches_one_child() {
        let stmt = builder().delete_row_statement(&team_heroes(), &Hero { id: 9 }).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE \"heroes\" SET \"team_id\" = NULL WHERE \"team_id\" = $1 AND \"id\" = $2"
        );
        assert_eq!(stmt.params, vec![Value::BigInt(5), Value::BigInt(9)]);
    }

    #[test]
    fn test_insert_row_statement_attaches_child() {
        let stmt = builder().insert_row_statement(&team_heroes(), &Hero { id: 9 }).unwrap();
        assert_eq!(stmt.sql, "UPDATE \"heroes\" SET \"team_id\" = $1 WHERE \"id\" = $2");
        assert_eq!(stmt.params, vec![Value::BigInt(5), Value::BigInt(9)]);
    }

    #[test]
    fn test_update_row_statement_is_none() {
        let stmt = builder()
            .update_row_statement(&team_heroes(), &Hero { id: 9 })
            .unwrap();
        assert!(stmt.is_none());
    }

    #[test]
    fn test_mysql_placeholders() {
        let statements = ForeignKeyStatements::from_mapping(
            &TEAM_HEROES,
            StatementConfig::new(Dialect::Mysql),
        )
        .unwrap();
        let stmt = statements.insert_row_statement(&team_heroes(), &Hero { id: 9 }).unwrap();
        assert_eq!(stmt.sql, "UPDATE `heroes` SET `team_id` = ? WHERE `id` = ?");
    }

    #[test]
    fn test_from_mapping_rejects_link_table_mapping() {
        let many = CollectionMapping::new("powers", "powers", RelationshipKind::ManyToMany)
            .link_table(LinkTableInfo::new("hero_powers", "hero_id", "power_id"));
        assert!(matches!(
            ForeignKeyStatements::from_mapping(&many, StatementConfig::default()),
            Err(Error::Config(_))
        ));

        let no_key = CollectionMapping::new("heroes", "heroes", RelationshipKind::OneToMany)
            .fk_column("team_id");
        assert!(ForeignKeyStatements::from_mapping(&no_key, StatementConfig::default()).is_err());
    }

    #[test]
    fn test_missing_owner_key_is_rejected() {
        let unsaved: PersistentCollection<Hero> = PersistentCollection::new(TEAM_HEROES, vec![]);
        assert!(matches!(
            builder().delete_statement(&unsaved),
            Err(Error::Config(_))
        ));
        assert!(builder()
            .insert_row_statement(&unsaved, &Hero { id: 9 })
            .is_err());
    }
}
