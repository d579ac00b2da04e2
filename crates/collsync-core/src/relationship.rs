//! Relationship metadata for collection-valued associations.
//!
//! Mappings are static, shared, read-only descriptions of how a collection is
//! stored: which side of the relationship owns the rows, and which tables and
//! key columns hold them. Exactly one side of a relationship is owning; writes
//! issued from the inverse side are ignored by the persister.

use crate::error::{Error, Result};

/// The kind of collection-valued relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelationshipKind {
    /// One-to-many: one `Team` has many `Hero`s, tracked through a foreign-key
    /// column on the element table.
    #[default]
    OneToMany,
    /// Many-to-many: `Hero`s have many `Power`s via a link table.
    ManyToMany,
}

/// Which side of a bidirectional relationship a collection sits on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OwningSide {
    /// This side owns the rows and is allowed to write them.
    #[default]
    Owning,
    /// Mirror of the owning side; read-only at the row level.
    Inverse,
}

/// Information about a link/join table for many-to-many relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTableInfo {
    /// The link table name (e.g., `"hero_powers"`).
    pub table_name: &'static str,

    /// Column in link table pointing to the owning model (e.g., `"hero_id"`).
    pub local_column: &'static str,

    /// Column in link table pointing to the element model (e.g., `"power_id"`).
    pub remote_column: &'static str,

    /// Composite local key columns (for composite PK owners).
    ///
    /// If set, this takes precedence over `local_column`.
    pub local_columns: Option<&'static [&'static str]>,

    /// Composite remote key columns (for composite PK elements).
    ///
    /// If set, this takes precedence over `remote_column`.
    pub remote_columns: Option<&'static [&'static str]>,
}

impl LinkTableInfo {
    /// Create a new link-table definition.
    #[must_use]
    pub const fn new(
        table_name: &'static str,
        local_column: &'static str,
        remote_column: &'static str,
    ) -> Self {
        Self {
            table_name,
            local_column,
            remote_column,
            local_columns: None,
            remote_columns: None,
        }
    }

    /// Create a new composite link-table definition.
    ///
    /// Column order matters:
    /// - `local_columns` must match the owner key value ordering
    /// - `remote_columns` must match the element key value ordering
    #[must_use]
    pub const fn composite(
        table_name: &'static str,
        local_columns: &'static [&'static str],
        remote_columns: &'static [&'static str],
    ) -> Self {
        Self {
            table_name,
            local_column: "",
            remote_column: "",
            local_columns: Some(local_columns),
            remote_columns: Some(remote_columns),
        }
    }

    /// Return the local key columns (single or composite).
    #[must_use]
    pub fn local_cols(&self) -> &[&'static str] {
        if let Some(cols) = self.local_columns {
            return cols;
        }
        if self.local_column.is_empty() {
            return &[];
        }
        std::slice::from_ref(&self.local_column)
    }

    /// Return the remote key columns (single or composite).
    #[must_use]
    pub fn remote_cols(&self) -> &[&'static str] {
        if let Some(cols) = self.remote_columns {
            return cols;
        }
        if self.remote_column.is_empty() {
            return &[];
        }
        std::slice::from_ref(&self.remote_column)
    }
}

/// Mapping metadata for one collection-valued field.
///
/// # Example
///
/// ```ignore
/// const HERO_POWERS: CollectionMapping =
///     CollectionMapping::new("powers", "powers", RelationshipKind::ManyToMany)
///         .link_table(LinkTableInfo::new("hero_powers", "hero_id", "power_id"))
///         .element_key("id");
///
/// const POWER_HEROES: CollectionMapping =
///     CollectionMapping::new("heroes", "heroes", RelationshipKind::ManyToMany)
///         .mapped_by("powers");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionMapping {
    /// Name of the collection field on the owning entity.
    pub field_name: &'static str,

    /// Table holding the element entities.
    pub element_table: &'static str,

    /// Kind of relationship.
    pub kind: RelationshipKind,

    /// Owning or inverse side.
    pub side: OwningSide,

    /// On the inverse side, the field on the element that owns the relationship.
    pub mapped_by: Option<&'static str>,

    /// On the owning side of a bidirectional relationship, the field on the
    /// element that mirrors this collection.
    pub inversed_by: Option<&'static str>,

    /// Link table for ManyToMany relationships.
    pub link_table: Option<LinkTableInfo>,

    /// Foreign-key column on the element table pointing at the owner (OneToMany).
    pub fk_column: Option<&'static str>,

    /// Composite foreign-key columns (OneToMany). Takes precedence over `fk_column`.
    pub fk_columns: Option<&'static [&'static str]>,

    /// Primary-key column of the element table.
    pub element_key: Option<&'static str>,

    /// Composite primary-key columns of the element table.
    /// Takes precedence over `element_key`.
    pub element_keys: Option<&'static [&'static str]>,
}

impl CollectionMapping {
    /// Create an owning-side mapping with required fields.
    #[must_use]
    pub const fn new(
        field_name: &'static str,
        element_table: &'static str,
        kind: RelationshipKind,
    ) -> Self {
        Self {
            field_name,
            element_table,
            kind,
            side: OwningSide::Owning,
            mapped_by: None,
            inversed_by: None,
            link_table: None,
            fk_column: None,
            fk_columns: None,
            element_key: None,
            element_keys: None,
        }
    }

    /// Mark this mapping as the inverse side, mirrored from `field` on the element.
    #[must_use]
    pub const fn mapped_by(mut self, field: &'static str) -> Self {
        self.side = OwningSide::Inverse;
        self.mapped_by = Some(field);
        self
    }

    /// Name the field on the element that mirrors this (owning) collection.
    #[must_use]
    pub const fn inversed_by(mut self, field: &'static str) -> Self {
        self.inversed_by = Some(field);
        self
    }

    /// Set the link table metadata (ManyToMany).
    #[must_use]
    pub const fn link_table(mut self, info: LinkTableInfo) -> Self {
        self.link_table = Some(info);
        self
    }

    /// Set the foreign-key column on the element table (OneToMany).
    #[must_use]
    pub const fn fk_column(mut self, column: &'static str) -> Self {
        self.fk_column = Some(column);
        self.fk_columns = None;
        self
    }

    /// Set composite foreign-key columns (OneToMany).
    ///
    /// The column order must match the owner key value ordering.
    #[must_use]
    pub const fn fk_columns(mut self, columns: &'static [&'static str]) -> Self {
        self.fk_columns = Some(columns);
        self.fk_column = None;
        self
    }

    /// Set the element primary-key column.
    #[must_use]
    pub const fn element_key(mut self, column: &'static str) -> Self {
        self.element_key = Some(column);
        self.element_keys = None;
        self
    }

    /// Set composite element primary-key columns.
    ///
    /// The column order must match `CollectionElement::key_values` ordering.
    #[must_use]
    pub const fn element_keys(mut self, columns: &'static [&'static str]) -> Self {
        self.element_keys = Some(columns);
        self.element_key = None;
        self
    }

    /// Check whether this is the inverse (read-only) side.
    #[must_use]
    pub const fn is_inverse_side(&self) -> bool {
        matches!(self.side, OwningSide::Inverse)
    }

    /// Check whether this is the owning side.
    #[must_use]
    pub const fn is_owning_side(&self) -> bool {
        matches!(self.side, OwningSide::Owning)
    }

    /// Return the foreign-key columns (empty slice if unset).
    #[must_use]
    pub fn fk_cols(&self) -> &[&'static str] {
        if let Some(cols) = self.fk_columns {
            return cols;
        }
        match &self.fk_column {
            Some(col) => std::slice::from_ref(col),
            None => &[],
        }
    }

    /// Return the element key columns (empty slice if unset).
    #[must_use]
    pub fn element_key_cols(&self) -> &[&'static str] {
        if let Some(cols) = self.element_keys {
            return cols;
        }
        match &self.element_key {
            Some(col) => std::slice::from_ref(col),
            None => &[],
        }
    }

    /// Check the mapping for structural problems.
    ///
    /// Inverse-side mappings only need to name their owning field. Owning-side
    /// mappings need the column layout their writes depend on.
    pub fn validate(&self) -> Result<()> {
        if self.field_name.is_empty() {
            return Err(Error::config("collection mapping has no field name"));
        }

        if self.is_inverse_side() {
            return match self.mapped_by {
                Some(field) if !field.is_empty() => Ok(()),
                _ => Err(Error::config(format!(
                    "inverse collection '{}' must name its owning field",
                    self.field_name
                ))),
            };
        }

        match self.kind {
            RelationshipKind::ManyToMany => {
                let Some(link) = self.link_table else {
                    return Err(Error::config(format!(
                        "many-to-many collection '{}' has no link table",
                        self.field_name
                    )));
                };
                if link.table_name.is_empty()
                    || link.local_cols().is_empty()
                    || link.remote_cols().is_empty()
                {
                    return Err(Error::config(format!(
                        "link table for '{}' must name a table plus local and remote columns",
                        self.field_name
                    )));
                }
            }
            RelationshipKind::OneToMany => {
                if self.element_table.is_empty() {
                    return Err(Error::config(format!(
                        "one-to-many collection '{}' has no element table",
                        self.field_name
                    )));
                }
                if self.fk_cols().is_empty() {
                    return Err(Error::config(format!(
                        "one-to-many collection '{}' has no foreign-key column",
                        self.field_name
                    )));
                }
                if self.element_key_cols().is_empty() {
                    return Err(Error::config(format!(
                        "one-to-many collection '{}' has no element key column",
                        self.field_name
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for CollectionMapping {
    fn default() -> Self {
        Self::new("", "", RelationshipKind::default())
    }
}
