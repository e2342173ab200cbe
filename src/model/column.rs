//! Columns and entities.

use super::EntityId;

/// Whether a column is defined by a physical table or borrowed from the
/// projection of a nested statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Definition,
    Reference,
}

/// A column qualified by the alias of the table source that provides it.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlColumn {
    pub table_alias: String,
    pub column_name: String,
    /// Output name when the column is projected under a different name.
    pub alias: Option<String>,
    pub is_primary_key: bool,
    pub kind: ColumnKind,
}

impl SqlColumn {
    pub fn definition(
        table_alias: impl Into<String>,
        column_name: impl Into<String>,
        is_primary_key: bool,
    ) -> Self {
        Self {
            table_alias: table_alias.into(),
            column_name: column_name.into(),
            alias: None,
            is_primary_key,
            kind: ColumnKind::Definition,
        }
    }

    pub fn reference(
        table_alias: impl Into<String>,
        column_name: impl Into<String>,
        is_primary_key: bool,
    ) -> Self {
        Self {
            table_alias: table_alias.into(),
            column_name: column_name.into(),
            alias: None,
            is_primary_key,
            kind: ColumnKind::Reference,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The name this column is exposed under when projected.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.column_name)
    }
}

/// All columns of one mapped entity, in mapping order.
///
/// The owning table source is not stored here; it is tracked by the
/// resolution context under the entity's id.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlEntity {
    pub id: EntityId,
    pub item_type: String,
    pub name: Option<String>,
    pub table_alias: String,
    pub columns: Vec<SqlColumn>,
    /// Set when the entity comes from a left join and may be absent.
    pub nullable: bool,
}

impl SqlEntity {
    pub fn column(&self, column_name: &str) -> Option<&SqlColumn> {
        self.columns.iter().find(|c| c.column_name == column_name)
    }

    pub fn primary_key(&self) -> Vec<&SqlColumn> {
        self.columns.iter().filter(|c| c.is_primary_key).collect()
    }
}
