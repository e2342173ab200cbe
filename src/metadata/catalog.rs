//! A static, file-loadable mapping catalog.
//!
//! Example (TOML):
//! ```toml
//! [entities.Cook]
//! table = "CookTable"
//! columns = [
//!     { member = "ID", primary_key = true },
//!     { member = "FirstName" },
//!     { member = "KitchenID" },
//! ]
//!
//! [entities.Cook.relations.Kitchen]
//! target = "Kitchen"
//! owner_key = "KitchenID"
//! target_key = "ID"
//! cardinality = "one"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::resolver::{
    Cardinality, ColumnMapping, MappingResolver, MemberMapping, RelationMapping, TableMapping,
};

/// Error type for catalog loading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read catalog file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse JSON catalog: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse TOML catalog: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Unsupported catalog format: {0} (expected .json or .toml)")]
    UnsupportedFormat(String),
}

/// Entity mappings keyed by entity type name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub entities: BTreeMap<String, EntityMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMapping {
    pub table: String,
    #[serde(default)]
    pub schema: Option<String>,
    pub columns: Vec<MemberColumn>,
    #[serde(default)]
    pub relations: BTreeMap<String, RelationMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberColumn {
    pub member: String,
    /// Column name, defaults to the member name.
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub primary_key: bool,
}

impl MemberColumn {
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.member)
    }
}

impl EntityMapping {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            schema: None,
            columns: vec![],
            relations: BTreeMap::new(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Add a primary key column named after its member.
    pub fn key(mut self, member: impl Into<String>) -> Self {
        self.columns.push(MemberColumn {
            member: member.into(),
            column: None,
            primary_key: true,
        });
        self
    }

    /// Add a column named after its member.
    pub fn column(mut self, member: impl Into<String>) -> Self {
        self.columns.push(MemberColumn {
            member: member.into(),
            column: None,
            primary_key: false,
        });
        self
    }

    pub fn column_as(mut self, member: impl Into<String>, column: impl Into<String>) -> Self {
        self.columns.push(MemberColumn {
            member: member.into(),
            column: Some(column.into()),
            primary_key: false,
        });
        self
    }

    pub fn relation(
        mut self,
        member: impl Into<String>,
        target: impl Into<String>,
        owner_key: impl Into<String>,
        target_key: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        self.relations.insert(
            member.into(),
            RelationMapping {
                target: target.into(),
                owner_key: owner_key.into(),
                target_key: target_key.into(),
                cardinality,
            },
        );
        self
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, item_type: impl Into<String>, mapping: EntityMapping) -> Self {
        self.entities.insert(item_type.into(), mapping);
        self
    }

    /// Check relations and keys for dangling references.
    ///
    /// Returns one message per problem; an empty list means the catalog is
    /// consistent.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (name, entity) in &self.entities {
            let mut seen = HashSet::new();
            for column in &entity.columns {
                if !seen.insert(column.column_name()) {
                    problems.push(format!(
                        "{}: column '{}' is mapped more than once",
                        name,
                        column.column_name()
                    ));
                }
            }
            if !entity.columns.iter().any(|c| c.primary_key) {
                problems.push(format!("{}: no primary key column", name));
            }
            for (member, relation) in &entity.relations {
                if !has_column(entity, &relation.owner_key) {
                    problems.push(format!(
                        "{}.{}: owner key '{}' is not a column of {}",
                        name, member, relation.owner_key, entity.table
                    ));
                }
                match self.entities.get(&relation.target) {
                    Some(target) => {
                        if !has_column(target, &relation.target_key) {
                            problems.push(format!(
                                "{}.{}: target key '{}' is not a column of {}",
                                name, member, relation.target_key, target.table
                            ));
                        }
                    }
                    None => problems.push(format!(
                        "{}.{}: unknown target entity '{}'",
                        name, member, relation.target
                    )),
                }
            }
        }
        problems
    }
}

fn has_column(entity: &EntityMapping, column: &str) -> bool {
    entity.columns.iter().any(|c| c.column_name() == column)
}

/// [`MappingResolver`] backed by an in-memory [`Catalog`].
#[derive(Debug, Clone, Default)]
pub struct StaticMappingResolver {
    catalog: Catalog,
}

impl StaticMappingResolver {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(serde_json::from_str(content)?))
    }

    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(toml::from_str(content)?))
    }

    /// Load a catalog file, picking the format from its extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            other => Err(CatalogError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

impl MappingResolver for StaticMappingResolver {
    fn resolve_table(&self, item_type: &str) -> Option<TableMapping> {
        let entity = self.catalog.entities.get(item_type)?;
        Some(TableMapping {
            table_name: entity.table.clone(),
            schema: entity.schema.clone(),
            columns: entity
                .columns
                .iter()
                .map(|c| ColumnMapping {
                    column: c.column_name().to_string(),
                    is_primary_key: c.primary_key,
                })
                .collect(),
        })
    }

    fn resolve_member(&self, entity_type: &str, member: &str) -> Option<MemberMapping> {
        let entity = self.catalog.entities.get(entity_type)?;
        if let Some(column) = entity.columns.iter().find(|c| c.member == member) {
            return Some(MemberMapping::Column {
                column: column.column_name().to_string(),
            });
        }
        entity
            .relations
            .get(member)
            .map(|r| MemberMapping::Relation(r.clone()))
    }
}
