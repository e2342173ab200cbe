//! The mapping resolver contract.

use serde::{Deserialize, Serialize};

use crate::model::SqlExpr;
use crate::query::Value;

/// Physical table backing an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMapping {
    pub table_name: String,
    pub schema: Option<String>,
    /// Columns in projection order.
    pub columns: Vec<ColumnMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub column: String,
    pub is_primary_key: bool,
}

/// What a member of an entity maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberMapping {
    Column { column: String },
    Relation(RelationMapping),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    One,
    Many,
}

/// A navigation from an owner entity to a related entity type.
///
/// Rows match when `owner.owner_key = target.target_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMapping {
    pub target: String,
    pub owner_key: String,
    pub target_key: String,
    pub cardinality: Cardinality,
}

/// Maps entity types and their members to physical schema constructs.
///
/// Implementations are shared across concurrent translations and must
/// answer identical questions identically within one translation; the
/// translator reports inconsistent answers as a contract violation.
pub trait MappingResolver: Send + Sync {
    /// Table for an entity type, `None` if the type is not mapped.
    fn resolve_table(&self, item_type: &str) -> Option<TableMapping>;

    /// Mapping of `member` on `entity_type`, `None` if it is not mapped.
    fn resolve_member(&self, entity_type: &str, member: &str) -> Option<MemberMapping>;

    /// Expression standing in for a constant entity when it is compared
    /// with an entity's primary key.
    fn resolve_constant(&self, _item_type: &str, key: &Value) -> Option<SqlExpr> {
        Some(SqlExpr::Constant(key.clone()))
    }
}
