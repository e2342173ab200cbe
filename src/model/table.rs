//! Table sources.

use super::expr::SqlExpr;
use super::statement::SqlStatement;
use super::TableId;

/// A table source of a statement, together with the joins it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlTable {
    pub id: TableId,
    pub info: TableInfo,
    pub joins: Vec<SqlTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableInfo {
    /// Known only by the entity type it yields.
    Unresolved { item_type: String },
    /// A related collection reached through `source`, e.g. `c.Restaurant.Cooks`.
    UnresolvedCollection { item_type: String, source: SqlExpr },
    /// A nested statement whose own tables are not yet resolved.
    UnresolvedSubStatement(Box<SqlStatement>),
    Simple(ResolvedSimpleTable),
    SubStatement(ResolvedSubStatement),
    Join(Box<JoinInfo>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSimpleTable {
    pub table_name: String,
    pub schema: Option<String>,
    pub alias: String,
    pub item_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSubStatement {
    pub alias: String,
    pub statement: Box<SqlStatement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSemantics {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinInfo {
    pub semantics: JoinSemantics,
    pub target: TableInfo,
    pub condition: SqlExpr,
}

impl SqlTable {
    pub fn new(id: TableId, info: TableInfo) -> Self {
        Self {
            id,
            info,
            joins: vec![],
        }
    }

    /// Alias of the resolved source, `None` while unresolved.
    pub fn alias(&self) -> Option<&str> {
        self.info.alias()
    }

    /// Whether this table, its joins and any nested statement are resolved.
    pub fn is_resolved(&self) -> bool {
        self.info.is_resolved() && self.joins.iter().all(SqlTable::is_resolved)
    }

    /// Find this table or one of its (transitive) joins by id.
    pub fn find_mut(&mut self, id: TableId) -> Option<&mut SqlTable> {
        if self.id == id {
            return Some(self);
        }
        self.joins.iter_mut().find_map(|j| j.find_mut(id))
    }
}

impl TableInfo {
    pub fn alias(&self) -> Option<&str> {
        match self {
            TableInfo::Simple(t) => Some(&t.alias),
            TableInfo::SubStatement(s) => Some(&s.alias),
            TableInfo::Join(j) => j.target.alias(),
            TableInfo::Unresolved { .. }
            | TableInfo::UnresolvedCollection { .. }
            | TableInfo::UnresolvedSubStatement(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            TableInfo::Unresolved { .. }
            | TableInfo::UnresolvedCollection { .. }
            | TableInfo::UnresolvedSubStatement(_) => false,
            TableInfo::Simple(_) => true,
            TableInfo::SubStatement(s) => s.statement.is_resolved(),
            TableInfo::Join(j) => j.target.is_resolved() && j.condition.is_resolved(),
        }
    }
}
