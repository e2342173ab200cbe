//! Statements: the builder used while preparing and the frozen result.

use std::fmt;

use super::expr::SqlExpr;
use super::table::{SqlTable, TableInfo};

/// Shape of the rows a statement produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataInfo {
    #[default]
    Sequence,
    /// At most one row is consumed (`First`, `Single`).
    Single { or_default: bool },
    /// One scalar value (aggregates, existence tests).
    Scalar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlOrdering {
    pub expr: SqlExpr,
    pub direction: OrderingDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperation {
    Union,
    UnionAll,
    Intersect,
    Except,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOperationClause {
    pub operation: SetOperation,
    pub statement: SqlStatement,
}

/// Mutable statement under construction.
///
/// The first table is the root source; later tables are cross-joined
/// additional sources. Joins hang off the table that owns them.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatementBuilder {
    pub data_info: DataInfo,
    pub projection: SqlExpr,
    pub tables: Vec<SqlTable>,
    pub where_condition: Option<SqlExpr>,
    pub group_by: Vec<SqlExpr>,
    pub orderings: Vec<SqlOrdering>,
    pub distinct: bool,
    pub top: Option<SqlExpr>,
    pub skip: Option<SqlExpr>,
    pub set_operations: Vec<SetOperationClause>,
}

impl SqlStatementBuilder {
    pub fn new(projection: SqlExpr) -> Self {
        Self {
            data_info: DataInfo::Sequence,
            projection,
            tables: vec![],
            where_condition: None,
            group_by: vec![],
            orderings: vec![],
            distinct: false,
            top: None,
            skip: None,
            set_operations: vec![],
        }
    }

    pub fn add_where(&mut self, predicate: SqlExpr) -> &mut Self {
        self.where_condition = Some(SqlExpr::and_also(self.where_condition.take(), predicate));
        self
    }

    /// Whether paging (top or skip) has been applied.
    pub fn is_paged(&self) -> bool {
        self.top.is_some() || self.skip.is_some()
    }

    /// Whether the statement could be merged into an enclosing one.
    pub fn is_simple_sequence(&self) -> bool {
        self.data_info == DataInfo::Sequence
            && !self.distinct
            && !self.is_paged()
            && self.group_by.is_empty()
            && self.set_operations.is_empty()
            && !matches!(self.projection, SqlExpr::Grouping(_))
    }

    /// Whether a statement wrapping this one must repeat its row order.
    pub fn exposes_ordering(&self) -> bool {
        self.is_paged() && !self.orderings.is_empty() && self.set_operations.is_empty()
    }

    pub fn find_table_mut(&mut self, id: super::TableId) -> Option<&mut SqlTable> {
        self.tables.iter_mut().find_map(|t| t.find_mut(id))
    }

    pub fn build(self) -> SqlStatement {
        SqlStatement {
            data_info: self.data_info,
            projection: self.projection,
            tables: self.tables,
            where_condition: self.where_condition,
            group_by: self.group_by,
            orderings: self.orderings,
            distinct: self.distinct,
            top: self.top,
            skip: self.skip,
            set_operations: self.set_operations,
        }
    }
}

/// A frozen statement. Later stages consume it and produce a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    data_info: DataInfo,
    projection: SqlExpr,
    tables: Vec<SqlTable>,
    where_condition: Option<SqlExpr>,
    group_by: Vec<SqlExpr>,
    orderings: Vec<SqlOrdering>,
    distinct: bool,
    top: Option<SqlExpr>,
    skip: Option<SqlExpr>,
    set_operations: Vec<SetOperationClause>,
}

impl SqlStatement {
    pub fn data_info(&self) -> DataInfo {
        self.data_info
    }

    pub fn projection(&self) -> &SqlExpr {
        &self.projection
    }

    pub fn tables(&self) -> &[SqlTable] {
        &self.tables
    }

    pub fn where_condition(&self) -> Option<&SqlExpr> {
        self.where_condition.as_ref()
    }

    pub fn group_by(&self) -> &[SqlExpr] {
        &self.group_by
    }

    pub fn orderings(&self) -> &[SqlOrdering] {
        &self.orderings
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn top(&self) -> Option<&SqlExpr> {
        self.top.as_ref()
    }

    pub fn skip(&self) -> Option<&SqlExpr> {
        self.skip.as_ref()
    }

    pub fn set_operations(&self) -> &[SetOperationClause] {
        &self.set_operations
    }

    pub fn is_paged(&self) -> bool {
        self.top.is_some() || self.skip.is_some()
    }

    /// Whether the statement could be merged into an enclosing one.
    pub fn is_simple_sequence(&self) -> bool {
        self.data_info == DataInfo::Sequence
            && !self.distinct
            && !self.is_paged()
            && self.group_by.is_empty()
            && self.set_operations.is_empty()
            && !matches!(self.projection, SqlExpr::Grouping(_))
    }

    /// Whether no unresolved table or expression remains anywhere.
    pub fn is_resolved(&self) -> bool {
        self.tables.iter().all(SqlTable::is_resolved)
            && self.projection.is_resolved()
            && self.where_condition.as_ref().map_or(true, SqlExpr::is_resolved)
            && self.group_by.iter().all(SqlExpr::is_resolved)
            && self.orderings.iter().all(|o| o.expr.is_resolved())
            && self.top.as_ref().map_or(true, SqlExpr::is_resolved)
            && self.skip.as_ref().map_or(true, SqlExpr::is_resolved)
            && self.set_operations.iter().all(|s| s.statement.is_resolved())
    }

    pub fn into_builder(self) -> SqlStatementBuilder {
        SqlStatementBuilder {
            data_info: self.data_info,
            projection: self.projection,
            tables: self.tables,
            where_condition: self.where_condition,
            group_by: self.group_by,
            orderings: self.orderings,
            distinct: self.distinct,
            top: self.top,
            skip: self.skip,
            set_operations: self.set_operations,
        }
    }
}

/// Compact outline used in error messages, not valid SQL.
impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        write!(f, "<{}>", self.projection.kind_name())?;
        if !self.tables.is_empty() {
            write!(f, " FROM ")?;
            for (i, table) in self.tables.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                outline_table(f, table)?;
            }
        }
        if self.where_condition.is_some() {
            write!(f, " WHERE ...")?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY ...")?;
        }
        if !self.orderings.is_empty() {
            write!(f, " ORDER BY ...")?;
        }
        Ok(())
    }
}

fn outline_table(f: &mut fmt::Formatter<'_>, table: &SqlTable) -> fmt::Result {
    match &table.info {
        TableInfo::Unresolved { item_type } => write!(f, "<{}>", item_type)?,
        TableInfo::UnresolvedCollection { item_type, .. } => write!(f, "<collection of {}>", item_type)?,
        TableInfo::UnresolvedSubStatement(s) => write!(f, "({})", s)?,
        TableInfo::Simple(t) => write!(f, "{} {}", t.table_name, t.alias)?,
        TableInfo::SubStatement(s) => write!(f, "({}) {}", s.statement, s.alias)?,
        TableInfo::Join(j) => match &j.target {
            TableInfo::Simple(t) => write!(f, "JOIN {} {}", t.table_name, t.alias)?,
            _ => write!(f, "JOIN <source>")?,
        },
    }
    for join in &table.joins {
        write!(f, " ")?;
        outline_table(f, join)?;
    }
    Ok(())
}
