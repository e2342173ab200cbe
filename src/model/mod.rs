//! Statement model.
//!
//! The intermediate tree that represents one SQL statement, first in
//! unresolved form (as produced by preparation) and then in resolved form
//! (as consumed by generation). Every category is a closed enum so each
//! stage handles node kinds through exhaustive matching.
//!
//! Statements are assembled through [`SqlStatementBuilder`] and frozen into
//! [`SqlStatement`]; a frozen statement can only be changed by turning it
//! back into a builder, which consumes it.

mod column;
mod expr;
mod statement;
mod table;

pub use column::{ColumnKind, SqlColumn, SqlEntity};
pub use expr::{
    AggregateKind, CaseWhen, MethodCall, NamedExpr, SqlBinaryOp, SqlExpr, SqlGrouping, SqlLiteral,
    SqlUnaryOp,
};
pub use statement::{
    DataInfo, OrderingDirection, SetOperation, SetOperationClause, SqlOrdering, SqlStatement,
    SqlStatementBuilder,
};
pub use table::{
    JoinInfo, JoinSemantics, ResolvedSubStatement, ResolvedSimpleTable, SqlTable, TableInfo,
};

/// Identity of a table source within one translation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub usize);

/// Identity of an entity expression within one translation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);
