//! SQL-level expressions of the statement model.

use crate::query::{MethodSignature, Value};

use super::column::{SqlColumn, SqlEntity};
use super::statement::SqlStatement;
use super::TableId;

/// An expression in a statement.
///
/// The first group of variants only exists between preparation and
/// resolution; [`SqlExpr::is_resolved`] reports whether any remain.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    // === Unresolved ===
    /// The current row of a table source.
    TableRef(TableId),
    /// Member access on an entity, compound or grouping.
    Member { inner: Box<SqlExpr>, member: String },
    /// A constant instance of a mapped entity.
    EntityConstant { item_type: String, key: Value },
    /// An aggregate computed inside the grouping statement behind `table`.
    GroupAggregateRef { table: TableId, name: String },
    /// Ordering key `index` of the paged statement behind `table`.
    OrderingKeyRef { table: TableId, index: usize },

    // === Resolved ===
    Column(SqlColumn),
    Entity(SqlEntity),
    /// A user-supplied value, always emitted as a parameter.
    Constant(Value),
    /// A fixed SQL literal produced by the translator itself.
    Literal(SqlLiteral),
    Binary {
        op: SqlBinaryOp,
        left: Box<SqlExpr>,
        right: Box<SqlExpr>,
    },
    Unary {
        op: SqlUnaryOp,
        operand: Box<SqlExpr>,
    },
    /// A method call, translated through the transformer registry at
    /// generation time.
    Call(MethodCall),
    Function { name: String, args: Vec<SqlExpr> },
    Like {
        operand: Box<SqlExpr>,
        pattern: Box<SqlExpr>,
        escape: Option<char>,
    },
    Case {
        whens: Vec<CaseWhen>,
        else_result: Option<Box<SqlExpr>>,
    },
    IsNull { operand: Box<SqlExpr>, negated: bool },
    In { operand: Box<SqlExpr>, list: Vec<SqlExpr> },
    Exists(Box<SqlStatement>),
    /// A scalar subquery.
    Subquery(Box<SqlStatement>),
    Aggregate {
        kind: AggregateKind,
        arg: Option<Box<SqlExpr>>,
        distinct: bool,
    },
    /// An anonymous-type projection.
    Compound(Vec<NamedExpr>),
    /// The projection of a grouping statement.
    Grouping(Box<SqlGrouping>),
    /// A projected value with an explicit output name.
    Named(Box<NamedExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlLiteral {
    Int(i64),
    Null,
    Str(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlBinaryOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl SqlBinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            SqlBinaryOp::Eq
                | SqlBinaryOp::Ne
                | SqlBinaryOp::Lt
                | SqlBinaryOp::Lte
                | SqlBinaryOp::Gt
                | SqlBinaryOp::Gte
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, SqlBinaryOp::And | SqlBinaryOp::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlUnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateKind {
    pub fn function_name(&self) -> &'static str {
        match self {
            AggregateKind::Count => "COUNT",
            AggregateKind::Sum => "SUM",
            AggregateKind::Min => "MIN",
            AggregateKind::Max => "MAX",
            AggregateKind::Avg => "AVG",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub instance: Option<Box<SqlExpr>>,
    pub signature: MethodSignature,
    pub arguments: Vec<SqlExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseWhen {
    pub condition: SqlExpr,
    pub result: SqlExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedExpr {
    pub name: String,
    pub expr: SqlExpr,
}

impl NamedExpr {
    pub fn new(name: impl Into<String>, expr: SqlExpr) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }
}

/// Group key plus the aggregates requested over each group.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlGrouping {
    pub key: SqlExpr,
    /// The per-row element aggregates range over. Only meaningful during
    /// preparation, which takes it out once the grouping becomes a source.
    pub element: Option<SqlExpr>,
    pub aggregates: Vec<NamedExpr>,
}

impl SqlExpr {
    pub fn binary(op: SqlBinaryOp, left: SqlExpr, right: SqlExpr) -> SqlExpr {
        SqlExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: SqlExpr, right: SqlExpr) -> SqlExpr {
        SqlExpr::binary(SqlBinaryOp::Eq, left, right)
    }

    pub fn and(left: SqlExpr, right: SqlExpr) -> SqlExpr {
        SqlExpr::binary(SqlBinaryOp::And, left, right)
    }

    pub fn not(operand: SqlExpr) -> SqlExpr {
        SqlExpr::Unary {
            op: SqlUnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    pub fn is_null(operand: SqlExpr) -> SqlExpr {
        SqlExpr::IsNull {
            operand: Box::new(operand),
            negated: false,
        }
    }

    pub fn function(name: impl Into<String>, args: Vec<SqlExpr>) -> SqlExpr {
        SqlExpr::Function {
            name: name.into(),
            args,
        }
    }

    pub fn int(n: i64) -> SqlExpr {
        SqlExpr::Literal(SqlLiteral::Int(n))
    }

    /// `CASE WHEN condition THEN result ELSE else_result END`.
    pub fn case_when(condition: SqlExpr, result: SqlExpr, else_result: Option<SqlExpr>) -> SqlExpr {
        SqlExpr::Case {
            whens: vec![CaseWhen { condition, result }],
            else_result: else_result.map(Box::new),
        }
    }

    /// AND `predicate` onto an optional existing condition.
    pub fn and_also(existing: Option<SqlExpr>, predicate: SqlExpr) -> SqlExpr {
        match existing {
            Some(e) => SqlExpr::and(e, predicate),
            None => predicate,
        }
    }

    /// Conjunction of all predicates; `None` when empty.
    pub fn all(predicates: impl IntoIterator<Item = SqlExpr>) -> Option<SqlExpr> {
        predicates
            .into_iter()
            .fold(None, |acc, p| Some(SqlExpr::and_also(acc, p)))
    }

    /// Whether this expression is a boolean test rather than a value.
    pub fn is_predicate(&self) -> bool {
        match self {
            SqlExpr::Binary { op, .. } => op.is_comparison() || op.is_logical(),
            SqlExpr::Unary {
                op: SqlUnaryOp::Not,
                ..
            } => true,
            SqlExpr::Like { .. }
            | SqlExpr::IsNull { .. }
            | SqlExpr::In { .. }
            | SqlExpr::Exists(_) => true,
            SqlExpr::Named(named) => named.expr.is_predicate(),
            _ => false,
        }
    }

    /// Whether no preparation-only node remains in this expression.
    pub fn is_resolved(&self) -> bool {
        match self {
            SqlExpr::TableRef(_)
            | SqlExpr::Member { .. }
            | SqlExpr::EntityConstant { .. }
            | SqlExpr::GroupAggregateRef { .. }
            | SqlExpr::OrderingKeyRef { .. } => false,
            SqlExpr::Column(_) | SqlExpr::Entity(_) | SqlExpr::Constant(_) | SqlExpr::Literal(_) => {
                true
            }
            SqlExpr::Binary { left, right, .. } => left.is_resolved() && right.is_resolved(),
            SqlExpr::Unary { operand, .. } => operand.is_resolved(),
            SqlExpr::Call(call) => {
                call.instance.as_ref().map_or(true, |i| i.is_resolved())
                    && call.arguments.iter().all(SqlExpr::is_resolved)
            }
            SqlExpr::Function { args, .. } => args.iter().all(SqlExpr::is_resolved),
            SqlExpr::Like {
                operand, pattern, ..
            } => operand.is_resolved() && pattern.is_resolved(),
            SqlExpr::Case { whens, else_result } => {
                whens
                    .iter()
                    .all(|w| w.condition.is_resolved() && w.result.is_resolved())
                    && else_result.as_ref().map_or(true, |e| e.is_resolved())
            }
            SqlExpr::IsNull { operand, .. } => operand.is_resolved(),
            SqlExpr::In { operand, list } => {
                operand.is_resolved() && list.iter().all(SqlExpr::is_resolved)
            }
            SqlExpr::Exists(s) | SqlExpr::Subquery(s) => s.is_resolved(),
            SqlExpr::Aggregate { arg, .. } => arg.as_ref().map_or(true, |a| a.is_resolved()),
            SqlExpr::Compound(members) => members.iter().all(|m| m.expr.is_resolved()),
            SqlExpr::Grouping(g) => {
                g.key.is_resolved() && g.aggregates.iter().all(|a| a.expr.is_resolved())
            }
            SqlExpr::Named(named) => named.expr.is_resolved(),
        }
    }

    /// Short description used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SqlExpr::TableRef(_) => "table reference",
            SqlExpr::Member { .. } => "member access",
            SqlExpr::EntityConstant { .. } => "entity constant",
            SqlExpr::GroupAggregateRef { .. } => "group aggregate reference",
            SqlExpr::OrderingKeyRef { .. } => "ordering key reference",
            SqlExpr::Column(_) => "column",
            SqlExpr::Entity(_) => "entity",
            SqlExpr::Constant(_) => "constant",
            SqlExpr::Literal(_) => "literal",
            SqlExpr::Binary { .. } => "binary expression",
            SqlExpr::Unary { .. } => "unary expression",
            SqlExpr::Call(_) => "method call",
            SqlExpr::Function { .. } => "function",
            SqlExpr::Like { .. } => "LIKE",
            SqlExpr::Case { .. } => "CASE",
            SqlExpr::IsNull { .. } => "IS NULL",
            SqlExpr::In { .. } => "IN",
            SqlExpr::Exists(_) => "EXISTS",
            SqlExpr::Subquery(_) => "subquery",
            SqlExpr::Aggregate { .. } => "aggregate",
            SqlExpr::Compound(_) => "anonymous type",
            SqlExpr::Grouping(_) => "grouping",
            SqlExpr::Named(_) => "named expression",
        }
    }
}
