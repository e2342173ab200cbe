//! Query models: the clause sequence produced by a front-end.

use serde::{Deserialize, Serialize};

use super::expr::{Expr, Lambda};

/// A complete query: a main source, body clauses, a selector and the
/// result operators applied to the selected sequence, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryModel {
    pub main_from: FromClause,
    #[serde(default)]
    pub body_clauses: Vec<BodyClause>,
    pub select: Expr,
    #[serde(default)]
    pub result_operators: Vec<ResultOperator>,
}

/// Introduces a named query source ranging over `source`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromClause {
    pub item_name: String,
    pub item_type: String,
    pub source: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyClause {
    AdditionalFrom(FromClause),
    Where(Expr),
    OrderBy(Vec<Ordering>),
    Join(JoinClause),
    GroupJoin(GroupJoinClause),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ordering {
    pub expr: Expr,
    #[serde(default)]
    pub direction: OrderingDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingDirection {
    #[default]
    Asc,
    Desc,
}

/// `join x in inner_sequence on outer_key equals inner_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinClause {
    pub item_name: String,
    pub item_type: String,
    pub inner_sequence: Expr,
    pub outer_key: Expr,
    pub inner_key: Expr,
}

/// `join ... into item_name`: a join whose matches are exposed as a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupJoinClause {
    pub item_name: String,
    pub join: JoinClause,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOperator {
    Distinct,
    Take(Expr),
    Skip(Expr),
    First {
        #[serde(default)]
        or_default: bool,
    },
    Single {
        #[serde(default)]
        or_default: bool,
    },
    Last {
        #[serde(default)]
        or_default: bool,
    },
    Count,
    LongCount,
    Sum,
    Min,
    Max,
    Average,
    Any,
    All(Lambda),
    Contains(Expr),
    GroupBy {
        key: Lambda,
        #[serde(default)]
        element: Option<Lambda>,
    },
    DefaultIfEmpty,
    Cast(String),
    OfType(String),
    Union(Expr),
    Concat(Expr),
    Intersect(Expr),
    Except(Expr),
    Reverse,
    Aggregate,
}

impl ResultOperator {
    pub fn name(&self) -> &'static str {
        match self {
            ResultOperator::Distinct => "Distinct",
            ResultOperator::Take(_) => "Take",
            ResultOperator::Skip(_) => "Skip",
            ResultOperator::First { .. } => "First",
            ResultOperator::Single { .. } => "Single",
            ResultOperator::Last { .. } => "Last",
            ResultOperator::Count => "Count",
            ResultOperator::LongCount => "LongCount",
            ResultOperator::Sum => "Sum",
            ResultOperator::Min => "Min",
            ResultOperator::Max => "Max",
            ResultOperator::Average => "Average",
            ResultOperator::Any => "Any",
            ResultOperator::All(_) => "All",
            ResultOperator::Contains(_) => "Contains",
            ResultOperator::GroupBy { .. } => "GroupBy",
            ResultOperator::DefaultIfEmpty => "DefaultIfEmpty",
            ResultOperator::Cast(_) => "Cast",
            ResultOperator::OfType(_) => "OfType",
            ResultOperator::Union(_) => "Union",
            ResultOperator::Concat(_) => "Concat",
            ResultOperator::Intersect(_) => "Intersect",
            ResultOperator::Except(_) => "Except",
            ResultOperator::Reverse => "Reverse",
            ResultOperator::Aggregate => "Aggregate",
        }
    }
}

impl FromClause {
    /// `from item_name in <table of item_type>`.
    pub fn table(item_name: impl Into<String>, item_type: impl Into<String>) -> Self {
        let item_type = item_type.into();
        Self {
            item_name: item_name.into(),
            source: Expr::table(item_type.clone()),
            item_type,
        }
    }

    pub fn new(item_name: impl Into<String>, item_type: impl Into<String>, source: Expr) -> Self {
        Self {
            item_name: item_name.into(),
            item_type: item_type.into(),
            source,
        }
    }
}

impl QueryModel {
    pub fn new(main_from: FromClause, select: Expr) -> Self {
        Self {
            main_from,
            body_clauses: vec![],
            select,
            result_operators: vec![],
        }
    }

    /// `from item_name in <table> select item_name`.
    pub fn from_table(item_name: impl Into<String>, item_type: impl Into<String>) -> Self {
        let from = FromClause::table(item_name, item_type);
        let select = Expr::source(from.item_name.clone());
        Self::new(from, select)
    }

    pub fn with_clause(mut self, clause: BodyClause) -> Self {
        self.body_clauses.push(clause);
        self
    }

    pub fn with_where(self, predicate: Expr) -> Self {
        self.with_clause(BodyClause::Where(predicate))
    }

    pub fn with_order_by(self, expr: Expr, direction: OrderingDirection) -> Self {
        self.with_clause(BodyClause::OrderBy(vec![Ordering { expr, direction }]))
    }

    pub fn with_select(mut self, select: Expr) -> Self {
        self.select = select;
        self
    }

    pub fn with_result_operator(mut self, op: ResultOperator) -> Self {
        self.result_operators.push(op);
        self
    }
}
