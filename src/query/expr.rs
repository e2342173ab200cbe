//! Expressions of the query input contract.

use serde::{Deserialize, Serialize};

use super::model::QueryModel;
use super::signature::MethodSignature;
use super::value::Value;

/// An expression inside a query clause.
///
/// Query sources (from clauses, join clauses and lambda parameters) are
/// referenced by name through [`Expr::QuerySource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// The root queryable of a mapped entity type.
    Table { item_type: String },
    /// A reference to a named query source.
    QuerySource(String),
    Constant(Value),
    Member {
        inner: Box<Expr>,
        member: String,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// A method call; `instance` is `None` for static methods.
    Call {
        instance: Option<Box<Expr>>,
        method: MethodSignature,
        #[serde(default)]
        arguments: Vec<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    /// Construction of an anonymous type.
    New(Vec<NewMember>),
    SubQuery(Box<QueryModel>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub expr: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    AndAlso,
    OrElse,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Coalesce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Negate,
}

/// A single-parameter lambda over the current sequence element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    pub parameter: String,
    pub body: Expr,
}

impl Lambda {
    pub fn new(parameter: impl Into<String>, body: Expr) -> Self {
        Self {
            parameter: parameter.into(),
            body,
        }
    }
}

// Builder helpers, mostly used by front-ends and tests.
impl Expr {
    pub fn table(item_type: impl Into<String>) -> Self {
        Expr::Table {
            item_type: item_type.into(),
        }
    }

    pub fn source(name: impl Into<String>) -> Self {
        Expr::QuerySource(name.into())
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn null() -> Self {
        Expr::Constant(Value::Null)
    }

    pub fn subquery(model: QueryModel) -> Self {
        Expr::SubQuery(Box::new(model))
    }

    pub fn new_object<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = (S, Expr)>,
        S: Into<String>,
    {
        Expr::New(
            members
                .into_iter()
                .map(|(name, expr)| NewMember {
                    name: name.into(),
                    expr,
                })
                .collect(),
        )
    }

    pub fn member(self, member: impl Into<String>) -> Self {
        Expr::Member {
            inner: Box::new(self),
            member: member.into(),
        }
    }

    pub fn binary(self, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    pub fn eq(self, right: Expr) -> Self {
        self.binary(BinaryOp::Equal, right)
    }

    pub fn ne(self, right: Expr) -> Self {
        self.binary(BinaryOp::NotEqual, right)
    }

    pub fn gt(self, right: Expr) -> Self {
        self.binary(BinaryOp::GreaterThan, right)
    }

    pub fn lt(self, right: Expr) -> Self {
        self.binary(BinaryOp::LessThan, right)
    }

    pub fn and(self, right: Expr) -> Self {
        self.binary(BinaryOp::AndAlso, right)
    }

    pub fn or(self, right: Expr) -> Self {
        self.binary(BinaryOp::OrElse, right)
    }

    pub fn not(self) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    /// Instance method call.
    pub fn call(self, method: MethodSignature, arguments: Vec<Expr>) -> Self {
        Expr::Call {
            instance: Some(Box::new(self)),
            method,
            arguments,
        }
    }

    /// Static method call.
    pub fn call_static(method: MethodSignature, arguments: Vec<Expr>) -> Self {
        Expr::Call {
            instance: None,
            method,
            arguments,
        }
    }
}
