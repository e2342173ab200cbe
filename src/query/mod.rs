//! Query input contract.
//!
//! A front-end parses source query syntax into a [`QueryModel`]: a main
//! from clause, body clauses (additional sources, filters, orderings and
//! joins), a selector and a sequence of result operators. The translator
//! consumes it read-only. All types are serde-serializable so models can be
//! exchanged as JSON.

mod expr;
mod model;
mod signature;
mod value;

pub use expr::{BinaryOp, Expr, Lambda, NewMember, UnaryOp};
pub use model::{
    BodyClause, FromClause, GroupJoinClause, JoinClause, Ordering, OrderingDirection, QueryModel,
    ResultOperator,
};
pub use signature::MethodSignature;
pub use value::{Value, ValueType};
