//! # relq
//!
//! Translates structured, object-oriented query descriptions into
//! parameterized SQL for several dialects.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 QueryModel (query input)                 │
//! │   (from clauses, filters, orderings, result operators)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [prepare]
//! ┌─────────────────────────────────────────────────────────┐
//! │            SqlStatement (unresolved tables)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [resolve]  ◄── MappingResolver
//! ┌─────────────────────────────────────────────────────────┐
//! │        SqlStatement (tables, columns, joins)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [generate] ◄── transformer registry
//! ┌─────────────────────────────────────────────────────────┐
//! │          SqlCommand (text + ordered parameters)          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use relq::prelude::*;
//!
//! let catalog = Catalog::new().with_entity(
//!     "Cook",
//!     EntityMapping::new("CookTable").key("ID").column("FirstName"),
//! );
//! let translator = SqlQueryTranslator::new(StaticMappingResolver::new(catalog));
//!
//! let query = QueryModel::from_table("c", "Cook")
//!     .with_where(Expr::source("c").member("FirstName").eq(Expr::constant("John")))
//!     .with_select(Expr::source("c").member("FirstName"));
//!
//! let command = translator.translate(&query).unwrap();
//! assert_eq!(
//!     command.text,
//!     "SELECT [t0].[FirstName] FROM [CookTable] [t0] WHERE [t0].[FirstName] = @1"
//! );
//! ```

pub mod config;
pub mod error;
pub mod metadata;
pub mod model;
pub mod query;
pub mod sql;
pub mod translation;

pub use error::{TranslationError, TranslationResult};
pub use sql::{Dialect, PagingStrategy, SqlCommand};
pub use translation::{translate, SqlQueryTranslator, TranslationOptions};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::error::{TranslationError, TranslationResult};
    pub use crate::metadata::{
        Cardinality, Catalog, EntityMapping, MappingResolver, StaticMappingResolver,
    };
    pub use crate::query::{
        BinaryOp, Expr, Lambda, MethodSignature, OrderingDirection, QueryModel, ResultOperator,
        Value,
    };
    pub use crate::sql::{Dialect, PagingStrategy, SqlCommand, SqlDialect};
    pub use crate::translation::{
        translate, MethodCallTransformer, MethodCallTransformerRegistry, SqlQueryTranslator,
        TranslationOptions,
    };
}
