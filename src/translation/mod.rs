//! Query translation pipeline.
//!
//! ```text
//!   QueryModel
//!       │
//!       ▼ [prepare]     clauses and result operators → unresolved statement
//!   SqlStatement (unresolved)
//!       │
//!       ▼ [resolve]     MappingResolver: tables, columns, joins
//!   SqlStatement (resolved)
//!       │
//!       ▼ [generate]    dialect tokens + parameters, method-call transformers
//!   SqlCommand
//! ```
//!
//! Every translation gets its own [`UniqueIdentifierGenerator`] and resolution
//! context. The resolver and the transformer registry are shared read-only.

pub mod generate;
pub mod identifiers;
pub mod prepare;
pub mod resolve;
pub mod transformers;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::TranslationResult;
use crate::metadata::MappingResolver;
use crate::query::QueryModel;
use crate::sql::{Dialect, PagingStrategy, SqlCommand, SqlDialect};

pub use generate::generate;
pub use identifiers::UniqueIdentifierGenerator;
pub use prepare::prepare;
pub use resolve::resolve;
pub use transformers::{MethodCallTransformer, MethodCallTransformerRegistry};

/// Per-translation output options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationOptions {
    pub dialect: Dialect,
    /// Overrides the dialect's default paging strategy.
    pub paging: Option<PagingStrategy>,
}

impl TranslationOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            paging: None,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_paging(mut self, paging: PagingStrategy) -> Self {
        self.paging = Some(paging);
        self
    }

    /// The paging strategy generation uses.
    ///
    /// A `LimitOffset` override falls back to `OffsetFetch` on dialects
    /// without `LIMIT`.
    pub fn paging_strategy(&self) -> PagingStrategy {
        match self.paging {
            Some(PagingStrategy::LimitOffset) if !self.dialect.supports_limit() => {
                tracing::warn!(
                    dialect = %self.dialect,
                    "dialect has no LIMIT clause, using OFFSET/FETCH"
                );
                PagingStrategy::OffsetFetch
            }
            Some(paging) => paging,
            None => self.dialect.default_paging(),
        }
    }
}

/// Translate `query` into a parameterized command.
pub fn translate(
    query: &QueryModel,
    resolver: &dyn MappingResolver,
    registry: &MethodCallTransformerRegistry,
    options: &TranslationOptions,
) -> TranslationResult<SqlCommand> {
    let mut ids = UniqueIdentifierGenerator::new();

    let prepared = prepare(query, &mut ids)?;
    tracing::debug!(statement = %prepared, "prepared");

    let resolved = resolve(prepared, resolver, &mut ids)?;
    tracing::debug!(statement = %resolved, "resolved");

    generate(&resolved, registry, options)
}

/// A translator bundling a resolver, a registry and options.
///
/// Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct SqlQueryTranslator {
    resolver: Arc<dyn MappingResolver>,
    registry: Arc<MethodCallTransformerRegistry>,
    options: TranslationOptions,
}

impl SqlQueryTranslator {
    /// A translator using the built-in transformers and default options.
    pub fn new(resolver: impl MappingResolver + 'static) -> Self {
        Self {
            resolver: Arc::new(resolver),
            registry: Arc::new(MethodCallTransformerRegistry::with_defaults()),
            options: TranslationOptions::default(),
        }
    }

    pub fn with_registry(mut self, registry: MethodCallTransformerRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_options(mut self, options: TranslationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    pub fn registry(&self) -> &MethodCallTransformerRegistry {
        &self.registry
    }

    pub fn translate(&self, query: &QueryModel) -> TranslationResult<SqlCommand> {
        translate(query, self.resolver.as_ref(), &self.registry, &self.options)
    }
}

impl std::fmt::Debug for SqlQueryTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlQueryTranslator")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
