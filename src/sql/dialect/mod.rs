//! Target databases of generated commands.
//!
//! [`SqlDialect`] captures everything that differs between the supported
//! databases; [`Dialect`] selects an implementation:
//!
//! - Identifier quoting: `"` (PG/DuckDB), `` ` `` (MySQL), `[]` (T-SQL)
//! - Parameter placeholders: `@1` (T-SQL), `$1` (PG/DuckDB), `?` (MySQL)
//! - Pagination: LIMIT/OFFSET vs OFFSET FETCH vs TOP
//! - Boolean values: native predicates vs `CASE WHEN ... THEN 1 ELSE 0 END`
//! - Correlated sources: `CROSS JOIN LATERAL` vs `CROSS APPLY`
//!
//! # Example
//!
//! ```
//! use relq::sql::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::TSql;
//! assert_eq!(dialect.quote_identifier("CookTable"), "[CookTable]");
//! assert_eq!(dialect.parameter_placeholder(1), "@1");
//! ```
//!
//! # Server versions
//!
//! | Feature | PostgreSQL | SQL Server | MySQL | DuckDB |
//! |---------|-----------|------------|-------|--------|
//! | OFFSET ... FETCH | 8.4+ | 2012+ | ❌ | ✓ |
//! | LATERAL / APPLY | 9.3+ | 2005+ (APPLY) | 8.0.14+ | ✓ |
//! | TRIM() | ✓ | 2017+ | ✓ | ✓ |
//! | CONCAT() | 9.1+ | 2012+ | ✓ | ✓ |

mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
mod tsql;

pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use tsql::TSql;

use serde::{Deserialize, Serialize};

use super::token::{Token, TokenStream};

/// How row limits and skips are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingStrategy {
    /// `LIMIT n OFFSET m`
    LimitOffset,
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`, with `TOP (n)` (or
    /// `FETCH FIRST n ROWS ONLY`) when only a limit is present.
    OffsetFetch,
}

/// Rendering rules of one target database.
///
/// Defaults describe PostgreSQL-like behavior; dialects override what
/// differs.
pub trait SqlDialect: std::fmt::Debug + Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Quoting
    // =========================================================================

    /// Quote a table, column or alias name.
    ///
    /// - PostgreSQL/DuckDB: `"identifier"`
    /// - MySQL: `` `identifier` ``
    /// - T-SQL: `[identifier]`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a literal chosen by the translator. Query values never pass
    /// through here; they become parameters.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Placeholder text for the 1-based parameter `index`.
    ///
    /// - T-SQL: `@1`
    /// - PostgreSQL/DuckDB: `$1`
    /// - MySQL: `?` (positional)
    fn parameter_placeholder(&self, index: usize) -> String;

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Paging strategy used unless configuration overrides it.
    fn default_paging(&self) -> PagingStrategy {
        PagingStrategy::LimitOffset
    }

    /// Whether `LIMIT n` is understood. T-SQL has no LIMIT clause.
    fn supports_limit(&self) -> bool {
        true
    }

    /// Whether `SELECT TOP (n)` is understood. Only T-SQL.
    fn supports_top(&self) -> bool {
        false
    }

    /// Emit LIMIT/OFFSET for already rendered limit and offset values.
    fn emit_limit_offset(
        &self,
        limit: Option<&TokenStream>,
        offset: Option<&TokenStream>,
    ) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    // =========================================================================
    // Booleans
    // =========================================================================

    /// Whether predicates can be used as values (in SELECT lists, as
    /// comparison operands) and boolean values as predicates.
    ///
    /// T-SQL requires `CASE WHEN p THEN 1 ELSE 0 END` and `flag = 1`.
    fn supports_boolean_values(&self) -> bool {
        true
    }

    // =========================================================================
    // Correlated sources
    // =========================================================================

    /// `CROSS JOIN LATERAL` is understood. T-SQL spells it `CROSS APPLY`.
    fn supports_lateral(&self) -> bool {
        true
    }

    /// Keywords introducing a correlated additional source.
    fn emit_cross_apply(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        if self.supports_lateral() {
            ts.push(Token::Cross)
                .space()
                .push(Token::Join)
                .space()
                .push(Token::Lateral);
        } else {
            ts.push(Token::Cross).space().push(Token::Apply);
        }
        ts
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// This dialect's spelling of a function emitted by a transformer,
    /// e.g. `LENGTH` is `LEN` on T-SQL. `None` keeps the name; matching
    /// ignores case.
    fn remap_function(&self, name: &str) -> Option<&'static str> {
        let _ = name;
        None
    }
}

/// A supported target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    TSql,
    Postgres,
    DuckDb,
    MySql,
}

impl Dialect {
    /// The rendering rules for this database.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::TSql => &TSql,
            Dialect::Postgres => &Postgres,
            Dialect::DuckDb => &DuckDb,
            Dialect::MySql => &MySql,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn parameter_placeholder(&self, index: usize) -> String {
        self.dialect().parameter_placeholder(index)
    }

    fn default_paging(&self) -> PagingStrategy {
        self.dialect().default_paging()
    }

    fn supports_limit(&self) -> bool {
        self.dialect().supports_limit()
    }

    fn supports_top(&self) -> bool {
        self.dialect().supports_top()
    }

    fn emit_limit_offset(
        &self,
        limit: Option<&TokenStream>,
        offset: Option<&TokenStream>,
    ) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn supports_boolean_values(&self) -> bool {
        self.dialect().supports_boolean_values()
    }

    fn supports_lateral(&self) -> bool {
        self.dialect().supports_lateral()
    }

    fn emit_cross_apply(&self) -> TokenStream {
        self.dialect().emit_cross_apply()
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        self.dialect().remap_function(name)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
