//! DuckDB SQL dialect.
//!
//! DuckDB is PostgreSQL-compatible for everything the translator emits:
//! - ANSI identifier quoting (`"`)
//! - Numbered parameters (`$1`)
//! - Native booleans
//! - LATERAL joins

use super::helpers;
use super::SqlDialect;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn parameter_placeholder(&self, index: usize) -> String {
        helpers::placeholder_dollar(index)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_duckdb(name)
    }
}
