//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL has significant differences from ANSI:
//! - Square bracket identifier quoting (`[name]`)
//! - Named parameters (`@1`)
//! - No boolean values in SELECT (must use CASE)
//! - OFFSET FETCH for pagination (requires ORDER BY)
//! - TOP for simple limiting
//! - N'...' prefix for Unicode strings
//! - CROSS APPLY instead of LATERAL

use super::helpers;
use super::{PagingStrategy, SqlDialect};

/// T-SQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        // T-SQL uses N'...' for Unicode strings
        if !s.is_ascii() {
            helpers::quote_string_unicode(s)
        } else {
            helpers::quote_string_single(s)
        }
    }

    fn parameter_placeholder(&self, index: usize) -> String {
        helpers::placeholder_at(index)
    }

    fn default_paging(&self) -> PagingStrategy {
        PagingStrategy::OffsetFetch
    }

    fn supports_limit(&self) -> bool {
        false
    }

    fn supports_top(&self) -> bool {
        true
    }

    fn supports_boolean_values(&self) -> bool {
        false
    }

    fn supports_lateral(&self) -> bool {
        // T-SQL uses CROSS APPLY instead
        false
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_tsql(name)
    }
}
