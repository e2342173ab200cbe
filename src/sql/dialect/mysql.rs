//! MySQL SQL dialect.
//!
//! MySQL differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - Positional `?` parameters
//! - LIMIT ... OFFSET ... for pagination, OFFSET never alone
//! - No OFFSET/FETCH
//! - LATERAL supported in 8.0.14+
//! - Backslash escapes inside string literals
//! - LENGTH counts bytes (CHAR_LENGTH counts characters)

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    fn parameter_placeholder(&self, index: usize) -> String {
        helpers::placeholder_question(index)
    }

    fn emit_limit_offset(
        &self,
        limit: Option<&TokenStream>,
        offset: Option<&TokenStream>,
    ) -> TokenStream {
        helpers::emit_limit_offset_mysql(limit, offset)
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_mysql(name)
    }
}
