//! Building blocks shared by the [`SqlDialect`](super::SqlDialect)
//! implementations, and the paging clauses the generator emits directly.

use super::super::token::{Token, TokenStream};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// `"name"`, doubling embedded quotes.
/// Used by: Postgres, DuckDB
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `` `name` ``, doubling embedded backticks.
/// Used by: MySQL
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// `[name]`, doubling embedded closing brackets.
/// Used by: T-SQL (SQL Server, Azure SQL)
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

// =============================================================================
// String Quoting
// =============================================================================

/// `'text'`, doubling embedded quotes.
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with single quotes, doubling backslashes as well.
/// Used by: MySQL (backslash escapes inside literals by default)
pub fn quote_string_backslash(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

/// `N'text'`: a Unicode literal on T-SQL.
pub fn quote_string_unicode(s: &str) -> String {
    format!("N'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Parameter Placeholders
// =============================================================================

/// `@1`, `@2`, ...
/// Used by: T-SQL
pub fn placeholder_at(index: usize) -> String {
    format!("@{}", index)
}

/// `$1`, `$2`, ...
/// Used by: Postgres, DuckDB
pub fn placeholder_dollar(index: usize) -> String {
    format!("${}", index)
}

/// `?` for every parameter; binding is positional.
/// Used by: MySQL
pub fn placeholder_question(_index: usize) -> String {
    "?".to_string()
}

// =============================================================================
// Pagination
// =============================================================================

/// `LIMIT n OFFSET m`, either part optional.
/// Used by: Postgres, DuckDB
pub fn emit_limit_offset_standard(
    limit: Option<&TokenStream>,
    offset: Option<&TokenStream>,
) -> TokenStream {
    let mut ts = TokenStream::new();
    for (keyword, value) in [(Token::Limit, limit), (Token::Offset, offset)] {
        let Some(value) = value else { continue };
        if !ts.is_empty() {
            ts.space();
        }
        ts.push(keyword).space().append(value);
    }
    ts
}

/// Emit LIMIT ... OFFSET ..., with the largest row count as limit when only
/// an offset is present.
/// Used by: MySQL (OFFSET is not accepted without LIMIT)
pub fn emit_limit_offset_mysql(
    limit: Option<&TokenStream>,
    offset: Option<&TokenStream>,
) -> TokenStream {
    match (limit, offset) {
        (None, Some(off)) => {
            let mut all = TokenStream::new();
            all.push(Token::Raw("18446744073709551615".into()));
            emit_limit_offset_standard(Some(&all), Some(off))
        }
        _ => emit_limit_offset_standard(limit, offset),
    }
}

/// Emit OFFSET ... ROWS [FETCH NEXT ... ROWS ONLY].
/// Used by: T-SQL, and any dialect configured for offset/fetch paging.
/// T-SQL only accepts it after ORDER BY.
pub fn emit_offset_fetch(limit: Option<&TokenStream>, offset: Option<&TokenStream>) -> TokenStream {
    let mut ts = TokenStream::new();

    ts.push(Token::Offset).space();
    match offset {
        Some(off) => ts.append(off),
        None => ts.push(Token::LitInt(0)),
    };
    ts.space().push(Token::Rows);

    if let Some(lim) = limit {
        ts.space()
            .push(Token::Fetch)
            .space()
            .push(Token::Next)
            .space()
            .append(lim)
            .space()
            .push(Token::Rows)
            .space()
            .push(Token::Only);
    }

    ts
}

/// Emit FETCH FIRST ... ROWS ONLY.
/// Used by: dialects without TOP configured for offset/fetch paging.
pub fn emit_fetch_first(limit: &TokenStream) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Fetch)
        .space()
        .push(Token::First)
        .space()
        .append(limit)
        .space()
        .push(Token::Rows)
        .space()
        .push(Token::Only);
    ts
}

// =============================================================================
// Function Remapping
// =============================================================================

/// PostgreSQL spellings.
pub fn remap_function_postgres(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "LEN" => Some("LENGTH"),
        "ISNULL" => Some("COALESCE"),
        "IFNULL" => Some("COALESCE"),
        _ => None,
    }
}

/// DuckDB spellings.
pub fn remap_function_duckdb(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "LEN" => Some("LENGTH"),
        "ISNULL" => Some("COALESCE"),
        "IFNULL" => Some("COALESCE"),
        _ => None,
    }
}

/// MySQL spellings.
pub fn remap_function_mysql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        // LENGTH counts bytes in MySQL
        "LENGTH" => Some("CHAR_LENGTH"),
        "LEN" => Some("CHAR_LENGTH"),
        "ISNULL" => Some("IFNULL"),
        "SUBSTR" => Some("SUBSTRING"),
        _ => None,
    }
}

/// T-SQL spellings.
pub fn remap_function_tsql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "LENGTH" => Some("LEN"),
        "SUBSTR" => Some("SUBSTRING"),
        "CEIL" => Some("CEILING"),
        "IFNULL" => Some("ISNULL"),
        _ => None,
    }
}
