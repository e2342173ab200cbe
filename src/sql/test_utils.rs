//! Parse generated commands back with sqlparser to catch malformed output.

use sqlparser::dialect::{DuckDbDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

fn parser_dialect(dialect: Dialect) -> Box<dyn sqlparser::dialect::Dialect> {
    match dialect {
        Dialect::TSql => Box::new(MsSqlDialect {}),
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
    }
}

/// `Err` with the parser message and the offending text when `sql` does
/// not parse as `dialect`.
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    match Parser::parse_sql(parser_dialect(dialect).as_ref(), sql) {
        Ok(_) => Ok(()),
        Err(e) => Err(format!("{} rejected the command: {}\n{}", dialect, e, sql)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_placeholders() {
        validate_sql(r#"SELECT "t0"."ID" FROM "CookTable" "t0" WHERE "t0"."ID" = $1"#, Dialect::Postgres)
            .unwrap();
        validate_sql("SELECT `t0`.`ID` FROM `CookTable` `t0` WHERE `t0`.`ID` = ?", Dialect::MySql)
            .unwrap();
    }

    #[test]
    fn test_rejects_garbage() {
        let err = validate_sql("SELEC ID FORM CookTable", Dialect::DuckDb).unwrap_err();
        assert!(err.contains("SELEC ID FORM CookTable"));
    }
}
