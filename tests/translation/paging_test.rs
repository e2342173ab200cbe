//! Take, Skip, First and Single across paging strategies.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use pretty_assertions::assert_eq;
use relq::query::{Expr, FromClause, OrderingDirection, QueryModel, ResultOperator, Value};
use relq::translation::TranslationOptions;
use relq::{Dialect, PagingStrategy, TranslationError};

fn ordered_page() -> QueryModel {
    cooks()
        .with_order_by(cook("ID"), OrderingDirection::Asc)
        .with_select(cook("FirstName"))
        .with_result_operator(ResultOperator::Skip(Expr::constant(10)))
        .with_result_operator(ResultOperator::Take(Expr::constant(5)))
}

fn first_names() -> QueryModel {
    cooks().with_select(cook("FirstName"))
}

#[test]
fn test_tsql_offset_fetch() {
    let command = tsql(&ordered_page());
    assert_eq!(
        command.text,
        "SELECT [t0].[FirstName] FROM [CookTable] [t0] ORDER BY [t0].[ID] ASC \
         OFFSET @1 ROWS FETCH NEXT @2 ROWS ONLY"
    );
    assert_eq!(
        command.parameter_pairs(),
        vec![("@1", &Value::Int(10)), ("@2", &Value::Int(5))]
    );
}

#[test]
fn test_postgres_limit_offset() {
    let command = postgres(&ordered_page());
    assert!(command.text.ends_with(r#"ORDER BY "t0"."ID" ASC LIMIT $1 OFFSET $2"#));
    assert_eq!(
        command.parameter_pairs(),
        vec![("$1", &Value::Int(5)), ("$2", &Value::Int(10))]
    );
}

#[test]
fn test_mysql_skip_without_take() {
    let query = cooks()
        .with_order_by(cook("ID"), OrderingDirection::Asc)
        .with_select(cook("FirstName"))
        .with_result_operator(ResultOperator::Skip(Expr::constant(10)));
    let command = translate_for(&query, Dialect::MySql).unwrap();
    assert!(command.text.ends_with("LIMIT 18446744073709551615 OFFSET ?"));
    assert_parses(&command);
}

#[test]
fn test_tsql_take_uses_top() {
    let query = first_names().with_result_operator(ResultOperator::Take(Expr::constant(3)));
    let command = tsql(&query);
    assert_eq!(
        command.text,
        "SELECT TOP (@1) [t0].[FirstName] FROM [CookTable] [t0]"
    );
    assert_eq!(command.parameters[0].value, Value::Int(3));
}

#[test]
fn test_first_and_single() {
    let first = first_names().with_result_operator(ResultOperator::First { or_default: false });
    assert_eq!(
        tsql(&first).text,
        "SELECT TOP (1) [t0].[FirstName] FROM [CookTable] [t0]"
    );

    let single = first_names().with_result_operator(ResultOperator::Single { or_default: true });
    assert_eq!(
        postgres(&single).text,
        r#"SELECT "t0"."FirstName" FROM "CookTable" "t0" LIMIT 2"#
    );
}

#[test]
fn test_skip_requires_ordering() {
    let query = first_names().with_result_operator(ResultOperator::Skip(Expr::constant(10)));
    let err = translate_for(&query, Dialect::Postgres).unwrap_err();
    assert!(matches!(err, TranslationError::InvalidQuery { .. }));
}

/// First names ordered by key, limited to the first ten rows.
fn first_ten() -> QueryModel {
    cooks()
        .with_order_by(cook("ID"), OrderingDirection::Asc)
        .with_select(cook("FirstName"))
        .with_result_operator(ResultOperator::Take(Expr::constant(10)))
}

#[test]
fn test_take_then_take_keeps_order() {
    let query = first_ten().with_result_operator(ResultOperator::Take(Expr::constant(5)));

    let command = tsql(&query);
    insta::assert_snapshot!(command.text, @"SELECT TOP (@1) [q0].[FirstName] FROM (SELECT TOP (@2) [t0].[FirstName], [t0].[ID] FROM [CookTable] [t0] ORDER BY [t0].[ID] ASC) [q0] ORDER BY [q0].[ID] ASC");
    assert_eq!(
        command.parameter_pairs(),
        vec![("@1", &Value::Int(5)), ("@2", &Value::Int(10))]
    );

    let command = postgres(&query);
    insta::assert_snapshot!(command.text, @r#"SELECT "q0"."FirstName" FROM (SELECT "t0"."FirstName", "t0"."ID" FROM "CookTable" "t0" ORDER BY "t0"."ID" ASC LIMIT $1) "q0" ORDER BY "q0"."ID" ASC LIMIT $2"#);
    assert_eq!(
        command.parameter_pairs(),
        vec![("$1", &Value::Int(10)), ("$2", &Value::Int(5))]
    );
}

#[test]
fn test_take_then_first_keeps_order() {
    let query = first_ten().with_result_operator(ResultOperator::First { or_default: false });

    insta::assert_snapshot!(tsql(&query).text, @"SELECT TOP (1) [q0].[FirstName] FROM (SELECT TOP (@1) [t0].[FirstName], [t0].[ID] FROM [CookTable] [t0] ORDER BY [t0].[ID] ASC) [q0] ORDER BY [q0].[ID] ASC");
    insta::assert_snapshot!(postgres(&query).text, @r#"SELECT "q0"."FirstName" FROM (SELECT "t0"."FirstName", "t0"."ID" FROM "CookTable" "t0" ORDER BY "t0"."ID" ASC LIMIT $1) "q0" ORDER BY "q0"."ID" ASC LIMIT 1"#);
}

#[test]
fn test_take_then_skip_keeps_order() {
    let query = first_ten().with_result_operator(ResultOperator::Skip(Expr::constant(5)));

    let command = tsql(&query);
    insta::assert_snapshot!(command.text, @"SELECT [q0].[FirstName] FROM (SELECT TOP (@1) [t0].[FirstName], [t0].[ID] FROM [CookTable] [t0] ORDER BY [t0].[ID] ASC) [q0] ORDER BY [q0].[ID] ASC OFFSET @2 ROWS");
    assert_eq!(
        command.parameter_pairs(),
        vec![("@1", &Value::Int(10)), ("@2", &Value::Int(5))]
    );

    let command = postgres(&query);
    insta::assert_snapshot!(command.text, @r#"SELECT "q0"."FirstName" FROM (SELECT "t0"."FirstName", "t0"."ID" FROM "CookTable" "t0" ORDER BY "t0"."ID" ASC LIMIT $1) "q0" ORDER BY "q0"."ID" ASC OFFSET $2"#);
}

#[test]
fn test_descending_order_survives_nesting() {
    let query = cooks()
        .with_order_by(cook("Salary"), OrderingDirection::Desc)
        .with_select(cook("FirstName"))
        .with_result_operator(ResultOperator::Take(Expr::constant(10)))
        .with_result_operator(ResultOperator::Take(Expr::constant(5)));
    let text = tsql(&query).text;
    assert!(text.contains("[t0].[FirstName], [t0].[Salary] FROM"));
    assert!(text.ends_with("[q0] ORDER BY [q0].[Salary] DESC"));
}

#[test]
fn test_paged_subquery_source_keeps_order() {
    let page = cooks()
        .with_order_by(cook("ID"), OrderingDirection::Asc)
        .with_result_operator(ResultOperator::Take(Expr::constant(3)));
    let query = QueryModel::new(
        FromClause::new("x", "Cook", Expr::subquery(page)),
        Expr::source("x").member("FirstName"),
    );
    let text = tsql(&query).text;
    assert!(text.starts_with("SELECT [q0].[FirstName] FROM (SELECT TOP (@1) [t0].[ID], "));
    assert!(text.contains(", [t0].[ID] AS [c0] FROM [CookTable] [t0] ORDER BY [t0].[ID] ASC)"));
    assert!(text.ends_with("[q0] ORDER BY [q0].[c0] ASC"));
}

#[test]
fn test_unordered_take_then_take_stays_unordered() {
    let query = first_names()
        .with_result_operator(ResultOperator::Take(Expr::constant(10)))
        .with_result_operator(ResultOperator::Take(Expr::constant(5)));
    assert!(!tsql(&query).text.contains("ORDER BY"));
}

#[test]
fn test_offset_fetch_override_on_postgres() {
    let query = first_names().with_result_operator(ResultOperator::Take(Expr::constant(5)));
    let options = TranslationOptions::new(Dialect::Postgres).with_paging(PagingStrategy::OffsetFetch);
    let command = translate_with(&query, options).unwrap();
    assert!(command.text.ends_with("FETCH FIRST $1 ROWS ONLY"));
    assert_parses(&command);
}

#[test]
fn test_distinct_then_take() {
    let query = first_names()
        .with_result_operator(ResultOperator::Distinct)
        .with_result_operator(ResultOperator::Take(Expr::constant(5)));
    assert!(tsql(&query).text.starts_with("SELECT DISTINCT TOP (@1) "));
}

#[test]
fn test_count_after_take_wraps_statement() {
    let query = first_names()
        .with_result_operator(ResultOperator::Take(Expr::constant(5)))
        .with_result_operator(ResultOperator::Count);
    assert_eq!(
        tsql(&query).text,
        "SELECT COUNT(*) FROM (SELECT TOP (@1) [t0].[FirstName] FROM [CookTable] [t0]) [q0]"
    );
}
