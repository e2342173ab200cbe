//! Aggregates, quantifiers, set operations and unsupported operators.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use pretty_assertions::assert_eq;
use relq::query::{Expr, Lambda, QueryModel, ResultOperator};
use relq::{Dialect, TranslationError};

#[test]
fn test_count() {
    let query = cooks().with_result_operator(ResultOperator::Count);
    insta::assert_snapshot!(tsql(&query).text, @"SELECT COUNT(*) FROM [CookTable] [t0]");
}

#[test]
fn test_sum_of_member() {
    let query = cooks()
        .with_select(cook("Salary"))
        .with_result_operator(ResultOperator::Sum);
    insta::assert_snapshot!(tsql(&query).text, @"SELECT SUM([t0].[Salary]) FROM [CookTable] [t0]");
}

#[test]
fn test_any_becomes_exists() {
    let query = cooks()
        .with_where(cook("IsStarred"))
        .with_result_operator(ResultOperator::Any);
    let command = tsql(&query);
    assert!(command.text.starts_with("SELECT CASE WHEN EXISTS(SELECT "));
    assert!(command.text.ends_with(") THEN 1 ELSE 0 END"));
    assert_parses(&translate_for(&query, Dialect::Postgres).unwrap());
}

#[test]
fn test_all_tests_predicate_through_case() {
    let query = cooks().with_result_operator(ResultOperator::All(Lambda::new(
        "x",
        Expr::source("x").member("Salary").gt(Expr::constant(1000)),
    )));
    let command = tsql(&query);
    assert!(command.text.contains("NOT (EXISTS("));
    assert!(command
        .text
        .contains("WHERE CASE WHEN [t0].[Salary] > @1 THEN 1 ELSE 0 END = 0"));
}

#[test]
fn test_all_counts_null_as_not_matching() {
    // A cook with a NULL salary makes All false.
    let query = cooks().with_result_operator(ResultOperator::All(Lambda::new(
        "x",
        Expr::source("x").member("Salary").gt(Expr::constant(1000)),
    )));
    let command = postgres(&query);
    assert!(command.text.contains("NOT (EXISTS(SELECT "));
    assert!(command.text.contains(
        r#"FROM "CookTable" "t0" WHERE CASE WHEN "t0"."Salary" > $1 THEN 1 ELSE 0 END = 0)"#
    ));
    assert!(!command.text.contains(r#"NOT ("t0"."Salary""#));
}

#[test]
fn test_distinct_count_wraps_statement() {
    let query = cooks()
        .with_select(cook("FirstName"))
        .with_result_operator(ResultOperator::Distinct)
        .with_result_operator(ResultOperator::Count);
    let command = tsql(&query);
    assert!(command.text.starts_with("SELECT COUNT(*) FROM (SELECT DISTINCT "));
    assert!(command.text.ends_with(") [q0]"));
}

#[test]
fn test_concat_is_union_all() {
    let kitchen_names = kitchens().with_select(Expr::source("k").member("Name"));
    let query = cooks()
        .with_select(cook("Name"))
        .with_result_operator(ResultOperator::Concat(Expr::subquery(kitchen_names)));
    let command = tsql(&query);
    assert_eq!(
        command.text,
        "SELECT [t0].[Name] FROM [CookTable] [t0] UNION ALL SELECT [t1].[Name] FROM [KitchenTable] [t1]"
    );
    assert_parses(&translate_for(&query, Dialect::MySql).unwrap());
}

#[test]
fn test_contains_over_subquery() {
    let query = cooks()
        .with_select(cook("ID"))
        .with_result_operator(ResultOperator::Contains(Expr::constant(7)));
    assert_eq!(
        tsql(&query).text,
        "SELECT CASE WHEN EXISTS(SELECT [t0].[ID] FROM [CookTable] [t0] WHERE [t0].[ID] = @1) \
         THEN 1 ELSE 0 END"
    );
}

#[test]
fn test_scalar_subquery_in_projection() {
    let kitchen_name = QueryModel::from_table("k", "Kitchen")
        .with_where(Expr::source("k").member("ID").eq(cook("KitchenID")))
        .with_select(Expr::source("k").member("Name"))
        .with_result_operator(ResultOperator::First { or_default: true });
    let query = cooks().with_select(Expr::subquery(kitchen_name));
    assert_eq!(
        tsql(&query).text,
        "SELECT (SELECT TOP (1) [t1].[Name] FROM [KitchenTable] [t1] \
         WHERE [t1].[ID] = [t0].[KitchenID]) FROM [CookTable] [t0]"
    );
}

#[test]
fn test_unsupported_operators_name_themselves() {
    for (op, name) in [
        (ResultOperator::Reverse, "Reverse"),
        (ResultOperator::Last { or_default: false }, "Last"),
        (ResultOperator::DefaultIfEmpty, "DefaultIfEmpty"),
    ] {
        let query = cooks().with_result_operator(op);
        let err = translate_for(&query, Dialect::TSql).unwrap_err();
        assert!(
            matches!(err, TranslationError::UnsupportedConstruct { .. }),
            "{} should be unsupported",
            name
        );
        assert!(err.to_string().contains(name));
    }
}
