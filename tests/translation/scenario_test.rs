//! End-to-end translation of filters, projections and joins.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use pretty_assertions::assert_eq;
use relq::query::{BodyClause, Expr, FromClause, JoinClause, MethodSignature, Value, ValueType};
use relq::Dialect;

#[test]
fn test_where_member_equals_constant() {
    let query = cooks()
        .with_where(cook("FirstName").eq(Expr::constant("John")))
        .with_select(cook("FirstName"));
    let command = tsql(&query);

    assert_eq!(
        command.text,
        "SELECT [t0].[FirstName] FROM [CookTable] [t0] WHERE [t0].[FirstName] = @1"
    );
    assert_eq!(command.parameter_pairs(), vec![("@1", &Value::from("John"))]);
    assert_eq!(command.parameters[0].ty, ValueType::String);
}

#[test]
fn test_select_entity_lists_mapped_columns() {
    let command = tsql(&cooks());
    assert_eq!(
        command.text,
        format!("SELECT {} FROM [CookTable] [t0]", cook_columns("t0"))
    );
    assert!(command.parameters.is_empty());
}

#[test]
fn test_boolean_member_as_predicate() {
    let query = cooks()
        .with_where(cook("IsStarred"))
        .with_select(cook("FirstName"));

    assert_eq!(
        tsql(&query).text,
        "SELECT [t0].[FirstName] FROM [CookTable] [t0] WHERE [t0].[IsStarred] = 1"
    );
    assert_eq!(
        postgres(&query).text,
        r#"SELECT "t0"."FirstName" FROM "CookTable" "t0" WHERE "t0"."IsStarred""#
    );
}

#[test]
fn test_null_comparison_uses_is_null() {
    let query = cooks()
        .with_where(cook("Name").eq(Expr::null()))
        .with_select(cook("FirstName"));
    let command = tsql(&query);
    assert_eq!(
        command.text,
        "SELECT [t0].[FirstName] FROM [CookTable] [t0] WHERE [t0].[Name] IS NULL"
    );
    assert!(command.parameters.is_empty());
}

#[test]
fn test_combined_predicates() {
    let query = cooks()
        .with_where(
            cook("FirstName")
                .eq(Expr::constant("John"))
                .or(cook("Salary").gt(Expr::constant(1000))),
        )
        .with_select(cook("FirstName"));
    let command = postgres(&query);
    assert!(command.text.contains(r#""t0"."FirstName" = $1"#));
    assert!(command.text.contains(" OR "));
    assert!(command.text.contains(r#""t0"."Salary" > $2"#));
    assert_eq!(command.parameters.len(), 2);
}

#[test]
fn test_constant_list_contains_becomes_in() {
    let list = Expr::constant(Value::List(vec![Value::Int(1), Value::Int(2)]));
    let contains = Expr::call_static(
        MethodSignature::new("Enumerable", "Contains"),
        vec![list, cook("ID")],
    );
    let query = cooks().with_where(contains).with_select(cook("FirstName"));
    let command = tsql(&query);

    assert_eq!(
        command.text,
        "SELECT [t0].[FirstName] FROM [CookTable] [t0] WHERE [t0].[ID] IN (@1, @2)"
    );
    assert_eq!(
        command.parameter_pairs(),
        vec![("@1", &Value::Int(1)), ("@2", &Value::Int(2))]
    );
}

#[test]
fn test_string_contains_escapes_wildcards() {
    let query = cooks()
        .with_where(cook("FirstName").call(
            string_method("Contains", &["String"]),
            vec![Expr::constant("50%")],
        ))
        .with_select(cook("FirstName"));
    let command = tsql(&query);

    assert_eq!(
        command.text,
        r"SELECT [t0].[FirstName] FROM [CookTable] [t0] WHERE [t0].[FirstName] LIKE @1 ESCAPE '\'"
    );
    assert_eq!(command.parameters[0].value, Value::from(r"%50\%%"));
}

#[test]
fn test_string_function_in_projection() {
    let query = cooks().with_select(
        cook("FirstName").call(string_method("ToUpper", &[]), vec![]),
    );
    assert_eq!(
        tsql(&query).text,
        "SELECT UPPER([t0].[FirstName]) FROM [CookTable] [t0]"
    );
}

#[test]
fn test_additional_from_is_cross_join() {
    let query = cooks()
        .with_clause(BodyClause::AdditionalFrom(FromClause::table("k", "Kitchen")))
        .with_where(cook("KitchenID").eq(Expr::source("k").member("ID")))
        .with_select(cook("FirstName"));
    assert_eq!(
        tsql(&query).text,
        "SELECT [t0].[FirstName] FROM [CookTable] [t0] CROSS JOIN [KitchenTable] [t1] \
         WHERE [t0].[KitchenID] = [t1].[ID]"
    );
}

#[test]
fn test_join_clause_is_inner_join() {
    let query = cooks()
        .with_clause(BodyClause::Join(JoinClause {
            item_name: "k".into(),
            item_type: "Kitchen".into(),
            inner_sequence: Expr::table("Kitchen"),
            outer_key: cook("KitchenID"),
            inner_key: Expr::source("k").member("ID"),
        }))
        .with_select(Expr::source("k").member("Name"));
    let command = tsql(&query);
    assert!(command
        .text
        .contains("INNER JOIN [KitchenTable] [t1] ON [t0].[KitchenID] = [t1].[ID]"));
    assert!(command.text.starts_with("SELECT [t1].[Name] FROM [CookTable] [t0]"));
}

#[test]
fn test_anonymous_projection_flattens_members() {
    let query = cooks().with_select(Expr::new_object([
        ("First", cook("FirstName")),
        ("Pay", cook("Salary")),
    ]));
    let command = postgres(&query);
    assert!(command.text.starts_with("SELECT "));
    assert!(command.text.contains(r#""t0"."FirstName""#));
    assert!(command.text.contains(r#""t0"."Salary""#));
}

#[test]
fn test_every_dialect_parses() {
    let query = cooks()
        .with_where(cook("Salary").gt(Expr::constant(100)).and(cook("IsStarred")))
        .with_select(cook("Kitchen").member("Name"));
    for dialect in [Dialect::Postgres, Dialect::DuckDb, Dialect::MySql] {
        let command = translate_for(&query, dialect).unwrap();
        assert_parses(&command);
        assert_eq!(command.dialect, dialect);
    }
}
