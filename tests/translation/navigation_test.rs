//! Relations between entities: joins introduced by member access.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use pretty_assertions::assert_eq;
use relq::query::{BodyClause, Expr, FromClause, QueryModel, ResultOperator, Value};
use relq::TranslationError;

#[test]
fn test_single_relation_adds_left_join() {
    let query = cooks().with_select(cook("Kitchen").member("Name"));
    assert_eq!(
        tsql(&query).text,
        "SELECT [t1].[Name] FROM [CookTable] [t0] \
         LEFT JOIN [KitchenTable] [t1] ON [t0].[KitchenID] = [t1].[ID]"
    );
}

#[test]
fn test_relation_chain_joins_in_order() {
    let query = cooks().with_select(cook("Kitchen").member("Restaurant").member("Name"));
    assert_eq!(
        tsql(&query).text,
        "SELECT [t2].[Name] FROM [CookTable] [t0] \
         LEFT JOIN [KitchenTable] [t1] ON [t0].[KitchenID] = [t1].[ID] \
         LEFT JOIN [RestaurantTable] [t2] ON [t1].[RestaurantID] = [t2].[ID]"
    );
}

#[test]
fn test_relation_used_twice_joins_once() {
    let query = cooks()
        .with_where(cook("Kitchen").member("Name").ne(Expr::null()))
        .with_select(Expr::new_object([
            ("Name", cook("Kitchen").member("Name")),
            ("RestaurantID", cook("Kitchen").member("RestaurantID")),
        ]));
    let command = tsql(&query);
    assert_eq!(command.text.matches("LEFT JOIN").count(), 1);
    assert!(command.text.ends_with("WHERE [t1].[Name] IS NOT NULL"));
}

#[test]
fn test_relation_compared_with_null_checks_key() {
    let query = cooks()
        .with_where(cook("Kitchen").ne(Expr::null()))
        .with_select(cook("FirstName"));
    let command = tsql(&query);
    assert!(command.text.ends_with("WHERE [t1].[ID] IS NOT NULL"));
    assert!(command.parameters.is_empty());
}

#[test]
fn test_entity_constant_compares_keys() {
    let five = Value::Entity {
        item_type: "Cook".into(),
        key: Box::new(Value::Int(5)),
    };
    let query = cooks()
        .with_where(Expr::source("c").eq(Expr::constant(five)))
        .with_select(cook("FirstName"));
    let command = tsql(&query);
    assert_eq!(
        command.text,
        "SELECT [t0].[FirstName] FROM [CookTable] [t0] WHERE [t0].[ID] = @1"
    );
    assert_eq!(command.parameters[0].value, Value::Int(5));
}

#[test]
fn test_collection_contains_becomes_exists() {
    let colleagues = QueryModel::new(
        FromClause::new("x", "Cook", cook("Restaurant").member("Cooks")),
        Expr::source("x"),
    )
    .with_result_operator(ResultOperator::Contains(Expr::source("c")));
    let query = cooks()
        .with_where(Expr::subquery(colleagues))
        .with_select(cook("FirstName"));
    let command = tsql(&query);

    assert!(command.text.contains("WHERE EXISTS(SELECT"));
    assert_eq!(command.text.matches("LEFT JOIN").count(), 1);
    assert!(command.text.contains("LEFT JOIN [RestaurantTable] [t1]"));
    assert!(command
        .text
        .contains("([t2].[RestaurantID] = [t1].[ID]) AND ([t2].[ID] = [t0].[ID])"));
    assert_parses(&translate_for(&query, relq::Dialect::Postgres).unwrap());
}

#[test]
fn test_collection_as_additional_source() {
    let query = kitchens()
        .with_clause(BodyClause::AdditionalFrom(FromClause::new(
            "c",
            "Cook",
            Expr::source("k").member("Cooks"),
        )))
        .with_select(cook("FirstName"));
    assert_eq!(
        tsql(&query).text,
        "SELECT [t1].[FirstName] FROM [KitchenTable] [t0] CROSS JOIN [CookTable] [t1] \
         WHERE [t1].[KitchenID] = [t0].[ID]"
    );
}

#[test]
fn test_collection_used_as_value_is_unsupported() {
    let query = kitchens().with_select(Expr::source("k").member("Cooks"));
    let err = translate_for(&query, relq::Dialect::TSql).unwrap_err();
    assert!(matches!(err, TranslationError::UnsupportedConstruct { .. }));
}
