//! GroupBy with aggregates over the groups.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use pretty_assertions::assert_eq;
use relq::query::{Expr, FromClause, Lambda, QueryModel, ResultOperator};
use relq::TranslationError;

fn by_kitchen() -> QueryModel {
    cooks().with_result_operator(ResultOperator::GroupBy {
        key: Lambda::new("c", cook("KitchenID")),
        element: None,
    })
}

/// `from x in g [where filter] select selector` followed by `op`.
fn over_group(filter: Option<Expr>, selector: Expr, op: ResultOperator) -> Expr {
    let mut model = QueryModel::new(FromClause::new("x", "Cook", Expr::source("g")), selector);
    if let Some(filter) = filter {
        model = model.with_where(filter);
    }
    Expr::subquery(model.with_result_operator(op))
}

fn groups(select: Expr) -> QueryModel {
    QueryModel::new(
        FromClause::new("g", "Grouping", Expr::subquery(by_kitchen())),
        select,
    )
}

#[test]
fn test_group_count() {
    let query = groups(Expr::new_object([
        ("Key", Expr::source("g").member("Key")),
        (
            "Count",
            over_group(None, Expr::source("x"), ResultOperator::Count),
        ),
    ]));
    assert_eq!(
        tsql(&query).text,
        "SELECT [q0].[Key], [q0].[a0] FROM (SELECT [t0].[KitchenID] AS [Key], COUNT(*) AS [a0] \
         FROM [CookTable] [t0] GROUP BY [t0].[KitchenID]) [q0]"
    );
}

#[test]
fn test_group_sum() {
    let query = groups(Expr::new_object([
        ("Key", Expr::source("g").member("Key")),
        (
            "Total",
            over_group(None, Expr::source("x").member("Salary"), ResultOperator::Sum),
        ),
    ]));
    let command = tsql(&query);
    assert!(command.text.contains("SUM([t0].[Salary]) AS [a0]"));
    assert!(command.text.contains("GROUP BY [t0].[KitchenID]"));
}

#[test]
fn test_filtered_group_count() {
    let query = groups(Expr::new_object([
        ("Key", Expr::source("g").member("Key")),
        (
            "Starred",
            over_group(
                Some(Expr::source("x").member("IsStarred")),
                Expr::source("x"),
                ResultOperator::Count,
            ),
        ),
    ]));
    let command = tsql(&query);
    assert!(command
        .text
        .contains("COUNT(CASE WHEN [t0].[IsStarred] = 1 THEN 1 END) AS [a0]"));
}

#[test]
fn test_grouping_as_projection_is_unsupported() {
    let err = translate_for(&by_kitchen(), relq::Dialect::TSql).unwrap_err();
    assert!(matches!(err, TranslationError::UnsupportedConstruct { .. }));
}

#[test]
fn test_composite_key() {
    let grouped = cooks().with_result_operator(ResultOperator::GroupBy {
        key: Lambda::new(
            "c",
            Expr::new_object([
                ("KitchenID", cook("KitchenID")),
                ("RestaurantID", cook("RestaurantID")),
            ]),
        ),
        element: None,
    });
    let query = QueryModel::new(
        FromClause::new("g", "Grouping", Expr::subquery(grouped)),
        Expr::new_object([
            ("Kitchen", Expr::source("g").member("Key").member("KitchenID")),
            (
                "Count",
                over_group(None, Expr::source("x"), ResultOperator::Count),
            ),
        ]),
    );
    let command = tsql(&query);
    assert!(command
        .text
        .contains("GROUP BY [t0].[KitchenID], [t0].[RestaurantID]"));
    assert_parses(&translate_for(&query, relq::Dialect::Postgres).unwrap());
}

#[test]
fn test_count_of_groups() {
    let query = by_kitchen().with_result_operator(ResultOperator::Count);
    assert_eq!(
        tsql(&query).text,
        "SELECT COUNT(*) FROM (SELECT [t0].[KitchenID] AS [Key] FROM [CookTable] [t0] \
         GROUP BY [t0].[KitchenID]) [q0]"
    );
}
