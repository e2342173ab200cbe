//! Preparation and resolution as separate stages.

#[path = "../common/mod.rs"]
mod common;

use std::collections::HashSet;
use std::sync::LazyLock;

use common::*;
use pretty_assertions::assert_eq;
use regex::Regex;
use relq::metadata::{Catalog, EntityMapping, StaticMappingResolver};
use relq::query::{BodyClause, Expr, FromClause, QueryModel, ResultOperator};
use relq::translation::{prepare, resolve, SqlQueryTranslator, UniqueIdentifierGenerator};

/// `[SomeTable] [tN]`: a table declared in a FROM or JOIN.
static TABLE_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\w+Table\] \[(t\d+)\]").unwrap());

#[test]
fn test_resolving_twice_changes_nothing() {
    let query = cooks()
        .with_where(cook("Kitchen").member("Name").eq(Expr::constant("Main")))
        .with_select(cook("FirstName"));
    let mut ids = UniqueIdentifierGenerator::new();
    let resolver = resolver();

    let prepared = prepare(&query, &mut ids).unwrap();
    let resolved = resolve(prepared, &resolver, &mut ids).unwrap();
    let again = resolve(resolved.clone(), &resolver, &mut ids).unwrap();
    assert_eq!(again, resolved);
}

#[test]
fn test_table_aliases_are_unique() {
    let nested = QueryModel::from_table("k", "Kitchen")
        .with_where(Expr::source("k").member("ID").eq(cook("KitchenID")))
        .with_select(Expr::source("k").member("Restaurant").member("Name"))
        .with_result_operator(ResultOperator::First { or_default: true });
    let query = cooks()
        .with_clause(BodyClause::AdditionalFrom(FromClause::table(
            "r",
            "Restaurant",
        )))
        .with_where(cook("RestaurantID").eq(Expr::source("r").member("ID")))
        .with_select(Expr::new_object([
            ("Cook", cook("FirstName")),
            ("Kitchen", cook("Kitchen").member("Name")),
            ("Restaurant", Expr::subquery(nested)),
        ]));
    let text = tsql(&query).text;

    let declared: Vec<&str> = TABLE_ALIAS
        .captures_iter(&text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let unique: HashSet<&str> = declared.iter().copied().collect();
    assert_eq!(declared.len(), 5, "aliases: {:?} in {}", declared, text);
    assert_eq!(unique.len(), declared.len());
}

#[test]
fn test_schema_qualifies_table() {
    let catalog = Catalog::new().with_entity(
        "Cook",
        EntityMapping::new("CookTable")
            .with_schema("dbo")
            .key("ID")
            .column("FirstName"),
    );
    let translator = SqlQueryTranslator::new(StaticMappingResolver::new(catalog));
    let command = translator
        .translate(&cooks().with_select(cook("FirstName")))
        .unwrap();
    assert_eq!(
        command.text,
        "SELECT [t0].[FirstName] FROM [dbo].[CookTable] [t0]"
    );
}

#[test]
fn test_renamed_column_keeps_member_name_out_of_sql() {
    let catalog = Catalog::new().with_entity(
        "Cook",
        EntityMapping::new("CookTable")
            .key("ID")
            .column_as("Surname", "LastName"),
    );
    let translator = SqlQueryTranslator::new(StaticMappingResolver::new(catalog));
    let command = translator
        .translate(&cooks().with_where(cook("Surname").eq(Expr::constant("Smith"))))
        .unwrap();
    assert_eq!(
        command.text,
        "SELECT [t0].[ID], [t0].[LastName] FROM [CookTable] [t0] WHERE [t0].[LastName] = @1"
    );
}

#[test]
fn test_translations_do_not_share_aliases() {
    let translator = SqlQueryTranslator::new(resolver());
    let query = cooks().with_select(cook("Kitchen").member("Name"));
    let first = translator.translate(&query).unwrap();
    let second = translator.translate(&query).unwrap();
    assert_eq!(first.text, second.text);
    assert!(first.text.contains("[t1]"));
    assert!(!first.text.contains("[t2]"));
}
