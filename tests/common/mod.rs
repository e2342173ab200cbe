//! Shared fixtures for integration tests: the kitchen catalog and helpers
//! to translate against it.

#![allow(dead_code)]

use relq::metadata::{Cardinality, Catalog, EntityMapping, StaticMappingResolver};
use relq::query::{Expr, MethodSignature, QueryModel};
use relq::sql::{Dialect, SqlCommand};
use relq::translation::{translate, MethodCallTransformerRegistry, TranslationOptions};
use relq::TranslationResult;
use sqlparser::dialect::{DuckDbDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

/// Cooks work in kitchens, kitchens belong to restaurants.
pub fn catalog() -> Catalog {
    Catalog::new()
        .with_entity(
            "Cook",
            EntityMapping::new("CookTable")
                .key("ID")
                .column("FirstName")
                .column("Name")
                .column("IsStarred")
                .column("Salary")
                .column("KitchenID")
                .column("RestaurantID")
                .relation("Kitchen", "Kitchen", "KitchenID", "ID", Cardinality::One)
                .relation("Restaurant", "Restaurant", "RestaurantID", "ID", Cardinality::One),
        )
        .with_entity(
            "Kitchen",
            EntityMapping::new("KitchenTable")
                .key("ID")
                .column("Name")
                .column("RestaurantID")
                .relation("Cooks", "Cook", "ID", "KitchenID", Cardinality::Many)
                .relation("Restaurant", "Restaurant", "RestaurantID", "ID", Cardinality::One),
        )
        .with_entity(
            "Restaurant",
            EntityMapping::new("RestaurantTable")
                .key("ID")
                .column("Name")
                .relation("Cooks", "Cook", "ID", "RestaurantID", Cardinality::Many)
                .relation("Kitchens", "Kitchen", "ID", "RestaurantID", Cardinality::Many),
        )
}

pub fn resolver() -> StaticMappingResolver {
    StaticMappingResolver::new(catalog())
}

/// All columns of the cook table as projected from `alias`, T-SQL quoting.
pub fn cook_columns(alias: &str) -> String {
    [
        "ID",
        "FirstName",
        "Name",
        "IsStarred",
        "Salary",
        "KitchenID",
        "RestaurantID",
    ]
    .iter()
    .map(|c| format!("[{}].[{}]", alias, c))
    .collect::<Vec<_>>()
    .join(", ")
}

pub fn cooks() -> QueryModel {
    QueryModel::from_table("c", "Cook")
}

pub fn kitchens() -> QueryModel {
    QueryModel::from_table("k", "Kitchen")
}

/// `c.<member>`
pub fn cook(member: &str) -> Expr {
    Expr::source("c").member(member)
}

pub fn string_method(name: &str, parameters: &[&str]) -> MethodSignature {
    MethodSignature::new("String", name).with_parameters(parameters.iter().copied())
}

pub fn translate_with(query: &QueryModel, options: TranslationOptions) -> TranslationResult<SqlCommand> {
    translate(
        query,
        &resolver(),
        &MethodCallTransformerRegistry::with_defaults(),
        &options,
    )
}

pub fn translate_for(query: &QueryModel, dialect: Dialect) -> TranslationResult<SqlCommand> {
    translate_with(query, TranslationOptions::new(dialect))
}

/// Translate for T-SQL, panicking on errors.
pub fn tsql(query: &QueryModel) -> SqlCommand {
    translate_for(query, Dialect::TSql).unwrap()
}

/// Translate for PostgreSQL and check the text parses.
pub fn postgres(query: &QueryModel) -> SqlCommand {
    let command = translate_for(query, Dialect::Postgres).unwrap();
    assert_parses(&command);
    command
}

/// Assert that the command text is valid SQL for its dialect.
pub fn assert_parses(command: &SqlCommand) {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match command.dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::TSql => Box::new(MsSqlDialect {}),
    };
    if let Err(e) = Parser::parse_sql(&*parser_dialect, &command.text) {
        panic!("invalid SQL for {}: {}\n{}", command.dialect, e, command.text);
    }
}
