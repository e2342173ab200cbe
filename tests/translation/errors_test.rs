//! Error reporting for queries that cannot be translated.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use relq::metadata::{
    Cardinality, ColumnMapping, MappingResolver, MemberMapping, RelationMapping, TableMapping,
};
use relq::query::{Expr, QueryModel};
use relq::translation::{translate, MethodCallTransformerRegistry, TranslationOptions};
use relq::{Dialect, TranslationError};

#[test]
fn test_unmapped_member() {
    let query = cooks().with_select(cook("Shoe"));
    let err = translate_for(&query, Dialect::TSql).unwrap_err();
    match err {
        TranslationError::UnmappedItem {
            member,
            declaring_type,
        } => {
            assert_eq!(member, "Shoe");
            assert_eq!(declaring_type, "Cook");
        }
        other => panic!("expected an unmapped member, got {:?}", other),
    }
}

#[test]
fn test_unmapped_table() {
    let query = QueryModel::from_table("w", "Waiter");
    let err = translate_for(&query, Dialect::TSql).unwrap_err();
    assert!(matches!(
        err,
        TranslationError::UnmappedItem { ref declaring_type, .. } if declaring_type == "Waiter"
    ));
}

#[test]
fn test_unknown_query_source() {
    let query = cooks().with_select(Expr::source("nobody"));
    let err = translate_for(&query, Dialect::TSql).unwrap_err();
    assert!(matches!(err, TranslationError::InvalidQuery { .. }));
    assert!(err.to_string().contains("nobody"));
}

/// Claims a relation whose owner key the table does not have.
struct BrokenResolver;

impl MappingResolver for BrokenResolver {
    fn resolve_table(&self, item_type: &str) -> Option<TableMapping> {
        Some(TableMapping {
            table_name: format!("{}Table", item_type),
            schema: None,
            columns: vec![ColumnMapping {
                column: "ID".into(),
                is_primary_key: true,
            }],
        })
    }

    fn resolve_member(&self, _entity_type: &str, member: &str) -> Option<MemberMapping> {
        match member {
            "ID" => Some(MemberMapping::Column { column: "ID".into() }),
            "Kitchen" => Some(MemberMapping::Relation(RelationMapping {
                target: "Kitchen".into(),
                owner_key: "KitchenID".into(),
                target_key: "ID".into(),
                cardinality: Cardinality::One,
            })),
            _ => None,
        }
    }
}

#[test]
fn test_inconsistent_resolver_is_a_contract_violation() {
    let query = cooks().with_select(cook("Kitchen").member("ID"));
    let err = translate(
        &query,
        &BrokenResolver,
        &MethodCallTransformerRegistry::with_defaults(),
        &TranslationOptions::new(Dialect::TSql),
    )
    .unwrap_err();
    assert!(matches!(err, TranslationError::ResolverContractViolation { .. }));
}

#[test]
fn test_errors_carry_statement_context() {
    let query = cooks()
        .with_where(cook("FirstName").eq(Expr::constant("John")))
        .with_select(cook("Shoe"));
    let err = translate_for(&query, Dialect::TSql).unwrap_err();
    assert!(err.to_string().contains("Shoe"));
}
