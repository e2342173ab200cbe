//! Loading and checking mapping catalogs.

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use relq::metadata::{
    Cardinality, Catalog, CatalogError, EntityMapping, MappingResolver, MemberMapping,
    StaticMappingResolver,
};
use relq::query::{Expr, QueryModel};
use relq::SqlQueryTranslator;

const KITCHEN_JSON: &str = r#"{
  "entities": {
    "Cook": {
      "table": "CookTable",
      "columns": [
        { "member": "ID", "primary_key": true },
        { "member": "FirstName" },
        { "member": "KitchenID" }
      ],
      "relations": {
        "Kitchen": {
          "target": "Kitchen",
          "owner_key": "KitchenID",
          "target_key": "ID",
          "cardinality": "one"
        }
      }
    },
    "Kitchen": {
      "table": "KitchenTable",
      "columns": [
        { "member": "ID", "primary_key": true },
        { "member": "Name" }
      ]
    }
  }
}"#;

const KITCHEN_TOML: &str = r#"
[entities.Cook]
table = "CookTable"
columns = [
    { member = "ID", primary_key = true },
    { member = "FirstName" },
    { member = "KitchenID" },
]

[entities.Cook.relations.Kitchen]
target = "Kitchen"
owner_key = "KitchenID"
target_key = "ID"
cardinality = "one"

[entities.Kitchen]
table = "KitchenTable"
columns = [
    { member = "ID", primary_key = true },
    { member = "Name" },
]
"#;

fn scratch_file(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("relq-catalog-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_json_and_toml_describe_the_same_catalog() {
    let json = StaticMappingResolver::from_json(KITCHEN_JSON).unwrap();
    let toml = StaticMappingResolver::from_toml(KITCHEN_TOML).unwrap();
    assert_eq!(json.catalog(), toml.catalog());
    assert!(json.catalog().validate().is_empty());
}

#[test]
fn test_loaded_catalog_translates() {
    let translator = SqlQueryTranslator::new(StaticMappingResolver::from_json(KITCHEN_JSON).unwrap());
    let query = QueryModel::from_table("c", "Cook")
        .with_select(Expr::source("c").member("Kitchen").member("Name"));
    let command = translator.translate(&query).unwrap();
    assert_eq!(
        command.text,
        "SELECT [t1].[Name] FROM [CookTable] [t0] \
         LEFT JOIN [KitchenTable] [t1] ON [t0].[KitchenID] = [t1].[ID]"
    );
}

#[test]
fn test_relation_lookup() {
    let resolver = StaticMappingResolver::from_toml(KITCHEN_TOML).unwrap();
    match resolver.resolve_member("Cook", "Kitchen") {
        Some(MemberMapping::Relation(relation)) => {
            assert_eq!(relation.target, "Kitchen");
            assert_eq!(relation.cardinality, Cardinality::One);
        }
        other => panic!("expected a relation, got {:?}", other),
    }
    assert!(resolver.resolve_member("Kitchen", "Cooks").is_none());
}

#[test]
fn test_from_file_picks_format_by_extension() {
    let json = scratch_file("kitchen.json", KITCHEN_JSON);
    let toml = scratch_file("kitchen.toml", KITCHEN_TOML);
    let from_json = StaticMappingResolver::from_file(&json).unwrap();
    let from_toml = StaticMappingResolver::from_file(&toml).unwrap();
    assert_eq!(from_json.catalog().entities.len(), 2);
    assert_eq!(from_json.catalog(), from_toml.catalog());
}

#[test]
fn test_from_file_errors() {
    let missing = StaticMappingResolver::from_file("/nonexistent/relq/catalog.json");
    assert!(matches!(missing, Err(CatalogError::FileNotFound(_))));

    let yaml = scratch_file("kitchen.yaml", "entities: {}");
    assert!(matches!(
        StaticMappingResolver::from_file(&yaml),
        Err(CatalogError::UnsupportedFormat(ext)) if ext == "yaml"
    ));

    let broken = scratch_file("broken.json", "{ \"entities\": ");
    assert!(matches!(
        StaticMappingResolver::from_file(&broken),
        Err(CatalogError::JsonError(_))
    ));
}

#[test]
fn test_validate_lists_every_problem() {
    let catalog = Catalog::new()
        .with_entity(
            "Cook",
            EntityMapping::new("CookTable")
                .column("FirstName")
                .relation("Chef", "Chef", "ChefID", "ID", Cardinality::One),
        )
        .with_entity("Kitchen", EntityMapping::new("KitchenTable").key("ID"));
    let problems = catalog.validate();

    assert!(problems.iter().any(|p| p.contains("no primary key")));
    assert!(problems.iter().any(|p| p.contains("unknown target entity 'Chef'")));
    assert!(problems.iter().any(|p| p.contains("ChefID")));
}
