//! Mapping metadata.
//!
//! The translator learns how entity types map onto tables through the
//! [`MappingResolver`] trait. [`StaticMappingResolver`] is an in-memory
//! implementation loaded from a JSON or TOML [`Catalog`].

mod catalog;
mod resolver;

pub use catalog::{Catalog, CatalogError, EntityMapping, MemberColumn, StaticMappingResolver};
pub use resolver::{
    Cardinality, ColumnMapping, MappingResolver, MemberMapping, RelationMapping, TableMapping,
};
