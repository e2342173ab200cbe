//! State shared across one resolution pass.

use std::collections::HashMap;

use crate::error::{TranslationError, TranslationResult};
use crate::metadata::{MemberMapping, TableMapping};
use crate::model::{EntityId, SqlExpr, SqlTable, TableId};

/// Bookkeeping for one resolution pass.
///
/// Tracks what each table source projects, which table every entity belongs
/// to, the joins created for relation navigation, and the answers the
/// mapping resolver has given so far.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    table_projections: HashMap<TableId, SqlExpr>,
    /// Ordering keys a paged sub-statement exposes to its outer statement.
    ordering_keys: HashMap<TableId, Vec<SqlExpr>>,
    entity_tables: HashMap<EntityId, TableId>,
    /// `(owner table, relation member)` to the join table created for it.
    joins: HashMap<(TableId, String), TableId>,
    /// Joins created during expression resolution, attached to their owner
    /// when the statement containing it finishes.
    pending_joins: HashMap<TableId, Vec<SqlTable>>,
    table_mappings: HashMap<String, TableMapping>,
    member_mappings: HashMap<(String, String), MemberMapping>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record what references to `table` resolve to.
    pub fn register_table(&mut self, table: TableId, projection: SqlExpr) {
        self.register_entities(table, &projection);
        self.table_projections.insert(table, projection);
    }

    fn register_entities(&mut self, table: TableId, expr: &SqlExpr) {
        match expr {
            SqlExpr::Entity(entity) => {
                self.entity_tables.insert(entity.id, table);
            }
            SqlExpr::Compound(members) => {
                for member in members {
                    self.register_entities(table, &member.expr);
                }
            }
            SqlExpr::Grouping(grouping) => self.register_entities(table, &grouping.key),
            SqlExpr::Named(named) => self.register_entities(table, &named.expr),
            _ => {}
        }
    }

    pub fn table_projection(&self, table: TableId) -> Option<&SqlExpr> {
        self.table_projections.get(&table)
    }

    pub fn register_ordering_keys(&mut self, table: TableId, keys: Vec<SqlExpr>) {
        self.ordering_keys.insert(table, keys);
    }

    pub fn ordering_key(&self, table: TableId, index: usize) -> Option<&SqlExpr> {
        self.ordering_keys.get(&table)?.get(index)
    }

    pub fn table_of(&self, entity: EntityId) -> Option<TableId> {
        self.entity_tables.get(&entity).copied()
    }

    pub fn existing_join(&self, owner: TableId, member: &str) -> Option<TableId> {
        self.joins.get(&(owner, member.to_string())).copied()
    }

    pub fn add_join(&mut self, owner: TableId, member: &str, join: SqlTable) {
        self.joins.insert((owner, member.to_string()), join.id);
        self.pending_joins.entry(owner).or_default().push(join);
    }

    pub fn take_pending_joins(&mut self, owner: TableId) -> Vec<SqlTable> {
        self.pending_joins.remove(&owner).unwrap_or_default()
    }

    /// Fail if any join could not be attached to its owner.
    pub fn ensure_no_pending_joins(&self) -> TranslationResult<()> {
        match self.pending_joins.keys().next() {
            Some(owner) => Err(TranslationError::unresolved(format!(
                "join owned by table {:?} outside the statement",
                owner
            ))),
            None => Ok(()),
        }
    }

    /// Remember a table mapping, failing if it contradicts an earlier answer.
    pub fn check_table_mapping(
        &mut self,
        item_type: &str,
        mapping: &TableMapping,
    ) -> TranslationResult<()> {
        match self.table_mappings.get(item_type) {
            Some(known) if known != mapping => Err(TranslationError::contract_violation(format!(
                "table mapping for '{}' changed within one translation",
                item_type
            ))),
            Some(_) => Ok(()),
            None => {
                self.table_mappings
                    .insert(item_type.to_string(), mapping.clone());
                Ok(())
            }
        }
    }

    pub fn table_mapping(&self, item_type: &str) -> Option<&TableMapping> {
        self.table_mappings.get(item_type)
    }

    /// Remember a member mapping, failing if it contradicts an earlier answer.
    pub fn check_member_mapping(
        &mut self,
        entity_type: &str,
        member: &str,
        mapping: &MemberMapping,
    ) -> TranslationResult<()> {
        let key = (entity_type.to_string(), member.to_string());
        match self.member_mappings.get(&key) {
            Some(known) if known != mapping => Err(TranslationError::contract_violation(format!(
                "mapping for '{}.{}' changed within one translation",
                entity_type, member
            ))),
            Some(_) => Ok(()),
            None => {
                self.member_mappings.insert(key, mapping.clone());
                Ok(())
            }
        }
    }
}
