//! Unique identifiers for one translation session.

use std::collections::HashMap;

use crate::model::{EntityId, TableId};

/// Issues table aliases, column aliases and node identities.
///
/// Every prefix has its own monotonically increasing counter. Identifiers
/// are never reused within a session, even when the node they were issued
/// for is later discarded by a rewrite.
#[derive(Debug, Default)]
pub struct UniqueIdentifierGenerator {
    counters: HashMap<String, usize>,
    next_table: usize,
    next_entity: usize,
}

impl UniqueIdentifierGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next identifier for `prefix`: `prefix0`, `prefix1`, ...
    pub fn next_identifier(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        let identifier = format!("{}{}", prefix, counter);
        *counter += 1;
        tracing::trace!(%identifier, "issued identifier");
        identifier
    }

    /// Alias for a physical table: `t0`, `t1`, ...
    pub fn next_table_alias(&mut self) -> String {
        self.next_identifier("t")
    }

    /// Alias for a nested statement used as a source: `q0`, `q1`, ...
    pub fn next_subquery_alias(&mut self) -> String {
        self.next_identifier("q")
    }

    /// Alias for a projected column: `c0`, `c1`, ...
    pub fn next_column_alias(&mut self) -> String {
        self.next_identifier("c")
    }

    /// Name for an aggregate computed inside a grouping: `a0`, `a1`, ...
    pub fn next_aggregate_name(&mut self) -> String {
        self.next_identifier("a")
    }

    pub fn next_table_id(&mut self) -> TableId {
        let id = TableId(self.next_table);
        self.next_table += 1;
        id
    }

    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        id
    }
}
