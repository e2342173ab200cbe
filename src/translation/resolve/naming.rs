//! Output names for the projection of a nested statement.
//!
//! A statement used as a table source exposes its projection under unique
//! column names. Naming produces two expressions: the inner projection with
//! explicit output names, and the outer projection that references those
//! names through the sub-statement alias.

use std::collections::HashSet;

use crate::error::{TranslationError, TranslationResult};
use crate::model::{NamedExpr, SqlColumn, SqlEntity, SqlExpr, SqlGrouping};
use crate::translation::identifiers::UniqueIdentifierGenerator;

/// Name `projection` for use behind `alias`.
///
/// Returns `(inner, outer)`. Entities in the outer projection get fresh ids
/// and are nullable when `nullable` is set.
pub(super) fn name_projection(
    projection: SqlExpr,
    alias: &str,
    nullable: bool,
    ids: &mut UniqueIdentifierGenerator,
) -> TranslationResult<(SqlExpr, SqlExpr)> {
    let mut namer = ProjectionNamer {
        alias,
        nullable,
        ids,
        used: HashSet::new(),
    };
    namer.name(projection, None)
}

/// Name `projection` together with the ordering `keys` of a paged statement.
///
/// Returns `(inner, outer, outer_keys)`. The inner projection selects the
/// keys after the projected values.
pub(super) fn name_projection_with_keys(
    projection: SqlExpr,
    keys: Vec<SqlExpr>,
    alias: &str,
    nullable: bool,
    ids: &mut UniqueIdentifierGenerator,
) -> TranslationResult<(SqlExpr, SqlExpr, Vec<SqlExpr>)> {
    let mut namer = ProjectionNamer {
        alias,
        nullable,
        ids,
        used: HashSet::new(),
    };
    let (inner, outer) = namer.name(projection, None)?;

    let mut selected = vec![NamedExpr::new("value", inner)];
    let mut outer_keys = Vec::with_capacity(keys.len());
    for key in keys {
        let (i, o) = namer.name(key, None)?;
        selected.push(NamedExpr::new("key", i));
        outer_keys.push(o);
    }
    Ok((SqlExpr::Compound(selected), outer, outer_keys))
}

struct ProjectionNamer<'a> {
    alias: &'a str,
    nullable: bool,
    ids: &'a mut UniqueIdentifierGenerator,
    used: HashSet<String>,
}

impl ProjectionNamer<'_> {
    fn unique(&mut self, preferred: &str) -> String {
        if self.used.insert(preferred.to_string()) {
            return preferred.to_string();
        }
        loop {
            let candidate = self.ids.next_column_alias();
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    fn name(
        &mut self,
        expr: SqlExpr,
        preferred: Option<&str>,
    ) -> TranslationResult<(SqlExpr, SqlExpr)> {
        match expr {
            SqlExpr::Entity(entity) => Ok(self.name_entity(entity)),
            SqlExpr::Column(column) => {
                let preferred = preferred.unwrap_or(column.output_name()).to_string();
                let name = self.unique(&preferred);
                let outer = SqlColumn::reference(self.alias, &name, column.is_primary_key);
                Ok((
                    SqlExpr::Column(rename(column, name)),
                    SqlExpr::Column(outer),
                ))
            }
            SqlExpr::Compound(members) => {
                let mut inner = Vec::with_capacity(members.len());
                let mut outer = Vec::with_capacity(members.len());
                for member in members {
                    let (i, o) = self.name(member.expr, Some(&member.name))?;
                    inner.push(NamedExpr::new(member.name.clone(), i));
                    outer.push(NamedExpr::new(member.name, o));
                }
                Ok((SqlExpr::Compound(inner), SqlExpr::Compound(outer)))
            }
            SqlExpr::Grouping(grouping) => {
                let SqlGrouping {
                    key, aggregates, ..
                } = *grouping;
                let (inner_key, outer_key) = self.name(key, Some("Key"))?;
                let mut inner = Vec::with_capacity(aggregates.len());
                let mut outer = Vec::with_capacity(aggregates.len());
                for aggregate in aggregates {
                    let (i, o) = self.name(aggregate.expr, Some(&aggregate.name))?;
                    inner.push(NamedExpr::new(aggregate.name.clone(), i));
                    outer.push(NamedExpr::new(aggregate.name, o));
                }
                Ok((
                    SqlExpr::Grouping(Box::new(SqlGrouping {
                        key: inner_key,
                        element: None,
                        aggregates: inner,
                    })),
                    SqlExpr::Grouping(Box::new(SqlGrouping {
                        key: outer_key,
                        element: None,
                        aggregates: outer,
                    })),
                ))
            }
            SqlExpr::Named(named) => {
                let NamedExpr { name, expr } = *named;
                Ok(self.name_value(expr, &name))
            }
            expr if !expr.is_resolved() => Err(TranslationError::unresolved(format!(
                "{} in the projection of a nested statement",
                expr.kind_name()
            ))),
            other => Ok(self.name_value(other, preferred.unwrap_or("value"))),
        }
    }

    fn name_entity(&mut self, entity: SqlEntity) -> (SqlExpr, SqlExpr) {
        let mut inner_columns = Vec::with_capacity(entity.columns.len());
        let mut outer_columns = Vec::with_capacity(entity.columns.len());
        for column in entity.columns {
            let preferred = column.output_name().to_string();
            let name = self.unique(&preferred);
            outer_columns.push(SqlColumn::reference(
                self.alias,
                &name,
                column.is_primary_key,
            ));
            inner_columns.push(rename(column, name));
        }

        let outer = SqlEntity {
            id: self.ids.next_entity_id(),
            item_type: entity.item_type.clone(),
            name: entity.name.clone(),
            table_alias: self.alias.to_string(),
            columns: outer_columns,
            nullable: entity.nullable || self.nullable,
        };
        let inner = SqlEntity {
            columns: inner_columns,
            ..entity
        };
        (SqlExpr::Entity(inner), SqlExpr::Entity(outer))
    }

    fn name_value(&mut self, expr: SqlExpr, preferred: &str) -> (SqlExpr, SqlExpr) {
        let name = self.unique(preferred);
        let outer = SqlColumn::reference(self.alias, &name, false);
        (
            SqlExpr::Named(Box::new(NamedExpr::new(name, expr))),
            SqlExpr::Column(outer),
        )
    }
}

/// Expose `column` as `name`, dropping the alias when it matches.
fn rename(column: SqlColumn, name: String) -> SqlColumn {
    if column.column_name == name {
        SqlColumn {
            alias: None,
            ..column
        }
    } else {
        column.with_alias(name)
    }
}
