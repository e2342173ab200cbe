//! Mapping resolution.
//!
//! Turns every unresolved table and expression of a prepared statement into
//! its resolved form by asking a [`MappingResolver`] how entity types and
//! members map onto tables and columns:
//!
//! ```text
//! Unresolved { Cook }            ->  Simple(CookTable t0), Entity(t0.*)
//! UnresolvedCollection           ->  Simple(...) + correlation predicate
//! UnresolvedSubStatement         ->  SubStatement(... q0), named projection
//! Member(Entity, column member)  ->  Column
//! Member(Entity, relation)       ->  Entity of a LEFT JOIN, reused per owner
//! Entity == Entity               ->  primary key comparison
//! ```
//!
//! Resolving an already resolved statement returns it unchanged.

mod context;
mod expr;
mod naming;

pub use context::ResolutionContext;

use crate::error::{TranslationError, TranslationResult};
use crate::metadata::{Cardinality, MappingResolver, MemberMapping, TableMapping};
use crate::model::{
    JoinInfo, JoinSemantics, ResolvedSimpleTable, ResolvedSubStatement, SetOperationClause,
    SqlColumn, SqlEntity, SqlExpr, SqlLiteral, SqlOrdering, SqlStatement, SqlTable, TableId,
    TableInfo,
};

use super::identifiers::UniqueIdentifierGenerator;

/// Resolve every table and expression in `statement`.
pub fn resolve(
    statement: SqlStatement,
    resolver: &dyn MappingResolver,
    ids: &mut UniqueIdentifierGenerator,
) -> TranslationResult<SqlStatement> {
    let mut statement_resolver = StatementResolver::new(resolver, ids);
    let resolved = statement_resolver.resolve_statement(statement)?;
    statement_resolver.ctx.ensure_no_pending_joins()?;
    Ok(resolved)
}

pub(crate) struct StatementResolver<'a> {
    resolver: &'a dyn MappingResolver,
    ids: &'a mut UniqueIdentifierGenerator,
    ctx: ResolutionContext,
}

impl<'a> StatementResolver<'a> {
    pub(crate) fn new(
        resolver: &'a dyn MappingResolver,
        ids: &'a mut UniqueIdentifierGenerator,
    ) -> Self {
        Self {
            resolver,
            ids,
            ctx: ResolutionContext::new(),
        }
    }

    pub(crate) fn resolve_statement(
        &mut self,
        statement: SqlStatement,
    ) -> TranslationResult<SqlStatement> {
        let outline = statement.to_string();
        self.resolve_statement_inner(statement)
            .map_err(|e| e.with_context(&outline))
    }

    fn resolve_statement_inner(
        &mut self,
        statement: SqlStatement,
    ) -> TranslationResult<SqlStatement> {
        let mut builder = statement.into_builder();

        // Tables first: expressions refer to what the tables project.
        let mut correlations = Vec::new();
        let mut tables = std::mem::take(&mut builder.tables)
            .into_iter()
            .map(|t| self.resolve_table(t, &mut correlations))
            .collect::<TranslationResult<Vec<_>>>()?;
        for table in &mut tables {
            self.resolve_join_conditions(table)?;
        }
        builder.tables = tables;

        builder.projection = self.resolve_expr(take_expr(&mut builder.projection))?;
        let where_condition = builder
            .where_condition
            .take()
            .map(|w| self.resolve_expr(w))
            .transpose()?;
        builder.where_condition = SqlExpr::all(correlations.into_iter().chain(where_condition));
        builder.group_by = std::mem::take(&mut builder.group_by)
            .into_iter()
            .map(|e| self.resolve_expr(e))
            .collect::<TranslationResult<Vec<_>>>()?;
        builder.orderings = std::mem::take(&mut builder.orderings)
            .into_iter()
            .map(|o| -> TranslationResult<SqlOrdering> {
                Ok(SqlOrdering {
                    expr: self.resolve_expr(o.expr)?,
                    direction: o.direction,
                })
            })
            .collect::<TranslationResult<Vec<_>>>()?;
        builder.top = builder.top.take().map(|e| self.resolve_expr(e)).transpose()?;
        builder.skip = builder.skip.take().map(|e| self.resolve_expr(e)).transpose()?;
        builder.set_operations = std::mem::take(&mut builder.set_operations)
            .into_iter()
            .map(|clause| -> TranslationResult<SetOperationClause> {
                Ok(SetOperationClause {
                    operation: clause.operation,
                    statement: self.resolve_statement(clause.statement)?,
                })
            })
            .collect::<TranslationResult<Vec<_>>>()?;

        self.attach_pending_joins(&mut builder.tables);
        Ok(builder.build())
    }

    // =========================================================================
    // Tables
    // =========================================================================

    fn resolve_table(
        &mut self,
        table: SqlTable,
        correlations: &mut Vec<SqlExpr>,
    ) -> TranslationResult<SqlTable> {
        let SqlTable { id, info, joins } = table;
        let info = match info {
            TableInfo::Unresolved { item_type } => {
                TableInfo::Simple(self.resolve_simple(id, &item_type, false)?)
            }
            TableInfo::UnresolvedCollection { item_type, source } => {
                let (table, predicate) = self.resolve_collection(id, &item_type, source)?;
                correlations.push(predicate);
                TableInfo::Simple(table)
            }
            TableInfo::UnresolvedSubStatement(statement) => {
                TableInfo::SubStatement(self.resolve_substatement(id, *statement, false)?)
            }
            TableInfo::Simple(table) => TableInfo::Simple(table),
            TableInfo::SubStatement(sub) => TableInfo::SubStatement(ResolvedSubStatement {
                alias: sub.alias,
                statement: Box::new(self.resolve_statement(*sub.statement)?),
            }),
            TableInfo::Join(join) => {
                let JoinInfo {
                    semantics,
                    target,
                    condition,
                } = *join;
                let nullable = semantics == JoinSemantics::Left;
                let target = match target {
                    TableInfo::Unresolved { item_type } => {
                        TableInfo::Simple(self.resolve_simple(id, &item_type, nullable)?)
                    }
                    TableInfo::UnresolvedSubStatement(statement) => TableInfo::SubStatement(
                        self.resolve_substatement(id, *statement, nullable)?,
                    ),
                    TableInfo::UnresolvedCollection { item_type, .. } => {
                        return Err(TranslationError::unsupported(format!(
                            "collection of {} as a join target",
                            item_type
                        )))
                    }
                    TableInfo::Simple(table) => TableInfo::Simple(table),
                    TableInfo::SubStatement(sub) => TableInfo::SubStatement(ResolvedSubStatement {
                        alias: sub.alias,
                        statement: Box::new(self.resolve_statement(*sub.statement)?),
                    }),
                    TableInfo::Join(_) => {
                        return Err(TranslationError::invalid("join nested as a join target"))
                    }
                };
                TableInfo::Join(Box::new(JoinInfo {
                    semantics,
                    target,
                    condition,
                }))
            }
        };

        let joins = joins
            .into_iter()
            .map(|j| self.resolve_table(j, correlations))
            .collect::<TranslationResult<Vec<_>>>()?;
        Ok(SqlTable { id, info, joins })
    }

    /// Join conditions may refer to any table of the statement, so they are
    /// resolved once every table is.
    fn resolve_join_conditions(&mut self, table: &mut SqlTable) -> TranslationResult<()> {
        if let TableInfo::Join(join) = &mut table.info {
            join.condition = self.resolve_expr(take_expr(&mut join.condition))?;
        }
        for join in &mut table.joins {
            self.resolve_join_conditions(join)?;
        }
        Ok(())
    }

    fn resolve_simple(
        &mut self,
        id: TableId,
        item_type: &str,
        nullable: bool,
    ) -> TranslationResult<ResolvedSimpleTable> {
        let mapping = self.table_mapping(item_type)?;
        let alias = self.ids.next_table_alias();
        let columns = mapping
            .columns
            .iter()
            .map(|c| SqlColumn::definition(&alias, &c.column, c.is_primary_key))
            .collect();
        let entity = SqlEntity {
            id: self.ids.next_entity_id(),
            item_type: item_type.to_string(),
            name: None,
            table_alias: alias.clone(),
            columns,
            nullable,
        };
        self.ctx.register_table(id, SqlExpr::Entity(entity));

        tracing::trace!(item_type, table = %mapping.table_name, %alias, "resolved table");
        Ok(ResolvedSimpleTable {
            table_name: mapping.table_name,
            schema: mapping.schema,
            alias,
            item_type: item_type.to_string(),
        })
    }

    /// A related collection becomes a table of the relation's target plus a
    /// predicate tying it to its owner.
    fn resolve_collection(
        &mut self,
        id: TableId,
        item_type: &str,
        source: SqlExpr,
    ) -> TranslationResult<(ResolvedSimpleTable, SqlExpr)> {
        let (inner, member) = match source {
            SqlExpr::Member { inner, member } => (inner, member),
            other => {
                return Err(TranslationError::unsupported(format!(
                    "{} as the source of a collection of {}",
                    other.kind_name(),
                    item_type
                )))
            }
        };
        let owner = match self.resolve_expr(*inner)? {
            SqlExpr::Entity(owner) => owner,
            other => {
                return Err(TranslationError::unsupported(format!(
                    "collection '{}' on {}",
                    member,
                    other.kind_name()
                )))
            }
        };

        let relation = match self.member_mapping(&owner.item_type, &member)? {
            MemberMapping::Relation(relation) if relation.cardinality == Cardinality::Many => {
                relation
            }
            MemberMapping::Relation(_) => {
                return Err(TranslationError::unsupported(format!(
                    "single-valued relation '{}.{}' used as a sequence",
                    owner.item_type, member
                )))
            }
            MemberMapping::Column { .. } => {
                return Err(TranslationError::unsupported(format!(
                    "column '{}.{}' used as a sequence",
                    owner.item_type, member
                )))
            }
        };

        let table = self.resolve_simple(id, &relation.target, false)?;
        let target = self.table_entity(id)?;
        let predicate = SqlExpr::eq(
            SqlExpr::Column(self.entity_column(&target, &relation.target_key)?),
            SqlExpr::Column(self.entity_column(&owner, &relation.owner_key)?),
        );
        Ok((table, predicate))
    }

    fn resolve_substatement(
        &mut self,
        id: TableId,
        statement: SqlStatement,
        nullable: bool,
    ) -> TranslationResult<ResolvedSubStatement> {
        let resolved = self.resolve_statement(statement)?;
        let alias = self.ids.next_subquery_alias();

        let mut builder = resolved.into_builder();
        let projection = take_expr(&mut builder.projection);
        if builder.exposes_ordering() {
            let keys = builder.orderings.iter().map(|o| o.expr.clone()).collect();
            let (inner, outer, outer_keys) =
                naming::name_projection_with_keys(projection, keys, &alias, nullable, self.ids)?;
            builder.projection = inner;
            self.ctx.register_table(id, outer);
            self.ctx.register_ordering_keys(id, outer_keys);
        } else {
            let (inner, outer) = naming::name_projection(projection, &alias, nullable, self.ids)?;
            builder.projection = inner;
            self.ctx.register_table(id, outer);
        }

        Ok(ResolvedSubStatement {
            alias,
            statement: Box::new(builder.build()),
        })
    }

    fn attach_pending_joins(&mut self, tables: &mut [SqlTable]) {
        for table in tables {
            let pending = self.ctx.take_pending_joins(table.id);
            table.joins.extend(pending);
            self.attach_pending_joins(&mut table.joins);
        }
    }

    // =========================================================================
    // Mapping lookups
    // =========================================================================

    fn table_mapping(&mut self, item_type: &str) -> TranslationResult<TableMapping> {
        let mapping = self
            .resolver
            .resolve_table(item_type)
            .ok_or_else(|| TranslationError::unmapped("<table>", item_type))?;

        if mapping.columns.is_empty() {
            return Err(TranslationError::contract_violation(format!(
                "table mapping for '{}' has no columns",
                item_type
            )));
        }
        for (i, column) in mapping.columns.iter().enumerate() {
            if mapping.columns[..i].iter().any(|c| c.column == column.column) {
                return Err(TranslationError::contract_violation(format!(
                    "table mapping for '{}' lists column '{}' twice",
                    item_type, column.column
                )));
            }
        }

        self.ctx.check_table_mapping(item_type, &mapping)?;
        Ok(mapping)
    }

    fn member_mapping(
        &mut self,
        entity_type: &str,
        member: &str,
    ) -> TranslationResult<MemberMapping> {
        let mapping = self
            .resolver
            .resolve_member(entity_type, member)
            .ok_or_else(|| TranslationError::unmapped(member, entity_type))?;
        self.ctx.check_member_mapping(entity_type, member, &mapping)?;
        Ok(mapping)
    }

    /// The column of `entity` backed by the physical column `column`.
    fn entity_column(&self, entity: &SqlEntity, column: &str) -> TranslationResult<SqlColumn> {
        let position = self
            .ctx
            .table_mapping(&entity.item_type)
            .and_then(|m| m.columns.iter().position(|c| c.column == column));
        match position.and_then(|p| entity.columns.get(p)) {
            Some(found) => Ok(found.clone()),
            None => Err(TranslationError::contract_violation(format!(
                "column '{}' is not part of the table mapping for '{}'",
                column, entity.item_type
            ))),
        }
    }

    /// The entity projected by a resolved simple table.
    fn table_entity(&self, table: TableId) -> TranslationResult<SqlEntity> {
        match self.ctx.table_projection(table) {
            Some(SqlExpr::Entity(entity)) => Ok(entity.clone()),
            _ => Err(TranslationError::unresolved(format!(
                "table {:?} does not project an entity",
                table
            ))),
        }
    }
}

fn take_expr(expr: &mut SqlExpr) -> SqlExpr {
    std::mem::replace(expr, SqlExpr::Literal(SqlLiteral::Null))
}
