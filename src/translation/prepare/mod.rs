//! Preparation: query model to unresolved statement.
//!
//! Walks the clauses of a [`QueryModel`] in order and builds a
//! [`SqlStatement`] whose tables are known only by item type and whose
//! expressions still refer to sources by [`TableId`]. Result operators that
//! cannot be applied to the statement built so far wrap it into a nested
//! statement first.
//!
//! Query sources are tracked in a stack of scopes so nested queries can
//! refer to the sources of the queries that enclose them.

mod expr;
mod result_operators;

use std::collections::HashMap;

use crate::error::{TranslationError, TranslationResult};
use crate::model::{
    DataInfo, JoinInfo, JoinSemantics, NamedExpr, OrderingDirection, SqlExpr, SqlLiteral,
    SqlOrdering, SqlStatement, SqlStatementBuilder, SqlTable, TableId, TableInfo,
};
use crate::query::{BodyClause, Expr, FromClause, JoinClause, QueryModel, ResultOperator};

use super::identifiers::UniqueIdentifierGenerator;

/// Prepare `query` into an unresolved statement.
pub fn prepare(
    query: &QueryModel,
    ids: &mut UniqueIdentifierGenerator,
) -> TranslationResult<SqlStatement> {
    let mut preparer = Preparer::new(ids);
    let statement = match preparer.prepare_query(query)? {
        Prepared::Statement(builder) => preparer.finish(builder),
        Prepared::Expression(expr) => {
            let mut builder = SqlStatementBuilder::new(expr);
            builder.data_info = DataInfo::Scalar;
            preparer.finish(builder)
        }
    };

    if !preparer.group_aggregates.is_empty() {
        return Err(TranslationError::unresolved(
            "aggregate over a grouping that is not part of the statement",
        ));
    }
    tracing::trace!(statement = %statement, "prepared statement");
    Ok(statement)
}

/// What a query source name stands for.
#[derive(Debug, Clone)]
enum Binding {
    /// The current item of a source.
    Value(SqlExpr),
    /// `join ... into name`: only usable as a sequence.
    GroupJoin(JoinClause),
}

/// The element sequence behind a grouping source.
#[derive(Debug, Clone)]
struct GroupingSource {
    /// Per-row element, expressed over the tables of the grouping statement.
    element: SqlExpr,
    /// Table whose statement carries the grouping projection.
    target: TableId,
}

/// Outcome of preparing a query or applying a result operator.
pub(crate) enum Prepared {
    Statement(SqlStatementBuilder),
    /// A scalar result such as an existence test.
    Expression(SqlExpr),
}

pub(crate) struct Preparer<'a> {
    ids: &'a mut UniqueIdentifierGenerator,
    scopes: Vec<HashMap<String, Binding>>,
    groupings: HashMap<TableId, GroupingSource>,
    /// Aggregates requested over a grouping, keyed by the table holding it.
    /// Added to the grouping projection when the owning statement finishes.
    group_aggregates: HashMap<TableId, Vec<NamedExpr>>,
}

impl<'a> Preparer<'a> {
    fn new(ids: &'a mut UniqueIdentifierGenerator) -> Self {
        Self {
            ids,
            scopes: vec![HashMap::new()],
            groupings: HashMap::new(),
            group_aggregates: HashMap::new(),
        }
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    fn in_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> TranslationResult<T>,
    ) -> TranslationResult<T> {
        self.scopes.push(HashMap::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn bind(&mut self, name: &str, binding: Binding) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), binding);
        }
    }

    fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    // =========================================================================
    // Queries and clauses
    // =========================================================================

    fn prepare_query(&mut self, model: &QueryModel) -> TranslationResult<Prepared> {
        self.in_scope(|p| p.prepare_query_in_scope(model))
    }

    fn prepare_query_in_scope(&mut self, model: &QueryModel) -> TranslationResult<Prepared> {
        let mut builder = SqlStatementBuilder::new(SqlExpr::Literal(SqlLiteral::Null));

        self.add_from(&mut builder, &model.main_from)
            .map_err(|e| e.with_context(outline(&builder)))?;
        for clause in &model.body_clauses {
            self.add_body_clause(&mut builder, clause)
                .map_err(|e| e.with_context(outline(&builder)))?;
        }
        builder.projection = self
            .prepare_expr(&model.select)
            .map_err(|e| e.with_context(outline(&builder)))?;

        let mut prepared = Prepared::Statement(builder);
        for op in &model.result_operators {
            prepared = match prepared {
                Prepared::Statement(builder) => {
                    let context = outline(&builder);
                    self.apply_result_operator(builder, op)
                        .map_err(|e| e.with_context(context))?
                }
                Prepared::Expression(_) => {
                    return Err(TranslationError::unsupported(format!(
                        "{} after a scalar result operator",
                        op.name()
                    )))
                }
            };
        }
        Ok(prepared)
    }

    fn add_body_clause(
        &mut self,
        builder: &mut SqlStatementBuilder,
        clause: &BodyClause,
    ) -> TranslationResult<()> {
        match clause {
            BodyClause::AdditionalFrom(from) => self.add_from(builder, from),
            BodyClause::Where(predicate) => {
                let predicate = self.prepare_expr(predicate)?;
                builder.add_where(predicate);
                Ok(())
            }
            BodyClause::OrderBy(orderings) => {
                let mut prepared = orderings
                    .iter()
                    .map(|o| -> TranslationResult<SqlOrdering> {
                        Ok(SqlOrdering {
                            expr: self.prepare_expr(&o.expr)?,
                            direction: expr::direction(o.direction),
                        })
                    })
                    .collect::<TranslationResult<Vec<_>>>()?;
                // A later ordering clause takes precedence over earlier ones.
                prepared.append(&mut builder.orderings);
                builder.orderings = prepared;
                Ok(())
            }
            BodyClause::Join(join) => {
                self.add_join(builder, join, &join.item_name, JoinSemantics::Inner)
            }
            BodyClause::GroupJoin(group_join) => {
                self.bind(
                    &group_join.item_name,
                    Binding::GroupJoin(group_join.join.clone()),
                );
                Ok(())
            }
        }
    }

    fn add_from(
        &mut self,
        builder: &mut SqlStatementBuilder,
        from: &FromClause,
    ) -> TranslationResult<()> {
        match &from.source {
            Expr::Table { item_type } => {
                let id = self.ids.next_table_id();
                builder.tables.push(SqlTable::new(
                    id,
                    TableInfo::Unresolved {
                        item_type: item_type.clone(),
                    },
                ));
                self.bind(&from.item_name, Binding::Value(SqlExpr::TableRef(id)));
                Ok(())
            }
            Expr::QuerySource(name) => {
                let join = match self.lookup(name) {
                    Some(Binding::GroupJoin(join)) => join.clone(),
                    Some(Binding::Value(_)) => {
                        return Err(TranslationError::unsupported(format!(
                            "query source '{}' used as a sequence",
                            name
                        )))
                    }
                    None => {
                        return Err(TranslationError::invalid(format!(
                            "unknown query source '{}'",
                            name
                        )))
                    }
                };
                // Flattening a group join is an inner join expressed as a
                // filtered additional source.
                let table = self.sequence_table(&join.inner_sequence)?;
                let predicate = self.join_predicate(&join, SqlExpr::TableRef(table.id))?;
                self.bind(&from.item_name, Binding::Value(SqlExpr::TableRef(table.id)));
                builder.tables.push(table);
                builder.add_where(predicate);
                Ok(())
            }
            Expr::SubQuery(sub) => {
                if let Some(join) = self.left_join_pattern(sub) {
                    return self.add_join(builder, &join, &from.item_name, JoinSemantics::Left);
                }
                match self.prepare_query(sub)? {
                    Prepared::Statement(inner) => {
                        self.add_statement_source(builder, from, inner);
                        Ok(())
                    }
                    Prepared::Expression(_) => Err(TranslationError::unsupported(
                        "scalar subquery used as a query source",
                    )),
                }
            }
            Expr::Member { .. } => {
                let source = self.prepare_expr(&from.source)?;
                let id = self.ids.next_table_id();
                builder.tables.push(SqlTable::new(
                    id,
                    TableInfo::UnresolvedCollection {
                        item_type: from.item_type.clone(),
                        source,
                    },
                ));
                self.bind(&from.item_name, Binding::Value(SqlExpr::TableRef(id)));
                Ok(())
            }
            Expr::Constant(_) => Err(TranslationError::unsupported(
                "constant collection used as a query source",
            )),
            _ => Err(TranslationError::unsupported(format!(
                "'{}' as a query source",
                from.item_name
            ))),
        }
    }

    /// Merge a simple nested statement into `builder`, or keep it as a
    /// nested source when it must stay a separate scope.
    fn add_statement_source(
        &mut self,
        builder: &mut SqlStatementBuilder,
        from: &FromClause,
        inner: SqlStatementBuilder,
    ) {
        if inner.is_simple_sequence() {
            builder.tables.extend(inner.tables);
            if let Some(predicate) = inner.where_condition {
                builder.add_where(predicate);
            }
            builder.orderings.extend(inner.orderings);
            self.bind(&from.item_name, Binding::Value(inner.projection));
        } else {
            let directions = exposed_directions(&inner);
            let table = self.substatement_table(inner);
            self.bind(&from.item_name, Binding::Value(SqlExpr::TableRef(table.id)));
            builder.orderings.extend(key_orderings(table.id, &directions));
            builder.tables.push(table);
        }
    }

    /// `from x in g.DefaultIfEmpty()` over a group join `g`.
    fn left_join_pattern(&self, sub: &QueryModel) -> Option<JoinClause> {
        let Expr::QuerySource(name) = &sub.main_from.source else {
            return None;
        };
        let Some(Binding::GroupJoin(join)) = self.lookup(name) else {
            return None;
        };
        let selects_item = sub.select == Expr::QuerySource(sub.main_from.item_name.clone());
        let only_default_if_empty = sub.result_operators == [ResultOperator::DefaultIfEmpty];
        (sub.body_clauses.is_empty() && selects_item && only_default_if_empty)
            .then(|| join.clone())
    }

    /// Attach the inner sequence of `join` to the last root table.
    fn add_join(
        &mut self,
        builder: &mut SqlStatementBuilder,
        join: &JoinClause,
        item_name: &str,
        semantics: JoinSemantics,
    ) -> TranslationResult<()> {
        let target = self.sequence_table(&join.inner_sequence)?;
        let id = target.id;
        let condition = self.join_predicate(join, SqlExpr::TableRef(id))?;
        let owner = builder
            .tables
            .last_mut()
            .ok_or_else(|| TranslationError::invalid("join without a preceding source"))?;
        owner.joins.push(SqlTable::new(
            id,
            TableInfo::Join(Box::new(JoinInfo {
                semantics,
                target: target.info,
                condition,
            })),
        ));
        self.bind(item_name, Binding::Value(SqlExpr::TableRef(id)));
        Ok(())
    }

    /// `outer_key == inner_key`, with the join item bound to `inner`.
    fn join_predicate(&mut self, join: &JoinClause, inner: SqlExpr) -> TranslationResult<SqlExpr> {
        let outer_key = self.prepare_expr(&join.outer_key)?;
        let inner_key = self.in_scope(|p| {
            p.bind(&join.item_name, Binding::Value(inner));
            p.prepare_expr(&join.inner_key)
        })?;
        Ok(SqlExpr::eq(outer_key, inner_key))
    }

    /// A fresh table for a join's inner sequence.
    fn sequence_table(&mut self, sequence: &Expr) -> TranslationResult<SqlTable> {
        match sequence {
            Expr::Table { item_type } => Ok(SqlTable::new(
                self.ids.next_table_id(),
                TableInfo::Unresolved {
                    item_type: item_type.clone(),
                },
            )),
            Expr::SubQuery(sub) => match self.prepare_query(sub)? {
                Prepared::Statement(inner) => Ok(self.substatement_table(inner)),
                Prepared::Expression(_) => Err(TranslationError::unsupported(
                    "scalar subquery used as a join source",
                )),
            },
            _ => Err(TranslationError::unsupported(
                "join over a sequence that is neither a table nor a query",
            )),
        }
    }

    // =========================================================================
    // Nested statements
    // =========================================================================

    /// Freeze `inner` into a nested table source with a fresh id.
    ///
    /// A grouping projection gives up its element here; aggregates requested
    /// later through the new table are computed over it.
    fn substatement_table(&mut self, mut inner: SqlStatementBuilder) -> SqlTable {
        let id = self.ids.next_table_id();
        if let SqlExpr::Grouping(grouping) = &mut inner.projection {
            if let Some(element) = grouping.element.take() {
                self.groupings
                    .insert(id, GroupingSource { element, target: id });
            }
        } else if let SqlExpr::TableRef(inner_id) = inner.projection {
            if let Some(source) = self.groupings.get(&inner_id).cloned() {
                self.groupings.insert(id, source);
            }
        }
        let statement = self.finish(inner);
        SqlTable::new(id, TableInfo::UnresolvedSubStatement(Box::new(statement)))
    }

    /// Move `builder` into a nested source of a fresh outer statement that
    /// projects it unchanged.
    ///
    /// The row order of a paged statement carries over to the outer one.
    fn wrap_into_substatement(&mut self, mut builder: SqlStatementBuilder) -> SqlStatementBuilder {
        if !builder.is_paged() {
            builder.orderings.clear();
        }
        let directions = exposed_directions(&builder);
        let table = self.substatement_table(builder);
        tracing::trace!(table = ?table.id, "wrapped statement into a nested source");
        let mut outer = SqlStatementBuilder::new(SqlExpr::TableRef(table.id));
        outer.orderings = key_orderings(table.id, &directions);
        outer.tables.push(table);
        outer
    }

    fn finish(&mut self, mut builder: SqlStatementBuilder) -> SqlStatement {
        self.flush_group_aggregates(&mut builder.tables);
        builder.build()
    }

    /// Add pending aggregates to the grouping statements among `tables`.
    fn flush_group_aggregates(&mut self, tables: &mut [SqlTable]) {
        if self.group_aggregates.is_empty() {
            return;
        }
        for table in tables.iter_mut() {
            let pending = self.group_aggregates.remove(&table.id);
            match &mut table.info {
                TableInfo::UnresolvedSubStatement(statement) => {
                    self.flush_into_statement(statement, pending)
                }
                TableInfo::Join(join) => {
                    if let TableInfo::UnresolvedSubStatement(statement) = &mut join.target {
                        self.flush_into_statement(statement, pending)
                    }
                }
                _ => {}
            }
            self.flush_group_aggregates(&mut table.joins);
        }
    }

    fn flush_into_statement(
        &mut self,
        statement: &mut Box<SqlStatement>,
        pending: Option<Vec<NamedExpr>>,
    ) {
        let mut inner = statement.as_ref().clone().into_builder();
        if let (Some(aggregates), SqlExpr::Grouping(grouping)) = (pending, &mut inner.projection) {
            grouping.aggregates.extend(aggregates);
        }
        self.flush_group_aggregates(&mut inner.tables);
        **statement = inner.build();
    }
}

fn outline(builder: &SqlStatementBuilder) -> SqlStatement {
    builder.clone().build()
}

/// Directions of the orderings an enclosing statement has to repeat.
fn exposed_directions(builder: &SqlStatementBuilder) -> Vec<OrderingDirection> {
    if !builder.exposes_ordering() {
        return vec![];
    }
    builder.orderings.iter().map(|o| o.direction).collect()
}

/// Orderings over the keys the paged statement behind `table` projects.
fn key_orderings(table: TableId, directions: &[OrderingDirection]) -> Vec<SqlOrdering> {
    directions
        .iter()
        .enumerate()
        .map(|(index, &direction)| SqlOrdering {
            expr: SqlExpr::OrderingKeyRef { table, index },
            direction,
        })
        .collect()
}
