//! Statement rendering: clauses, sources and paging.

use crate::error::{TranslationError, TranslationResult};
use crate::model::{
    JoinSemantics, OrderingDirection, SetOperation, SqlColumn, SqlEntity, SqlExpr, SqlStatement, SqlTable,
    TableInfo,
};
use crate::sql::dialect::helpers;
use crate::sql::{PagingStrategy, SqlDialect, Token, TokenStream};

use super::{Position, SqlGenerator};

impl SqlGenerator<'_> {
    pub(super) fn statement(
        &mut self,
        statement: &SqlStatement,
        top_level: bool,
    ) -> TranslationResult<()> {
        self.statement_inner(statement, top_level)
            .map_err(|e| e.with_context(statement))
    }

    fn statement_inner(&mut self, statement: &SqlStatement, top_level: bool) -> TranslationResult<()> {
        self.select(statement, top_level)?;

        for clause in statement.set_operations() {
            self.ts.space();
            match clause.operation {
                SetOperation::Union => self.ts.push(Token::Union),
                SetOperation::UnionAll => self.ts.push(Token::Union).space().push(Token::All),
                SetOperation::Intersect => self.ts.push(Token::Intersect),
                SetOperation::Except => self.ts.push(Token::Except),
            };
            self.ts.space();

            let branch = &clause.statement;
            if branch.set_operations().is_empty() && !branch.is_paged() {
                self.statement(branch, false)?;
            } else {
                self.ts.lparen();
                self.statement(branch, false)?;
                self.ts.rparen();
            }
        }
        Ok(())
    }

    fn select(&mut self, statement: &SqlStatement, top_level: bool) -> TranslationResult<()> {
        let ordered = !statement.orderings().is_empty();
        if statement.skip().is_some() && !ordered {
            return Err(TranslationError::invalid(
                "Skip requires an ordering to be deterministic",
            ));
        }
        let use_top = self.paging == PagingStrategy::OffsetFetch
            && self.dialect.supports_top()
            && statement.skip().is_none();

        self.ts.push(Token::Select);
        if statement.is_distinct() {
            self.ts.space().push(Token::Distinct);
        }
        if let (true, Some(top)) = (use_top, statement.top()) {
            self.ts.space().push(Token::Top).space().lparen();
            self.expr(top, Position::Value)?;
            self.ts.rparen();
        }
        self.ts.space();
        self.projection(statement.projection())?;

        if !statement.tables().is_empty() {
            self.ts.space().push(Token::From).space();
            self.tables(statement.tables())?;
        }

        if let Some(condition) = statement.where_condition() {
            self.ts.space().push(Token::Where).space();
            self.expr(condition, Position::Predicate)?;
        }

        if !statement.group_by().is_empty() {
            let mut keys = Vec::new();
            for key in statement.group_by() {
                flatten(key, &mut keys);
            }
            self.ts.space().push(Token::GroupBy).space();
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    self.ts.comma().space();
                }
                self.expr(key, Position::Value)?;
            }
        }

        // Row order only matters for the final result and for paging.
        if ordered && (top_level || statement.is_paged()) {
            self.ts.space().push(Token::OrderBy).space();
            let mut first = true;
            for ordering in statement.orderings() {
                let mut keys = Vec::new();
                flatten(&ordering.expr, &mut keys);
                for key in &keys {
                    if !first {
                        self.ts.comma().space();
                    }
                    first = false;
                    self.expr(key, Position::Value)?;
                    self.ts.space().push(match ordering.direction {
                        OrderingDirection::Asc => Token::Asc,
                        OrderingDirection::Desc => Token::Desc,
                    });
                }
            }
        }

        if !use_top {
            self.paging(statement)?;
        }
        Ok(())
    }

    fn paging(&mut self, statement: &SqlStatement) -> TranslationResult<()> {
        let (top, skip) = (statement.top(), statement.skip());
        if top.is_none() && skip.is_none() {
            return Ok(());
        }

        // Parameters are numbered in textual order: the row count comes first
        // only with LIMIT.
        let (limit, offset) = match self.paging {
            PagingStrategy::OffsetFetch => {
                let offset = self.rendered(skip)?;
                (self.rendered(top)?, offset)
            }
            PagingStrategy::LimitOffset => {
                let limit = self.rendered(top)?;
                (limit, self.rendered(skip)?)
            }
        };

        let clause = match (self.paging, &limit, &offset) {
            (PagingStrategy::OffsetFetch, Some(limit), None) => helpers::emit_fetch_first(limit),
            (PagingStrategy::OffsetFetch, _, _) => {
                helpers::emit_offset_fetch(limit.as_ref(), offset.as_ref())
            }
            (PagingStrategy::LimitOffset, _, _) => {
                self.dialect.emit_limit_offset(limit.as_ref(), offset.as_ref())
            }
        };
        self.ts.space().append(&clause);
        Ok(())
    }

    fn rendered(&mut self, expr: Option<&SqlExpr>) -> TranslationResult<Option<TokenStream>> {
        expr.map(|e| self.detached(|g| g.expr(e, Position::Value)))
            .transpose()
    }

    // =========================================================================
    // Projection
    // =========================================================================

    fn projection(&mut self, projection: &SqlExpr) -> TranslationResult<()> {
        let mut first = true;
        self.projection_items(projection, &mut first)?;
        if first {
            return Err(TranslationError::invalid("statement projects no columns"));
        }
        Ok(())
    }

    fn projection_items(&mut self, expr: &SqlExpr, first: &mut bool) -> TranslationResult<()> {
        match expr {
            SqlExpr::Entity(entity) => {
                for column in &entity.columns {
                    self.separator(first);
                    self.entity_column(entity, column)?;
                }
            }
            SqlExpr::Compound(members) => {
                for member in members {
                    self.projection_items(&member.expr, first)?;
                }
            }
            SqlExpr::Grouping(grouping) => {
                self.projection_items(&grouping.key, first)?;
                for aggregate in &grouping.aggregates {
                    self.projection_items(&aggregate.expr, first)?;
                }
            }
            SqlExpr::Named(named) => {
                self.separator(first);
                self.expr(&named.expr, Position::Projection)?;
                self.ts
                    .space()
                    .push(Token::As)
                    .space()
                    .push(Token::Ident(named.name.clone()));
            }
            SqlExpr::Column(column) => {
                self.separator(first);
                self.ts.qualified_column(&column.table_alias, &column.column_name);
                if let Some(alias) = &column.alias {
                    self.ts
                        .space()
                        .push(Token::As)
                        .space()
                        .push(Token::Ident(alias.clone()));
                }
            }
            other => {
                self.separator(first);
                self.expr(other, Position::Projection)?;
            }
        }
        Ok(())
    }

    /// A column of a left-joined entity reads as NULL when the entity is absent.
    fn entity_column(&mut self, entity: &SqlEntity, column: &SqlColumn) -> TranslationResult<()> {
        let key = entity.primary_key().first().copied();
        match key {
            Some(key) if entity.nullable && !column.is_primary_key => {
                self.ts
                    .push(Token::Case)
                    .space()
                    .push(Token::When)
                    .space()
                    .qualified_column(&key.table_alias, &key.column_name)
                    .space()
                    .push(Token::IsNull)
                    .space()
                    .push(Token::Then)
                    .space()
                    .push(Token::LitNull)
                    .space()
                    .push(Token::Else)
                    .space()
                    .qualified_column(&column.table_alias, &column.column_name)
                    .space()
                    .push(Token::End)
                    .space()
                    .push(Token::As)
                    .space()
                    .push(Token::Ident(column.output_name().to_string()));
            }
            _ => {
                self.ts
                    .qualified_column(&column.table_alias, &column.column_name);
                if let Some(alias) = &column.alias {
                    self.ts
                        .space()
                        .push(Token::As)
                        .space()
                        .push(Token::Ident(alias.clone()));
                }
            }
        }
        Ok(())
    }

    fn separator(&mut self, first: &mut bool) {
        if !*first {
            self.ts.comma().space();
        }
        *first = false;
    }

    // =========================================================================
    // Sources
    // =========================================================================

    fn tables(&mut self, tables: &[SqlTable]) -> TranslationResult<()> {
        for (i, table) in tables.iter().enumerate() {
            if i > 0 {
                self.ts.space();
                match &table.info {
                    // Nested statements may refer to earlier sources.
                    TableInfo::SubStatement(_) => {
                        let apply = self.dialect.emit_cross_apply();
                        self.ts.append(&apply);
                    }
                    _ => {
                        self.ts.push(Token::Cross).space().push(Token::Join);
                    }
                }
                self.ts.space();
            }
            self.table_source(&table.info)?;
            for join in &table.joins {
                self.join(join)?;
            }
        }
        Ok(())
    }

    fn table_source(&mut self, info: &TableInfo) -> TranslationResult<()> {
        match info {
            TableInfo::Simple(table) => {
                self.ts
                    .push(Token::QualifiedIdent {
                        schema: table.schema.clone(),
                        name: table.table_name.clone(),
                    })
                    .space()
                    .push(Token::Ident(table.alias.clone()));
                Ok(())
            }
            TableInfo::SubStatement(sub) => {
                self.ts.lparen();
                self.statement(&sub.statement, false)?;
                self.ts.rparen().space().push(Token::Ident(sub.alias.clone()));
                Ok(())
            }
            TableInfo::Join(_) => Err(TranslationError::invalid("join used as a root source")),
            TableInfo::Unresolved { item_type }
            | TableInfo::UnresolvedCollection { item_type, .. } => Err(
                TranslationError::unresolved(format!("table of {}", item_type)),
            ),
            TableInfo::UnresolvedSubStatement(_) => {
                Err(TranslationError::unresolved("nested statement source"))
            }
        }
    }

    fn join(&mut self, table: &SqlTable) -> TranslationResult<()> {
        let TableInfo::Join(join) = &table.info else {
            return Err(TranslationError::invalid("source attached as a join without a condition"));
        };
        self.ts.space().push(match join.semantics {
            JoinSemantics::Inner => Token::Inner,
            JoinSemantics::Left => Token::Left,
        });
        self.ts.space().push(Token::Join).space();
        self.table_source(&join.target)?;
        self.ts.space().push(Token::On).space();
        self.expr(&join.condition, Position::Predicate)?;

        for nested in &table.joins {
            self.join(nested)?;
        }
        Ok(())
    }
}

/// Expand entities and anonymous types into their individual columns.
pub(super) fn flatten(expr: &SqlExpr, out: &mut Vec<SqlExpr>) {
    match expr {
        SqlExpr::Entity(entity) => out.extend(entity.columns.iter().map(|c| {
            SqlExpr::Column(SqlColumn {
                alias: None,
                ..c.clone()
            })
        })),
        SqlExpr::Compound(members) => {
            for member in members {
                flatten(&member.expr, out);
            }
        }
        SqlExpr::Named(named) => flatten(&named.expr, out),
        other => out.push(other.clone()),
    }
}
