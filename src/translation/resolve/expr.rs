//! Expression resolution: members, relations and identity comparisons.

use crate::error::{TranslationError, TranslationResult};
use crate::metadata::{Cardinality, MemberMapping, RelationMapping};
use crate::model::{
    CaseWhen, JoinInfo, JoinSemantics, MethodCall, NamedExpr, SqlBinaryOp, SqlColumn, SqlEntity,
    SqlExpr, SqlGrouping, SqlTable, TableId, TableInfo,
};
use crate::query::Value;

use super::StatementResolver;

impl StatementResolver<'_> {
    pub(super) fn resolve_expr(&mut self, expr: SqlExpr) -> TranslationResult<SqlExpr> {
        match expr {
            SqlExpr::TableRef(table) => self.ctx.table_projection(table).cloned().ok_or_else(|| {
                TranslationError::unresolved(format!(
                    "reference to table {:?} outside its statement",
                    table
                ))
            }),
            SqlExpr::Member { inner, member } => {
                let inner = self.resolve_expr(*inner)?;
                self.resolve_member(inner, &member)
            }
            SqlExpr::EntityConstant { item_type, .. } => Err(TranslationError::unsupported(
                format!("constant {} outside an equality comparison", item_type),
            )),
            SqlExpr::GroupAggregateRef { table, name } => self.resolve_group_aggregate(table, &name),
            SqlExpr::OrderingKeyRef { table, index } => {
                self.ctx.ordering_key(table, index).cloned().ok_or_else(|| {
                    TranslationError::unresolved(format!(
                        "ordering key {} of table {:?} is not projected",
                        index, table
                    ))
                })
            }

            e @ (SqlExpr::Column(_)
            | SqlExpr::Entity(_)
            | SqlExpr::Constant(_)
            | SqlExpr::Literal(_)) => Ok(e),
            SqlExpr::Binary { op, left, right } => {
                let left = self.resolve_operand(*left)?;
                let right = self.resolve_operand(*right)?;
                self.resolve_binary(op, left, right)
            }
            SqlExpr::Unary { op, operand } => Ok(SqlExpr::Unary {
                op,
                operand: self.resolve_boxed(operand)?,
            }),
            SqlExpr::Call(call) => {
                let MethodCall {
                    instance,
                    signature,
                    arguments,
                } = call;
                let instance = match instance {
                    Some(i) => Some(self.resolve_boxed(i)?),
                    None => None,
                };
                Ok(SqlExpr::Call(MethodCall {
                    instance,
                    signature,
                    arguments: self.resolve_all(arguments)?,
                }))
            }
            SqlExpr::Function { name, args } => Ok(SqlExpr::Function {
                name,
                args: self.resolve_all(args)?,
            }),
            SqlExpr::Like {
                operand,
                pattern,
                escape,
            } => Ok(SqlExpr::Like {
                operand: self.resolve_boxed(operand)?,
                pattern: self.resolve_boxed(pattern)?,
                escape,
            }),
            SqlExpr::Case { whens, else_result } => {
                let whens = whens
                    .into_iter()
                    .map(|w| -> TranslationResult<CaseWhen> {
                        Ok(CaseWhen {
                            condition: self.resolve_expr(w.condition)?,
                            result: self.resolve_expr(w.result)?,
                        })
                    })
                    .collect::<TranslationResult<Vec<_>>>()?;
                let else_result = match else_result {
                    Some(e) => Some(self.resolve_boxed(e)?),
                    None => None,
                };
                Ok(SqlExpr::Case { whens, else_result })
            }
            SqlExpr::IsNull { operand, negated } => Ok(SqlExpr::IsNull {
                operand: self.resolve_boxed(operand)?,
                negated,
            }),
            SqlExpr::In { operand, list } => Ok(SqlExpr::In {
                operand: self.resolve_boxed(operand)?,
                list: self.resolve_all(list)?,
            }),
            SqlExpr::Exists(statement) => Ok(SqlExpr::Exists(Box::new(
                self.resolve_statement(*statement)?,
            ))),
            SqlExpr::Subquery(statement) => Ok(SqlExpr::Subquery(Box::new(
                self.resolve_statement(*statement)?,
            ))),
            SqlExpr::Aggregate {
                kind,
                arg,
                distinct,
            } => {
                let arg = match arg {
                    Some(a) => Some(self.resolve_boxed(a)?),
                    None => None,
                };
                Ok(SqlExpr::Aggregate {
                    kind,
                    arg,
                    distinct,
                })
            }
            SqlExpr::Compound(members) => {
                let members = members
                    .into_iter()
                    .map(|m| -> TranslationResult<NamedExpr> {
                        Ok(NamedExpr::new(m.name, self.resolve_expr(m.expr)?))
                    })
                    .collect::<TranslationResult<Vec<_>>>()?;
                Ok(SqlExpr::Compound(members))
            }
            SqlExpr::Grouping(grouping) => {
                let SqlGrouping {
                    key, aggregates, ..
                } = *grouping;
                let key = self.resolve_expr(key)?;
                let aggregates = aggregates
                    .into_iter()
                    .map(|a| -> TranslationResult<NamedExpr> {
                        Ok(NamedExpr::new(a.name, self.resolve_expr(a.expr)?))
                    })
                    .collect::<TranslationResult<Vec<_>>>()?;
                Ok(SqlExpr::Grouping(Box::new(SqlGrouping {
                    key,
                    element: None,
                    aggregates,
                })))
            }
            SqlExpr::Named(named) => {
                let NamedExpr { name, expr } = *named;
                Ok(SqlExpr::Named(Box::new(NamedExpr::new(
                    name,
                    self.resolve_expr(expr)?,
                ))))
            }
        }
    }

    fn resolve_boxed(&mut self, expr: Box<SqlExpr>) -> TranslationResult<Box<SqlExpr>> {
        Ok(Box::new(self.resolve_expr(*expr)?))
    }

    fn resolve_all(&mut self, exprs: Vec<SqlExpr>) -> TranslationResult<Vec<SqlExpr>> {
        exprs.into_iter().map(|e| self.resolve_expr(e)).collect()
    }

    /// Entity constants survive until the comparison that consumes them.
    fn resolve_operand(&mut self, expr: SqlExpr) -> TranslationResult<SqlExpr> {
        match expr {
            SqlExpr::EntityConstant { .. } => Ok(expr),
            other => self.resolve_expr(other),
        }
    }

    fn resolve_binary(
        &mut self,
        op: SqlBinaryOp,
        left: SqlExpr,
        right: SqlExpr,
    ) -> TranslationResult<SqlExpr> {
        let is_equality = matches!(op, SqlBinaryOp::Eq | SqlBinaryOp::Ne);
        if is_equality && (has_identity(&left) || has_identity(&right)) {
            return self.identity_comparison(op, left, right);
        }
        if is_equality
            && matches!(
                (&left, &right),
                (SqlExpr::Compound(_), SqlExpr::Compound(_))
            )
        {
            return self.compound_comparison(op, left, right);
        }
        if has_identity(&left) || has_identity(&right) {
            return Err(TranslationError::unsupported(
                "entity in a non-equality comparison",
            ));
        }
        Ok(SqlExpr::binary(op, left, right))
    }

    /// Entities compare by primary key.
    fn identity_comparison(
        &mut self,
        op: SqlBinaryOp,
        left: SqlExpr,
        right: SqlExpr,
    ) -> TranslationResult<SqlExpr> {
        let equal = match (left, right) {
            (SqlExpr::Entity(a), SqlExpr::Entity(b)) => {
                let (ka, kb) = (key_columns(&a)?, key_columns(&b)?);
                if ka.len() != kb.len() {
                    return Err(TranslationError::invalid(format!(
                        "comparison of {} with {} whose keys differ",
                        a.item_type, b.item_type
                    )));
                }
                conjunction(
                    ka.into_iter()
                        .zip(kb)
                        .map(|(x, y)| SqlExpr::eq(SqlExpr::Column(x), SqlExpr::Column(y))),
                )?
            }
            (SqlExpr::Entity(entity), SqlExpr::EntityConstant { item_type, key })
            | (SqlExpr::EntityConstant { item_type, key }, SqlExpr::Entity(entity)) => {
                let column = match key_columns(&entity)?.as_slice() {
                    [column] => column.clone(),
                    _ => {
                        return Err(TranslationError::unsupported(format!(
                            "comparison of {} with a constant entity over a composite key",
                            entity.item_type
                        )))
                    }
                };
                let constant = self
                    .resolver
                    .resolve_constant(&item_type, &key)
                    .ok_or_else(|| TranslationError::unmapped("<constant>", &item_type))?;
                SqlExpr::eq(SqlExpr::Column(column), constant)
            }
            (SqlExpr::Entity(entity), other) | (other, SqlExpr::Entity(entity))
                if is_null_constant(&other) =>
            {
                conjunction(key_columns(&entity)?.into_iter().map(|c| SqlExpr::is_null(SqlExpr::Column(c))))?
            }
            (left, right) => {
                return Err(TranslationError::unsupported(format!(
                    "comparison of {} with {}",
                    left.kind_name(),
                    right.kind_name()
                )))
            }
        };
        Ok(match op {
            SqlBinaryOp::Ne => negate(equal),
            _ => equal,
        })
    }

    /// Anonymous types compare member by member.
    fn compound_comparison(
        &mut self,
        op: SqlBinaryOp,
        left: SqlExpr,
        right: SqlExpr,
    ) -> TranslationResult<SqlExpr> {
        let (SqlExpr::Compound(left), SqlExpr::Compound(right)) = (left, right) else {
            return Err(TranslationError::invalid("member-wise comparison of non-compounds"));
        };
        if left.len() != right.len() {
            return Err(TranslationError::invalid(
                "comparison of anonymous types with different members",
            ));
        }
        let mut parts = Vec::with_capacity(left.len());
        for (a, b) in left.into_iter().zip(right) {
            if a.name != b.name {
                return Err(TranslationError::invalid(format!(
                    "comparison of anonymous type members '{}' and '{}'",
                    a.name, b.name
                )));
            }
            parts.push(self.resolve_binary(SqlBinaryOp::Eq, a.expr, b.expr)?);
        }
        let equal = SqlExpr::all(parts)
            .ok_or_else(|| TranslationError::invalid("comparison of empty anonymous types"))?;
        Ok(match op {
            SqlBinaryOp::Ne => SqlExpr::not(equal),
            _ => equal,
        })
    }

    fn resolve_member(&mut self, inner: SqlExpr, member: &str) -> TranslationResult<SqlExpr> {
        match inner {
            SqlExpr::Entity(entity) => match self.member_mapping(&entity.item_type, member)? {
                MemberMapping::Column { column } => {
                    Ok(SqlExpr::Column(self.entity_column(&entity, &column)?))
                }
                MemberMapping::Relation(relation) => match relation.cardinality {
                    Cardinality::One => self.navigate(&entity, member, &relation),
                    Cardinality::Many => Err(TranslationError::unsupported(format!(
                        "collection '{}.{}' used as a value",
                        entity.item_type, member
                    ))),
                },
            },
            SqlExpr::Compound(members) => members
                .into_iter()
                .find(|m| m.name == member)
                .map(|m| m.expr)
                .ok_or_else(|| TranslationError::unmapped(member, "anonymous type")),
            SqlExpr::Grouping(grouping) if member == "Key" => Ok(grouping.key),
            SqlExpr::Grouping(_) => Err(TranslationError::unsupported(format!(
                "member '{}' of a grouping",
                member
            ))),
            SqlExpr::Named(named) => self.resolve_member(named.expr, member),
            other => Err(TranslationError::unsupported(format!(
                "member '{}' on {}",
                member,
                other.kind_name()
            ))),
        }
    }

    /// Follow a single-valued relation through a LEFT JOIN owned by the
    /// table of `owner`; repeated navigation reuses the join.
    fn navigate(
        &mut self,
        owner: &SqlEntity,
        member: &str,
        relation: &RelationMapping,
    ) -> TranslationResult<SqlExpr> {
        let owner_table = self.ctx.table_of(owner.id).ok_or_else(|| {
            TranslationError::unresolved(format!("{} entity without a table", owner.item_type))
        })?;
        if let Some(existing) = self.ctx.existing_join(owner_table, member) {
            return self.table_entity(existing).map(SqlExpr::Entity);
        }

        let id: TableId = self.ids.next_table_id();
        let target = self.resolve_simple(id, &relation.target, true)?;
        let target_entity = self.table_entity(id)?;
        let condition = SqlExpr::eq(
            SqlExpr::Column(self.entity_column(owner, &relation.owner_key)?),
            SqlExpr::Column(self.entity_column(&target_entity, &relation.target_key)?),
        );
        self.ctx.add_join(
            owner_table,
            member,
            SqlTable::new(
                id,
                TableInfo::Join(Box::new(JoinInfo {
                    semantics: JoinSemantics::Left,
                    target: TableInfo::Simple(target),
                    condition,
                })),
            ),
        );
        tracing::debug!(
            owner = %owner.item_type,
            member,
            target = %relation.target,
            "joined relation"
        );
        Ok(SqlExpr::Entity(target_entity))
    }

    fn resolve_group_aggregate(&self, table: TableId, name: &str) -> TranslationResult<SqlExpr> {
        match self.ctx.table_projection(table) {
            Some(SqlExpr::Grouping(grouping)) => grouping
                .aggregates
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.expr.clone())
                .ok_or_else(|| {
                    TranslationError::unresolved(format!(
                        "aggregate '{}' missing from its grouping",
                        name
                    ))
                }),
            _ => Err(TranslationError::unresolved(format!(
                "aggregate '{}' over a source that is not a grouping",
                name
            ))),
        }
    }
}

fn has_identity(expr: &SqlExpr) -> bool {
    matches!(expr, SqlExpr::Entity(_) | SqlExpr::EntityConstant { .. })
}

fn is_null_constant(expr: &SqlExpr) -> bool {
    matches!(expr, SqlExpr::Constant(Value::Null))
}

fn key_columns(entity: &SqlEntity) -> TranslationResult<Vec<SqlColumn>> {
    let keys: Vec<SqlColumn> = entity.primary_key().into_iter().cloned().collect();
    if keys.is_empty() {
        return Err(TranslationError::contract_violation(format!(
            "'{}' has no primary key",
            entity.item_type
        )));
    }
    Ok(keys)
}

fn conjunction(parts: impl IntoIterator<Item = SqlExpr>) -> TranslationResult<SqlExpr> {
    SqlExpr::all(parts).ok_or_else(|| TranslationError::invalid("empty key comparison"))
}

fn negate(predicate: SqlExpr) -> SqlExpr {
    match predicate {
        SqlExpr::Binary {
            op: SqlBinaryOp::Eq,
            left,
            right,
        } => SqlExpr::Binary {
            op: SqlBinaryOp::Ne,
            left,
            right,
        },
        SqlExpr::IsNull {
            operand,
            negated: false,
        } => SqlExpr::IsNull {
            operand,
            negated: true,
        },
        other => SqlExpr::not(other),
    }
}
