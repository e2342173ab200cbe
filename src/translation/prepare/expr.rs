//! Query expressions to unresolved SQL expressions.

use crate::error::{TranslationError, TranslationResult};
use crate::model::{
    AggregateKind, DataInfo, MethodCall, NamedExpr, OrderingDirection, SqlBinaryOp, SqlExpr,
    SqlUnaryOp, TableId,
};
use crate::query::{
    self, BinaryOp, BodyClause, Expr, MethodSignature, QueryModel, ResultOperator, UnaryOp, Value,
};

use super::{Binding, GroupingSource, Prepared, Preparer};

pub(super) fn direction(direction: query::OrderingDirection) -> OrderingDirection {
    match direction {
        query::OrderingDirection::Asc => OrderingDirection::Asc,
        query::OrderingDirection::Desc => OrderingDirection::Desc,
    }
}

/// `None` for operators without a direct SQL counterpart.
fn binary_op(op: BinaryOp) -> Option<SqlBinaryOp> {
    Some(match op {
        BinaryOp::Equal => SqlBinaryOp::Eq,
        BinaryOp::NotEqual => SqlBinaryOp::Ne,
        BinaryOp::LessThan => SqlBinaryOp::Lt,
        BinaryOp::LessThanOrEqual => SqlBinaryOp::Lte,
        BinaryOp::GreaterThan => SqlBinaryOp::Gt,
        BinaryOp::GreaterThanOrEqual => SqlBinaryOp::Gte,
        BinaryOp::AndAlso => SqlBinaryOp::And,
        BinaryOp::OrElse => SqlBinaryOp::Or,
        BinaryOp::Add => SqlBinaryOp::Add,
        BinaryOp::Subtract => SqlBinaryOp::Sub,
        BinaryOp::Multiply => SqlBinaryOp::Mul,
        BinaryOp::Divide => SqlBinaryOp::Div,
        BinaryOp::Modulo => SqlBinaryOp::Mod,
        BinaryOp::Coalesce => return None,
    })
}

/// `from v in <constant list> select v` followed only by `Contains(item)`.
fn constant_list_contains(model: &QueryModel) -> Option<(&[Value], &Expr)> {
    let Expr::Constant(Value::List(values)) = &model.main_from.source else {
        return None;
    };
    let selects_item = model.select == Expr::QuerySource(model.main_from.item_name.clone());
    match model.result_operators.as_slice() {
        [ResultOperator::Contains(item)] if model.body_clauses.is_empty() && selects_item => {
            Some((values.as_slice(), item))
        }
        _ => None,
    }
}

impl Preparer<'_> {
    pub(super) fn prepare_expr(&mut self, expr: &Expr) -> TranslationResult<SqlExpr> {
        match expr {
            Expr::Table { item_type } => Err(TranslationError::unsupported(format!(
                "table of {} used as a value",
                item_type
            ))),
            Expr::QuerySource(name) => match self.lookup(name) {
                Some(Binding::Value(value)) => Ok(value.clone()),
                Some(Binding::GroupJoin(_)) => Err(TranslationError::unsupported(format!(
                    "group join '{}' used as a value",
                    name
                ))),
                None => Err(TranslationError::invalid(format!(
                    "unknown query source '{}'",
                    name
                ))),
            },
            Expr::Constant(value) => match value {
                Value::Entity { item_type, key } => Ok(SqlExpr::EntityConstant {
                    item_type: item_type.clone(),
                    key: key.as_ref().clone(),
                }),
                Value::List(_) => Err(TranslationError::unsupported(
                    "constant collection used as a value",
                )),
                other => Ok(SqlExpr::Constant(other.clone())),
            },
            Expr::Member { inner, member } => Ok(SqlExpr::Member {
                inner: Box::new(self.prepare_expr(inner)?),
                member: member.clone(),
            }),
            Expr::Binary { op, left, right } => {
                let left = self.prepare_expr(left)?;
                let right = self.prepare_expr(right)?;
                Ok(match binary_op(*op) {
                    Some(op) => SqlExpr::binary(op, left, right),
                    None => SqlExpr::function("COALESCE", vec![left, right]),
                })
            }
            Expr::Unary { op, operand } => Ok(SqlExpr::Unary {
                op: match op {
                    UnaryOp::Not => SqlUnaryOp::Not,
                    UnaryOp::Negate => SqlUnaryOp::Negate,
                },
                operand: Box::new(self.prepare_expr(operand)?),
            }),
            Expr::Call {
                instance,
                method,
                arguments,
            } => self.prepare_call(instance.as_deref(), method, arguments),
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => Ok(SqlExpr::case_when(
                self.prepare_expr(test)?,
                self.prepare_expr(if_true)?,
                Some(self.prepare_expr(if_false)?),
            )),
            Expr::New(members) => {
                let members = members
                    .iter()
                    .map(|m| -> TranslationResult<NamedExpr> {
                        Ok(NamedExpr::new(m.name.clone(), self.prepare_expr(&m.expr)?))
                    })
                    .collect::<TranslationResult<Vec<_>>>()?;
                Ok(SqlExpr::Compound(members))
            }
            Expr::SubQuery(model) => self.prepare_subquery(model),
        }
    }

    fn prepare_call(
        &mut self,
        instance: Option<&Expr>,
        method: &MethodSignature,
        arguments: &[Expr],
    ) -> TranslationResult<SqlExpr> {
        // Containment in a constant collection, instance or extension form.
        if method.name == "Contains" {
            match (instance, arguments) {
                (Some(Expr::Constant(Value::List(values))), [item])
                | (None, [Expr::Constant(Value::List(values)), item]) => {
                    return self.prepare_in(values, item)
                }
                _ => {}
            }
        }

        let instance = match instance {
            Some(i) => Some(Box::new(self.prepare_expr(i)?)),
            None => None,
        };
        let arguments = arguments
            .iter()
            .map(|a| self.prepare_expr(a))
            .collect::<TranslationResult<Vec<_>>>()?;
        Ok(SqlExpr::Call(MethodCall {
            instance,
            signature: method.clone(),
            arguments,
        }))
    }

    fn prepare_in(&mut self, values: &[Value], item: &Expr) -> TranslationResult<SqlExpr> {
        let operand = self.prepare_expr(item)?;
        Ok(SqlExpr::In {
            operand: Box::new(operand),
            list: values.iter().cloned().map(SqlExpr::Constant).collect(),
        })
    }

    fn prepare_subquery(&mut self, model: &QueryModel) -> TranslationResult<SqlExpr> {
        if let Some((table, source)) = self.grouping_source_of(model) {
            return self.prepare_group_aggregate(model, table, source);
        }
        if let Some((values, item)) = constant_list_contains(model) {
            return self.prepare_in(values, item);
        }

        match self.prepare_query(model)? {
            Prepared::Expression(expr) => Ok(expr),
            Prepared::Statement(builder) => match builder.data_info {
                DataInfo::Sequence => Err(TranslationError::unsupported(
                    "sequence-valued subquery used as a value",
                )),
                DataInfo::Single { .. } | DataInfo::Scalar => {
                    Ok(SqlExpr::Subquery(Box::new(self.finish(builder))))
                }
            },
        }
    }

    /// The grouping behind the main source of `model`, if it ranges over one.
    fn grouping_source_of(&self, model: &QueryModel) -> Option<(TableId, GroupingSource)> {
        let Expr::QuerySource(name) = &model.main_from.source else {
            return None;
        };
        let Some(Binding::Value(SqlExpr::TableRef(table))) = self.lookup(name) else {
            return None;
        };
        let source = self.groupings.get(table)?.clone();
        Some((*table, source))
    }

    /// An aggregate over the elements of one group, computed inside the
    /// grouping statement and referenced by name from outside it.
    fn prepare_group_aggregate(
        &mut self,
        model: &QueryModel,
        table: TableId,
        source: GroupingSource,
    ) -> TranslationResult<SqlExpr> {
        let (distinct, last) = match model.result_operators.as_slice() {
            [ResultOperator::Distinct, last] => (true, last),
            [last] => (false, last),
            _ => {
                return Err(TranslationError::unsupported(
                    "query over a grouping without a single aggregate",
                ))
            }
        };
        let kind = match last {
            ResultOperator::Count | ResultOperator::LongCount => AggregateKind::Count,
            ResultOperator::Sum => AggregateKind::Sum,
            ResultOperator::Min => AggregateKind::Min,
            ResultOperator::Max => AggregateKind::Max,
            ResultOperator::Average => AggregateKind::Avg,
            other => {
                return Err(TranslationError::unsupported(format!(
                    "{} over a grouping",
                    other.name()
                )))
            }
        };

        let (filter, selected) = self.in_scope(|p| {
            p.bind(
                &model.main_from.item_name,
                Binding::Value(source.element.clone()),
            );
            let mut filter = None;
            for clause in &model.body_clauses {
                let BodyClause::Where(predicate) = clause else {
                    return Err(TranslationError::unsupported(
                        "clauses other than where over a grouping",
                    ));
                };
                let predicate = p.prepare_expr(predicate)?;
                filter = Some(SqlExpr::and_also(filter, predicate));
            }
            Ok((filter, p.prepare_expr(&model.select)?))
        })?;

        let value = match (kind, distinct) {
            (AggregateKind::Count, false) => None,
            _ => Some(selected),
        };
        // Filtered aggregates only see rows matching the filter.
        let arg = match (filter, value) {
            (Some(filter), Some(value)) => Some(SqlExpr::case_when(filter, value, None)),
            (Some(filter), None) => Some(SqlExpr::case_when(filter, SqlExpr::int(1), None)),
            (None, value) => value,
        };

        let name = self.ids.next_aggregate_name();
        self.group_aggregates
            .entry(source.target)
            .or_default()
            .push(NamedExpr::new(
                name.clone(),
                SqlExpr::Aggregate {
                    kind,
                    arg: arg.map(Box::new),
                    distinct,
                },
            ));
        Ok(SqlExpr::GroupAggregateRef { table, name })
    }
}
