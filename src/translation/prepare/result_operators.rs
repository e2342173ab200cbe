//! Result operators applied to the statement under construction.

use crate::error::{TranslationError, TranslationResult};
use crate::model::{
    AggregateKind, DataInfo, SetOperation, SetOperationClause, SqlExpr, SqlGrouping,
    SqlStatement, SqlStatementBuilder, SqlTable, TableInfo,
};
use crate::query::{Expr, Lambda, ResultOperator};

use super::{Binding, Prepared, Preparer};

impl Preparer<'_> {
    pub(super) fn apply_result_operator(
        &mut self,
        mut builder: SqlStatementBuilder,
        op: &ResultOperator,
    ) -> TranslationResult<Prepared> {
        if builder.data_info != DataInfo::Sequence {
            return Err(TranslationError::unsupported(format!(
                "{} after a single-row result operator",
                op.name()
            )));
        }
        tracing::trace!(operator = op.name(), "applying result operator");

        let has_set_operations = !builder.set_operations.is_empty();
        match op {
            ResultOperator::Distinct => {
                if builder.is_paged() || has_set_operations {
                    builder = self.wrap_into_substatement(builder);
                    // Distinct rows come back in no particular order.
                    builder.orderings.clear();
                }
                builder.distinct = true;
                Ok(Prepared::Statement(builder))
            }
            ResultOperator::Take(count) => {
                if builder.top.is_some() || has_set_operations {
                    builder = self.wrap_into_substatement(builder);
                }
                builder.top = Some(self.prepare_expr(count)?);
                Ok(Prepared::Statement(builder))
            }
            ResultOperator::Skip(count) => {
                if builder.is_paged() || has_set_operations {
                    builder = self.wrap_into_substatement(builder);
                }
                builder.skip = Some(self.prepare_expr(count)?);
                Ok(Prepared::Statement(builder))
            }
            ResultOperator::First { or_default } => {
                self.single_row(builder, 1, DataInfo::Single { or_default: *or_default })
            }
            ResultOperator::Single { or_default } => {
                // Two rows are fetched so the caller can detect a second match.
                self.single_row(builder, 2, DataInfo::Single { or_default: *or_default })
            }
            ResultOperator::Count | ResultOperator::LongCount => {
                self.aggregate(builder, AggregateKind::Count)
            }
            ResultOperator::Sum => self.aggregate(builder, AggregateKind::Sum),
            ResultOperator::Min => self.aggregate(builder, AggregateKind::Min),
            ResultOperator::Max => self.aggregate(builder, AggregateKind::Max),
            ResultOperator::Average => self.aggregate(builder, AggregateKind::Avg),
            ResultOperator::Any => {
                let statement = self.existence_statement(builder);
                Ok(Prepared::Expression(SqlExpr::Exists(Box::new(statement))))
            }
            ResultOperator::All(predicate) => {
                if builder.is_paged() || has_set_operations {
                    builder = self.wrap_into_substatement(builder);
                }
                let predicate = self.apply_lambda(predicate, &builder.projection)?;
                builder.add_where(not_known_true(predicate));
                let statement = self.existence_statement(builder);
                Ok(Prepared::Expression(SqlExpr::not(SqlExpr::Exists(Box::new(
                    statement,
                )))))
            }
            ResultOperator::Contains(item) => {
                if builder.is_paged() || has_set_operations {
                    builder = self.wrap_into_substatement(builder);
                }
                let item = self.prepare_expr(item)?;
                let projection = builder.projection.clone();
                builder.add_where(SqlExpr::eq(projection, item));
                let statement = self.existence_statement(builder);
                Ok(Prepared::Expression(SqlExpr::Exists(Box::new(statement))))
            }
            ResultOperator::GroupBy { key, element } => {
                if builder.is_paged()
                    || builder.distinct
                    || !builder.group_by.is_empty()
                    || has_set_operations
                    || matches!(builder.projection, SqlExpr::Grouping(_))
                {
                    builder = self.wrap_into_substatement(builder);
                }
                let key = self.apply_lambda(key, &builder.projection)?;
                let element = match element {
                    Some(selector) => self.apply_lambda(selector, &builder.projection)?,
                    None => builder.projection.clone(),
                };
                builder.group_by = match &key {
                    SqlExpr::Compound(members) => members.iter().map(|m| m.expr.clone()).collect(),
                    other => vec![other.clone()],
                };
                builder.orderings.clear();
                builder.projection = SqlExpr::Grouping(Box::new(SqlGrouping {
                    key,
                    element: Some(element),
                    aggregates: vec![],
                }));
                Ok(Prepared::Statement(builder))
            }
            // Casting the sequence leaves the rows unchanged.
            ResultOperator::Cast(_) => Ok(Prepared::Statement(builder)),
            ResultOperator::Union(source) => {
                self.set_operation(builder, SetOperation::Union, source)
            }
            ResultOperator::Concat(source) => {
                self.set_operation(builder, SetOperation::UnionAll, source)
            }
            ResultOperator::Intersect(source) => {
                self.set_operation(builder, SetOperation::Intersect, source)
            }
            ResultOperator::Except(source) => {
                self.set_operation(builder, SetOperation::Except, source)
            }
            ResultOperator::DefaultIfEmpty => Err(TranslationError::unsupported(
                "DefaultIfEmpty outside a group join",
            )),
            ResultOperator::OfType(item_type) => Err(TranslationError::unsupported(format!(
                "OfType<{}>",
                item_type
            ))),
            ResultOperator::Last { .. } | ResultOperator::Reverse | ResultOperator::Aggregate => {
                Err(TranslationError::unsupported(op.name()))
            }
        }
    }

    /// Evaluate `lambda` with its parameter bound to `argument`.
    fn apply_lambda(&mut self, lambda: &Lambda, argument: &SqlExpr) -> TranslationResult<SqlExpr> {
        self.in_scope(|p| {
            p.bind(&lambda.parameter, Binding::Value(argument.clone()));
            p.prepare_expr(&lambda.body)
        })
    }

    fn single_row(
        &mut self,
        mut builder: SqlStatementBuilder,
        rows: i64,
        data_info: DataInfo,
    ) -> TranslationResult<Prepared> {
        if builder.top.is_some() || !builder.set_operations.is_empty() {
            builder = self.wrap_into_substatement(builder);
        }
        builder.top = Some(SqlExpr::int(rows));
        builder.data_info = data_info;
        Ok(Prepared::Statement(builder))
    }

    fn aggregate(
        &mut self,
        mut builder: SqlStatementBuilder,
        kind: AggregateKind,
    ) -> TranslationResult<Prepared> {
        if builder.distinct
            || builder.is_paged()
            || !builder.group_by.is_empty()
            || !builder.set_operations.is_empty()
            || matches!(builder.projection, SqlExpr::Grouping(_))
        {
            builder = self.wrap_into_substatement(builder);
        }
        let arg = match kind {
            AggregateKind::Count => None,
            _ => Some(Box::new(builder.projection.clone())),
        };
        builder.projection = SqlExpr::Aggregate {
            kind,
            arg,
            distinct: false,
        };
        builder.orderings.clear();
        builder.data_info = DataInfo::Scalar;
        Ok(Prepared::Statement(builder))
    }

    /// Freeze `builder` for use inside EXISTS; row order is irrelevant there
    /// unless paging depends on it.
    fn existence_statement(&mut self, mut builder: SqlStatementBuilder) -> SqlStatement {
        if !builder.is_paged() {
            builder.orderings.clear();
        }
        self.finish(builder)
    }

    fn set_operation(
        &mut self,
        mut builder: SqlStatementBuilder,
        operation: SetOperation,
        source: &Expr,
    ) -> TranslationResult<Prepared> {
        if builder.is_paged() {
            builder = self.wrap_into_substatement(builder);
        }
        builder.orderings.clear();

        let mut second = match source {
            Expr::Table { item_type } => {
                let id = self.ids.next_table_id();
                let mut second = SqlStatementBuilder::new(SqlExpr::TableRef(id));
                second.tables.push(SqlTable::new(
                    id,
                    TableInfo::Unresolved {
                        item_type: item_type.clone(),
                    },
                ));
                second
            }
            Expr::SubQuery(model) => match self.prepare_query(model)? {
                Prepared::Statement(second) => second,
                Prepared::Expression(_) => {
                    return Err(TranslationError::unsupported(
                        "scalar subquery as a set operand",
                    ))
                }
            },
            _ => {
                return Err(TranslationError::unsupported(
                    "set operand that is neither a table nor a query",
                ))
            }
        };
        if second.data_info != DataInfo::Sequence {
            return Err(TranslationError::unsupported(
                "single-row query as a set operand",
            ));
        }
        if second.is_paged() {
            second = self.wrap_into_substatement(second);
        }
        second.orderings.clear();

        let statement = self.finish(second);
        builder.set_operations.push(SetOperationClause {
            operation,
            statement,
        });
        Ok(Prepared::Statement(builder))
    }
}

/// Holds for rows where `predicate` is false or unknown.
fn not_known_true(predicate: SqlExpr) -> SqlExpr {
    let truth = SqlExpr::case_when(predicate, SqlExpr::int(1), Some(SqlExpr::int(0)));
    SqlExpr::eq(truth, SqlExpr::int(0))
}

#[cfg(test)]
mod tests {
    use crate::error::TranslationError;
    use crate::model::{self, AggregateKind, DataInfo, SqlExpr, SqlOrdering, TableInfo};
    use crate::query::{Expr, Lambda, OrderingDirection, QueryModel, ResultOperator};
    use crate::translation::identifiers::UniqueIdentifierGenerator;
    use crate::translation::prepare::prepare;

    fn cooks() -> QueryModel {
        QueryModel::from_table("c", "Cook")
    }

    fn prepare_model(model: &QueryModel) -> crate::error::TranslationResult<crate::model::SqlStatement> {
        prepare(model, &mut UniqueIdentifierGenerator::new())
    }

    #[test]
    fn test_take_then_skip_share_statement() {
        let model = cooks()
            .with_order_by(Expr::source("c").member("Name"), OrderingDirection::Asc)
            .with_result_operator(ResultOperator::Skip(Expr::constant(10)))
            .with_result_operator(ResultOperator::Take(Expr::constant(5)));
        let statement = prepare_model(&model).unwrap();
        assert!(statement.top().is_some());
        assert!(statement.skip().is_some());
        assert_eq!(statement.tables().len(), 1);
        assert!(matches!(statement.tables()[0].info, TableInfo::Unresolved { .. }));
    }

    #[test]
    fn test_distinct_after_take_wraps() {
        let model = cooks()
            .with_result_operator(ResultOperator::Take(Expr::constant(5)))
            .with_result_operator(ResultOperator::Distinct);
        let statement = prepare_model(&model).unwrap();
        assert!(statement.is_distinct());
        assert!(statement.top().is_none());
        let TableInfo::UnresolvedSubStatement(inner) = &statement.tables()[0].info else {
            panic!("expected nested statement");
        };
        assert!(inner.top().is_some());
    }

    #[test]
    fn test_paged_order_moves_to_the_wrapping_statement() {
        let model = cooks()
            .with_order_by(Expr::source("c").member("Name"), OrderingDirection::Desc)
            .with_result_operator(ResultOperator::Take(Expr::constant(10)))
            .with_result_operator(ResultOperator::Skip(Expr::constant(5)));
        let statement = prepare_model(&model).unwrap();

        let TableInfo::UnresolvedSubStatement(inner) = &statement.tables()[0].info else {
            panic!("expected nested statement");
        };
        assert_eq!(inner.orderings().len(), 1);
        assert_eq!(
            statement.orderings(),
            &[SqlOrdering {
                expr: SqlExpr::OrderingKeyRef {
                    table: statement.tables()[0].id,
                    index: 0,
                },
                direction: model::OrderingDirection::Desc,
            }]
        );
    }

    #[test]
    fn test_distinct_drops_wrapped_order() {
        let model = cooks()
            .with_order_by(Expr::source("c").member("Name"), OrderingDirection::Asc)
            .with_result_operator(ResultOperator::Take(Expr::constant(10)))
            .with_result_operator(ResultOperator::Distinct);
        let statement = prepare_model(&model).unwrap();
        assert!(statement.orderings().is_empty());
    }

    #[test]
    fn test_first_sets_single_row() {
        let model = cooks().with_result_operator(ResultOperator::First { or_default: true });
        let statement = prepare_model(&model).unwrap();
        assert_eq!(statement.top(), Some(&SqlExpr::int(1)));
        assert_eq!(statement.data_info(), DataInfo::Single { or_default: true });
    }

    #[test]
    fn test_single_fetches_two_rows() {
        let model = cooks().with_result_operator(ResultOperator::Single { or_default: false });
        let statement = prepare_model(&model).unwrap();
        assert_eq!(statement.top(), Some(&SqlExpr::int(2)));
    }

    #[test]
    fn test_count_clears_orderings() {
        let model = cooks()
            .with_order_by(Expr::source("c").member("Name"), OrderingDirection::Asc)
            .with_result_operator(ResultOperator::Count);
        let statement = prepare_model(&model).unwrap();
        assert!(statement.orderings().is_empty());
        assert_eq!(statement.data_info(), DataInfo::Scalar);
        assert_eq!(
            statement.projection(),
            &SqlExpr::Aggregate {
                kind: AggregateKind::Count,
                arg: None,
                distinct: false
            }
        );
    }

    #[test]
    fn test_count_after_distinct_wraps() {
        let model = cooks()
            .with_select(Expr::source("c").member("Name"))
            .with_result_operator(ResultOperator::Distinct)
            .with_result_operator(ResultOperator::Count);
        let statement = prepare_model(&model).unwrap();
        assert!(!statement.is_distinct());
        assert!(matches!(
            statement.tables()[0].info,
            TableInfo::UnresolvedSubStatement(_)
        ));
    }

    #[test]
    fn test_top_level_any_is_scalar_exists() {
        let model = cooks().with_result_operator(ResultOperator::Any);
        let statement = prepare_model(&model).unwrap();
        assert_eq!(statement.data_info(), DataInfo::Scalar);
        assert!(statement.tables().is_empty());
        assert!(matches!(statement.projection(), SqlExpr::Exists(_)));
    }

    #[test]
    fn test_all_looks_for_rows_not_known_to_match() {
        let model = cooks().with_result_operator(ResultOperator::All(Lambda::new(
            "x",
            Expr::source("x").member("IsStarred").eq(Expr::constant(true)),
        )));
        let statement = prepare_model(&model).unwrap();
        let SqlExpr::Unary { operand, .. } = statement.projection() else {
            panic!("expected NOT EXISTS");
        };
        let SqlExpr::Exists(inner) = operand.as_ref() else {
            panic!("expected EXISTS");
        };
        let Some(SqlExpr::Binary { left, right, .. }) = inner.where_condition() else {
            panic!("expected a comparison");
        };
        assert!(matches!(left.as_ref(), SqlExpr::Case { .. }));
        assert_eq!(right.as_ref(), &SqlExpr::int(0));
    }

    #[test]
    fn test_operator_after_first_is_unsupported() {
        let model = cooks()
            .with_result_operator(ResultOperator::First { or_default: false })
            .with_result_operator(ResultOperator::Distinct);
        let err = prepare_model(&model).unwrap_err();
        assert!(matches!(err, TranslationError::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_unsupported_operators_are_named() {
        for op in [
            ResultOperator::Reverse,
            ResultOperator::Last { or_default: false },
            ResultOperator::Aggregate,
            ResultOperator::DefaultIfEmpty,
        ] {
            let name = op.name();
            let err = prepare_model(&cooks().with_result_operator(op)).unwrap_err();
            assert!(err.to_string().contains(name), "{}", err);
        }
    }

    #[test]
    fn test_union_clears_branch_orderings() {
        let other = cooks()
            .with_order_by(Expr::source("c").member("Name"), OrderingDirection::Asc);
        let model = cooks()
            .with_order_by(Expr::source("c").member("Name"), OrderingDirection::Desc)
            .with_result_operator(ResultOperator::Union(Expr::subquery(other)));
        let statement = prepare_model(&model).unwrap();
        assert!(statement.orderings().is_empty());
        assert_eq!(statement.set_operations().len(), 1);
        assert!(statement.set_operations()[0].statement.orderings().is_empty());
    }

    #[test]
    fn test_group_by_compound_key() {
        let model = cooks().with_result_operator(ResultOperator::GroupBy {
            key: Lambda::new(
                "c",
                Expr::new_object([
                    ("Kitchen", Expr::source("c").member("KitchenID")),
                    ("Starred", Expr::source("c").member("IsStarred")),
                ]),
            ),
            element: None,
        });
        let statement = prepare_model(&model).unwrap();
        assert_eq!(statement.group_by().len(), 2);
        assert!(matches!(statement.projection(), SqlExpr::Grouping(_)));
    }
}
