//! Expression rendering.

use crate::error::{TranslationError, TranslationResult};
use crate::model::{SqlBinaryOp, SqlExpr, SqlLiteral, SqlStatement, SqlUnaryOp};
use crate::query::Value;
use crate::sql::{SqlDialect, Token};

use super::{Position, SqlGenerator};

fn binary_token(op: SqlBinaryOp) -> Token {
    match op {
        SqlBinaryOp::Eq => Token::Eq,
        SqlBinaryOp::Ne => Token::Ne,
        SqlBinaryOp::Lt => Token::Lt,
        SqlBinaryOp::Lte => Token::Lte,
        SqlBinaryOp::Gt => Token::Gt,
        SqlBinaryOp::Gte => Token::Gte,
        SqlBinaryOp::And => Token::And,
        SqlBinaryOp::Or => Token::Or,
        SqlBinaryOp::Add => Token::Plus,
        SqlBinaryOp::Sub => Token::Minus,
        SqlBinaryOp::Mul => Token::Mul,
        SqlBinaryOp::Div => Token::Div,
        SqlBinaryOp::Mod => Token::Mod,
    }
}

fn is_null_literal(expr: &SqlExpr) -> bool {
    matches!(
        expr,
        SqlExpr::Constant(Value::Null) | SqlExpr::Literal(SqlLiteral::Null)
    )
}

/// Whether a scalar subquery over `statement` yields exactly one column.
fn projects_single_column(projection: &SqlExpr) -> bool {
    match projection {
        SqlExpr::Entity(entity) => entity.columns.len() == 1,
        SqlExpr::Compound(members) => {
            members.len() == 1 && projects_single_column(&members[0].expr)
        }
        SqlExpr::Grouping(_) => false,
        SqlExpr::Named(named) => projects_single_column(&named.expr),
        _ => true,
    }
}

impl SqlGenerator<'_> {
    pub(super) fn expr(&mut self, expr: &SqlExpr, position: Position) -> TranslationResult<()> {
        let expr = self.transformed(expr)?;
        let expr = expr.as_ref();
        let is_predicate = expr.is_predicate();
        let native_booleans = self.dialect.supports_boolean_values();

        match position {
            Position::Predicate if !is_predicate && !native_booleans => {
                self.node(expr, Position::Value)?;
                self.ts
                    .space()
                    .push(Token::Eq)
                    .space()
                    .push(Token::LitInt(1));
                Ok(())
            }
            Position::Projection if is_predicate => self.predicate_as_value(expr),
            Position::Value if is_predicate && !native_booleans => {
                self.predicate_as_value(expr)
            }
            _ => self.node(expr, position),
        }
    }

    /// `CASE WHEN predicate THEN 1 ELSE 0 END`
    fn predicate_as_value(&mut self, predicate: &SqlExpr) -> TranslationResult<()> {
        self.ts.push(Token::Case).space().push(Token::When).space();
        self.node(predicate, Position::Predicate)?;
        self.ts
            .space()
            .push(Token::Then)
            .space()
            .push(Token::LitInt(1))
            .space()
            .push(Token::Else)
            .space()
            .push(Token::LitInt(0))
            .space()
            .push(Token::End);
        Ok(())
    }

    /// Binary operands are parenthesized when they are binary themselves.
    fn operand(&mut self, expr: &SqlExpr, position: Position) -> TranslationResult<()> {
        let expr = self.transformed(expr)?;
        let expr = expr.as_ref();
        if matches!(expr, SqlExpr::Binary { .. }) {
            self.ts.lparen();
            self.expr(expr, position)?;
            self.ts.rparen();
            Ok(())
        } else {
            self.expr(expr, position)
        }
    }

    fn node(&mut self, expr: &SqlExpr, position: Position) -> TranslationResult<()> {
        match expr {
            SqlExpr::Column(column) => {
                self.ts.qualified_column(&column.table_alias, &column.column_name);
            }
            SqlExpr::Entity(entity) => {
                return Err(TranslationError::unsupported(format!(
                    "{} entity used as a single value",
                    entity.item_type
                )))
            }
            SqlExpr::Constant(value) => match value {
                Value::List(_) | Value::Entity { .. } => {
                    return Err(TranslationError::unsupported(format!(
                        "{} constant used as a parameter",
                        value.value_type()
                    )))
                }
                _ => self.parameter(value),
            },
            SqlExpr::Literal(literal) => {
                self.ts.push(match literal {
                    SqlLiteral::Int(n) => Token::LitInt(*n),
                    SqlLiteral::Null => Token::LitNull,
                    SqlLiteral::Str(s) => Token::LitString((*s).to_string()),
                });
            }
            SqlExpr::Binary { op, left, right } => self.binary(*op, left, right)?,
            SqlExpr::Unary { op, operand } => {
                let (token, inner_position) = match op {
                    SqlUnaryOp::Not => (Token::Not, Position::Predicate),
                    SqlUnaryOp::Negate => (Token::Minus, Position::Value),
                };
                self.ts.push(token);
                if *op == SqlUnaryOp::Not {
                    self.ts.space();
                }
                self.ts.lparen();
                self.expr(operand, inner_position)?;
                self.ts.rparen();
            }
            SqlExpr::Call(call) => {
                let transformed = self.registry.transform(call)?;
                return self.expr(&transformed, position);
            }
            SqlExpr::Function { name, args } => {
                self.ts.push(Token::FunctionName(name.clone())).lparen();
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.ts.comma().space();
                    }
                    self.expr(arg, Position::Value)?;
                }
                self.ts.rparen();
            }
            SqlExpr::Like {
                operand,
                pattern,
                escape,
            } => {
                self.expr(operand, Position::Value)?;
                self.ts.space().push(Token::Like).space();
                self.expr(pattern, Position::Value)?;
                if let Some(escape) = escape {
                    self.ts
                        .space()
                        .push(Token::Escape)
                        .space()
                        .push(Token::LitString(escape.to_string()));
                }
            }
            SqlExpr::Case { whens, else_result } => {
                self.ts.push(Token::Case);
                for when in whens {
                    self.ts.space().push(Token::When).space();
                    self.expr(&when.condition, Position::Predicate)?;
                    self.ts.space().push(Token::Then).space();
                    self.expr(&when.result, Position::Value)?;
                }
                if let Some(else_result) = else_result {
                    self.ts.space().push(Token::Else).space();
                    self.expr(else_result, Position::Value)?;
                }
                self.ts.space().push(Token::End);
            }
            SqlExpr::IsNull { operand, negated } => {
                self.operand(operand, Position::Value)?;
                self.ts.space().push(if *negated {
                    Token::IsNotNull
                } else {
                    Token::IsNull
                });
            }
            SqlExpr::In { operand, list } => {
                if list.is_empty() {
                    // Nothing is contained in an empty list.
                    self.ts
                        .push(Token::LitInt(1))
                        .space()
                        .push(Token::Eq)
                        .space()
                        .push(Token::LitInt(0));
                    return Ok(());
                }
                self.operand(operand, Position::Value)?;
                self.ts.space().push(Token::In).space().lparen();
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        self.ts.comma().space();
                    }
                    self.expr(item, Position::Value)?;
                }
                self.ts.rparen();
            }
            SqlExpr::Exists(statement) => {
                self.ts.push(Token::Exists).lparen();
                self.statement(statement, false)?;
                self.ts.rparen();
            }
            SqlExpr::Subquery(statement) => self.scalar_subquery(statement)?,
            SqlExpr::Aggregate {
                kind,
                arg,
                distinct,
            } => {
                self.ts
                    .push(Token::FunctionName(kind.function_name().to_string()))
                    .lparen();
                if *distinct {
                    self.ts.push(Token::Distinct).space();
                }
                match arg.as_deref() {
                    None => {
                        self.ts.push(Token::Star);
                    }
                    Some(SqlExpr::Entity(entity)) => match entity.primary_key().as_slice() {
                        [key] => {
                            self.ts.qualified_column(&key.table_alias, &key.column_name);
                        }
                        _ if !*distinct => {
                            self.ts.push(Token::Star);
                        }
                        _ => {
                            return Err(TranslationError::unsupported(format!(
                                "distinct {} over {} entities with a composite key",
                                kind.function_name(),
                                entity.item_type
                            )))
                        }
                    },
                    Some(arg) => self.expr(arg, Position::Value)?,
                }
                self.ts.rparen();
            }
            SqlExpr::Compound(_) => {
                return Err(TranslationError::unsupported(
                    "anonymous type used as a single value",
                ))
            }
            SqlExpr::Grouping(_) => {
                return Err(TranslationError::unsupported("grouping used as a single value"))
            }
            SqlExpr::Named(named) => return self.expr(&named.expr, position),
            SqlExpr::TableRef(_)
            | SqlExpr::Member { .. }
            | SqlExpr::EntityConstant { .. }
            | SqlExpr::GroupAggregateRef { .. }
            | SqlExpr::OrderingKeyRef { .. } => {
                return Err(TranslationError::unresolved(expr.kind_name()))
            }
        }
        Ok(())
    }

    fn binary(
        &mut self,
        op: SqlBinaryOp,
        left: &SqlExpr,
        right: &SqlExpr,
    ) -> TranslationResult<()> {
        if matches!(op, SqlBinaryOp::Eq | SqlBinaryOp::Ne) {
            let tested = match (is_null_literal(left), is_null_literal(right)) {
                (false, true) => Some(left),
                (true, false) => Some(right),
                _ => None,
            };
            if let Some(tested) = tested {
                self.operand(tested, Position::Value)?;
                self.ts.space().push(if op == SqlBinaryOp::Eq {
                    Token::IsNull
                } else {
                    Token::IsNotNull
                });
                return Ok(());
            }
        }

        let operand_position = if op.is_logical() {
            Position::Predicate
        } else {
            Position::Value
        };
        self.operand(left, operand_position)?;
        self.ts.space().push(binary_token(op)).space();
        self.operand(right, operand_position)
    }

    fn scalar_subquery(&mut self, statement: &SqlStatement) -> TranslationResult<()> {
        if !projects_single_column(statement.projection()) {
            return Err(TranslationError::unsupported(
                "subquery projecting more than one column used as a single value",
            )
            .with_context(statement));
        }
        self.ts.lparen();
        self.statement(statement, false)?;
        self.ts.rparen();
        Ok(())
    }
}
