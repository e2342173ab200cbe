//! SQL generation.
//!
//! Walks a resolved statement in textual order, emitting tokens for the
//! configured dialect and registering every constant as a command parameter
//! the moment its placeholder is written. Method calls are replaced through
//! the transformer registry as they are reached.

mod expr;
mod statement;

use std::borrow::Cow;

use crate::error::{TranslationError, TranslationResult};
use crate::model::{SqlExpr, SqlStatement};
use crate::query::Value;
use crate::sql::{Dialect, PagingStrategy, SqlCommand, SqlCommandBuilder, TokenStream};

use super::transformers::MethodCallTransformerRegistry;
use super::TranslationOptions;

/// Generate the command for a resolved statement.
pub fn generate(
    statement: &SqlStatement,
    registry: &MethodCallTransformerRegistry,
    options: &TranslationOptions,
) -> TranslationResult<SqlCommand> {
    if !statement.is_resolved() {
        return Err(TranslationError::unresolved(format!(
            "statement '{}' reached generation",
            statement
        )));
    }
    if let SqlExpr::Grouping(_) = statement.projection() {
        return Err(
            TranslationError::unsupported("grouping selected as the query result")
                .with_context(statement),
        );
    }

    let mut generator = SqlGenerator::new(registry, options.dialect, options.paging_strategy());
    generator.statement(statement, true)?;
    let command = generator.finish();
    tracing::debug!(
        dialect = %command.dialect,
        parameters = command.parameters.len(),
        "generated command"
    );
    Ok(command)
}

/// Where an expression appears; decides how booleans render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Operand of a comparison, function or arithmetic.
    Value,
    /// WHERE, ON, CASE WHEN and logical operands.
    Predicate,
    /// A projected column. Predicates always project as `1`/`0`.
    Projection,
}

pub(crate) struct SqlGenerator<'a> {
    registry: &'a MethodCallTransformerRegistry,
    dialect: Dialect,
    paging: PagingStrategy,
    command: SqlCommandBuilder,
    ts: TokenStream,
}

impl<'a> SqlGenerator<'a> {
    pub(crate) fn new(
        registry: &'a MethodCallTransformerRegistry,
        dialect: Dialect,
        paging: PagingStrategy,
    ) -> Self {
        Self {
            registry,
            dialect,
            paging,
            command: SqlCommandBuilder::new(dialect),
            ts: TokenStream::new(),
        }
    }

    pub(crate) fn finish(mut self) -> SqlCommand {
        self.command.append(&self.ts);
        self.command.build()
    }

    /// Render into a separate stream. Parameters keep their global order, so
    /// the result must be spliced in where it was rendered.
    fn detached(
        &mut self,
        render: impl FnOnce(&mut Self) -> TranslationResult<()>,
    ) -> TranslationResult<TokenStream> {
        let outer = std::mem::take(&mut self.ts);
        let result = render(self);
        let inner = std::mem::replace(&mut self.ts, outer);
        result.map(|()| inner)
    }

    fn parameter(&mut self, value: &Value) {
        let placeholder = self.command.add_parameter(value.clone());
        self.ts.push(placeholder);
    }

    /// Replace a method call by its transformation.
    fn transformed<'e>(&self, expr: &'e SqlExpr) -> TranslationResult<Cow<'e, SqlExpr>> {
        match expr {
            SqlExpr::Call(call) => Ok(Cow::Owned(self.registry.transform(call)?)),
            other => Ok(Cow::Borrowed(other)),
        }
    }
}
