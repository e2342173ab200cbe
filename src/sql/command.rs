//! Parameterized SQL commands.

use serde::Serialize;
use std::fmt;

use super::dialect::{Dialect, SqlDialect};
use super::token::{Token, TokenStream};
use crate::query::{Value, ValueType};

/// A command parameter in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandParameter {
    /// Placeholder text as it appears in the command (`@1`, `$1`, `?`).
    pub name: String,
    pub value: Value,
    #[serde(rename = "type")]
    pub ty: ValueType,
}

/// Generated command text and its ordered parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlCommand {
    pub text: String,
    pub parameters: Vec<CommandParameter>,
    pub dialect: Dialect,
}

impl SqlCommand {
    /// `(name, value)` pairs, handy for assertions and logging.
    pub fn parameter_pairs(&self) -> Vec<(&str, &Value)> {
        self.parameters
            .iter()
            .map(|p| (p.name.as_str(), &p.value))
            .collect()
    }
}

impl fmt::Display for SqlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)?;
        for p in &self.parameters {
            write!(f, "\n-- {} = {} ({})", p.name, p.value, p.ty)?;
        }
        Ok(())
    }
}

/// Accumulates command tokens and parameters.
///
/// Placeholders are numbered in the order parameters are added, so callers
/// must add them in textual order; positional dialects depend on it.
#[derive(Debug, Clone)]
pub struct SqlCommandBuilder {
    dialect: Dialect,
    tokens: TokenStream,
    parameters: Vec<CommandParameter>,
}

impl SqlCommandBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            tokens: TokenStream::new(),
            parameters: vec![],
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Register a parameter and return its placeholder token.
    pub fn add_parameter(&mut self, value: Value) -> Token {
        let index = self.parameters.len() + 1;
        self.parameters.push(CommandParameter {
            name: self.dialect.parameter_placeholder(index),
            ty: value.value_type(),
            value,
        });
        Token::Placeholder(index)
    }

    pub fn append(&mut self, tokens: &TokenStream) -> &mut Self {
        self.tokens.append(tokens);
        self
    }

    pub fn build(self) -> SqlCommand {
        SqlCommand {
            text: self.tokens.serialize(self.dialect),
            parameters: self.parameters,
            dialect: self.dialect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_numbered_in_order() {
        let mut builder = SqlCommandBuilder::new(Dialect::TSql);
        let first = builder.add_parameter(Value::from("John"));
        let second = builder.add_parameter(Value::from(3));
        let mut ts = TokenStream::new();
        ts.push(first).space().push(second);
        builder.append(&ts);

        let command = builder.build();
        assert_eq!(command.text, "@1 @2");
        assert_eq!(
            command.parameter_pairs(),
            vec![("@1", &Value::from("John")), ("@2", &Value::from(3))]
        );
        assert_eq!(command.parameters[1].ty, ValueType::Int);
    }

    #[test]
    fn test_positional_parameters() {
        let mut builder = SqlCommandBuilder::new(Dialect::MySql);
        builder.add_parameter(Value::from(1));
        builder.add_parameter(Value::from(2));
        let command = builder.build();
        assert!(command.parameters.iter().all(|p| p.name == "?"));
    }
}
