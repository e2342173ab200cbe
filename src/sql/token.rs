//! Output tokens for generated SELECT statements.
//!
//! The generator never writes SQL text directly. It pushes tokens into a
//! [`TokenStream`], and the stream is rendered once for the target dialect,
//! which decides quoting, placeholders and function names.

use super::dialect::{Dialect, SqlDialect};

/// One element of a generated statement.
///
/// Keywords, punctuation and operators render the same in every dialect;
/// identifiers, literals, placeholders and function names do not.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Clauses and keywords
    Select,
    Distinct,
    Top,
    From,
    Where,
    GroupBy,
    OrderBy,
    Asc,
    Desc,
    As,
    Join,
    Inner,
    Left,
    Cross,
    Apply,
    Lateral,
    On,
    Limit,
    Offset,
    Fetch,
    Next,
    First,
    Rows,
    Only,
    Union,
    All,
    Intersect,
    Except,

    // Predicates and conditionals
    And,
    Or,
    Not,
    In,
    Like,
    Escape,
    IsNull,
    IsNotNull,
    Exists,
    Case,
    When,
    Then,
    Else,
    End,

    Comma,
    Dot,
    Star,
    LParen,
    RParen,
    Space,

    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,

    /// Table, column or alias name, quoted per dialect.
    Ident(String),
    /// `schema.name`, or `name` alone.
    QualifiedIdent {
        schema: Option<String>,
        name: String,
    },
    /// Integer chosen by the translator, e.g. `TOP (1)`.
    LitInt(i64),
    /// String chosen by the translator, e.g. a LIKE wildcard.
    LitString(String),
    LitNull,
    /// 1-based command parameter.
    Placeholder(usize),
    /// Remapped per dialect, e.g. `LENGTH` becomes `LEN` on T-SQL.
    FunctionName(String),
    /// Emitted verbatim. Query values must travel as placeholders instead.
    Raw(String),
}

impl Token {
    /// Text of tokens that render identically in every dialect.
    fn fixed(&self) -> Option<&'static str> {
        let text = match self {
            Token::Select => "SELECT",
            Token::Distinct => "DISTINCT",
            Token::Top => "TOP",
            Token::From => "FROM",
            Token::Where => "WHERE",
            Token::GroupBy => "GROUP BY",
            Token::OrderBy => "ORDER BY",
            Token::Asc => "ASC",
            Token::Desc => "DESC",
            Token::As => "AS",
            Token::Join => "JOIN",
            Token::Inner => "INNER",
            Token::Left => "LEFT",
            Token::Cross => "CROSS",
            Token::Apply => "APPLY",
            Token::Lateral => "LATERAL",
            Token::On => "ON",
            Token::Limit => "LIMIT",
            Token::Offset => "OFFSET",
            Token::Fetch => "FETCH",
            Token::Next => "NEXT",
            Token::First => "FIRST",
            Token::Rows => "ROWS",
            Token::Only => "ONLY",
            Token::Union => "UNION",
            Token::All => "ALL",
            Token::Intersect => "INTERSECT",
            Token::Except => "EXCEPT",
            Token::And => "AND",
            Token::Or => "OR",
            Token::Not => "NOT",
            Token::In => "IN",
            Token::Like => "LIKE",
            Token::Escape => "ESCAPE",
            Token::IsNull => "IS NULL",
            Token::IsNotNull => "IS NOT NULL",
            Token::Exists => "EXISTS",
            Token::Case => "CASE",
            Token::When => "WHEN",
            Token::Then => "THEN",
            Token::Else => "ELSE",
            Token::End => "END",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Star => "*",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Space => " ",
            Token::Eq => "=",
            Token::Ne => "<>",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Lte => "<=",
            Token::Gte => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Mul => "*",
            Token::Div => "/",
            Token::Mod => "%",
            Token::LitNull => "NULL",
            Token::Ident(_)
            | Token::QualifiedIdent { .. }
            | Token::LitInt(_)
            | Token::LitString(_)
            | Token::Placeholder(_)
            | Token::FunctionName(_)
            | Token::Raw(_) => return None,
        };
        Some(text)
    }

    /// Render this token for `dialect`.
    pub fn serialize(&self, dialect: Dialect) -> String {
        if let Some(text) = self.fixed() {
            return text.to_string();
        }
        match self {
            Token::Ident(name) => dialect.quote_identifier(name),
            Token::QualifiedIdent {
                schema: Some(schema),
                name,
            } => format!(
                "{}.{}",
                dialect.quote_identifier(schema),
                dialect.quote_identifier(name)
            ),
            Token::QualifiedIdent { schema: None, name } => dialect.quote_identifier(name),
            Token::LitInt(n) => n.to_string(),
            Token::LitString(s) => dialect.quote_string(s),
            Token::Placeholder(index) => dialect.parameter_placeholder(*index),
            Token::FunctionName(name) => dialect
                .remap_function(name)
                .unwrap_or(name.as_str())
                .to_uppercase(),
            Token::Raw(sql) => sql.clone(),
            _ => String::new(),
        }
    }
}

/// Tokens of a statement or fragment, built with chained calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend_from_slice(&other.tokens);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn serialize(&self, dialect: Dialect) -> String {
        self.tokens.iter().map(|t| t.serialize(dialect)).collect()
    }

    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }

    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }

    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }

    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }

    /// `alias.column`, both quoted.
    pub fn qualified_column(&mut self, alias: &str, column: &str) -> &mut Self {
        self.push(Token::Ident(alias.to_string()))
            .push(Token::Dot)
            .push(Token::Ident(column.to_string()))
    }
}
