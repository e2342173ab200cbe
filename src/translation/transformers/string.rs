//! Built-in transformers for `String` members.

use regex::Regex;
use std::sync::LazyLock;

use super::{argument, instance, FunctionTransformer, MethodCallTransformerRegistry};
use crate::error::TranslationResult;
use crate::model::{MethodCall, SqlBinaryOp, SqlExpr, SqlLiteral};
use crate::query::{MethodSignature, Value};

/// Escape character used for LIKE patterns built from constants.
pub const LIKE_ESCAPE: char = '\\';

static LIKE_WILDCARDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\\%_\[]").unwrap());

/// Escape LIKE wildcards so `value` matches literally.
pub fn escape_like(value: &str) -> String {
    LIKE_WILDCARDS.replace_all(value, r"\$0").into_owned()
}

fn string_method(name: &str, parameters: &[&str]) -> MethodSignature {
    MethodSignature::new("String", name).with_parameters(parameters.iter().copied())
}

pub(super) fn register(registry: &mut MethodCallTransformerRegistry) {
    registry.register_builtin(string_method("Contains", &["String"]), contains);
    registry.register_builtin(string_method("StartsWith", &["String"]), starts_with);
    registry.register_builtin(string_method("EndsWith", &["String"]), ends_with);

    registry.register_builtin(string_method("ToUpper", &[]), FunctionTransformer::new("UPPER"));
    registry.register_builtin(string_method("ToLower", &[]), FunctionTransformer::new("LOWER"));
    registry.register_builtin(string_method("Trim", &[]), FunctionTransformer::new("TRIM"));
    registry.register_builtin(string_method("get_Length", &[]), FunctionTransformer::new("LENGTH"));
    registry.register_builtin(
        string_method("Replace", &["String", "String"]),
        FunctionTransformer::new("REPLACE"),
    );

    registry.register_builtin(string_method("Substring", &["Int32"]), substring_from);
    registry.register_builtin(string_method("Substring", &["Int32", "Int32"]), substring);

    registry.register_builtin(string_method("Equals", &["String"]), equals);
    registry.register_builtin(string_method("IsNullOrEmpty", &["String"]), is_null_or_empty);

    for arity in 2..=4 {
        registry.register_builtin(
            string_method("Concat", &vec!["String"; arity]),
            FunctionTransformer::new("CONCAT"),
        );
    }
}

/// `operand LIKE pattern`, wrapping `needle` in `%` on the requested sides.
///
/// Constant needles are escaped and folded into a single parameter; other
/// needles are concatenated with the wildcards in SQL and match as patterns.
fn like(call: &MethodCall, leading: bool, trailing: bool) -> TranslationResult<SqlExpr> {
    let operand = instance(call)?;
    let needle = argument(call, 0)?;

    let (pattern, escape) = match needle {
        SqlExpr::Constant(Value::String(s)) => {
            let mut pattern = String::new();
            if leading {
                pattern.push('%');
            }
            pattern.push_str(&escape_like(&s));
            if trailing {
                pattern.push('%');
            }
            (SqlExpr::Constant(Value::String(pattern)), Some(LIKE_ESCAPE))
        }
        other => {
            let mut parts = vec![];
            if leading {
                parts.push(SqlExpr::Literal(SqlLiteral::Str("%")));
            }
            parts.push(other);
            if trailing {
                parts.push(SqlExpr::Literal(SqlLiteral::Str("%")));
            }
            (SqlExpr::function("CONCAT", parts), None)
        }
    };

    Ok(SqlExpr::Like {
        operand: Box::new(operand),
        pattern: Box::new(pattern),
        escape,
    })
}

fn contains(call: &MethodCall) -> TranslationResult<SqlExpr> {
    like(call, true, true)
}

fn starts_with(call: &MethodCall) -> TranslationResult<SqlExpr> {
    like(call, false, true)
}

fn ends_with(call: &MethodCall) -> TranslationResult<SqlExpr> {
    like(call, true, false)
}

/// Zero-based start index becomes SQL's one-based position.
fn one_based(start: SqlExpr) -> SqlExpr {
    match start {
        SqlExpr::Literal(SqlLiteral::Int(n)) => SqlExpr::int(n + 1),
        other => SqlExpr::binary(SqlBinaryOp::Add, other, SqlExpr::int(1)),
    }
}

fn substring_from(call: &MethodCall) -> TranslationResult<SqlExpr> {
    let operand = instance(call)?;
    let start = one_based(argument(call, 0)?);
    let length = SqlExpr::function("LENGTH", vec![operand.clone()]);
    Ok(SqlExpr::function("SUBSTRING", vec![operand, start, length]))
}

fn substring(call: &MethodCall) -> TranslationResult<SqlExpr> {
    let operand = instance(call)?;
    let start = one_based(argument(call, 0)?);
    let length = argument(call, 1)?;
    Ok(SqlExpr::function("SUBSTRING", vec![operand, start, length]))
}

fn equals(call: &MethodCall) -> TranslationResult<SqlExpr> {
    Ok(SqlExpr::eq(instance(call)?, argument(call, 0)?))
}

fn is_null_or_empty(call: &MethodCall) -> TranslationResult<SqlExpr> {
    let operand = argument(call, 0)?;
    Ok(SqlExpr::binary(
        SqlBinaryOp::Or,
        SqlExpr::is_null(operand.clone()),
        SqlExpr::eq(operand, SqlExpr::Literal(SqlLiteral::Str(""))),
    ))
}
