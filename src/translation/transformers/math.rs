//! Built-in transformers for `Math` functions.

use super::{argument, FunctionTransformer, MethodCallTransformerRegistry};
use crate::error::TranslationResult;
use crate::model::{MethodCall, SqlExpr};
use crate::query::MethodSignature;

const NUMERIC_TYPES: [&str; 4] = ["Int32", "Int64", "Double", "Decimal"];
const FRACTIONAL_TYPES: [&str; 2] = ["Double", "Decimal"];

fn math_method(name: &str, parameters: &[&str]) -> MethodSignature {
    MethodSignature::new("Math", name).with_parameters(parameters.iter().copied())
}

pub(super) fn register(registry: &mut MethodCallTransformerRegistry) {
    for ty in NUMERIC_TYPES {
        registry.register_builtin(math_method("Abs", &[ty]), FunctionTransformer::new("ABS"));
    }
    for ty in FRACTIONAL_TYPES {
        registry.register_builtin(math_method("Round", &[ty]), round);
        registry.register_builtin(
            math_method("Round", &[ty, "Int32"]),
            FunctionTransformer::new("ROUND"),
        );
        registry.register_builtin(math_method("Floor", &[ty]), FunctionTransformer::new("FLOOR"));
        registry.register_builtin(
            math_method("Ceiling", &[ty]),
            FunctionTransformer::new("CEILING"),
        );
    }
}

/// `Math.Round(x)` rounds to zero decimals.
fn round(call: &MethodCall) -> TranslationResult<SqlExpr> {
    Ok(SqlExpr::function(
        "ROUND",
        vec![argument(call, 0)?, SqlExpr::int(0)],
    ))
}
