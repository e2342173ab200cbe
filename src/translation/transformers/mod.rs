//! Method-call transformer registry.
//!
//! Every method call that survives into the resolved statement is looked up
//! here at generation time and replaced by the SQL expression its
//! transformer produces.
//!
//! Lookup order for a call signature:
//!
//! 1. custom transformer registered for the exact signature
//! 2. built-in transformer for the exact signature
//! 3. custom transformer for the generic definition
//! 4. built-in transformer for the generic definition
//!
//! A call with no match fails translation with an unsupported-construct
//! error naming the signature.

mod math;
mod string;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{TranslationError, TranslationResult};
use crate::model::{MethodCall, SqlExpr};
use crate::query::MethodSignature;

/// Turns one method call into a SQL expression.
///
/// Transformers receive the call with instance and arguments already
/// resolved; they never see query-level nodes.
pub trait MethodCallTransformer: Send + Sync {
    fn transform(&self, call: &MethodCall) -> TranslationResult<SqlExpr>;
}

impl<F> MethodCallTransformer for F
where
    F: Fn(&MethodCall) -> TranslationResult<SqlExpr> + Send + Sync,
{
    fn transform(&self, call: &MethodCall) -> TranslationResult<SqlExpr> {
        self(call)
    }
}

/// Maps a call onto a SQL function taking the instance (if any) followed
/// by the arguments.
#[derive(Debug, Clone, Copy)]
pub struct FunctionTransformer {
    function: &'static str,
}

impl FunctionTransformer {
    pub const fn new(function: &'static str) -> Self {
        Self { function }
    }
}

impl MethodCallTransformer for FunctionTransformer {
    fn transform(&self, call: &MethodCall) -> TranslationResult<SqlExpr> {
        let mut args = Vec::with_capacity(call.arguments.len() + 1);
        if let Some(instance) = &call.instance {
            args.push((**instance).clone());
        }
        args.extend(call.arguments.iter().cloned());
        Ok(SqlExpr::function(self.function, args))
    }
}

/// Registry of method-call transformers keyed by signature.
///
/// Built once and shared read-only across translations.
#[derive(Clone, Default)]
pub struct MethodCallTransformerRegistry {
    custom: HashMap<MethodSignature, Arc<dyn MethodCallTransformer>>,
    builtin: HashMap<MethodSignature, Arc<dyn MethodCallTransformer>>,
}

impl MethodCallTransformerRegistry {
    /// An empty registry with no built-in transformers.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in string and math transformers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Add the built-in transformers.
    pub fn register_defaults(&mut self) -> &mut Self {
        string::register(self);
        math::register(self);
        self
    }

    /// Register a custom transformer for `signature`.
    ///
    /// Custom transformers take precedence over built-ins. When the same
    /// signature is registered twice the first registration stays.
    pub fn register(
        &mut self,
        signature: MethodSignature,
        transformer: impl MethodCallTransformer + 'static,
    ) -> &mut Self {
        if self.custom.contains_key(&signature) {
            tracing::debug!(%signature, "ignoring duplicate transformer registration");
        } else {
            self.custom.insert(signature, Arc::new(transformer));
        }
        self
    }

    pub(crate) fn register_builtin(
        &mut self,
        signature: MethodSignature,
        transformer: impl MethodCallTransformer + 'static,
    ) {
        self.builtin
            .entry(signature)
            .or_insert_with(|| Arc::new(transformer));
    }

    /// Find the transformer for `signature`.
    pub fn lookup(&self, signature: &MethodSignature) -> Option<&dyn MethodCallTransformer> {
        if let Some(t) = self
            .custom
            .get(signature)
            .or_else(|| self.builtin.get(signature))
        {
            return Some(t.as_ref());
        }
        let definition = signature.generic_definition()?;
        self.custom
            .get(&definition)
            .or_else(|| self.builtin.get(&definition))
            .map(|t| t.as_ref())
    }

    pub fn contains(&self, signature: &MethodSignature) -> bool {
        self.lookup(signature).is_some()
    }

    pub fn len(&self) -> usize {
        self.custom.len() + self.builtin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.custom.is_empty() && self.builtin.is_empty()
    }

    /// Transform `call` with its registered transformer.
    pub fn transform(&self, call: &MethodCall) -> TranslationResult<SqlExpr> {
        match self.lookup(&call.signature) {
            Some(transformer) => transformer.transform(call),
            None => Err(TranslationError::unsupported(format!(
                "method {}",
                call.signature
            ))),
        }
    }
}

impl fmt::Debug for MethodCallTransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodCallTransformerRegistry")
            .field("custom", &self.custom.len())
            .field("builtin", &self.builtin.len())
            .finish()
    }
}

// =============================================================================
// Shared argument helpers
// =============================================================================

pub(crate) fn instance(call: &MethodCall) -> TranslationResult<SqlExpr> {
    call.instance
        .as_deref()
        .cloned()
        .ok_or_else(|| {
            TranslationError::invalid(format!("{} called without an instance", call.signature))
        })
}

pub(crate) fn argument(call: &MethodCall, index: usize) -> TranslationResult<SqlExpr> {
    call.arguments.get(index).cloned().ok_or_else(|| {
        TranslationError::invalid(format!(
            "{} expects an argument at position {}",
            call.signature, index
        ))
    })
}
