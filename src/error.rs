//! Translation errors.
//!
//! Every stage of the pipeline reports failures through [`TranslationError`].
//! Errors are raised at the point of detection and no partial command is ever
//! returned alongside them.

/// Errors that can occur while translating a query to SQL.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranslationError {
    /// A clause, result operator or method call has no SQL translation.
    #[error("Unsupported construct: {construct}{}", describe_context(.context))]
    UnsupportedConstruct {
        construct: String,
        context: Option<String>,
    },

    /// The mapping resolver could not map a member or an entity type.
    #[error("Cannot map member '{member}' of type '{declaring_type}'")]
    UnmappedItem {
        member: String,
        declaring_type: String,
    },

    /// A semantically invalid combination of clauses.
    #[error("Invalid query: {reason}{}", describe_context(.context))]
    InvalidQuery {
        reason: String,
        context: Option<String>,
    },

    /// The mapping resolver returned inconsistent or malformed data.
    #[error("Mapping resolver contract violation: {details}")]
    ResolverContractViolation { details: String },

    /// A stage received a node that an earlier stage should have rewritten.
    #[error("Unresolved node: {node}")]
    UnresolvedNode { node: String },
}

pub type TranslationResult<T> = Result<T, TranslationError>;

fn describe_context(context: &Option<String>) -> String {
    match context {
        Some(c) => format!(" (while translating: {})", c),
        None => String::new(),
    }
}

impl TranslationError {
    pub fn unsupported(construct: impl Into<String>) -> Self {
        TranslationError::UnsupportedConstruct {
            construct: construct.into(),
            context: None,
        }
    }

    pub fn unmapped(member: impl Into<String>, declaring_type: impl Into<String>) -> Self {
        TranslationError::UnmappedItem {
            member: member.into(),
            declaring_type: declaring_type.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        TranslationError::InvalidQuery {
            reason: reason.into(),
            context: None,
        }
    }

    pub fn contract_violation(details: impl Into<String>) -> Self {
        TranslationError::ResolverContractViolation {
            details: details.into(),
        }
    }

    pub fn unresolved(node: impl Into<String>) -> Self {
        TranslationError::UnresolvedNode { node: node.into() }
    }

    /// Attach a rendering of the statement under construction.
    ///
    /// Only the first attached context is kept, so the innermost statement
    /// wins when an error propagates through nested statements.
    pub fn with_context(mut self, statement: impl std::fmt::Display) -> Self {
        match &mut self {
            TranslationError::UnsupportedConstruct { context, .. }
            | TranslationError::InvalidQuery { context, .. } => {
                if context.is_none() {
                    *context = Some(statement.to_string());
                }
            }
            _ => {}
        }
        self
    }
}
