//! Method signatures used to dispatch method calls to SQL transformers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a called operation: declaring type, member name and
/// parameter shape.
///
/// A signature with generic arguments can be reduced to its generic
/// definition, where each argument is replaced by a positional placeholder
/// (`T0`, `T1`, ...). Transformers registered for the definition apply to
/// every instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    pub declaring_type: String,
    pub name: String,
    #[serde(default)]
    pub generic_arguments: Vec<String>,
    #[serde(default)]
    pub parameter_types: Vec<String>,
}

impl MethodSignature {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            generic_arguments: vec![],
            parameter_types: vec![],
        }
    }

    pub fn with_parameters<I, S>(mut self, parameter_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_types = parameter_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_generic_arguments<I, S>(mut self, generic_arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generic_arguments = generic_arguments.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_arguments.is_empty()
    }

    /// The open generic definition of this signature, if it is generic.
    pub fn generic_definition(&self) -> Option<MethodSignature> {
        if !self.is_generic() {
            return None;
        }
        let placeholders: Vec<String> = (0..self.generic_arguments.len())
            .map(|i| format!("T{}", i))
            .collect();
        if self.generic_arguments == placeholders {
            return None;
        }

        let parameter_types = self
            .parameter_types
            .iter()
            .map(|param| {
                let mut open = param.clone();
                for (arg, placeholder) in self.generic_arguments.iter().zip(&placeholders) {
                    if &open == arg {
                        open = placeholder.clone();
                    } else {
                        open = open.replace(&format!("<{}>", arg), &format!("<{}>", placeholder));
                    }
                }
                open
            })
            .collect();

        Some(MethodSignature {
            declaring_type: self.declaring_type.clone(),
            name: self.name.clone(),
            generic_arguments: placeholders,
            parameter_types,
        })
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)?;
        if self.is_generic() {
            write!(f, "<{}>", self.generic_arguments.join(", "))?;
        }
        write!(f, "({})", self.parameter_types.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let sig = MethodSignature::new("String", "Contains").with_parameters(["String"]);
        assert_eq!(sig.to_string(), "String.Contains(String)");
    }

    #[test]
    fn test_non_generic_has_no_definition() {
        let sig = MethodSignature::new("String", "ToLower");
        assert_eq!(sig.generic_definition(), None);
    }

    #[test]
    fn test_generic_definition() {
        let sig = MethodSignature::new("Enumerable", "Contains")
            .with_generic_arguments(["Int32"])
            .with_parameters(["IEnumerable<Int32>", "Int32"]);
        let open = sig.generic_definition().unwrap();
        assert_eq!(open.to_string(), "Enumerable.Contains<T0>(IEnumerable<T0>, T0)");
        // The definition of a definition is itself.
        assert_eq!(open.generic_definition(), None);
    }
}
