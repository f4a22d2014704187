//! Error types for schema building and parameter validation.

use thiserror::Error;

/// Errors that can occur while building a parameters schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// An external schema reference was encountered but no provider was supplied.
    #[error("no schema provider available to resolve reference for '{name}'")]
    NoProvider { name: String },

    /// The provider had no definition for an external schema reference.
    #[error("unresolved schema reference '{schema_name}:{definition_name}' for '{name}'")]
    UnresolvedReference {
        name: String,
        schema_name: String,
        definition_name: String,
    },

    /// Two different explicit types were declared for the same name.
    #[error("conflicting type declarations for '{name}': '{declared}' vs '{conflicting}'")]
    ConflictingType {
        name: String,
        declared: String,
        conflicting: String,
    },
}

/// A single validation failure for a supplied parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterError {
    /// Path to the offending field (e.g. `section.foo` or `values.[2]`).
    pub path: String,
    /// What was wrong with it.
    pub message: String,
}

impl std::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A supplied parameters object failed validation against the schema.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parameter validation failed: {}", format_parameter_errors(.errors))]
pub struct ParameterErrors {
    pub errors: Vec<ParameterError>,
}

fn format_parameter_errors(errors: &[ParameterError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
