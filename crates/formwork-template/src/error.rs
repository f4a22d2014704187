/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template loading, schema building, and rendering.

use formwork_schema::{ParameterErrors, SchemaError};
use thiserror::Error;

/// Errors that can occur during template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A `{{` with no closing `}}` before end of input.
    #[error("Unterminated tag at byte {position}")]
    UnterminatedTag { position: usize },

    /// A tag whose name is empty after trimming.
    #[error("Empty tag name at byte {position}")]
    EmptyTagName { position: usize },

    /// A tag name annotation that matches neither the type-suffix nor the
    /// external-reference grammar.
    #[error("Invalid tag annotation '{name}' at byte {position}")]
    InvalidAnnotation { name: String, position: usize },

    /// A close tag with no matching open section.
    #[error("Close tag '{name}' at byte {position} has no matching open section")]
    UnmatchedSectionClose { name: String, position: usize },

    /// A section still open at end of input.
    #[error("Section '{name}' is never closed")]
    UnclosedSection { name: String },

    /// A structured document without a string `template` body.
    #[error("Structured document has no template body")]
    MissingTemplateBody,

    /// A partial tag referencing a definition that does not exist.
    #[error("Partial not found: {name}")]
    PartialNotFound { name: String },

    /// Recursive partial inclusion detected.
    #[error("Recursive partial inclusion detected (depth > {max_depth}): {name}")]
    RecursivePartial { name: String, max_depth: usize },

    /// Error building the parameters schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A supplied parameters object failed validation.
    #[error(transparent)]
    Validation(#[from] ParameterErrors),

    /// Malformed structured document.
    #[error("Invalid document: {0}")]
    Document(#[from] serde_yaml::Error),

    /// Malformed serialized template or unserializable value.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;
