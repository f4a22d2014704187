/*
 * tag.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tag types.
//!
//! A scanned template is an ordered sequence of tags. Literal text between
//! tags is preserved verbatim so rendering can reproduce source spacing
//! byte-for-byte.

use serde_json::{Value, json};

/// An ordered element of a template scan.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    /// Literal text, emitted as-is.
    Literal(String),

    /// Variable interpolation: `{{name}}`, `{{name::type}}`, `{{name:s:d}}`,
    /// or the dot `{{.}}`.
    Variable(TagName),

    /// Section open: `{{#name}}`
    SectionOpen(TagName),

    /// Inverted section open: `{{^name}}`
    InvertedOpen(TagName),

    /// Section close: `{{/name}}`. Carries the base name only.
    SectionClose(String),

    /// Partial: `{{> name}}`. `indent` is empty when scanned; the renderer
    /// fills it for standalone partial lines.
    Partial { name: String, indent: String },

    /// Comment: `{{! text }}`. Skipped for schema and render purposes.
    Comment(String),
}

/// A tag name with its optional annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct TagName {
    pub name: String,
    pub annotation: Option<Annotation>,
}

impl TagName {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
        }
    }

    /// The declared value type, when the annotation is a type suffix.
    pub fn value_type(&self) -> Option<ValueType> {
        match &self.annotation {
            Some(Annotation::Type(value_type)) => Some(*value_type),
            _ => None,
        }
    }

    /// Whether this is the special `.` reference.
    pub fn is_dot(&self) -> bool {
        self.name == "."
    }
}

/// Annotation parsed from a tag name.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// Type suffix: `name::type`
    Type(ValueType),

    /// External schema reference: `name:schemaName:defName`
    External {
        schema_name: String,
        definition_name: String,
    },
}

/// Value types accepted by the `::type` suffix grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    /// Free text, rendered as a JSON-escaped quoted string.
    Text,
    /// Schema-string with `format: "hidden"`; never required.
    Hidden,
}

impl ValueType {
    /// Parse a suffix keyword. Returns `None` for unknown words.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "string" => Some(ValueType::String),
            "number" => Some(ValueType::Number),
            "integer" => Some(ValueType::Integer),
            "boolean" => Some(ValueType::Boolean),
            "array" => Some(ValueType::Array),
            "text" => Some(ValueType::Text),
            "hidden" => Some(ValueType::Hidden),
            _ => None,
        }
    }

    /// The suffix keyword for this type.
    pub fn keyword(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Integer => "integer",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Text => "text",
            ValueType::Hidden => "hidden",
        }
    }

    /// The JSON Schema type this value type maps to.
    pub fn schema_type(&self) -> &'static str {
        match self {
            ValueType::String | ValueType::Text | ValueType::Hidden => "string",
            ValueType::Number => "number",
            ValueType::Integer => "integer",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
        }
    }

    /// The type-appropriate default value.
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::String | ValueType::Text | ValueType::Hidden => json!(""),
            ValueType::Number | ValueType::Integer => json!(0),
            ValueType::Boolean => json!(false),
            ValueType::Array => json!([]),
        }
    }
}
