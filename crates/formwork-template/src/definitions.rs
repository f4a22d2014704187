/*
 * definitions.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Named sub-template definitions and the structured document format.
//!
//! A structured document is a YAML mapping with optional `title`,
//! `description`, `view`, and `definitions` keys and a mandatory `template`
//! body. Each definition may declare a sub-template (usable as a partial) and
//! field metadata consulted by the schema builder.

use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TemplateError, TemplateResult};

/// A named definition from a structured document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Sub-template body, spliced inline where `{{> name}}` appears.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared type for the matching property or section, taken verbatim.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// A parsed structured document.
#[derive(Debug, Clone)]
pub(crate) struct Document {
    pub title: String,
    pub description: Option<String>,
    pub view: serde_json::Map<String, Value>,
    pub definitions: LinkedHashMap<String, Definition>,
    pub template: String,
}

/// Raw deserialization shape of a structured document.
#[derive(Debug, Deserialize)]
struct DocumentSource {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    view: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    definitions: Option<LinkedHashMap<String, DefinitionSource>>,
    #[serde(default)]
    template: Option<String>,
}

/// A definition is either a bare template string or a full mapping.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DefinitionSource {
    Template(String),
    Full(Definition),
}

impl From<DefinitionSource> for Definition {
    fn from(source: DefinitionSource) -> Self {
        match source {
            DefinitionSource::Template(template) => Definition {
                template: Some(template),
                ..Definition::default()
            },
            DefinitionSource::Full(definition) => definition,
        }
    }
}

/// Parse a structured document from YAML text.
pub(crate) fn parse_document(text: &str) -> TemplateResult<Document> {
    let source: DocumentSource = serde_yaml::from_str(text)?;
    let Some(template) = source.template else {
        return Err(TemplateError::MissingTemplateBody);
    };
    let definitions = source
        .definitions
        .unwrap_or_default()
        .into_iter()
        .map(|(name, definition)| (name, definition.into()))
        .collect();
    Ok(Document {
        title: source.title.unwrap_or_default(),
        description: source.description,
        view: source.view.unwrap_or_default(),
        definitions,
        template,
    })
}
