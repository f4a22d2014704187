//! External schema reference resolution.
//!
//! Templates may annotate a variable as `{{name:schemaName:defName}}`, asking
//! for its field schema to come from a named external definition. The schema
//! builder resolves those through a [`SchemaProvider`], injected by the caller
//! so the core stays testable without I/O.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A field schema returned by a provider lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl FieldSchema {
    /// Create a field schema with just a type name.
    pub fn of_type(field_type: impl Into<String>) -> Self {
        Self {
            field_type: field_type.into(),
            default: None,
            title: None,
            description: None,
            minimum: None,
            maximum: None,
            format: None,
        }
    }
}

/// Trait for resolving external schema references.
pub trait SchemaProvider: Send + Sync {
    /// Look up a named definition within a named schema.
    ///
    /// Returns `None` when the schema or definition does not exist; the schema
    /// builder treats that as a fatal error for the referencing field.
    fn lookup(&self, schema_name: &str, definition_name: &str) -> Option<FieldSchema>;
}

/// On-disk shape of a provider schema file: a `definitions` map.
#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    definitions: HashMap<String, FieldSchema>,
}

/// Provider that reads `<root>/<schemaName>.json` files from a directory.
#[derive(Debug, Clone)]
pub struct FileSystemProvider {
    root: PathBuf,
}

impl FileSystemProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SchemaProvider for FileSystemProvider {
    fn lookup(&self, schema_name: &str, definition_name: &str) -> Option<FieldSchema> {
        let path = self.root.join(format!("{schema_name}.json"));
        let content = std::fs::read_to_string(&path).ok()?;
        let file: SchemaFile = serde_json::from_str(&content).ok()?;
        file.definitions.get(definition_name).cloned()
    }
}

/// Provider backed by an in-memory map, for testing and bundled schemas.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    schemas: HashMap<String, HashMap<String, FieldSchema>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition under a schema name.
    pub fn add(
        &mut self,
        schema_name: impl Into<String>,
        definition_name: impl Into<String>,
        field: FieldSchema,
    ) -> &mut Self {
        self.schemas
            .entry(schema_name.into())
            .or_default()
            .insert(definition_name.into(), field);
        self
    }

    /// Create a provider with the given `(schema, definition, field)` entries.
    pub fn with_definitions(
        definitions: impl IntoIterator<Item = (impl Into<String>, impl Into<String>, FieldSchema)>,
    ) -> Self {
        let mut provider = Self::new();
        for (schema_name, definition_name, field) in definitions {
            provider.add(schema_name, definition_name, field);
        }
        provider
    }
}

impl SchemaProvider for MemoryProvider {
    fn lookup(&self, schema_name: &str, definition_name: &str) -> Option<FieldSchema> {
        self.schemas
            .get(schema_name)
            .and_then(|defs| defs.get(definition_name))
            .cloned()
    }
}

/// Provider that resolves nothing (for templates without external references).
#[derive(Debug, Clone, Default)]
pub struct NullProvider;

impl SchemaProvider for NullProvider {
    fn lookup(&self, _schema_name: &str, _definition_name: &str) -> Option<FieldSchema> {
        None
    }
}
